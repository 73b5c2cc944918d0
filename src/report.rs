/// Terminal reports for analyzed wallets

use colored::{ColoredString, Colorize};
use std::fmt::Write;
use whale_scout::{ClusterAnalysis, CoordinatedTrade, WalletCluster};
use whale_stalker::early_buyer::EarlyTokenEntry;
use whale_stalker::metrics::WalletSummary;
use whale_stalker::patterns::summarize_patterns;
use whale_stalker::{rank_wallets, RiskTier, SnipingAssessment, WalletAnalysis};

use crate::config::ReportConfig;

const RULE_WIDTH: usize = 78;
const COORDINATED_SHOWN: usize = 5;

/// Everything the cluster overview prints for one cluster
#[derive(Debug, Clone)]
pub struct ClusterFindings {
    pub cluster: WalletCluster,
    pub stats: ClusterAnalysis,
    pub common_funder: Option<String>,
    /// Funders of the hub wallet, nearest first
    pub hub_funding_chain: Vec<String>,
    pub coordinated: Vec<CoordinatedTrade>,
}

fn tier_label(tier: RiskTier) -> ColoredString {
    match tier {
        RiskTier::HighPriorityWhale => tier.label().red().bold(),
        RiskTier::Watchlist => tier.label().yellow().bold(),
        RiskTier::ModerateInterest => tier.label().cyan(),
        RiskTier::LowInterest => tier.label().normal(),
        RiskTier::MinimalInterest => tier.label().dimmed(),
    }
}

fn severity_marker(severity: u8) -> &'static str {
    match severity {
        5 => "🔴",
        4 => "🟠",
        3 => "🟡",
        _ => "⚪",
    }
}

fn short_address(address: &str) -> String {
    if address.chars().count() <= 14 {
        return address.to_string();
    }
    let head: String = address.chars().take(8).collect();
    let tail: String = address
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{}...{}", head, tail)
}

/// Ranked table of the highest scoring wallets
pub fn render_ranked_table(analyses: &[WalletAnalysis], config: &ReportConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "🐋 WHALE LEADERBOARD".bold());
    let _ = writeln!(out, "{}", "═".repeat(RULE_WIDTH));

    let mut shown = rank_wallets(analyses, config.min_score);
    shown.truncate(config.max_results_display);

    if shown.is_empty() {
        let _ = writeln!(out, "{}", "💤 No wallets to report".bright_yellow());
        return out;
    }

    let _ = writeln!(
        out,
        "{:>4}  {:<17} {:>7}  {:<20} {:>5} {:>8}  {}",
        "#", "WALLET", "SCORE", "TIER", "HITS", "AVG RANK", "PATTERNS"
    );
    let _ = writeln!(out, "{}", "─".repeat(RULE_WIDTH));

    for (i, analysis) in shown.iter().enumerate() {
        let names: Vec<&str> = analysis.patterns.iter().map(|p| p.name.as_str()).collect();
        let insider = if analysis.is_likely_insider { " ⚠️" } else { "" };
        let _ = writeln!(
            out,
            "{:>4}  {:<17} {:>7.2}  {:<20} {:>5} {:>8.1}  {}{}",
            i + 1,
            short_address(&analysis.wallet_address),
            analysis.whale_score,
            tier_label(analysis.tier),
            analysis.metrics.early_hits,
            analysis.metrics.avg_buy_rank,
            names.join(", "),
            insider
        );
    }

    let _ = writeln!(
        out,
        "{}\nShowing {} of {} wallets",
        "─".repeat(RULE_WIDTH),
        shown.len(),
        analyses.len()
    );
    out
}

/// Full report for one wallet: score breakdown, metrics, patterns, auxiliary signals
pub fn render_wallet_report(
    analysis: &WalletAnalysis,
    summary: &WalletSummary,
    sniping: &SnipingAssessment,
    early_tokens: &[EarlyTokenEntry],
) -> String {
    let m = &analysis.metrics;
    let b = &analysis.breakdown;
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", "═".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{} {}", "🐋 WALLET".bold(), analysis.wallet_address.bold());
    let _ = writeln!(out, "{}", "═".repeat(RULE_WIDTH));
    let _ = writeln!(
        out,
        "Whale score: {} / 100   Tier: {}",
        format!("{:.2}", analysis.whale_score).bold(),
        tier_label(analysis.tier)
    );
    if analysis.is_likely_insider {
        let _ = writeln!(out, "{}", "⚠️  LIKELY INSIDER".red().bold());
    }

    let _ = writeln!(out, "\n{}", "📊 SCORE BREAKDOWN".bold());
    for component in [&b.early_hit, &b.buy_rank, &b.pattern] {
        let _ = writeln!(
            out,
            "   {:>6.2} / {:<4.0} {}",
            component.points, component.max_points, component.details
        );
    }
    let _ = writeln!(
        out,
        "   pre-penalty {:.2} × penalty {:.2} = {:.2}",
        b.pre_penalty_score, b.score_penalty, b.total_score
    );

    let _ = writeln!(out, "\n{}", "📈 ACTIVITY".bold());
    let _ = writeln!(
        out,
        "   Trades: {}   Unique tokens: {}   Wallet age: {} days",
        m.total_trades, m.unique_tokens, m.wallet_age_days
    );
    let _ = writeln!(
        out,
        "   Early hits: {}   Early buys: {}   Avg rank: {:.1}   Median rank: {:.1}",
        m.early_hits, m.early_buy_count, m.avg_buy_rank, m.median_buy_rank
    );
    let _ = writeln!(
        out,
        "   Same-block buys: {}   High-volume early buys: {}   Fastest buy: {:.0}s",
        m.same_block_buys, m.high_volume_early_buys, m.fastest_buy_seconds
    );
    let _ = writeln!(
        out,
        "   Precision: {:.2}%   Spray-and-pray: {}",
        m.precision_rate * 100.0,
        if m.is_spray_and_pray { "yes".red() } else { "no".green() }
    );
    let hold = m
        .avg_hold_time_hours
        .map(|h| format!("{:.1}h", h))
        .unwrap_or_else(|| "n/a".to_string());
    let _ = writeln!(
        out,
        "   Strategic exits: {}   Avg hold: {}   Cluster size: {}",
        m.strategic_exit_count,
        hold,
        m.cluster_size.map_or_else(|| "-".to_string(), |s| s.to_string())
    );
    if summary.avg_hours_between_trades > 0.0 {
        let _ = writeln!(
            out,
            "   Avg time between trades: {:.1}h",
            summary.avg_hours_between_trades
        );
    }

    let pattern_summary = summarize_patterns(&analysis.patterns);
    let _ = writeln!(
        out,
        "\n{} ({} found, total severity {})",
        "🚩 PATTERNS".bold(),
        pattern_summary.total_patterns,
        pattern_summary.total_severity
    );
    if analysis.patterns.is_empty() {
        let _ = writeln!(out, "   none");
    }
    for pattern in &analysis.patterns {
        let _ = writeln!(
            out,
            "   {} {} (severity {}): {}",
            severity_marker(pattern.severity),
            pattern.name.as_str().bold(),
            pattern.severity,
            pattern.description
        );
    }

    if sniping.sniping_score > 0 {
        let verdict = if sniping.is_likely_sniper {
            "likely sniper bot".red()
        } else {
            "not a sniper".normal()
        };
        let _ = writeln!(
            out,
            "\n{} score {} ({})",
            "🎯 SNIPING".bold(),
            sniping.sniping_score,
            verdict
        );
        for evidence in &sniping.evidence {
            let _ = writeln!(out, "   • {}", evidence);
        }
    }

    if !early_tokens.is_empty() {
        let _ = writeln!(out, "\n{}", "🥇 EARLIEST ENTRIES".bold());
        for entry in early_tokens {
            let _ = writeln!(
                out,
                "   #{:<4} {} {:.4} @ {}{}",
                entry.buy_rank,
                short_address(&entry.token_address),
                entry.value,
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                if entry.is_same_block_buy { " (same block)" } else { "" }
            );
        }
    }

    if !summary.top_tokens_by_frequency.is_empty() {
        let tokens: Vec<String> = summary
            .top_tokens_by_frequency
            .iter()
            .take(5)
            .map(|(token, count)| format!("{} ×{}", short_address(token), count))
            .collect();
        let _ = writeln!(out, "\n{} {}", "🔁 Most traded:".bold(), tokens.join(", "));
    }

    out
}

/// Cluster overview: hub, shared funder, funding trail and coordinated trades
pub fn render_cluster_report(clusters: &[ClusterFindings]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "🕸️  WALLET CLUSTERS".bold());
    let _ = writeln!(out, "{}", "═".repeat(RULE_WIDTH));

    if clusters.is_empty() {
        let _ = writeln!(out, "{}", "No clusters above the minimum size".bright_yellow());
        return out;
    }

    for findings in clusters {
        let stats = &findings.stats;
        let _ = writeln!(
            out,
            "Cluster {}: {} wallets, {} transfers, traded value {:.2}",
            findings.cluster.id, stats.size, stats.edge_count, stats.total_traded_value
        );
        if let Some(hub) = &stats.most_connected_wallet {
            let _ = writeln!(
                out,
                "   Hub: {} (degree centrality {:.2})",
                short_address(hub),
                stats.degree_centrality
            );
            if !findings.hub_funding_chain.is_empty() {
                let trail: Vec<String> = findings.hub_funding_chain.iter().map(|w| short_address(w)).collect();
                let _ = writeln!(out, "   Hub funded via: {}", trail.join(" <- "));
            }
        }
        if let Some(funder) = &findings.common_funder {
            let _ = writeln!(out, "   Common funder: {}", funder.as_str().red());
        }
        if !findings.coordinated.is_empty() {
            let _ = writeln!(
                out,
                "   {} {} coordinated trades",
                "⚡".yellow(),
                findings.coordinated.len()
            );
            for trade in findings.coordinated.iter().take(COORDINATED_SHOWN) {
                let _ = writeln!(
                    out,
                    "      {:?} {}: {} then {} ({}s apart)",
                    trade.action,
                    short_address(&trade.token_address),
                    short_address(&trade.first_wallet),
                    short_address(&trade.second_wallet),
                    trade.seconds_apart
                );
            }
        }
    }
    out
}
