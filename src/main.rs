use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use whale_core::{Trade, Transfer};
use whale_hunter::config::LoggingConfig;
use whale_hunter::report::ClusterFindings;
use whale_hunter::{input, report, AppConfig, CliArgs};
use whale_scout::{
    detect_common_funding_source, identify_coordinated_trading, trace_funding_source, WalletGraph,
};
use whale_stalker::early_buyer::top_early_tokens;
use whale_stalker::metrics::summarize_activity;
use whale_stalker::patterns::filter_by_severity;
use whale_stalker::{
    group_trades_by_wallet, identify_sniping_behavior, AuxiliaryData, WalletAnalysis, WalletScorer,
    WhalePipeline,
};

const EARLY_TOKENS_IN_REPORT: usize = 5;
const COORDINATION_WINDOW_SECS: i64 = 300;
const HUB_FUNDING_DEPTH: usize = 5;
const CRITICAL_SEVERITY: u8 = 5;

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    // Create logs directory if it doesn't exist
    std::fs::create_dir_all(&logging.directory)
        .with_context(|| format!("Failed to create log directory {}", logging.directory))?;

    let file_appender = tracing_appender::rolling::daily(&logging.directory, &logging.file_prefix);
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .compact();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .json()
        .with_current_span(false)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Keep the file writer alive for the whole process
    std::mem::forget(_guard);

    Ok(())
}

/// Cluster sizes for the pipeline, plus the printable cluster overview
#[instrument(skip(transfers, trades), fields(transfer_count = transfers.len()))]
fn analyze_clusters(
    transfers: &[Transfer],
    trades: &[Trade],
    min_size: usize,
) -> (HashMap<String, u32>, String) {
    let graph = WalletGraph::from_transfers(transfers);
    let clusters = graph.find_clusters(min_size);

    let overview: Vec<ClusterFindings> = clusters
        .iter()
        .map(|cluster| {
            let stats = graph.analyze_cluster(cluster, trades);
            let common_funder = detect_common_funding_source(&cluster.wallets, transfers);
            if let Some(funder) = &common_funder {
                warn!(cluster = cluster.id, size = cluster.size(), funder = %funder, "🕸️ Cluster shares a funder");
            }
            let hub_funding_chain = stats
                .most_connected_wallet
                .as_deref()
                .map(|hub| trace_funding_source(hub, transfers, HUB_FUNDING_DEPTH))
                .unwrap_or_default();
            let coordinated = identify_coordinated_trading(&cluster.wallets, trades, COORDINATION_WINDOW_SECS);
            if !coordinated.is_empty() {
                warn!(cluster = cluster.id, coordinated = coordinated.len(), "⚡ Coordinated trading inside cluster");
            }
            ClusterFindings {
                cluster: cluster.clone(),
                stats,
                common_funder,
                hub_funding_chain,
                coordinated,
            }
        })
        .collect();

    (graph.cluster_sizes(min_size), report::render_cluster_report(&overview))
}

fn print_detailed_reports(
    analyses: &[WalletAnalysis],
    ledger: &BTreeMap<String, Vec<Trade>>,
    pipeline: &WhalePipeline,
    count: usize,
) {
    for analysis in analyses.iter().take(count) {
        let Some(trades) = ledger.get(&analysis.wallet_address) else {
            continue;
        };
        let summary = summarize_activity(trades);
        let sniping = identify_sniping_behavior(trades, pipeline.config());
        let early_tokens = top_early_tokens(trades, EARLY_TOKENS_IN_REPORT);
        print!(
            "{}",
            report::render_wallet_report(analysis, &summary, &sniping, &early_tokens)
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();
    let args = CliArgs::parse(&raw_args)?;
    let config = AppConfig::load_or_default(args.config.as_deref())?;

    init_tracing(&config.logging)?;

    info!("🐋 Whale Hunter - Early Buyer Analysis");
    info!("======================================");

    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let trades = input::load_trades(&args.trades).await?;
    let winners: Option<HashSet<String>> = match &args.winners {
        Some(path) => Some(input::load_winners(path).await?),
        None => None,
    };

    let ledger = group_trades_by_wallet(trades);
    info!(wallets = ledger.len(), as_of = %as_of, "📒 Ledger grouped by wallet");

    let mut aux = AuxiliaryData::new()
        .with_activity(AuxiliaryData::activity_from_ledger(&ledger))
        .with_sell_behavior(AuxiliaryData::sell_behavior_from_ledger(&ledger));

    let mut cluster_report = None;
    if let Some(path) = &args.transfers {
        let transfers = input::load_transfers(path).await?;
        let all_trades: Vec<Trade> = ledger.values().flatten().cloned().collect();
        let (sizes, rendered) = analyze_clusters(
            &transfers,
            &all_trades,
            config.detection.cluster_min_size as usize,
        );
        debug!(clustered_wallets = sizes.len(), "Cluster sizes ready");
        aux = aux.with_clusters(sizes);
        cluster_report = Some(rendered);
    }

    let pipeline = WhalePipeline::new(config.detection.clone())?;

    // Scoring is CPU bound, keep it off the async workers
    let (analyses, ledger, pipeline) = tokio::task::spawn_blocking(move || {
        let analyses = pipeline.analyze_batch(&ledger, &aux, winners.as_ref(), as_of);
        (analyses, ledger, pipeline)
    })
    .await
    .context("Wallet analysis task failed")?;

    let scorer = WalletScorer::new(pipeline.config());
    let alerts = analyses
        .iter()
        .filter(|a| scorer.should_send_alert(a.whale_score))
        .count();
    let watchlist = analyses
        .iter()
        .filter(|a| scorer.should_add_to_watchlist(a.whale_score))
        .count();
    let insiders = analyses.iter().filter(|a| a.is_likely_insider).count();
    let critical = analyses
        .iter()
        .filter(|a| !filter_by_severity(&a.patterns, CRITICAL_SEVERITY).is_empty())
        .count();
    info!(
        alerts = alerts,
        watchlist = watchlist,
        likely_insiders = insiders,
        critical_patterns = critical,
        "🎯 Scoring complete"
    );

    print!("{}", report::render_ranked_table(&analyses, &config.report));
    print_detailed_reports(&analyses, &ledger, &pipeline, config.report.detailed_reports);
    if let Some(rendered) = cluster_report {
        print!("{}", rendered);
    }

    info!("👋 Whale Hunter run complete");
    Ok(())
}
