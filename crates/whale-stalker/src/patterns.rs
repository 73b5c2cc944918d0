/// Rule-based detection of suspicious wallet behavior
///
/// Each rule is evaluated independently against the merged wallet metrics, so a
/// wallet can carry any combination of patterns. Output order follows rule order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use whale_core::DetectionConfig;

use crate::types::{PatternName, SuspiciousPattern, WalletMetrics};

const INSIDER_TOTAL_SEVERITY: u32 = 15;
const INSIDER_PATTERN_COUNT: usize = 4;

/// Aggregate view of a pattern list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub total_patterns: usize,
    pub total_severity: u32,
    pub max_severity: u8,
    pub pattern_names: Vec<PatternName>,
}

/// Run every detection rule against the merged metrics
pub fn detect_patterns(metrics: &WalletMetrics, config: &DetectionConfig) -> Vec<SuspiciousPattern> {
    [
        consistent_early_buyer(metrics, config),
        liquidity_sniper(metrics, config),
        fresh_wallet_alpha(metrics, config),
        wallet_cluster(metrics, config),
        strategic_dumper(metrics, config),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn consistent_early_buyer(m: &WalletMetrics, config: &DetectionConfig) -> Option<SuspiciousPattern> {
    if m.early_hits < config.min_early_hits || m.avg_buy_rank > config.early_buyer_avg_rank_threshold {
        return None;
    }
    Some(SuspiciousPattern::new(
        PatternName::ConsistentEarlyBuyer,
        5,
        format!(
            "Consistently bought early (avg rank {:.0}) on {} successful tokens",
            m.avg_buy_rank, m.early_hits
        ),
    ))
}

/// Same-block sniping means different things depending on wallet age: a fresh
/// wallet doing it suggests advance knowledge, an old one is routine MEV.
fn liquidity_sniper(m: &WalletMetrics, config: &DetectionConfig) -> Option<SuspiciousPattern> {
    if m.same_block_buys < config.liquidity_sniper_min_hits {
        return None;
    }

    let pattern = if m.wallet_age_days < config.fresh_wallet_days {
        SuspiciousPattern::new(
            PatternName::LiquiditySniper,
            5,
            format!(
                "INSIDER SIGNAL: fresh wallet ({}d old) sniped liquidity adds {} times, likely advance knowledge",
                m.wallet_age_days, m.same_block_buys
            ),
        )
    } else {
        SuspiciousPattern::new(
            PatternName::LiquiditySniper,
            2,
            format!(
                "Routine MEV bot: {} same-block buys on an established wallet ({}d old)",
                m.same_block_buys, m.wallet_age_days
            ),
        )
    };
    Some(pattern)
}

fn fresh_wallet_alpha(m: &WalletMetrics, config: &DetectionConfig) -> Option<SuspiciousPattern> {
    if m.wallet_age_days > config.fresh_wallet_days || m.early_hits < config.fresh_wallet_min_early_hits {
        return None;
    }
    Some(SuspiciousPattern::new(
        PatternName::FreshWalletAlpha,
        4,
        format!(
            "Fresh wallet ({} days old) went straight to early buying with {} hits",
            m.wallet_age_days, m.early_hits
        ),
    ))
}

fn wallet_cluster(m: &WalletMetrics, config: &DetectionConfig) -> Option<SuspiciousPattern> {
    let size = m.cluster_size.filter(|&size| size >= config.cluster_min_size)?;
    Some(SuspiciousPattern::new(
        PatternName::WalletCluster,
        4,
        format!(
            "Member of a {}-wallet cluster, possible Sybil operation (one entity, many wallets)",
            size
        ),
    ))
}

/// Early buyers who also exit hard are predators rather than lucky holders.
/// Unknown hold time is treated as a slow exit.
fn strategic_dumper(m: &WalletMetrics, config: &DetectionConfig) -> Option<SuspiciousPattern> {
    if m.strategic_exit_count < config.strategic_dumper_min_exits {
        return None;
    }

    let hold = m
        .avg_hold_time_hours
        .map(|h| format!("{:.1}h", h))
        .unwrap_or_else(|| "unknown".to_string());

    let pattern = match m.avg_hold_time_hours {
        Some(hours) if hours < config.quick_flip_hours => SuspiciousPattern::new(
            PatternName::StrategicDumper,
            5,
            format!(
                "PREDATOR ALERT: {} strategic exits with avg hold {}, likely insider flipping",
                m.strategic_exit_count, hold
            ),
        ),
        _ => SuspiciousPattern::new(
            PatternName::StrategicDumper,
            4,
            format!(
                "Profit taker: {} strategic exits with avg hold {}",
                m.strategic_exit_count, hold
            ),
        ),
    };
    Some(pattern)
}

pub fn total_severity(patterns: &[SuspiciousPattern]) -> u32 {
    patterns.iter().map(|p| p.severity as u32).sum()
}

/// Reporting classifier, not used in scoring
pub fn is_likely_insider(patterns: &[SuspiciousPattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let names: HashSet<PatternName> = patterns.iter().map(|p| p.name).collect();
    if names.contains(&PatternName::ConsistentEarlyBuyer) && names.contains(&PatternName::LiquiditySniper) {
        return true;
    }

    total_severity(patterns) >= INSIDER_TOTAL_SEVERITY || names.len() >= INSIDER_PATTERN_COUNT
}

pub fn summarize_patterns(patterns: &[SuspiciousPattern]) -> PatternSummary {
    PatternSummary {
        total_patterns: patterns.len(),
        total_severity: total_severity(patterns),
        max_severity: patterns.iter().map(|p| p.severity).max().unwrap_or(0),
        pattern_names: patterns.iter().map(|p| p.name).collect(),
    }
}

pub fn filter_by_severity(patterns: &[SuspiciousPattern], min_severity: u8) -> Vec<SuspiciousPattern> {
    patterns
        .iter()
        .filter(|p| p.severity >= min_severity)
        .cloned()
        .collect()
}
