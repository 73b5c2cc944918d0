/// Early-buy timing and rank analysis
///
/// Works on a wallet's ledger sorted by timestamp ascending. Only trades whose
/// global buy rank falls inside the configured early window are considered.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use whale_core::{DetectionConfig, Trade};

use crate::metrics::{mean, median};

// Sniping heuristic weights
const SAME_BLOCK_POINTS: u32 = 30;
const FAST_BUY_POINTS: u32 = 20;
const TOP_RANK_POINTS: u32 = 25;
const HIGH_FREQUENCY_POINTS: u32 = 15;
const SNIPER_SCORE_THRESHOLD: u32 = 40;

const FAST_BUY_SECONDS: f64 = 60.0;
const FAST_BUY_MIN_COUNT: usize = 3;
const TOP_RANK: u32 = 10;
const TOP_RANK_MIN_COUNT: usize = 5;
const HIGH_FREQUENCY_TRADES_PER_DAY: f64 = 5.0;

/// Rank and timing statistics over the wallet's early-window buys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarlyBuyMetrics {
    /// Distinct tokens bought inside the early window (winners only, when known)
    pub early_hits: u32,
    /// Trades that fell inside the early window
    pub early_buy_count: u32,
    pub avg_buy_rank: f64,
    pub median_buy_rank: f64,
    pub same_block_buys: u32,
    pub high_volume_early_buys: u32,
    pub fastest_buy_seconds: f64,
    pub avg_buy_delay_seconds: f64,
    /// Tokens counted as early hits, in first-seen order
    pub early_buy_tokens: Vec<String>,
}

/// Output of the standalone sniping heuristic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnipingAssessment {
    pub is_likely_sniper: bool,
    pub sniping_score: u32,
    pub evidence: Vec<String>,
}

/// Best-ranked entry of the wallet into one token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyTokenEntry {
    pub token_address: String,
    pub buy_rank: u32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub value: f64,
    pub is_same_block_buy: bool,
}

/// Analyze the wallet's buys within the first `config.first_n_buyers` buyers.
///
/// With a non-empty `winners` set, only tokens in that set count as early hits.
/// An empty set restricts nothing. Rank and timing statistics always cover the
/// whole early window.
pub fn analyze_early_buying(
    trades: &[Trade],
    winners: Option<&HashSet<String>>,
    config: &DetectionConfig,
) -> EarlyBuyMetrics {
    let winners = winners.filter(|w| !w.is_empty());
    let early: Vec<&Trade> = trades
        .iter()
        .filter(|t| matches!(t.buy_rank, Some(rank) if rank <= config.first_n_buyers))
        .collect();

    if early.is_empty() {
        return EarlyBuyMetrics::default();
    }

    let mut seen = HashSet::new();
    let early_buy_tokens: Vec<String> = early
        .iter()
        .map(|t| t.token_address.as_str())
        .filter(|token| winners.map_or(true, |w| w.contains(*token)))
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect();

    let mut ranks: Vec<f64> = early
        .iter()
        .filter_map(|t| t.buy_rank)
        .map(|r| r as f64)
        .collect();
    ranks.sort_by(|a, b| a.total_cmp(b));

    let delays: Vec<f64> = early.iter().filter_map(|t| t.seconds_after_launch).collect();

    EarlyBuyMetrics {
        early_hits: early_buy_tokens.len() as u32,
        early_buy_count: early.len() as u32,
        avg_buy_rank: mean(&ranks).unwrap_or(0.0),
        median_buy_rank: median(&ranks),
        same_block_buys: early.iter().filter(|t| t.is_same_block_buy).count() as u32,
        high_volume_early_buys: early
            .iter()
            .filter(|t| t.value >= config.high_volume_threshold)
            .count() as u32,
        fastest_buy_seconds: delays.iter().copied().reduce(f64::min).unwrap_or(0.0),
        avg_buy_delay_seconds: mean(&delays).unwrap_or(0.0),
        early_buy_tokens,
    }
}

/// Heuristic bot/sniper check over the whole ledger.
///
/// Independent of the whale score; used as an auxiliary reporting signal.
pub fn identify_sniping_behavior(trades: &[Trade], config: &DetectionConfig) -> SnipingAssessment {
    if trades.is_empty() {
        return SnipingAssessment::default();
    }

    let mut assessment = SnipingAssessment::default();

    let same_block = trades.iter().filter(|t| t.is_same_block_buy).count();
    if same_block >= config.liquidity_sniper_min_hits as usize {
        assessment.sniping_score += SAME_BLOCK_POINTS;
        assessment
            .evidence
            .push(format!("Same-block liquidity sniping: {} times", same_block));
    }

    let fast = trades
        .iter()
        .filter(|t| matches!(t.seconds_after_launch, Some(s) if s < FAST_BUY_SECONDS))
        .count();
    if fast >= FAST_BUY_MIN_COUNT {
        assessment.sniping_score += FAST_BUY_POINTS;
        assessment
            .evidence
            .push(format!("Ultra-fast buys (<60s): {} times", fast));
    }

    let top_ranked = trades
        .iter()
        .filter(|t| matches!(t.buy_rank, Some(r) if r <= TOP_RANK))
        .count();
    if top_ranked >= TOP_RANK_MIN_COUNT {
        assessment.sniping_score += TOP_RANK_POINTS;
        assessment
            .evidence
            .push(format!("Consistent top-10 buyer: {} times", top_ranked));
    }

    let first = trades.iter().map(|t| t.timestamp).min();
    let last = trades.iter().map(|t| t.timestamp).max();
    if let (Some(first), Some(last)) = (first, last) {
        let span_days = (last - first).num_days();
        if span_days > 0 {
            let per_day = trades.len() as f64 / span_days as f64;
            if per_day >= HIGH_FREQUENCY_TRADES_PER_DAY {
                assessment.sniping_score += HIGH_FREQUENCY_POINTS;
                assessment
                    .evidence
                    .push(format!("High-frequency: {:.1} trades/day", per_day));
            }
        }
    }

    assessment.is_likely_sniper = assessment.sniping_score >= SNIPER_SCORE_THRESHOLD;
    assessment
}

/// Tokens this wallet entered earliest, best rank first
pub fn top_early_tokens(trades: &[Trade], limit: usize) -> Vec<EarlyTokenEntry> {
    let mut best: HashMap<&str, &Trade> = HashMap::new();
    for trade in trades {
        let Some(rank) = trade.buy_rank else { continue };
        best.entry(trade.token_address.as_str())
            .and_modify(|current| {
                if current.buy_rank.map_or(true, |r| rank < r) {
                    *current = trade;
                }
            })
            .or_insert(trade);
    }

    let mut entries: Vec<EarlyTokenEntry> = best
        .into_values()
        .filter_map(|t| {
            t.buy_rank.map(|buy_rank| EarlyTokenEntry {
                token_address: t.token_address.clone(),
                buy_rank,
                timestamp: t.timestamp,
                value: t.value,
                is_same_block_buy: t.is_same_block_buy,
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        a.buy_rank
            .cmp(&b.buy_rank)
            .then_with(|| a.token_address.cmp(&b.token_address))
    });
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use whale_core::TradeAction;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn buy(token: &str, rank: Option<u32>, minutes: i64) -> Trade {
        Trade {
            wallet: "0xwallet".to_string(),
            token_address: token.to_string(),
            chain: "ethereum".to_string(),
            action: TradeAction::Buy,
            amount: 1.0,
            value: 0.5,
            timestamp: at(minutes),
            block_number: 100,
            tx_hash: format!("0x{}{}", token, minutes),
            tx_index: Some(0),
            buy_rank: rank,
            is_same_block_buy: false,
            seconds_after_launch: None,
            blocks_after_launch: None,
        }
    }

    #[test]
    fn test_nothing_in_window_is_all_zero() {
        let config = DetectionConfig::default();
        let trades = vec![buy("A", Some(150), 0), buy("B", None, 1)];
        let metrics = analyze_early_buying(&trades, None, &config);
        assert_eq!(metrics, EarlyBuyMetrics::default());
        assert!(metrics.early_buy_tokens.is_empty());
    }

    #[test]
    fn test_rank_statistics_over_window() {
        let config = DetectionConfig::default();
        let trades = vec![
            buy("A", Some(2), 0),
            buy("B", Some(10), 5),
            buy("A", Some(30), 9),
            buy("C", Some(500), 12),
        ];
        let metrics = analyze_early_buying(&trades, None, &config);

        assert_eq!(metrics.early_hits, 2);
        assert_eq!(metrics.early_buy_count, 3);
        assert_eq!(metrics.avg_buy_rank, 14.0);
        assert_eq!(metrics.median_buy_rank, 10.0);
        assert_eq!(metrics.early_buy_tokens, vec!["A", "B"]);
    }

    #[test]
    fn test_winners_restrict_hits_but_not_ranks() {
        let config = DetectionConfig::default();
        let trades = vec![buy("A", Some(4), 0), buy("B", Some(8), 1)];
        let winners: HashSet<String> = ["B".to_string()].into_iter().collect();

        let metrics = analyze_early_buying(&trades, Some(&winners), &config);
        assert_eq!(metrics.early_hits, 1);
        assert_eq!(metrics.early_buy_tokens, vec!["B"]);
        assert_eq!(metrics.avg_buy_rank, 6.0);
    }

    #[test]
    fn test_empty_winners_set_restricts_nothing() {
        let config = DetectionConfig::default();
        let trades = vec![buy("A", Some(3), 0)];
        let empty = HashSet::new();

        let unrestricted = analyze_early_buying(&trades, None, &config);
        let with_empty = analyze_early_buying(&trades, Some(&empty), &config);
        assert_eq!(unrestricted.early_hits, 1);
        assert_eq!(with_empty, unrestricted);
    }

    #[test]
    fn test_same_block_volume_and_timing() {
        let config = DetectionConfig::default();
        let mut first = buy("A", Some(1), 0);
        first.is_same_block_buy = true;
        first.value = 2.0;
        first.seconds_after_launch = Some(3.0);
        let mut second = buy("B", Some(5), 1);
        second.seconds_after_launch = Some(9.0);
        let third = buy("C", Some(7), 2);

        let metrics = analyze_early_buying(&[first, second, third], None, &config);
        assert_eq!(metrics.same_block_buys, 1);
        assert_eq!(metrics.high_volume_early_buys, 1);
        assert_eq!(metrics.fastest_buy_seconds, 3.0);
        assert_eq!(metrics.avg_buy_delay_seconds, 6.0);
    }

    #[test]
    fn test_window_is_configurable() {
        let config = DetectionConfig {
            first_n_buyers: 10,
            ..Default::default()
        };
        let trades = vec![buy("A", Some(10), 0), buy("B", Some(11), 1)];
        assert_eq!(analyze_early_buying(&trades, None, &config).early_hits, 1);
    }

    #[test]
    fn test_sniper_heuristic_scores() {
        let config = DetectionConfig::default();
        let trades: Vec<Trade> = (0..5)
            .map(|i| {
                let mut t = buy(&format!("T{}", i), Some(3), i);
                t.is_same_block_buy = i < 3;
                t
            })
            .collect();

        let assessment = identify_sniping_behavior(&trades, &config);
        assert_eq!(assessment.sniping_score, 55);
        assert!(assessment.is_likely_sniper);
        assert_eq!(assessment.evidence.len(), 2);
    }

    #[test]
    fn test_sniper_heuristic_below_threshold() {
        let config = DetectionConfig::default();
        let trades: Vec<Trade> = (0..3)
            .map(|i| {
                let mut t = buy(&format!("T{}", i), Some(50), i);
                t.seconds_after_launch = Some(20.0);
                t
            })
            .collect();

        let assessment = identify_sniping_behavior(&trades, &config);
        assert_eq!(assessment.sniping_score, 20);
        assert!(!assessment.is_likely_sniper);
    }

    #[test]
    fn test_high_frequency_needs_a_full_day() {
        let config = DetectionConfig::default();
        let same_day: Vec<Trade> = (0..20).map(|i| buy("A", None, i)).collect();
        assert_eq!(identify_sniping_behavior(&same_day, &config).sniping_score, 0);

        let two_days: Vec<Trade> = (0..20).map(|i| buy("A", None, i * 150)).collect();
        assert_eq!(identify_sniping_behavior(&two_days, &config).sniping_score, 15);
    }

    #[test]
    fn test_top_early_tokens_keeps_best_rank() {
        let trades = vec![
            buy("A", Some(40), 0),
            buy("A", Some(3), 5),
            buy("B", Some(12), 6),
            buy("C", None, 7),
        ];
        let top = top_early_tokens(&trades, 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].token_address, "A");
        assert_eq!(top[0].buy_rank, 3);
        assert_eq!(top[1].token_address, "B");

        assert_eq!(top_early_tokens(&trades, 1).len(), 1);
    }
}
