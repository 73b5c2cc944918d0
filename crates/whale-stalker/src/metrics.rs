/// Wallet-level descriptive statistics derived from a trade ledger
///
/// Nothing here measures profitability: the numbers describe how and how often
/// a wallet trades, never whether it made money.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use whale_core::Trade;

/// Spray-and-pray penalty tiers: (precision below, unique tokens above, flagged, penalty).
/// Evaluated in order, first match wins.
const SPRAY_TIERS: [(f64, u64, bool, f64); 3] = [
    (0.01, 500, true, 0.2),
    (0.05, 200, true, 0.5),
    (0.10, 100, false, 0.7),
];

/// A SELL disposing of more than this share of the open position is a strategic exit
const STRATEGIC_EXIT_FRACTION: f64 = 0.5;

const TOP_TOKENS_LIMIT: usize = 10;

/// Basic ledger statistics for one wallet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseMetrics {
    pub total_trades: u64,
    pub unique_tokens: u64,
    pub first_trade_date: Option<DateTime<Utc>>,
    pub last_trade_date: Option<DateTime<Utc>>,
    pub wallet_age_days: i64,
    pub tokens_traded: BTreeSet<String>,
}

/// Precision of a wallet's early buying relative to its overall activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDensity {
    /// successful / total unique tokens, rounded to 4 decimals
    pub precision_rate: f64,
    pub is_spray_and_pray: bool,
    /// Multiplier in (0, 1] applied to the composite score
    pub score_penalty: f64,
    pub total_unique_tokens: u64,
    pub successful_token_count: u64,
    pub total_tx_count: u64,
}

impl Default for ActivityDensity {
    fn default() -> Self {
        Self {
            precision_rate: 0.0,
            is_spray_and_pray: false,
            score_penalty: 1.0,
            total_unique_tokens: 0,
            successful_token_count: 0,
            total_tx_count: 0,
        }
    }
}

/// How a wallet exits positions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellBehavior {
    pub strategic_exit_count: u32,
    /// Mean hours from first buy to each strategic exit
    pub avg_hold_time_hours: Option<f64>,
}

/// Distribution of buy ranks across every ranked trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyRankDistribution {
    pub min_buy_rank: u32,
    pub max_buy_rank: u32,
    pub median_buy_rank: f64,
    pub mean_buy_rank: f64,
}

/// Reporting summary of trading behavior
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletSummary {
    /// (token, trade count), most traded first
    pub top_tokens_by_frequency: Vec<(String, u64)>,
    pub avg_hours_between_trades: f64,
    pub buy_rank_distribution: Option<BuyRankDistribution>,
}

/// Compute ledger statistics. `as_of` is the analysis clock used for wallet age.
pub fn calculate_wallet_metrics(trades: &[Trade], as_of: DateTime<Utc>) -> BaseMetrics {
    let Some(first_trade_date) = trades.iter().map(|t| t.timestamp).min() else {
        return BaseMetrics::default();
    };
    let last_trade_date = trades.iter().map(|t| t.timestamp).max();

    let tokens_traded: BTreeSet<String> =
        trades.iter().map(|t| t.token_address.clone()).collect();

    BaseMetrics {
        total_trades: trades.len() as u64,
        unique_tokens: tokens_traded.len() as u64,
        first_trade_date: Some(first_trade_date),
        last_trade_date,
        wallet_age_days: (as_of - first_trade_date).num_days().max(0),
        tokens_traded,
    }
}

/// Separate informed early buyers from bots that buy everything.
///
/// A wallet touching thousands of tokens lands on a few winners by chance, so
/// low precision combined with high volume scales the score down.
pub fn calculate_activity_density(
    total_unique_tokens: u64,
    successful_token_count: u64,
    total_tx_count: u64,
) -> ActivityDensity {
    if total_unique_tokens == 0 {
        return ActivityDensity {
            successful_token_count,
            total_tx_count,
            ..Default::default()
        };
    }

    let precision_rate = successful_token_count as f64 / total_unique_tokens as f64;

    let (is_spray_and_pray, score_penalty) = SPRAY_TIERS
        .iter()
        .find(|(max_precision, min_tokens, _, _)| {
            precision_rate < *max_precision && total_unique_tokens > *min_tokens
        })
        .map(|&(_, _, flagged, penalty)| (flagged, penalty))
        .unwrap_or((false, 1.0));

    ActivityDensity {
        precision_rate: (precision_rate * 10_000.0).round() / 10_000.0,
        is_spray_and_pray,
        score_penalty,
        total_unique_tokens,
        successful_token_count,
        total_tx_count,
    }
}

/// Count strategic exits from a timestamp-ordered ledger.
///
/// Positions are tracked per token in traded amount. A sell larger than half of
/// the position open at that moment is a strategic exit.
pub fn calculate_sell_behavior(trades: &[Trade]) -> SellBehavior {
    struct Position {
        open_amount: f64,
        first_buy: DateTime<Utc>,
    }

    let mut positions: HashMap<&str, Position> = HashMap::new();
    let mut hold_hours = Vec::new();

    for trade in trades {
        if trade.is_buy() {
            positions
                .entry(trade.token_address.as_str())
                .and_modify(|p| p.open_amount += trade.amount)
                .or_insert(Position {
                    open_amount: trade.amount,
                    first_buy: trade.timestamp,
                });
            continue;
        }

        // Sells without a recorded buy have no position to measure against
        let Some(position) = positions.get_mut(trade.token_address.as_str()) else {
            continue;
        };
        if position.open_amount <= 0.0 {
            continue;
        }

        if trade.amount > position.open_amount * STRATEGIC_EXIT_FRACTION {
            let held = trade.timestamp - position.first_buy;
            hold_hours.push(held.num_seconds().max(0) as f64 / 3600.0);
        }
        position.open_amount = (position.open_amount - trade.amount).max(0.0);
    }

    SellBehavior {
        strategic_exit_count: hold_hours.len() as u32,
        avg_hold_time_hours: mean(&hold_hours),
    }
}

/// Summary statistics for reports
pub fn summarize_activity(trades: &[Trade]) -> WalletSummary {
    if trades.is_empty() {
        return WalletSummary::default();
    }

    let mut counts: HashMap<&str, u64> = HashMap::new();
    for trade in trades {
        *counts.entry(trade.token_address.as_str()).or_default() += 1;
    }
    let mut top_tokens: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(token, count)| (token.to_string(), count))
        .collect();
    top_tokens.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_tokens.truncate(TOP_TOKENS_LIMIT);

    let mut timestamps: Vec<DateTime<Utc>> = trades.iter().map(|t| t.timestamp).collect();
    timestamps.sort();
    let gaps: Vec<f64> = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds() as f64 / 3600.0)
        .collect();

    let mut ranks: Vec<u32> = trades.iter().filter_map(|t| t.buy_rank).collect();
    ranks.sort_unstable();
    let buy_rank_distribution = if ranks.is_empty() {
        None
    } else {
        let as_f64: Vec<f64> = ranks.iter().map(|&r| r as f64).collect();
        Some(BuyRankDistribution {
            min_buy_rank: ranks[0],
            max_buy_rank: ranks[ranks.len() - 1],
            median_buy_rank: median(&as_f64),
            mean_buy_rank: mean(&as_f64).unwrap_or(0.0),
        })
    };

    WalletSummary {
        top_tokens_by_frequency: top_tokens,
        avg_hours_between_trades: mean(&gaps).unwrap_or(0.0),
        buy_rank_distribution,
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Median of an ascending-sorted slice; 0 when empty
pub(crate) fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}
