/// Value types flowing through the wallet analysis pipeline
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::early_buyer::EarlyBuyMetrics;
use crate::metrics::{ActivityDensity, BaseMetrics, SellBehavior};

/// Every per-wallet metric consumed by pattern detection and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletMetrics {
    pub wallet_address: String,

    // Ledger
    pub total_trades: u64,
    pub unique_tokens: u64,
    pub first_trade_date: Option<DateTime<Utc>>,
    pub last_trade_date: Option<DateTime<Utc>>,
    pub wallet_age_days: i64,
    pub tokens_traded: BTreeSet<String>,

    // Early buying
    pub early_hits: u32,
    pub early_buy_count: u32,
    pub avg_buy_rank: f64,
    pub median_buy_rank: f64,
    pub same_block_buys: u32,
    pub high_volume_early_buys: u32,
    pub fastest_buy_seconds: f64,
    pub avg_buy_delay_seconds: f64,
    pub early_buy_tokens: Vec<String>,

    // Activity density
    pub precision_rate: f64,
    pub is_spray_and_pray: bool,
    pub score_penalty: f64,

    // Sell behavior
    pub strategic_exit_count: u32,
    pub avg_hold_time_hours: Option<f64>,

    /// Size of the wallet's transfer cluster, when clustering data exists
    pub cluster_size: Option<u32>,
}

impl Default for WalletMetrics {
    fn default() -> Self {
        Self {
            wallet_address: String::new(),
            total_trades: 0,
            unique_tokens: 0,
            first_trade_date: None,
            last_trade_date: None,
            wallet_age_days: 0,
            tokens_traded: BTreeSet::new(),
            early_hits: 0,
            early_buy_count: 0,
            avg_buy_rank: 0.0,
            median_buy_rank: 0.0,
            same_block_buys: 0,
            high_volume_early_buys: 0,
            fastest_buy_seconds: 0.0,
            avg_buy_delay_seconds: 0.0,
            early_buy_tokens: Vec::new(),
            precision_rate: 0.0,
            is_spray_and_pray: false,
            score_penalty: 1.0,
            strategic_exit_count: 0,
            avg_hold_time_hours: None,
            cluster_size: None,
        }
    }
}

impl WalletMetrics {
    /// Merge the independently computed metric groups into one record
    pub fn merge(
        wallet_address: impl Into<String>,
        base: BaseMetrics,
        early: EarlyBuyMetrics,
        density: ActivityDensity,
        sells: SellBehavior,
        cluster_size: Option<u32>,
    ) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            total_trades: base.total_trades,
            unique_tokens: base.unique_tokens,
            first_trade_date: base.first_trade_date,
            last_trade_date: base.last_trade_date,
            wallet_age_days: base.wallet_age_days,
            tokens_traded: base.tokens_traded,
            early_hits: early.early_hits,
            early_buy_count: early.early_buy_count,
            avg_buy_rank: early.avg_buy_rank,
            median_buy_rank: early.median_buy_rank,
            same_block_buys: early.same_block_buys,
            high_volume_early_buys: early.high_volume_early_buys,
            fastest_buy_seconds: early.fastest_buy_seconds,
            avg_buy_delay_seconds: early.avg_buy_delay_seconds,
            early_buy_tokens: early.early_buy_tokens,
            precision_rate: density.precision_rate,
            is_spray_and_pray: density.is_spray_and_pray,
            score_penalty: density.score_penalty,
            strategic_exit_count: sells.strategic_exit_count,
            avg_hold_time_hours: sells.avg_hold_time_hours,
            cluster_size,
        }
    }

    /// True when the ledger had no trades at all, as opposed to trades without signal
    pub fn has_no_data(&self) -> bool {
        self.total_trades == 0
    }
}

/// Closed set of suspicious behaviors the detector can flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternName {
    ConsistentEarlyBuyer,
    LiquiditySniper,
    FreshWalletAlpha,
    WalletCluster,
    StrategicDumper,
}

impl PatternName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsistentEarlyBuyer => "CONSISTENT_EARLY_BUYER",
            Self::LiquiditySniper => "LIQUIDITY_SNIPER",
            Self::FreshWalletAlpha => "FRESH_WALLET_ALPHA",
            Self::WalletCluster => "WALLET_CLUSTER",
            Self::StrategicDumper => "STRATEGIC_DUMPER",
        }
    }
}

impl fmt::Display for PatternName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected pattern. Recomputed on every pass, never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspiciousPattern {
    pub name: PatternName,
    /// 1 (mild) to 5 (most severe)
    pub severity: u8,
    pub description: String,
}

impl SuspiciousPattern {
    pub fn new(name: PatternName, severity: u8, description: impl Into<String>) -> Self {
        Self {
            name,
            severity: severity.clamp(1, 5),
            description: description.into(),
        }
    }
}

/// Risk tier derived from the whale score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    MinimalInterest,
    LowInterest,
    ModerateInterest,
    Watchlist,
    HighPriorityWhale,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HighPriorityWhale => "HIGH PRIORITY WHALE",
            Self::Watchlist => "WATCHLIST",
            Self::ModerateInterest => "MODERATE INTEREST",
            Self::LowInterest => "LOW INTEREST",
            Self::MinimalInterest => "MINIMAL INTEREST",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Points contributed by one score component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub points: f64,
    pub max_points: f64,
    pub details: String,
}

/// Audit view of how a score was assembled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub early_hit: ComponentScore,
    pub buy_rank: ComponentScore,
    pub pattern: ComponentScore,
    pub pre_penalty_score: f64,
    pub score_penalty: f64,
    pub total_score: f64,
    pub tier: RiskTier,
}

/// Complete result of one wallet's analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletAnalysis {
    pub wallet_address: String,
    pub whale_score: f64,
    pub tier: RiskTier,
    pub patterns: Vec<SuspiciousPattern>,
    pub breakdown: ScoreBreakdown,
    pub is_likely_insider: bool,
    pub metrics: WalletMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_names_serialize_screaming_case() {
        let json = serde_json::to_string(&PatternName::FreshWalletAlpha).unwrap();
        assert_eq!(json, "\"FRESH_WALLET_ALPHA\"");
        assert_eq!(PatternName::StrategicDumper.to_string(), "STRATEGIC_DUMPER");
    }

    #[test]
    fn test_severity_is_bounded() {
        assert_eq!(SuspiciousPattern::new(PatternName::WalletCluster, 9, "x").severity, 5);
        assert_eq!(SuspiciousPattern::new(PatternName::WalletCluster, 0, "x").severity, 1);
    }

    #[test]
    fn test_default_metrics_are_neutral() {
        let metrics = WalletMetrics::default();
        assert_eq!(metrics.score_penalty, 1.0);
        assert!(metrics.cluster_size.is_none());
        assert!(metrics.has_no_data());
    }

    #[test]
    fn test_tier_ordering() {
        assert!(RiskTier::HighPriorityWhale > RiskTier::Watchlist);
        assert!(RiskTier::LowInterest > RiskTier::MinimalInterest);
    }
}
