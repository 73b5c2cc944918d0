use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Detection and scoring thresholds.
///
/// Passed by reference into every analysis call; nothing in the pipeline reads
/// thresholds from global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// A buy counts as early when its global buy rank is within this window
    pub first_n_buyers: u32,

    /// Early-buy value at or above this counts as a high-volume early buy
    pub high_volume_threshold: f64,

    /// CONSISTENT_EARLY_BUYER: minimum early hits
    pub min_early_hits: u32,

    /// CONSISTENT_EARLY_BUYER: maximum average buy rank
    pub early_buyer_avg_rank_threshold: f64,

    /// LIQUIDITY_SNIPER: minimum same-block buys
    pub liquidity_sniper_min_hits: u32,

    /// Wallets younger than this many days are "fresh"
    pub fresh_wallet_days: i64,

    /// FRESH_WALLET_ALPHA: minimum early hits for a fresh wallet
    pub fresh_wallet_min_early_hits: u32,

    /// WALLET_CLUSTER: minimum connected wallets
    pub cluster_min_size: u32,

    /// STRATEGIC_DUMPER: minimum strategic exits
    pub strategic_dumper_min_exits: u32,

    /// STRATEGIC_DUMPER: average hold below this is a quick flip (hours)
    pub quick_flip_hours: f64,

    /// Buy-rank component reaches zero at this average rank
    pub max_buy_rank: f64,

    /// Score at which a wallet belongs on the watchlist
    pub whale_score_watchlist: f64,

    /// Score at which a wallet warrants an immediate alert
    pub whale_score_alert: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            first_n_buyers: 100,
            high_volume_threshold: 1.0,
            min_early_hits: 5,
            early_buyer_avg_rank_threshold: 20.0,
            liquidity_sniper_min_hits: 3,
            fresh_wallet_days: 7,
            fresh_wallet_min_early_hits: 2,
            cluster_min_size: 5,
            strategic_dumper_min_exits: 3,
            quick_flip_hours: 48.0,
            max_buy_rank: 100.0,
            whale_score_watchlist: 60.0,
            whale_score_alert: 80.0,
        }
    }
}

impl DetectionConfig {
    /// Check the structural preconditions the scoring formulas rely on
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.first_n_buyers == 0 {
            return Err(CoreError::invalid(
                "first_n_buyers",
                self.first_n_buyers,
                "early window must contain at least one buyer",
            ));
        }

        // ln(max_buy_rank) is a divisor
        if self.max_buy_rank.is_nan() || self.max_buy_rank <= 1.0 {
            return Err(CoreError::invalid(
                "max_buy_rank",
                self.max_buy_rank,
                "must be greater than 1",
            ));
        }

        if self.early_buyer_avg_rank_threshold < 0.0 {
            return Err(CoreError::invalid(
                "early_buyer_avg_rank_threshold",
                self.early_buyer_avg_rank_threshold,
                "must not be negative",
            ));
        }

        if self.fresh_wallet_days < 0 {
            return Err(CoreError::invalid(
                "fresh_wallet_days",
                self.fresh_wallet_days,
                "must not be negative",
            ));
        }

        if self.quick_flip_hours < 0.0 {
            return Err(CoreError::invalid(
                "quick_flip_hours",
                self.quick_flip_hours,
                "must not be negative",
            ));
        }

        if !(0.0..=100.0).contains(&self.whale_score_watchlist) {
            return Err(CoreError::invalid(
                "whale_score_watchlist",
                self.whale_score_watchlist,
                "must be within 0..=100",
            ));
        }

        if !(0.0..=100.0).contains(&self.whale_score_alert) {
            return Err(CoreError::invalid(
                "whale_score_alert",
                self.whale_score_alert,
                "must be within 0..=100",
            ));
        }

        if self.whale_score_alert < self.whale_score_watchlist {
            return Err(CoreError::invalid(
                "whale_score_alert",
                self.whale_score_alert,
                "must not be below whale_score_watchlist",
            ));
        }

        Ok(())
    }
}
