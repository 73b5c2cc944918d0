/// Per-wallet analysis pipeline and parallel batch driver
///
/// metrics + early buys -> merged metrics -> patterns -> score. Every wallet is
/// analyzed independently, so batches fan out across the rayon pool with the
/// auxiliary lookups shared read-only.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, instrument};
use whale_core::{CoreError, DetectionConfig, Trade};

use crate::early_buyer::analyze_early_buying;
use crate::metrics::{
    calculate_activity_density, calculate_sell_behavior, calculate_wallet_metrics, SellBehavior,
};
use crate::patterns::{detect_patterns, is_likely_insider};
use crate::scorer::{sort_by_score, WalletScorer};
use crate::types::{WalletAnalysis, WalletMetrics};

/// Wallet activity over the whole lookback, from the activity-density source
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub total_unique_tokens: u64,
    pub total_tx_count: u64,
}

/// Read-only lookups built once per batch by external collaborators.
/// Wallets missing from a table get neutral defaults.
#[derive(Debug, Clone, Default)]
pub struct AuxiliaryData {
    pub activity: HashMap<String, ActivityCounts>,
    pub sell_behavior: HashMap<String, SellBehavior>,
    pub clusters: HashMap<String, u32>,
}

impl AuxiliaryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activity(mut self, activity: HashMap<String, ActivityCounts>) -> Self {
        self.activity = activity;
        self
    }

    pub fn with_sell_behavior(mut self, sell_behavior: HashMap<String, SellBehavior>) -> Self {
        self.sell_behavior = sell_behavior;
        self
    }

    pub fn with_clusters(mut self, clusters: HashMap<String, u32>) -> Self {
        self.clusters = clusters;
        self
    }

    /// Derive sell behavior from ledgers that include SELL rows
    pub fn sell_behavior_from_ledger(ledger: &BTreeMap<String, Vec<Trade>>) -> HashMap<String, SellBehavior> {
        ledger
            .iter()
            .map(|(wallet, trades)| (wallet.clone(), calculate_sell_behavior(trades)))
            .collect()
    }

    /// Activity counts when the ledger itself is the whole lookback
    pub fn activity_from_ledger(ledger: &BTreeMap<String, Vec<Trade>>) -> HashMap<String, ActivityCounts> {
        ledger
            .iter()
            .map(|(wallet, trades)| {
                let tokens: HashSet<&str> = trades.iter().map(|t| t.token_address.as_str()).collect();
                let counts = ActivityCounts {
                    total_unique_tokens: tokens.len() as u64,
                    total_tx_count: trades.len() as u64,
                };
                (wallet.clone(), counts)
            })
            .collect()
    }
}

/// Scores wallets against one immutable detection config
#[derive(Debug, Clone)]
pub struct WhalePipeline {
    config: DetectionConfig,
}

impl WhalePipeline {
    pub fn new(config: DetectionConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Build the merged metrics for one wallet
    pub fn collect_metrics(
        &self,
        wallet: &str,
        trades: &[Trade],
        aux: &AuxiliaryData,
        winners: Option<&HashSet<String>>,
        as_of: DateTime<Utc>,
    ) -> WalletMetrics {
        let trades = chronological(trades);

        let base = calculate_wallet_metrics(&trades, as_of);
        let early = analyze_early_buying(&trades, winners, &self.config);

        let density = aux
            .activity
            .get(wallet)
            .map(|a| calculate_activity_density(a.total_unique_tokens, early.early_hits as u64, a.total_tx_count))
            .unwrap_or_default();
        let sells = aux.sell_behavior.get(wallet).cloned().unwrap_or_default();
        let cluster_size = aux.clusters.get(wallet).copied();

        WalletMetrics::merge(wallet, base, early, density, sells, cluster_size)
    }

    /// Full analysis of one wallet
    pub fn analyze_wallet(
        &self,
        wallet: &str,
        trades: &[Trade],
        aux: &AuxiliaryData,
        winners: Option<&HashSet<String>>,
        as_of: DateTime<Utc>,
    ) -> WalletAnalysis {
        let metrics = self.collect_metrics(wallet, trades, aux, winners, as_of);
        self.evaluate(metrics)
    }

    /// Patterns and score for already merged metrics
    pub fn evaluate(&self, metrics: WalletMetrics) -> WalletAnalysis {
        let patterns = detect_patterns(&metrics, &self.config);
        let breakdown = WalletScorer::new(&self.config).breakdown(&metrics, &patterns);

        debug!(
            wallet = %metrics.wallet_address,
            score = breakdown.total_score,
            early_hits = metrics.early_hits,
            avg_buy_rank = metrics.avg_buy_rank,
            patterns = patterns.len(),
            "Wallet scored"
        );

        WalletAnalysis {
            wallet_address: metrics.wallet_address.clone(),
            whale_score: breakdown.total_score,
            tier: breakdown.tier,
            is_likely_insider: is_likely_insider(&patterns),
            patterns,
            breakdown,
            metrics,
        }
    }

    /// Analyze every wallet of a grouped ledger in parallel.
    ///
    /// Wallets without trades are skipped. Results come back highest score first.
    #[instrument(skip(self, ledger, aux, winners), fields(wallets = ledger.len()))]
    pub fn analyze_batch(
        &self,
        ledger: &BTreeMap<String, Vec<Trade>>,
        aux: &AuxiliaryData,
        winners: Option<&HashSet<String>>,
        as_of: DateTime<Utc>,
    ) -> Vec<WalletAnalysis> {
        let mut analyses: Vec<WalletAnalysis> = ledger
            .par_iter()
            .filter(|(_, trades)| !trades.is_empty())
            .map(|(wallet, trades)| self.analyze_wallet(wallet, trades, aux, winners, as_of))
            .collect();

        sort_by_score(&mut analyses);

        let watchlisted = analyses
            .iter()
            .filter(|a| a.whale_score >= self.config.whale_score_watchlist)
            .count();
        info!(
            analyzed = analyses.len(),
            watchlisted = watchlisted,
            "🐋 Batch analysis complete"
        );

        analyses
    }
}

/// Group a flat ledger by wallet, each wallet's trades in timestamp order
pub fn group_trades_by_wallet(trades: Vec<Trade>) -> BTreeMap<String, Vec<Trade>> {
    let mut ledger: BTreeMap<String, Vec<Trade>> = BTreeMap::new();
    for trade in trades {
        ledger.entry(trade.wallet.clone()).or_default().push(trade);
    }
    for trades in ledger.values_mut() {
        trades.sort_by_key(ledger_order);
    }
    ledger
}

/// Chain order of a trade: timestamp, then block, then position in the block
fn ledger_order(trade: &Trade) -> (DateTime<Utc>, u64, Option<u32>) {
    (trade.timestamp, trade.block_number, trade.tx_index)
}

/// Early-buy semantics depend on chain order; sort a copy only when needed
fn chronological(trades: &[Trade]) -> Cow<'_, [Trade]> {
    if trades.windows(2).all(|w| ledger_order(&w[0]) <= ledger_order(&w[1])) {
        Cow::Borrowed(trades)
    } else {
        let mut sorted = trades.to_vec();
        sorted.sort_by_key(ledger_order);
        Cow::Owned(sorted)
    }
}
