//! Wallet scoring and pattern detection.
//!
//! Turns a wallet's trade ledger plus auxiliary signals into merged metrics,
//! suspicious-pattern flags and a bounded whale score. Every stage is a pure
//! function of its inputs.

pub mod early_buyer;
pub mod metrics;
pub mod patterns;
pub mod pipeline;
pub mod scorer;
pub mod types;

pub use early_buyer::{analyze_early_buying, identify_sniping_behavior, EarlyBuyMetrics, SnipingAssessment};
pub use metrics::{calculate_activity_density, calculate_wallet_metrics, ActivityDensity, SellBehavior};
pub use patterns::{detect_patterns, is_likely_insider};
pub use pipeline::{group_trades_by_wallet, ActivityCounts, AuxiliaryData, WhalePipeline};
pub use scorer::{rank_wallets, sort_by_score, WalletScorer};
pub use types::*;
