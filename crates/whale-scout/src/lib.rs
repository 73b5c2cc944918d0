//! Wallet relationship analysis over on-chain transfers.
//!
//! Produces the cluster-size lookup consumed by the scoring pipeline, plus
//! funding-source tracing and coordinated-trading checks for reports.

pub mod cluster;

pub use cluster::{
    detect_common_funding_source, identify_coordinated_trading, trace_funding_source, ClusterAnalysis,
    CoordinatedTrade, WalletCluster, WalletGraph,
};
