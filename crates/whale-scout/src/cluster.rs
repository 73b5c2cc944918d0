//! Wallet clustering and funding-source tracing
//!
//! Wallets that move value between each other are probably controlled by the
//! same entity. Clusters are the connected components of the transfer graph.

use chrono::{DateTime, Utc};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};
use whale_core::{Trade, TradeAction, Transfer};

/// Depth used when looking for a shared funder
const COMMON_FUNDING_DEPTH: usize = 3;

/// Connected group of wallets, addresses sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCluster {
    pub id: usize,
    pub wallets: Vec<String>,
}

impl WalletCluster {
    pub fn size(&self) -> usize {
        self.wallets.len()
    }
}

/// Structure and trading footprint of one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAnalysis {
    pub size: usize,
    pub edge_count: usize,
    pub most_connected_wallet: Option<String>,
    /// Degree of the most connected wallet over `size - 1`
    pub degree_centrality: f64,
    pub total_traded_value: f64,
}

/// Two cluster wallets making the same move on a token within the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatedTrade {
    pub token_address: String,
    pub action: TradeAction,
    pub first_wallet: String,
    pub second_wallet: String,
    pub seconds_apart: i64,
}

/// Undirected transfer graph keyed by wallet address
#[derive(Debug, Default)]
pub struct WalletGraph {
    graph: UnGraph<String, f64>,
    wallet_to_node: HashMap<String, NodeIndex>,
}

impl WalletGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph, linking wallets for every transfer with positive value
    pub fn from_transfers(transfers: &[Transfer]) -> Self {
        let mut graph = Self::new();
        for transfer in transfers {
            graph.add_transfer(transfer);
        }
        debug!(
            wallets = graph.wallet_count(),
            edges = graph.edge_count(),
            "Transfer graph built"
        );
        graph
    }

    /// Zero-value and self transfers carry no relationship and are ignored
    pub fn add_transfer(&mut self, transfer: &Transfer) {
        if transfer.value <= 0.0 || transfer.from_address == transfer.to_address {
            return;
        }
        let from = self.get_or_create_node(&transfer.from_address);
        let to = self.get_or_create_node(&transfer.to_address);
        self.graph.add_edge(from, to, transfer.value);
    }

    fn get_or_create_node(&mut self, wallet: &str) -> NodeIndex {
        if let Some(&idx) = self.wallet_to_node.get(wallet) {
            return idx;
        }
        let idx = self.graph.add_node(wallet.to_string());
        self.wallet_to_node.insert(wallet.to_string(), idx);
        idx
    }

    pub fn wallet_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, wallet: &str) -> bool {
        self.wallet_to_node.contains_key(wallet)
    }

    /// Connected components with at least `min_size` wallets.
    ///
    /// Largest cluster first; ties ordered by smallest address.
    pub fn find_clusters(&self, min_size: usize) -> Vec<WalletCluster> {
        let mut components = UnionFind::<usize>::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            components.union(edge.source().index(), edge.target().index());
        }

        let mut groups: HashMap<usize, Vec<String>> = HashMap::new();
        for idx in self.graph.node_indices() {
            groups
                .entry(components.find(idx.index()))
                .or_default()
                .push(self.graph[idx].clone());
        }

        let mut clusters: Vec<Vec<String>> = groups
            .into_values()
            .filter(|wallets| wallets.len() >= min_size.max(1))
            .map(|mut wallets| {
                wallets.sort();
                wallets
            })
            .collect();
        clusters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

        let clusters: Vec<WalletCluster> = clusters
            .into_iter()
            .enumerate()
            .map(|(id, wallets)| WalletCluster { id, wallets })
            .collect();

        info!("Found {} wallet clusters (min size {})", clusters.len(), min_size);
        clusters
    }

    /// Wallet -> size of its cluster, for every wallet in a cluster of at least `min_size`
    pub fn cluster_sizes(&self, min_size: usize) -> HashMap<String, u32> {
        self.find_clusters(min_size)
            .into_iter()
            .flat_map(|cluster| {
                let size = cluster.size() as u32;
                cluster.wallets.into_iter().map(move |wallet| (wallet, size))
            })
            .collect()
    }

    pub fn analyze_cluster(&self, cluster: &WalletCluster, trades: &[Trade]) -> ClusterAnalysis {
        let members: HashSet<&str> = cluster.wallets.iter().map(String::as_str).collect();

        let edge_count = self
            .graph
            .edge_references()
            .filter(|e| {
                members.contains(self.graph[e.source()].as_str())
                    && members.contains(self.graph[e.target()].as_str())
            })
            .count();

        // Ties go to the smallest address since members are sorted
        let mut most_connected: Option<(&str, usize)> = None;
        for wallet in &cluster.wallets {
            let Some(&idx) = self.wallet_to_node.get(wallet) else {
                continue;
            };
            let degree = self.graph.edges(idx).count();
            if most_connected.map_or(true, |(_, best)| degree > best) {
                most_connected = Some((wallet.as_str(), degree));
            }
        }

        let degree_centrality = match most_connected {
            Some((_, degree)) if cluster.size() > 1 => degree as f64 / (cluster.size() - 1) as f64,
            _ => 0.0,
        };

        let total_traded_value = trades
            .iter()
            .filter(|t| members.contains(t.wallet.as_str()))
            .map(|t| t.value)
            .sum();

        ClusterAnalysis {
            size: cluster.size(),
            edge_count,
            most_connected_wallet: most_connected.map(|(wallet, _)| wallet.to_string()),
            degree_centrality,
            total_traded_value,
        }
    }
}

/// Earliest positive incoming transfer per receiving wallet
fn first_funders(transfers: &[Transfer]) -> HashMap<&str, (&str, DateTime<Utc>)> {
    let mut funders: HashMap<&str, (&str, DateTime<Utc>)> = HashMap::new();
    for t in transfers.iter().filter(|t| t.value > 0.0 && t.from_address != t.to_address) {
        let candidate = (t.from_address.as_str(), t.timestamp);
        funders
            .entry(t.to_address.as_str())
            .and_modify(|current| {
                if (candidate.1, candidate.0) < (current.1, current.0) {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }
    funders
}

fn walk_funders(
    wallet: &str,
    funders: &HashMap<&str, (&str, DateTime<Utc>)>,
    max_depth: usize,
) -> Vec<String> {
    let mut chain = Vec::new();
    let mut visited: HashSet<&str> = HashSet::from([wallet]);
    let mut current = wallet;

    while chain.len() < max_depth {
        let Some(&(funder, _)) = funders.get(current) else {
            break;
        };
        if !visited.insert(funder) {
            break;
        }
        chain.push(funder.to_string());
        current = funder;
    }
    chain
}

/// Follow the earliest incoming transfer backwards up to `max_depth` hops.
///
/// Returns the funders nearest first, so the last element is the deepest source
/// found. The walk stops at the first wallet already on the path.
pub fn trace_funding_source(wallet: &str, transfers: &[Transfer], max_depth: usize) -> Vec<String> {
    walk_funders(wallet, &first_funders(transfers), max_depth)
}

/// A wallet appearing in the funding chain of at least half of `wallets`.
///
/// The most frequent funder wins; ties go to the smallest address.
pub fn detect_common_funding_source(wallets: &[String], transfers: &[Transfer]) -> Option<String> {
    if wallets.is_empty() {
        return None;
    }

    let funders = first_funders(transfers);
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for wallet in wallets {
        let chain: HashSet<String> = walk_funders(wallet, &funders, COMMON_FUNDING_DEPTH)
            .into_iter()
            .collect();
        for funder in chain {
            *counts.entry(funder).or_default() += 1;
        }
    }

    let mut best: Option<(String, usize)> = None;
    for (funder, count) in counts {
        if best.as_ref().map_or(true, |(_, top)| count > *top) {
            best = Some((funder, count));
        }
    }

    best.filter(|(_, count)| count * 2 >= wallets.len())
        .map(|(funder, _)| funder)
}

/// Consecutive same-token, same-direction trades by different cluster wallets
/// at most `window_secs` apart.
pub fn identify_coordinated_trading(
    wallets: &[String],
    trades: &[Trade],
    window_secs: i64,
) -> Vec<CoordinatedTrade> {
    let members: HashSet<&str> = wallets.iter().map(String::as_str).collect();

    let mut by_token: BTreeMap<&str, Vec<&Trade>> = BTreeMap::new();
    for trade in trades.iter().filter(|t| members.contains(t.wallet.as_str())) {
        by_token.entry(trade.token_address.as_str()).or_default().push(trade);
    }

    let mut coordinated = Vec::new();
    for (token, mut token_trades) in by_token {
        token_trades.sort_by_key(|t| t.timestamp);
        for pair in token_trades.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            let seconds_apart = (second.timestamp - first.timestamp).num_seconds();
            if first.wallet != second.wallet && first.action == second.action && seconds_apart <= window_secs {
                coordinated.push(CoordinatedTrade {
                    token_address: token.to_string(),
                    action: first.action,
                    first_wallet: first.wallet.clone(),
                    second_wallet: second.wallet.clone(),
                    seconds_apart,
                });
            }
        }
    }

    if !coordinated.is_empty() {
        debug!(count = coordinated.len(), "Coordinated trades found");
    }
    coordinated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn transfer(from: &str, to: &str, value: f64, minutes: i64) -> Transfer {
        Transfer {
            from_address: from.to_string(),
            to_address: to.to_string(),
            value,
            timestamp: at(minutes),
        }
    }

    fn trade(wallet: &str, token: &str, action: TradeAction, value: f64, minutes: i64) -> Trade {
        Trade {
            wallet: wallet.to_string(),
            token_address: token.to_string(),
            chain: "ethereum".to_string(),
            action,
            amount: 1.0,
            value,
            timestamp: at(minutes),
            block_number: 0,
            tx_hash: String::new(),
            tx_index: None,
            buy_rank: None,
            is_same_block_buy: false,
            seconds_after_launch: None,
            blocks_after_launch: None,
        }
    }

    fn wallets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_chain_forms_one_cluster() {
        let graph = WalletGraph::from_transfers(&[
            transfer("a", "b", 1.0, 0),
            transfer("b", "c", 1.0, 1),
            transfer("d", "c", 1.0, 2),
            transfer("e", "d", 1.0, 3),
            transfer("x", "y", 1.0, 4),
        ]);
        let clusters = graph.find_clusters(2);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].wallets, wallets(&["a", "b", "c", "d", "e"]));
        assert_eq!(clusters[1].wallets, wallets(&["x", "y"]));

        let sizes = graph.cluster_sizes(5);
        assert_eq!(sizes.len(), 5);
        assert_eq!(sizes["c"], 5);
        assert!(!sizes.contains_key("x"));
    }

    #[test]
    fn test_zero_value_and_self_transfers_ignored() {
        let graph = WalletGraph::from_transfers(&[
            transfer("a", "b", 0.0, 0),
            transfer("c", "c", 5.0, 1),
        ]);
        assert_eq!(graph.wallet_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.find_clusters(1).is_empty());
        assert!(!graph.contains("a"));
    }

    #[test]
    fn test_star_cluster_analysis() {
        let graph = WalletGraph::from_transfers(&[
            transfer("hub", "s1", 1.0, 0),
            transfer("hub", "s2", 1.0, 0),
            transfer("hub", "s3", 1.0, 0),
            transfer("s4", "hub", 1.0, 0),
        ]);
        let cluster = &graph.find_clusters(5)[0];
        let trades = vec![
            trade("s1", "T", TradeAction::Buy, 2.0, 0),
            trade("s2", "T", TradeAction::Buy, 3.5, 1),
            trade("outsider", "T", TradeAction::Buy, 100.0, 1),
        ];

        let analysis = graph.analyze_cluster(cluster, &trades);
        assert_eq!(analysis.size, 5);
        assert_eq!(analysis.edge_count, 4);
        assert_eq!(analysis.most_connected_wallet.as_deref(), Some("hub"));
        assert_eq!(analysis.degree_centrality, 1.0);
        assert_eq!(analysis.total_traded_value, 5.5);
    }

    #[test]
    fn test_trace_follows_earliest_funder() {
        let transfers = vec![
            transfer("late", "target", 1.0, 50),
            transfer("early", "target", 1.0, 10),
            transfer("root", "early", 2.0, 5),
            transfer("dust", "target", 0.0, 0),
        ];
        assert_eq!(trace_funding_source("target", &transfers, 5), wallets(&["early", "root"]));
        assert_eq!(trace_funding_source("target", &transfers, 1), wallets(&["early"]));
        assert!(trace_funding_source("root", &transfers, 5).is_empty());
    }

    #[test]
    fn test_trace_stops_on_cycle() {
        let transfers = vec![
            transfer("b", "a", 1.0, 0),
            transfer("c", "b", 1.0, 0),
            transfer("a", "c", 1.0, 0),
        ];
        assert_eq!(trace_funding_source("a", &transfers, 10), wallets(&["b", "c"]));
    }

    #[test]
    fn test_common_funding_source() {
        let transfers = vec![
            transfer("deployer", "w1", 1.0, 0),
            transfer("deployer", "w2", 1.0, 0),
            transfer("mixer", "w3", 1.0, 0),
            transfer("other", "w4", 1.0, 0),
        ];
        let group = wallets(&["w1", "w2", "w3", "w4"]);
        assert_eq!(detect_common_funding_source(&group, &transfers), Some("deployer".to_string()));

        let spread = wallets(&["w1", "w3", "w4"]);
        assert_eq!(detect_common_funding_source(&spread, &transfers), None);
        assert_eq!(detect_common_funding_source(&[], &transfers), None);
    }

    #[test]
    fn test_coordinated_trading_window() {
        let group = wallets(&["a", "b"]);
        let trades = vec![
            trade("a", "T", TradeAction::Buy, 1.0, 0),
            trade("b", "T", TradeAction::Buy, 1.0, 1),
            trade("a", "T", TradeAction::Sell, 1.0, 2),
            trade("b", "U", TradeAction::Buy, 1.0, 0),
            trade("a", "U", TradeAction::Buy, 1.0, 30),
            trade("c", "U", TradeAction::Buy, 1.0, 30),
        ];

        let coordinated = identify_coordinated_trading(&group, &trades, 120);
        assert_eq!(coordinated.len(), 1);
        assert_eq!(coordinated[0].token_address, "T");
        assert_eq!(coordinated[0].first_wallet, "a");
        assert_eq!(coordinated[0].second_wallet, "b");
        assert_eq!(coordinated[0].seconds_apart, 60);
    }
}
