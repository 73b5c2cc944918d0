use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// One row of a wallet's trade ledger.
///
/// `buy_rank` is the wallet's 1-based position among every buyer of the token,
/// not a per-wallet counter. Sells normally carry no rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub wallet: String,
    pub token_address: String,
    #[serde(default)]
    pub chain: String,
    pub action: TradeAction,
    #[serde(default)]
    pub amount: f64,
    /// Trade value in native currency units
    #[serde(default)]
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default)]
    pub tx_index: Option<u32>,
    #[serde(default)]
    pub buy_rank: Option<u32>,
    #[serde(default)]
    pub is_same_block_buy: bool,
    #[serde(default)]
    pub seconds_after_launch: Option<f64>,
    #[serde(default)]
    pub blocks_after_launch: Option<i64>,
}

impl Trade {
    pub fn is_buy(&self) -> bool {
        self.action == TradeAction::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.action == TradeAction::Sell
    }
}

/// Native-currency transfer between two wallets, used for cluster analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from_address: String,
    pub to_address: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}
