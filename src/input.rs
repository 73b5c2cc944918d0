/// JSON input files for a batch run

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};
use whale_core::{Trade, Transfer};

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Flat trade ledger: a JSON array of trades across any number of wallets
pub async fn load_trades(path: &Path) -> Result<Vec<Trade>> {
    let trades: Vec<Trade> = read_json(path).await?;
    info!("📥 Loaded {} trades from {}", trades.len(), path.display());
    Ok(trades)
}

pub async fn load_transfers(path: &Path) -> Result<Vec<Transfer>> {
    let transfers: Vec<Transfer> = read_json(path).await?;
    info!("📥 Loaded {} transfers from {}", transfers.len(), path.display());
    Ok(transfers)
}

/// Confirmed winning token addresses, a JSON array of strings
pub async fn load_winners(path: &Path) -> Result<HashSet<String>> {
    let winners: Vec<String> = read_json(path).await?;
    if winners.is_empty() {
        warn!("⚠️ Winners file {} is empty, early hits will not be restricted", path.display());
    } else {
        info!("🏆 Loaded {} winning tokens from {}", winners.len(), path.display());
    }
    Ok(winners.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use whale_core::TradeAction;

    fn json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_trades_with_optional_fields() {
        let file = json_file(
            r#"[
                {
                    "wallet": "0xabc",
                    "token_address": "0xtoken",
                    "action": "BUY",
                    "amount": 1000.0,
                    "value": 0.5,
                    "timestamp": "2024-05-01T12:00:00Z",
                    "block_number": 19000000,
                    "buy_rank": 7,
                    "is_same_block_buy": true
                },
                {
                    "wallet": "0xabc",
                    "token_address": "0xtoken",
                    "action": "SELL",
                    "timestamp": "2024-05-02T12:00:00Z"
                }
            ]"#,
        );

        let trades = load_trades(file.path()).await.unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].buy_rank, Some(7));
        assert!(trades[0].is_same_block_buy);
        assert_eq!(trades[1].action, TradeAction::Sell);
        assert_eq!(trades[1].buy_rank, None);
        assert_eq!(trades[1].amount, 0.0);
    }

    #[tokio::test]
    async fn test_load_transfers_and_winners() {
        let transfers = json_file(
            r#"[{ "from_address": "a", "to_address": "b", "value": 1.5, "timestamp": "2024-05-01T00:00:00Z" }]"#,
        );
        let winners = json_file(r#"["0xone", "0xtwo", "0xone"]"#);

        assert_eq!(load_transfers(transfers.path()).await.unwrap()[0].value, 1.5);
        let winners = load_winners(winners.path()).await.unwrap();
        assert_eq!(winners.len(), 2);
        assert!(winners.contains("0xtwo"));
    }

    #[tokio::test]
    async fn test_empty_winners_file_loads_empty_set() {
        let file = json_file("[]");
        assert!(load_winners(file.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_input_names_the_file() {
        let file = json_file(r#"[{ "wallet": "0xabc" }]"#);
        let err = load_trades(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));

        let missing = load_trades(Path::new("/nonexistent/trades.json")).await.unwrap_err();
        assert!(missing.to_string().contains("Failed to read"));
    }
}
