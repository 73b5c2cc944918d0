pub mod config;
pub mod error;
pub mod types;

pub use config::DetectionConfig;
pub use error::CoreError;
pub use types::{Trade, TradeAction, Transfer};
