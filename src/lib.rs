// Batch driver pieces: configuration, input loading, reports
pub mod cli;
pub mod config;
pub mod input;
pub mod report;

pub use cli::CliArgs;
pub use config::{AppConfig, LoggingConfig, ReportConfig};
