/// Application configuration loaded from TOML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use whale_core::DetectionConfig;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rows in the ranked wallet table
    pub max_results_display: usize,
    /// Wallets that get a full per-wallet report
    pub detailed_reports: usize,
    /// Wallets scoring below this are left out of the table
    pub min_score: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_results_display: 50,
            detailed_reports: 3,
            min_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "whale-hunter.log".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        if self.logging.directory.trim().is_empty() {
            anyhow::bail!("logging.directory must not be empty");
        }
        if self.logging.file_prefix.trim().is_empty() {
            anyhow::bail!("logging.file_prefix must not be empty");
        }
        Ok(())
    }
}
