/// Command-line arguments for the batch driver

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

pub const USAGE: &str = "Usage: whale-hunter <trades.json> [--transfers transfers.json] \
[--winners winners.json] [--config whale-hunter.toml] [--as-of 2024-06-01T00:00:00Z]";

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub trades: PathBuf,
    pub transfers: Option<PathBuf>,
    pub winners: Option<PathBuf>,
    pub config: Option<PathBuf>,
    /// Analysis clock for wallet age; defaults to now
    pub as_of: Option<DateTime<Utc>>,
}

impl CliArgs {
    /// Parse `args` without the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut trades = None;
        let mut transfers = None;
        let mut winners = None;
        let mut config = None;
        let mut as_of = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--transfers" => transfers = Some(PathBuf::from(value_for(arg, iter.next())?)),
                "--winners" => winners = Some(PathBuf::from(value_for(arg, iter.next())?)),
                "--config" => config = Some(PathBuf::from(value_for(arg, iter.next())?)),
                "--as-of" => {
                    let raw = value_for(arg, iter.next())?;
                    let parsed = DateTime::parse_from_rfc3339(raw)
                        .with_context(|| format!("Invalid --as-of timestamp: {}", raw))?;
                    as_of = Some(parsed.with_timezone(&Utc));
                }
                flag if flag.starts_with("--") => bail!("Unknown option {}\n{}", flag, USAGE),
                path => {
                    if trades.is_some() {
                        bail!("Unexpected argument {}\n{}", path, USAGE);
                    }
                    trades = Some(PathBuf::from(path));
                }
            }
        }

        let Some(trades) = trades else {
            bail!("Missing trades file\n{}", USAGE);
        };

        Ok(Self {
            trades,
            transfers,
            winners,
            config,
            as_of,
        })
    }
}

fn value_for<'a>(flag: &str, value: Option<&'a String>) -> Result<&'a str> {
    match value {
        Some(v) if !v.starts_with("--") => Ok(v.as_str()),
        _ => bail!("{} requires a value\n{}", flag, USAGE),
    }
}
