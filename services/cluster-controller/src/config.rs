//! Configuration for the cluster controller.

use anyhow::{bail, Context, Result};
use seed_id::DatacenterName;

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => bail!("unknown log format {other:?}, expected \"json\" or \"pretty\""),
        }
    }
}

/// Cluster controller configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Seed datacenter for clusters whose spec does not name one.
    pub default_datacenter: DatacenterName,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let log_level = var("SEED_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match var("SEED_LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        let default_datacenter = var("SEED_DATACENTER")
            .unwrap_or_else(|| "seed".to_string())
            .parse::<DatacenterName>()
            .context("invalid SEED_DATACENTER")?;

        Ok(Self {
            log_level,
            log_format,
            default_datacenter,
        })
    }
}
