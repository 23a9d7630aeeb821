//! Aggregator configuration
//!
//! Loaded from a TOML file with the same surface the plugin's config had:
//!
//! ```toml
//! servers = ["lobby-1", "lobby-2", "survival"]
//! update-interval = 10
//!
//! [logging]
//! enable = true
//!
//! [groups]
//! lobbies = ["lobby-1", "lobby-2"]
//! ```
//!
//! Every field is optional; a missing or empty file yields a config that
//! tracks nothing and reports zeros, which the service must tolerate.

use crate::registry::GroupMap;
use log::warn;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Refresh period used when the config does not set one.
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 10;

/// Shortest refresh period the scheduler accepts.
pub const MIN_UPDATE_INTERVAL_SECS: u64 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Full configuration surface of the aggregator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Nodes polled on every refresh, in request order.
    pub servers: Vec<String>,
    /// Refresh period in seconds. Zero is clamped to the minimum; negative
    /// values are unrepresentable and fail parsing.
    #[serde(rename = "update-interval")]
    pub update_interval: u64,
    pub logging: LoggingConfig,
    /// Group name -> member nodes.
    pub groups: GroupMap,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enable: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            update_interval: DEFAULT_UPDATE_INTERVAL_SECS,
            logging: LoggingConfig::default(),
            groups: GroupMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enable: true }
    }
}

impl AggregatorConfig {
    /// Loads and parses a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses config text, clamping out-of-range values.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config: AggregatorConfig = toml::from_str(text)?;
        if config.update_interval < MIN_UPDATE_INTERVAL_SECS {
            warn!(
                "update-interval {}s is below the minimum, clamping to {}s",
                config.update_interval, MIN_UPDATE_INTERVAL_SECS
            );
            config.update_interval = MIN_UPDATE_INTERVAL_SECS;
        }
        Ok(config)
    }

    /// Refresh period as a duration, already clamped at parse time.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.update_interval.max(MIN_UPDATE_INTERVAL_SECS))
    }
}
