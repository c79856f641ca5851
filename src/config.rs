//! Stash configuration, read from TOML.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::logging::LoggingConfig;

/// Top-level configuration. Every section and key is optional.
///
/// ```toml
/// [watch]
/// poll_interval_ms = 500
///
/// [logging]
/// level = "debug"
/// json = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    pub watch: WatchConfig,
    pub logging: LoggingConfig,
}

/// How stash sources are watched on the host.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll sources at this interval instead of using native OS notifications.
    /// Useful on network file systems where native events are not delivered.
    pub poll_interval_ms: Option<u64>,
}

impl StashConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid stash configuration")
    }

    /// Loads the configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }
}
