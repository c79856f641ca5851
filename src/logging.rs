//! Structured logging via `tracing`.

use anyhow::Context;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Logging section of the stash configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `info` or `vfs_stash=debug`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this again once a subscriber is
/// installed does nothing.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log level: {}", config.level))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = installed {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() -> anyhow::Result<()> {
        init_logging(&LoggingConfig::default())?;
        init_logging(&LoggingConfig {
            level: "debug".to_string(),
            json: true,
        })?;
        Ok(())
    }
}
