//! Tracing subscriber setup.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Builds the filter for `level`.
///
/// `level` is any `EnvFilter` directive string, e.g. `info` or
/// `info,tessera_protocol=debug`. [`Config::validate`](crate::Config::validate)
/// applies a stricter check to configured values.
pub fn filter_for(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("Invalid log filter: {}", level))
}

/// Installs the global fmt subscriber.
///
/// Fails if the filter is invalid or a subscriber is already installed.
pub fn init(level: &str) -> Result<()> {
    let filter = filter_for(level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("Logging initialized at {}", level);
    Ok(())
}
