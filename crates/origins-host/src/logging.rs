//! Tracing subscriber setup for processes embedding the host.

use tracing_subscriber::EnvFilter;

use crate::config::HostConfig;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise [`HostConfig::log_filter`] is used.
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &HostConfig) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {e}", config.log_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
