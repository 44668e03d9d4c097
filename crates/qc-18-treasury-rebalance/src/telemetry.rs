//! Structured logging setup.
//!
//! Installs a global `tracing-subscriber` fmt subscriber. The filter comes
//! from `RUST_LOG` when set, otherwise from `RebalanceConfig::log_filter`.
//! JSON output carries the same fields for log shippers.

use crate::config::RebalanceConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Telemetry initialisation errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Build the env filter for `config`.
pub fn build_filter(config: &RebalanceConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &RebalanceConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let result = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        json = config.json_logs,
        filter = %config.log_filter,
        "[qc-18] telemetry initialised"
    );
    Ok(())
}
