//! # Rebalance Configuration
//!
//! Construction-time parameters for the coordinator plus logging settings.
//! Defaults are overridden from `QC_*` environment variables.
//!
//! ## Requirements
//!
//! - `owner` MUST NOT be the zero address
//! - `activation_point` MUST be non-zero; it is fixed for the process lifetime

use crate::adapters::DEFAULT_CHANNEL_CAPACITY;
use crate::domain::{Address, BlockNumber};
use thiserror::Error;

pub const ENV_OWNER: &str = "QC_REBALANCE_OWNER";
pub const ENV_ACTIVATION_POINT: &str = "QC_REBALANCE_ACTIVATION_POINT";
pub const ENV_EVENT_CAPACITY: &str = "QC_REBALANCE_EVENT_CAPACITY";
pub const ENV_LOG: &str = "QC_LOG";
pub const ENV_JSON_LOGS: &str = "QC_JSON_LOGS";

/// Coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalanceConfig {
    /// Privileged identity allowed to drive registration and phases.
    pub owner: Address,
    /// Block height at which the process becomes irreversible.
    pub activation_point: BlockNumber,
    /// Broadcast buffer per event subscriber.
    pub event_channel_capacity: usize,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            owner: Address::ZERO,
            activation_point: 0,
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            log_filter: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("owner must not be the zero address; set QC_REBALANCE_OWNER")]
    MissingOwner,

    #[error("activation point must be a non-zero block height; set QC_REBALANCE_ACTIVATION_POINT")]
    MissingActivationPoint,

    #[error("event channel capacity must be at least 1")]
    ZeroEventCapacity,

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl RebalanceConfig {
    pub fn new(owner: Address, activation_point: BlockNumber) -> Self {
        Self {
            owner,
            activation_point,
            ..Self::default()
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, then validate.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_OWNER) {
            config.owner = raw.trim().parse::<Address>().map_err(|e| ConfigError::InvalidValue {
                key: ENV_OWNER,
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
        }
        if let Some(raw) = lookup(ENV_ACTIVATION_POINT) {
            config.activation_point = parse_number(ENV_ACTIVATION_POINT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_EVENT_CAPACITY) {
            config.event_channel_capacity = parse_number(ENV_EVENT_CAPACITY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOG) {
            config.log_filter = raw;
        }
        if let Some(raw) = lookup(ENV_JSON_LOGS) {
            config.json_logs = parse_flag(ENV_JSON_LOGS, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the coordinator cannot safely run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_zero() {
            return Err(ConfigError::MissingOwner);
        }
        if self.activation_point == 0 {
            return Err(ConfigError::MissingActivationPoint);
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(())
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
