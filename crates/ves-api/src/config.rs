//! # Environment Configuration
//!
//! All runtime configuration comes from `VES_*` environment variables,
//! read once at startup. Every knob except the API token has a default;
//! a missing or malformed value fails startup with a typed error rather
//! than a half-configured server.
//!
//! | Variable                      | Default                      |
//! |-------------------------------|------------------------------|
//! | `VES_BIND_ADDR`               | `0.0.0.0:8080`               |
//! | `VES_API_TOKEN`               | required                     |
//! | `VES_BASE_URL`                | `https://veristamp.example`  |
//! | `VES_CHAIN_NETWORK`           | `polygon-amoy`               |
//! | `VES_MIN_BATCH_INTERVAL_SECS` | `3600`                       |
//! | `VES_MAX_BATCH_SIZE`          | `1000`                       |
//! | `VES_ANCHOR_TIMEOUT_SECS`     | `30`                         |

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use ves_state::CoordinatorConfig;

/// Configuration problems that abort startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable {name}")]
    MissingVar {
        /// The variable's name.
        name: &'static str,
    },

    /// A variable is set but cannot be used.
    #[error("invalid value for {name}: {reason}")]
    InvalidVar {
        /// The variable's name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Startup configuration for the API process.
#[derive(Clone)]
pub struct AppConfig {
    /// Socket the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Static bearer token all authenticated routes are checked against.
    pub api_token: String,
    /// Base URL verification links in exported packages point at.
    pub base_url: String,
    /// Ledger network name the anchor target reports in receipts.
    pub chain_network: String,
    /// Minimum seconds between batch runs.
    pub min_batch_interval_secs: u64,
    /// Maximum evidence records per batch.
    pub max_batch_size: usize,
    /// Seconds the anchor call may take before the batch is failed.
    pub anchor_timeout_secs: u64,
}

/// Custom `Debug` redacts the token value to prevent credential leakage
/// in logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("api_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("chain_network", &self.chain_network)
            .field("min_batch_interval_secs", &self.min_batch_interval_secs)
            .field("max_batch_size", &self.max_batch_size)
            .field("anchor_timeout_secs", &self.anchor_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingVar` when `VES_API_TOKEN` is unset or empty,
    /// `ConfigError::InvalidVar` when a set variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = match std::env::var("VES_API_TOKEN") {
            Ok(token) if !token.trim().is_empty() => token,
            _ => {
                return Err(ConfigError::MissingVar {
                    name: "VES_API_TOKEN",
                })
            }
        };

        Ok(Self {
            bind_addr: parsed_var("VES_BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            api_token,
            base_url: string_var("VES_BASE_URL", "https://veristamp.example"),
            chain_network: string_var("VES_CHAIN_NETWORK", "polygon-amoy"),
            min_batch_interval_secs: parsed_var("VES_MIN_BATCH_INTERVAL_SECS", 3600)?,
            max_batch_size: parsed_var("VES_MAX_BATCH_SIZE", 1000)?,
            anchor_timeout_secs: parsed_var("VES_ANCHOR_TIMEOUT_SECS", 30)?,
        })
    }

    /// The coordinator knobs carried by this configuration.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            min_batch_interval_secs: self.min_batch_interval_secs,
            max_batch_size: self.max_batch_size,
            anchor_timeout_secs: self.anchor_timeout_secs,
        }
    }
}

fn string_var(name: &'static str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

fn parsed_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidVar {
            name,
            reason: format!("{e}"),
        }),
        Err(_) => Ok(default),
    }
}
