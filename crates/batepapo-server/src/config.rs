//! Server configuration loaded from environment variables.
//!
//! The store location and the HTTP port are required; the process refuses
//! to start without them. Timing knobs fall back to defaults.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use batepapo_shared::constants::{
    DEFAULT_STALE_AFTER_SECS, DEFAULT_STORE_TIMEOUT_MS, DEFAULT_SWEEP_INTERVAL_SECS,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the SQLite store.
    /// Env: `STORE_URL` (required)
    pub store_url: PathBuf,

    /// Database name; the file is `<store_url>/<store_name>.db`.
    /// Env: `STORE_NAME` (required)
    pub store_name: String,

    /// Socket address for the HTTP API.
    /// Env: `HTTP_HOST` (default `0.0.0.0`) and `PORT` (required)
    pub http_addr: SocketAddr,

    /// Period between presence sweeps.
    /// Env: `SWEEP_INTERVAL_SECS`
    /// Default: 15s
    pub sweep_interval: Duration,

    /// Heartbeat gap after which a participant is evicted.
    /// Env: `STALE_AFTER_SECS`
    /// Default: 10s
    pub stale_after: Duration,

    /// Upper bound on a single store operation.
    /// Env: `STORE_TIMEOUT_MS`
    /// Default: 5000ms
    pub store_timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let store_url = PathBuf::from(required("STORE_URL")?);
        let store_name = required("STORE_NAME")?;

        let port_raw = required("PORT")?;
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: port_raw.clone(),
            })?;

        let host = match lookup("HTTP_HOST") {
            Some(raw) => raw.trim().parse::<IpAddr>().map_err(|_| ConfigError::Invalid {
                var: "HTTP_HOST",
                value: raw,
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let sweep_interval = Duration::from_secs(optional_u64(
            &lookup,
            "SWEEP_INTERVAL_SECS",
            DEFAULT_SWEEP_INTERVAL_SECS,
        ));
        let stale_after = Duration::from_secs(optional_u64(
            &lookup,
            "STALE_AFTER_SECS",
            DEFAULT_STALE_AFTER_SECS,
        ));
        let store_timeout = Duration::from_millis(optional_u64(
            &lookup,
            "STORE_TIMEOUT_MS",
            DEFAULT_STORE_TIMEOUT_MS,
        ));

        Ok(Self {
            store_url,
            store_name,
            http_addr: SocketAddr::new(host, port),
            sweep_interval,
            stale_after,
            store_timeout,
        })
    }
}

/// Read a positive integer, keeping `default` when unset or unparsable.
fn optional_u64<F>(lookup: &F, var: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => n,
        _ => {
            tracing::warn!(var, value = %raw, default, "Invalid value, using default");
            default
        }
    }
}
