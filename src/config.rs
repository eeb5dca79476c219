//! Configuration loader for the `aquaflow-dashboard` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Nothing else in the crate reads `env::var` for
//! application settings.
//!
use std::{env, time::Duration};

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional duration (whole seconds) environment variable.
macro_rules! parse_env_secs {
    ($var_name:expr, $default:expr) => {
        Duration::from_secs(
            env::var($var_name)
                .ok()
                .map(|v| v.parse::<u64>())
                .transpose()
                .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
                .unwrap_or($default),
        )
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Sensor data API base URL (token and data endpoints hang off it).
    pub api_url: String,

    /// Credentials exchanged for a bearer token.
    pub api_username: String,
    pub api_password: String,

    /// Port the dashboard HTTP server binds on.
    pub port: u16,

    /// Sleep between two polling cycles.
    pub refresh_interval: Duration,

    /// Upper bound on fetch attempts within one polling cycle.
    pub fetch_max_retries: u32,

    /// Pause between two failed fetch attempts.
    pub fetch_retry_delay: Duration,

    /// Per-request HTTP timeout.
    pub fetch_timeout: Duration,

    /// Age after which the bearer token is renewed.
    pub token_ttl: Duration,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `API_URL` – Sensor data API base URL
///
/// Optional:
/// - `API_USERNAME` / `API_PASSWORD` – token credentials (default: `default_user` / `default_pass`)
/// - `PORT` – HTTP port (default: 8050)
/// - `REFRESH_INTERVAL_SECS` – polling cadence (default: 300)
/// - `FETCH_MAX_RETRIES` – attempts per cycle (default: 3)
/// - `FETCH_RETRY_DELAY_SECS` – delay between attempts (default: 5)
/// - `FETCH_TIMEOUT_SECS` – HTTP request timeout (default: 10)
/// - `TOKEN_TTL_SECS` – token lifetime (default: 3600)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_url = require_env!("API_URL");
    let api_username = env::var("API_USERNAME").unwrap_or_else(|_| "default_user".to_string());
    let api_password = env::var("API_PASSWORD").unwrap_or_else(|_| "default_pass".to_string());

    let port = parse_env_u32!("PORT", 8050);
    let port = u16::try_from(port).map_err(|_| anyhow!("Invalid PORT: {} is out of range", port))?;

    let fetch_max_retries = parse_env_u32!("FETCH_MAX_RETRIES", 3);
    if fetch_max_retries == 0 {
        return Err(anyhow!("Invalid FETCH_MAX_RETRIES: must be at least 1"));
    }

    Ok(Config {
        api_url: api_url.trim_end_matches('/').to_string(),
        api_username,
        api_password,
        port,
        refresh_interval: parse_env_secs!("REFRESH_INTERVAL_SECS", 300),
        fetch_max_retries,
        fetch_retry_delay: parse_env_secs!("FETCH_RETRY_DELAY_SECS", 5),
        fetch_timeout: parse_env_secs!("FETCH_TIMEOUT_SECS", 10),
        token_ttl: parse_env_secs!("TOKEN_TTL_SECS", 3600),
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// The API password is masked; everything else is shown as loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  API_URL                : {}", self.api_url);
        tracing::info!("  API_USERNAME           : {}", self.api_username);
        tracing::info!("  API_PASSWORD           : {}", mask(&self.api_password));
        tracing::info!("  PORT                   : {}", self.port);
        tracing::info!("  REFRESH_INTERVAL_SECS  : {}", self.refresh_interval.as_secs());
        tracing::info!("  FETCH_MAX_RETRIES      : {}", self.fetch_max_retries);
        tracing::info!("  FETCH_RETRY_DELAY_SECS : {}", self.fetch_retry_delay.as_secs());
        tracing::info!("  FETCH_TIMEOUT_SECS     : {}", self.fetch_timeout.as_secs());
        tracing::info!("  TOKEN_TTL_SECS         : {}", self.token_ttl.as_secs());
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "****"
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_mask_hides_secret() {
        // ---
        assert_eq!(mask("hunter2"), "****");
        assert_eq!(mask(""), "<empty>");
    }
}
