//! Environment configuration helpers
//!
//! Typed reads of environment variables with logged defaults. Call
//! `dotenvy::dotenv()` before using these so `.env` values are visible.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} must be set")]
    Missing(String),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Required variable
pub fn require(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
}

/// Optional variable parsed as `T`, falling back to `default` when unset
pub fn try_load<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            tracing::warn!(key, "Invalid environment value");
            ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            }
        }),
        Err(_) => {
            tracing::info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// Seconds as a `Duration`
pub fn try_load_secs(key: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    try_load(key, default_secs).map(Duration::from_secs)
}

/// Comma-separated list with blanks dropped
pub fn load_list(key: &str, default: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
