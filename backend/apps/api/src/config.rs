//! Server configuration
//!
//! Everything the binary reads from the environment, gathered in one place
//! before any connection is opened.

use std::net::SocketAddr;
use std::time::Duration;

use auth::AuthConfig;
use bidding::BiddingConfig;
use platform::config::{ConfigError, load_list, require, try_load, try_load_secs};
use platform::rate_limit::RateLimitConfig;

const DEFAULT_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub bind_addr: SocketAddr,
    pub database_max_connections: u32,
    pub frontend_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
    pub bidding: BiddingConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = try_load("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 31113)))?;

        let rate_limit = RateLimitConfig::new(
            try_load("RATE_LIMIT_MAX_REQUESTS", 100u32)?,
            try_load("RATE_LIMIT_WINDOW_SECS", 60u64)?,
        );

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379".to_string())?,
            bind_addr,
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", 5u32)?,
            frontend_origins: load_list("FRONTEND_ORIGINS", DEFAULT_ORIGINS),
            rate_limit,
            auth: auth_config()?,
            bidding: bidding_config()?,
        })
    }
}

/// Release builds refuse to start without a JWT secret
fn auth_config() -> Result<AuthConfig, ConfigError> {
    let base = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        AuthConfig::default()
    };

    let jwt_secret = match require("JWT_SECRET") {
        Ok(secret) if secret.len() >= 32 => secret.into_bytes(),
        Ok(_) => {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET".to_string(),
                reason: "must be at least 32 bytes".to_string(),
            });
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("JWT_SECRET not set, using a random development secret");
            base.jwt_secret.clone()
        }
        Err(e) => return Err(e),
    };

    Ok(AuthConfig {
        jwt_secret,
        password_pepper: require("PASSWORD_PEPPER").ok().map(String::into_bytes),
        access_token_ttl: try_load_secs("ACCESS_TOKEN_TTL_SECS", base.access_token_ttl.as_secs())?,
        max_login_failures: try_load("MAX_LOGIN_FAILURES", base.max_login_failures)?,
        login_lockout: try_load_secs("LOGIN_LOCKOUT_SECS", base.login_lockout.as_secs())?,
        ..base
    })
}

fn bidding_config() -> Result<BiddingConfig, ConfigError> {
    let base = if cfg!(debug_assertions) {
        BiddingConfig::development()
    } else {
        BiddingConfig::default()
    };

    Ok(BiddingConfig {
        sweep_interval: try_load_secs("SCHEDULER_INTERVAL_SECS", base.sweep_interval.as_secs())?,
        closing_reminder_lead: try_load_secs(
            "CLOSING_REMINDER_LEAD_SECS",
            base.closing_reminder_lead.as_secs(),
        )?,
        notification_retention: try_load("NOTIFICATION_RETENTION_DAYS", 30u64)
            .map(|days| Duration::from_secs(days * 24 * 3600))?,
    })
}
