//! Rate Limiting Infrastructure
//!
//! Fixed-window counters kept in the shared key-value store, so every
//! server instance sees the same budget.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::kv::{KeyValueStore, KvError};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }
}

/// Outcome of an allowed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    Exceeded { retry_after_secs: u64 },

    #[error(transparent)]
    Store(#[from] KvError),
}

impl RateLimitError {
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            RateLimitError::Exceeded { retry_after_secs } => Some(*retry_after_secs),
            RateLimitError::Store(_) => None,
        }
    }
}

/// Whole seconds, rounded up, never zero
fn retry_secs(remaining: Duration) -> u64 {
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    secs.max(1)
}

/// Key layout: `rate_limit:{route}:{caller}`
pub fn window_key(route: &str, caller: &str) -> String {
    format!("rate_limit:{route}:{caller}")
}

fn parse_count(value: Option<String>) -> u32 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

// ============================================================================
// Fixed window limiter
// ============================================================================

/// Per-key fixed-window request counter
pub struct FixedWindowLimiter<S>
where
    S: KeyValueStore,
{
    store: Arc<S>,
    config: RateLimitConfig,
}

impl<S> FixedWindowLimiter<S>
where
    S: KeyValueStore,
{
    pub fn new(store: Arc<S>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request against `key`, rejecting once the window budget is spent
    ///
    /// Admission follows the value returned by the atomic increment.
    pub async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        let count = self.store.incr(key).await?;

        // The window starts with the first counted request. A counter left
        // without a TTL (expire lost after incr) is given one here.
        let reset_after = match self.store.ttl(key).await? {
            Some(ttl) if count > 1 => ttl,
            _ => {
                self.store.expire(key, self.config.window).await?;
                self.config.window
            }
        };

        let used = u32::try_from(count).unwrap_or(u32::MAX);
        if used > self.config.max_requests {
            tracing::debug!(key, count, "Rate limit exceeded");
            return Err(RateLimitError::Exceeded {
                retry_after_secs: retry_secs(reset_after),
            });
        }

        Ok(RateLimitResult {
            limit: self.config.max_requests,
            remaining: self.config.max_requests - used,
            reset_after,
        })
    }
}

// ============================================================================
// Login failure tracking
// ============================================================================

/// Consecutive failed sign-ins per client IP
pub struct LoginAttemptLimiter<S>
where
    S: KeyValueStore,
{
    store: Arc<S>,
    max_failures: u32,
    lockout: Duration,
}

impl<S> LoginAttemptLimiter<S>
where
    S: KeyValueStore,
{
    pub fn new(store: Arc<S>, max_failures: u32, lockout: Duration) -> Self {
        Self {
            store,
            max_failures,
            lockout,
        }
    }

    fn key(ip: &str) -> String {
        format!("login_failures:{ip}")
    }

    /// Reject before credentials are even checked when the IP is locked out
    pub async fn check(&self, ip: &str) -> Result<(), RateLimitError> {
        let key = Self::key(ip);
        let failures = parse_count(self.store.get(&key).await?);
        if failures >= self.max_failures {
            let remaining = self.store.ttl(&key).await?.unwrap_or(self.lockout);
            tracing::warn!(ip, failures, "Sign-in locked out");
            return Err(RateLimitError::Exceeded {
                retry_after_secs: retry_secs(remaining),
            });
        }
        Ok(())
    }

    /// Returns the failure count; the lockout window restarts on every failure
    pub async fn record_failure(&self, ip: &str) -> Result<u32, KvError> {
        let key = Self::key(ip);
        let failures = self.store.incr(&key).await?;
        self.store.expire(&key, self.lockout).await?;
        Ok(u32::try_from(failures).unwrap_or(u32::MAX))
    }

    pub async fn clear(&self, ip: &str) -> Result<(), KvError> {
        self.store.delete(&Self::key(ip)).await?;
        Ok(())
    }
}
