//! Key-value store with TTL
//!
//! Session records, the token blacklist and rate-limit counters all live in
//! a store shared by every server instance. [`RedisStore`] is the production
//! backend; [`MemoryStore`] (feature `testing`) follows an injected clock.

use std::time::Duration;

use redis::{
    Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;

pub type KvResult<T> = Result<T, KvError>;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("Key-value backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Stored value for {key} is not valid: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Key-value store operations used by sessions and rate limiting
#[trait_variant::make(KeyValueStore: Send)]
pub trait LocalKeyValueStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Set a value, replacing any previous value and TTL
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()>;

    /// Returns true if a key was removed
    async fn delete(&self, key: &str) -> KvResult<bool>;

    async fn exists(&self, key: &str) -> KvResult<bool>;

    /// Atomically increment an integer counter, creating it at 1
    async fn incr(&self, key: &str) -> KvResult<i64>;

    /// Returns false if the key does not exist
    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool>;

    /// Remaining TTL; `None` when the key is missing or has no expiry
    async fn ttl(&self, key: &str) -> KvResult<Option<Duration>>;
}

// ============================================================================
// Redis
// ============================================================================

/// Redis-backed store over a multiplexed, auto-reconnecting connection
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(redis_url: &str) -> KvResult<Self> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(3)
            .set_connection_timeout(Duration::from_secs(2));

        let client = Client::open(redis_url)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        tracing::info!("Connected to key-value store");

        Ok(Self::new(conn))
    }
}

fn millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(millis(ttl));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> KvResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        let mut conn = self.conn.clone();
        let count: i64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(count > 0)
    }

    async fn incr(&self, key: &str) -> KvResult<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = redis::cmd("INCR").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool> {
        let mut conn = self.conn.clone();
        let applied: i64 = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(millis(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(applied == 1)
    }

    async fn ttl(&self, key: &str) -> KvResult<Option<Duration>> {
        let mut conn = self.conn.clone();
        // -2: missing, -1: no expiry
        let remaining: i64 = redis::cmd("PTTL").arg(key).query_async(&mut conn).await?;
        Ok(u64::try_from(remaining).ok().map(Duration::from_millis))
    }
}

// ============================================================================
// In-memory (tests)
// ============================================================================

#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryStore;

#[cfg(any(test, feature = "testing"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;

    use chrono::{DateTime, Utc};

    use super::{KeyValueStore, KvError, KvResult};
    use crate::clock::Clock;

    struct Entry {
        value: String,
        expires_at: Option<DateTime<Utc>>,
    }

    /// Process-local store whose expiry follows the injected clock
    pub struct MemoryStore {
        clock: Arc<dyn Clock>,
        entries: Mutex<HashMap<String, Entry>>,
    }

    impl MemoryStore {
        pub fn new(clock: Arc<dyn Clock>) -> Self {
            Self {
                clock,
                entries: Mutex::new(HashMap::new()),
            }
        }

        fn with_live<R>(&self, f: impl FnOnce(&mut HashMap<String, Entry>) -> R) -> R {
            let now = self.clock.now();
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.retain(|_, e| e.expires_at.is_none_or(|at| at > now));
            f(&mut entries)
        }

        fn deadline(&self, ttl: Duration) -> DateTime<Utc> {
            let now = self.clock.now();
            chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| now.checked_add_signed(ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        }
    }

    impl KeyValueStore for MemoryStore {
        async fn get(&self, key: &str) -> KvResult<Option<String>> {
            Ok(self.with_live(|m| m.get(key).map(|e| e.value.clone())))
        }

        async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
            let expires_at = ttl.map(|t| self.deadline(t));
            self.with_live(|m| {
                m.insert(
                    key.to_string(),
                    Entry {
                        value: value.to_string(),
                        expires_at,
                    },
                );
            });
            Ok(())
        }

        async fn delete(&self, key: &str) -> KvResult<bool> {
            Ok(self.with_live(|m| m.remove(key).is_some()))
        }

        async fn exists(&self, key: &str) -> KvResult<bool> {
            Ok(self.with_live(|m| m.contains_key(key)))
        }

        async fn incr(&self, key: &str) -> KvResult<i64> {
            self.with_live(|m| {
                let entry = m.entry(key.to_string()).or_insert(Entry {
                    value: "0".to_string(),
                    expires_at: None,
                });
                let current: i64 = entry.value.parse().map_err(|_| KvError::Corrupt {
                    key: key.to_string(),
                    reason: "not an integer".to_string(),
                })?;
                entry.value = (current + 1).to_string();
                Ok(current + 1)
            })
        }

        async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool> {
            let deadline = self.deadline(ttl);
            Ok(self.with_live(|m| match m.get_mut(key) {
                Some(entry) => {
                    entry.expires_at = Some(deadline);
                    true
                }
                None => false,
            }))
        }

        async fn ttl(&self, key: &str) -> KvResult<Option<Duration>> {
            let now = self.clock.now();
            Ok(self.with_live(|m| {
                m.get(key)
                    .and_then(|e| e.expires_at)
                    .and_then(|at| (at - now).to_std().ok())
            }))
        }
    }
}
