//! Session Store
//!
//! Login sessions and revoked access tokens kept in the shared key-value
//! store. A session that is missing from the store is expired or logged out.

use std::sync::Arc;
use std::time::Duration;

use kernel::id::SessionId;
use platform::kv::KeyValueStore;

use crate::domain::entity::Session;
use crate::error::{AuthError, AuthResult};

fn session_key(session_id: SessionId) -> String {
    format!("session:{session_id}")
}

fn blacklist_key(jti: &str) -> String {
    format!("blacklist:{jti}")
}

pub struct SessionStore<S>
where
    S: KeyValueStore,
{
    store: Arc<S>,
    ttl: Duration,
}

impl<S> SessionStore<S>
where
    S: KeyValueStore,
{
    pub fn new(store: Arc<S>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Store (or re-store, restarting the TTL) a session
    pub async fn create(&self, session: &Session) -> AuthResult<()> {
        let value = serde_json::to_string(session)
            .map_err(|e| AuthError::Internal(format!("Session encoding: {e}")))?;
        self.store
            .set(&session_key(session.session_id), &value, Some(self.ttl))
            .await?;
        Ok(())
    }

    pub async fn get(&self, session_id: SessionId) -> AuthResult<Option<Session>> {
        let key = session_key(session_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // Unreadable record is treated as logged out
                tracing::warn!(%session_id, error = %e, "Dropping corrupt session record");
                self.store.delete(&key).await?;
                Ok(None)
            }
        }
    }

    pub async fn destroy(&self, session_id: SessionId) -> AuthResult<bool> {
        Ok(self.store.delete(&session_key(session_id)).await?)
    }

    /// Revoke an access token for the rest of its lifetime
    pub async fn blacklist(&self, jti: &str, remaining: Duration) -> AuthResult<()> {
        if remaining.is_zero() {
            return Ok(());
        }
        self.store
            .set(&blacklist_key(jti), "1", Some(remaining))
            .await?;
        Ok(())
    }

    pub async fn is_blacklisted(&self, jti: &str) -> AuthResult<bool> {
        Ok(self.store.exists(&blacklist_key(jti)).await?)
    }
}
