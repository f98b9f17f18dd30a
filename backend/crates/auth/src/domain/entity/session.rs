//! Session Entities
//!
//! [`Session`] is the ephemeral login record kept in the key-value store with
//! a TTL. [`UserSession`] is its durable mirror holding the refresh token hash.

use chrono::{DateTime, Utc};
use kernel::actor::Role;
use kernel::id::{SessionId, UserId};
use platform::client::ClientInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub role: Role,
    pub login_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Session {
    pub fn new(user_id: UserId, role: Role, now: DateTime<Utc>, client: &ClientInfo) -> Self {
        Self {
            session_id: SessionId::new(),
            user_id,
            role,
            login_at: now,
            ip_address: client.ip.map(|ip| ip.to_string()),
            user_agent: client.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// SHA-256 hex of the refresh token; the token itself is never stored
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserSession {
    pub fn mirror(
        session: &Session,
        refresh_token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session.session_id,
            user_id: session.user_id,
            refresh_token_hash,
            expires_at,
            revoked_at: None,
            ip_address: session.ip_address.clone(),
            user_agent: session.user_agent.clone(),
            created_at: session.login_at,
        }
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}
