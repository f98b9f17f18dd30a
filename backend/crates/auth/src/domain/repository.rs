//! Repository Traits
//!
//! Interfaces for durable persistence. Implementation is in infrastructure layer.
//! Ephemeral session records live in the key-value store instead
//! (see `application::session_store`).

use chrono::{DateTime, Utc};
use kernel::actor::Permission;
use kernel::id::{SessionId, UserId};

use crate::domain::entity::{PermissionGrant, User, UserSession};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// `email` is already normalized
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> AuthResult<()>;
}

/// Durable session mirror used for refresh-token validation
#[trait_variant::make(UserSessionRepository: Send)]
pub trait LocalUserSessionRepository {
    async fn create(&self, session: &UserSession) -> AuthResult<()>;

    /// Non-revoked, unexpired session holding this refresh token hash
    async fn find_active_by_refresh_hash(
        &self,
        refresh_token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<UserSession>>;

    /// Replace the refresh token hash (rotation)
    async fn rotate_refresh(
        &self,
        session_id: SessionId,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()>;

    async fn revoke(&self, session_id: SessionId, at: DateTime<Utc>) -> AuthResult<()>;

    /// Delete expired or long-revoked rows
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Permission grant store, shared by every server instance
#[trait_variant::make(PermissionRepository: Send)]
pub trait LocalPermissionRepository {
    /// Grants that are active and unexpired at `now`
    async fn find_effective(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AuthResult<Vec<PermissionGrant>>;

    /// Every grant, including revoked and expired ones
    async fn find_all(&self, user_id: UserId) -> AuthResult<Vec<PermissionGrant>>;

    /// Insert, or reactivate and replace the expiry of an existing grant
    async fn upsert(&self, grant: &PermissionGrant) -> AuthResult<()>;

    /// Logical delete; returns false when no active grant existed
    async fn deactivate(&self, user_id: UserId, permission: Permission) -> AuthResult<bool>;
}

/// Everything the auth use cases persist through
pub trait AuthStore:
    UserRepository + UserSessionRepository + PermissionRepository + Send + Sync + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository + UserSessionRepository + PermissionRepository + Send + Sync + 'static
{
}
