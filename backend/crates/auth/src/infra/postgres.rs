//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::actor::{Permission, Role};
use kernel::id::{SessionId, UserId};
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{PermissionGrant, User, UserSession};
use crate::domain::repository::{PermissionRepository, UserRepository, UserSessionRepository};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = r#"
    user_id,
    email,
    password_hash,
    role,
    public_entity_id,
    supplier_id,
    is_active,
    last_login_at,
    created_at,
    updated_at
"#;

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE user_id = $1")
            .bind(user_id.into_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// User Session Repository Implementation
// ============================================================================

impl UserSessionRepository for PgAuthRepository {
    async fn create(&self, session: &UserSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions (
                session_id,
                user_id,
                refresh_token_hash,
                expires_at,
                revoked_at,
                ip_address,
                user_agent,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.session_id.into_uuid())
        .bind(session.user_id.into_uuid())
        .bind(&session.refresh_token_hash)
        .bind(session.expires_at)
        .bind(session.revoked_at)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_active_by_refresh_hash(
        &self,
        refresh_token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<UserSession>> {
        let row = sqlx::query_as::<_, UserSessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                refresh_token_hash,
                expires_at,
                revoked_at,
                ip_address,
                user_agent,
                created_at
            FROM user_sessions
            WHERE refresh_token_hash = $1
              AND revoked_at IS NULL
              AND expires_at > $2
            "#,
        )
        .bind(refresh_token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserSessionRow::into_session))
    }

    async fn rotate_refresh(
        &self,
        session_id: SessionId,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE user_sessions
            SET refresh_token_hash = $2, expires_at = $3
            WHERE session_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(session_id.into_uuid())
        .bind(refresh_token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        // Revoked concurrently
        if result.rows_affected() == 0 {
            return Err(AuthError::SessionInvalid);
        }
        Ok(())
    }

    async fn revoke(&self, session_id: SessionId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query(
            "UPDATE user_sessions SET revoked_at = $2 WHERE session_id = $1 AND revoked_at IS NULL",
        )
        .bind(session_id.into_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query(
            "DELETE FROM user_sessions WHERE expires_at < $1 OR revoked_at < $1 - INTERVAL '1 day'",
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired user sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Permission Repository Implementation
// ============================================================================

impl PermissionRepository for PgAuthRepository {
    async fn find_effective(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AuthResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, PermissionGrantRow>(
            r#"
            SELECT user_id, permission, is_active, expires_at, granted_by, granted_at
            FROM permission_grants
            WHERE user_id = $1
              AND is_active
              AND (expires_at IS NULL OR expires_at > $2)
            "#,
        )
        .bind(user_id.into_uuid())
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PermissionGrantRow::into_grant).collect()
    }

    async fn find_all(&self, user_id: UserId) -> AuthResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, PermissionGrantRow>(
            r#"
            SELECT user_id, permission, is_active, expires_at, granted_by, granted_at
            FROM permission_grants
            WHERE user_id = $1
            ORDER BY permission
            "#,
        )
        .bind(user_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PermissionGrantRow::into_grant).collect()
    }

    async fn upsert(&self, grant: &PermissionGrant) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_grants (
                user_id, permission, is_active, expires_at, granted_by, granted_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, permission) DO UPDATE SET
                is_active = EXCLUDED.is_active,
                expires_at = EXCLUDED.expires_at,
                granted_by = EXCLUDED.granted_by,
                granted_at = EXCLUDED.granted_at
            "#,
        )
        .bind(grant.user_id.into_uuid())
        .bind(grant.permission.code())
        .bind(grant.is_active)
        .bind(grant.expires_at)
        .bind(grant.granted_by.map(UserId::into_uuid))
        .bind(grant.granted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deactivate(&self, user_id: UserId, permission: Permission) -> AuthResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE permission_grants
            SET is_active = FALSE
            WHERE user_id = $1 AND permission = $2 AND is_active
            "#,
        )
        .bind(user_id.into_uuid())
        .bind(permission.code())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    public_entity_id: Option<Uuid>,
    supplier_id: Option<Uuid>,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = Role::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Unknown role: {}", self.role)))?;

        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(User {
            user_id: UserId::from(self.user_id),
            email: self.email,
            password_hash,
            role,
            public_entity_id: self.public_entity_id.map(Into::into),
            supplier_id: self.supplier_id.map(Into::into),
            is_active: self.is_active,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    refresh_token_hash: String,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserSessionRow {
    fn into_session(self) -> UserSession {
        UserSession {
            session_id: self.session_id.into(),
            user_id: self.user_id.into(),
            refresh_token_hash: self.refresh_token_hash,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PermissionGrantRow {
    user_id: Uuid,
    permission: String,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    granted_by: Option<Uuid>,
    granted_at: DateTime<Utc>,
}

impl PermissionGrantRow {
    fn into_grant(self) -> AuthResult<PermissionGrant> {
        let permission = Permission::from_code(&self.permission).ok_or_else(|| {
            AuthError::Internal(format!("Unknown permission: {}", self.permission))
        })?;

        Ok(PermissionGrant {
            user_id: self.user_id.into(),
            permission,
            is_active: self.is_active,
            expires_at: self.expires_at,
            granted_by: self.granted_by.map(Into::into),
            granted_at: self.granted_at,
        })
    }
}
