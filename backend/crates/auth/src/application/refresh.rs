//! Refresh Use Case
//!
//! Exchanges a refresh token for a new access token. The refresh token is
//! rotated on every use and the session TTL restarts.

use std::sync::Arc;

use platform::clock::Clock;
use platform::crypto::{random_token, sha256_hex};
use platform::kv::KeyValueStore;

use crate::application::config::AuthConfig;
use crate::application::session_store::SessionStore;
use crate::application::token::TokenIssuer;
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};

pub struct RefreshOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

pub struct RefreshUseCase<R, S>
where
    R: AuthStore,
    S: KeyValueStore,
{
    repo: Arc<R>,
    kv: Arc<S>,
    tokens: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<R, S> RefreshUseCase<R, S>
where
    R: AuthStore,
    S: KeyValueStore,
{
    pub fn new(
        repo: Arc<R>,
        kv: Arc<S>,
        tokens: Arc<TokenIssuer>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            kv,
            tokens,
            config,
            clock,
        }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<RefreshOutput> {
        let now = self.clock.now();
        let hash = sha256_hex(refresh_token.as_bytes());

        let durable = self
            .repo
            .find_active_by_refresh_hash(&hash, now)
            .await?
            .filter(|s| s.is_usable(now))
            .ok_or(AuthError::SessionInvalid)?;

        let sessions = SessionStore::new(self.kv.clone(), self.config.session_ttl);
        let Some(session) = sessions.get(durable.session_id).await? else {
            // Logged out or expired in the store: the durable row is stale
            self.repo.revoke(durable.session_id, now).await?;
            return Err(AuthError::SessionInvalid);
        };

        let user = self
            .repo
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;
        if !user.can_login() {
            return Err(AuthError::AccountDisabled);
        }

        let next_refresh = random_token(32);
        let refresh_ttl = chrono::Duration::from_std(self.config.refresh_token_ttl)
            .map_err(|_| AuthError::Internal("Refresh token TTL out of range".to_string()))?;
        self.repo
            .rotate_refresh(
                durable.session_id,
                &sha256_hex(next_refresh.as_bytes()),
                now + refresh_ttl,
            )
            .await?;
        sessions.create(&session).await?;

        let (access_token, _claims) = self.tokens.issue(&session, now)?;

        tracing::info!(session_id = %session.session_id, "Session refreshed");

        Ok(RefreshOutput {
            access_token,
            refresh_token: next_refresh,
            expires_in: self.tokens.ttl().as_secs(),
        })
    }
}
