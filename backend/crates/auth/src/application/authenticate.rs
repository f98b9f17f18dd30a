//! Authenticate Use Case
//!
//! Resolves a bearer access token into the calling [`Actor`].

use std::sync::Arc;

use kernel::actor::Actor;
use platform::clock::Clock;
use platform::kv::KeyValueStore;

use crate::application::config::AuthConfig;
use crate::application::session_store::SessionStore;
use crate::application::token::{AccessClaims, TokenIssuer};
use crate::domain::entity::Session;
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};

/// Authenticated request context
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub actor: Actor,
    pub claims: AccessClaims,
    pub session: Session,
}

pub struct AuthenticateUseCase<R, S>
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

impl<R, S> AuthenticateUseCase<R, S>
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

    pub async fn execute(&self, token: &str) -> AuthResult<AuthContext> {
        let now = self.clock.now();
        let claims = self.tokens.verify(token, now)?;

        let sessions = SessionStore::new(self.kv.clone(), self.config.session_ttl);
        if sessions.is_blacklisted(&claims.jti).await? {
            return Err(AuthError::TokenRevoked);
        }

        let session = sessions
            .get(claims.sid)
            .await?
            .filter(|s| s.user_id == claims.sub)
            .ok_or(AuthError::SessionInvalid)?;

        let user = self
            .repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if !user.can_login() {
            return Err(AuthError::AccountDisabled);
        }

        let grants = self.repo.find_effective(user.user_id, now).await?;
        let actor = user.to_actor(
            grants
                .into_iter()
                .filter(|g| g.is_effective(now))
                .map(|g| g.permission),
        );

        tracing::debug!(user_id = %actor.user_id, session_id = %session.session_id, "Authenticated");

        Ok(AuthContext {
            actor,
            claims,
            session,
        })
    }
}
