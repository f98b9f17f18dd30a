//! Sign Out Use Case

use std::sync::Arc;

use platform::clock::Clock;
use platform::kv::KeyValueStore;

use crate::application::authenticate::AuthContext;
use crate::application::config::AuthConfig;
use crate::application::session_store::SessionStore;
use crate::domain::repository::AuthStore;
use crate::error::AuthResult;

pub struct SignOutUseCase<R, S>
where
    R: AuthStore,
    S: KeyValueStore,
{
    repo: Arc<R>,
    kv: Arc<S>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<R, S> SignOutUseCase<R, S>
where
    R: AuthStore,
    S: KeyValueStore,
{
    pub fn new(repo: Arc<R>, kv: Arc<S>, config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            kv,
            config,
            clock,
        }
    }

    /// Blacklists the presented token, then drops both session records
    pub async fn execute(&self, ctx: &AuthContext) -> AuthResult<()> {
        let now = self.clock.now();
        let sessions = SessionStore::new(self.kv.clone(), self.config.session_ttl);

        sessions
            .blacklist(&ctx.claims.jti, ctx.claims.remaining(now))
            .await?;
        sessions.destroy(ctx.claims.sid).await?;
        self.repo.revoke(ctx.claims.sid, now).await?;

        tracing::info!(
            user_id = %ctx.actor.user_id,
            session_id = %ctx.claims.sid,
            "User signed out"
        );
        Ok(())
    }
}
