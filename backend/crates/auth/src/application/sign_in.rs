//! Sign In Use Case
//!
//! Verifies credentials and opens a session: an ephemeral record in the
//! key-value store, its durable mirror holding the refresh token hash, and a
//! short-lived access token.

use std::sync::Arc;

use kernel::actor::Actor;
use platform::client::ClientInfo;
use platform::clock::Clock;
use platform::crypto::{random_token, sha256_hex};
use platform::kv::KeyValueStore;
use platform::password::ClearTextPassword;
use platform::rate_limit::LoginAttemptLimiter;

use crate::application::config::AuthConfig;
use crate::application::session_store::SessionStore;
use crate::application::token::TokenIssuer;
use crate::domain::entity::user::normalize_email;
use crate::domain::entity::{Session, User, UserSession};
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};

pub struct SignInInput {
    pub email: String,
    pub password: String,
}

pub struct SignInOutput {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    pub session: Session,
    pub actor: Actor,
}

pub struct SignInUseCase<R, S>
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

impl<R, S> SignInUseCase<R, S>
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

    pub async fn execute(&self, input: SignInInput, client: ClientInfo) -> AuthResult<SignInOutput> {
        let ip = client.ip_or_unknown();
        let limiter = LoginAttemptLimiter::new(
            self.kv.clone(),
            self.config.max_login_failures,
            self.config.login_lockout,
        );
        limiter.check(&ip).await?;

        let email = normalize_email(&input.email);
        let password = ClearTextPassword::for_verification(input.password);

        let user = match self.repo.find_by_email(&email).await? {
            Some(user) => self.verify_password(user, password).await?,
            None => None,
        };

        let Some(user) = user else {
            let failures = limiter.record_failure(&ip).await?;
            tracing::warn!(%ip, failures, "Sign-in failed");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.can_login() {
            return Err(AuthError::AccountDisabled);
        }

        limiter.clear(&ip).await?;

        let now = self.clock.now();
        let session = Session::new(user.user_id, user.role, now, &client);
        SessionStore::new(self.kv.clone(), self.config.session_ttl)
            .create(&session)
            .await?;

        let refresh_token = random_token(32);
        let refresh_ttl = chrono::Duration::from_std(self.config.refresh_token_ttl)
            .map_err(|_| AuthError::Internal("Refresh token TTL out of range".to_string()))?;
        let durable = UserSession::mirror(
            &session,
            sha256_hex(refresh_token.as_bytes()),
            now + refresh_ttl,
        );
        self.repo.create(&durable).await?;

        let grants = self.repo.find_effective(user.user_id, now).await?;
        let actor = user.to_actor(grants.into_iter().map(|g| g.permission));

        let (access_token, _claims) = self.tokens.issue(&session, now)?;
        self.repo.record_login(user.user_id, now).await?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            role = user.role.code(),
            "User signed in"
        );

        Ok(SignInOutput {
            access_token,
            refresh_token,
            expires_in: self.tokens.ttl().as_secs(),
            session,
            actor,
        })
    }

    /// Argon2 runs off the async workers
    async fn verify_password(&self, user: User, password: ClearTextPassword) -> AuthResult<Option<User>> {
        let pepper = self.config.password_pepper.clone();
        let hash = user.password_hash.clone();

        let valid = tokio::task::spawn_blocking(move || hash.verify(&password, pepper.as_deref()))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {e}")))?;

        Ok(valid.then_some(user))
    }
}
