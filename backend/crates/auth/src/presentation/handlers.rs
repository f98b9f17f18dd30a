//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::actor::{Actor, Permission};
use kernel::id::UserId;
use platform::client::ClientInfo;
use platform::clock::Clock;
use platform::kv::KeyValueStore;
use std::sync::Arc;

use crate::application::{
    AuthConfig, AuthContext, AuthenticateUseCase, GrantInput, PermissionService, RefreshUseCase,
    SignInInput, SignInUseCase, SignOutUseCase, TokenIssuer,
};
use crate::domain::repository::AuthStore;
use crate::error::AuthResult;
use crate::presentation::dto::{
    GrantPermissionRequest, MeResponse, PermissionGrantResponse, RefreshRequest, SignInRequest,
    TokenResponse,
};

/// Shared state for auth handlers and the authentication middleware
pub struct AuthAppState<R, S>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub kv: Arc<S>,
    pub tokens: Arc<TokenIssuer>,
    pub config: Arc<AuthConfig>,
    pub clock: Arc<dyn Clock>,
}

impl<R, S> AuthAppState<R, S>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, kv: Arc<S>, config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let tokens = Arc::new(TokenIssuer::new(&config.jwt_secret, config.access_token_ttl));
        Self {
            repo,
            kv,
            tokens,
            config: Arc::new(config),
            clock,
        }
    }

    pub fn authenticator(&self) -> AuthenticateUseCase<R, S> {
        AuthenticateUseCase::new(
            self.repo.clone(),
            self.kv.clone(),
            self.tokens.clone(),
            self.config.clone(),
            self.clock.clone(),
        )
    }

    pub fn permissions(&self) -> PermissionService<R> {
        PermissionService::new(self.repo.clone(), self.clock.clone())
    }
}

impl<R, S> Clone for AuthAppState<R, S>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            kv: self.kv.clone(),
            tokens: self.tokens.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<R, S>(
    State(state): State<AuthAppState<R, S>>,
    client: ClientInfo,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Json<TokenResponse>>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.kv.clone(),
        state.tokens.clone(),
        state.config.clone(),
        state.clock.clone(),
    );

    let input = SignInInput {
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input, client).await?;

    let mut response =
        TokenResponse::bearer(output.access_token, output.refresh_token, output.expires_in);
    response.user = Some(MeResponse::from(&output.actor));

    Ok(Json(response))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh<R, S>(
    State(state): State<AuthAppState<R, S>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<TokenResponse>>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    let use_case = RefreshUseCase::new(
        state.repo.clone(),
        state.kv.clone(),
        state.tokens.clone(),
        state.config.clone(),
        state.clock.clone(),
    );

    let output = use_case.execute(&req.refresh_token).await?;

    Ok(Json(TokenResponse::bearer(
        output.access_token,
        output.refresh_token,
        output.expires_in,
    )))
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<R, S>(
    State(state): State<AuthAppState<R, S>>,
    Extension(ctx): Extension<AuthContext>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    let use_case = SignOutUseCase::new(
        state.repo.clone(),
        state.kv.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    use_case.execute(&ctx).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Current caller
// ============================================================================

/// GET /api/auth/me
pub async fn me(actor: Actor) -> Json<MeResponse> {
    Json(MeResponse::from(&actor))
}

// ============================================================================
// Permissions
// ============================================================================

/// GET /api/permissions/{user_id}
pub async fn list_permissions<R, S>(
    State(state): State<AuthAppState<R, S>>,
    actor: Actor,
    Path(user_id): Path<UserId>,
) -> AuthResult<Json<Vec<PermissionGrantResponse>>>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    let grants = state.permissions().list(&actor, user_id).await?;
    Ok(Json(grants.into_iter().map(Into::into).collect()))
}

/// POST /api/permissions/{user_id}
pub async fn grant_permission<R, S>(
    State(state): State<AuthAppState<R, S>>,
    actor: Actor,
    Path(user_id): Path<UserId>,
    Json(req): Json<GrantPermissionRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    let grant = state
        .permissions()
        .grant(
            &actor,
            GrantInput {
                user_id,
                permission: req.permission,
                expires_at: req.expires_at,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionGrantResponse::from(grant))))
}

/// DELETE /api/permissions/{user_id}/{permission}
pub async fn revoke_permission<R, S>(
    State(state): State<AuthAppState<R, S>>,
    actor: Actor,
    Path((user_id, permission)): Path<(UserId, Permission)>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    state.permissions().revoke(&actor, user_id, permission).await?;
    Ok(StatusCode::NO_CONTENT)
}
