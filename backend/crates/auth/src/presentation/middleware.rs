//! Auth Middleware
//!
//! Resolves the bearer token on protected routes and places the [`Actor`]
//! and [`AuthContext`] in request extensions for handlers and route layers.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use kernel::actor::Actor;
use platform::client::extract_bearer_token;
use platform::kv::KeyValueStore;

use crate::application::AuthContext;
use crate::domain::repository::AuthStore;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Middleware that requires a valid access token
pub async fn require_auth<R, S>(
    State(state): State<AuthAppState<R, S>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    let token = extract_bearer_token(req.headers())
        .ok_or(AuthError::SessionInvalid)?
        .to_string();

    let ctx: AuthContext = state.authenticator().execute(&token).await?;

    req.extensions_mut().insert::<Actor>(ctx.actor.clone());
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// Like [`require_auth`], but lets anonymous requests through. A token that
/// is present and invalid is still rejected.
pub async fn optional_auth<R, S>(
    State(state): State<AuthAppState<R, S>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    let Some(token) = extract_bearer_token(req.headers()).map(str::to_string) else {
        return Ok(next.run(req).await);
    };

    let ctx: AuthContext = state.authenticator().execute(&token).await?;

    req.extensions_mut().insert::<Actor>(ctx.actor.clone());
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
