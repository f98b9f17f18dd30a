//! Auth Router

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use platform::kv::KeyValueStore;

use crate::domain::repository::AuthStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_auth;

/// `/api/auth`: sign-in and refresh are public, the rest needs a token
pub fn auth_router<R, S>(state: AuthAppState<R, S>) -> Router
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    let protected = Router::new()
        .route("/signout", post(handlers::sign_out::<R, S>))
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<R, S>,
        ));

    Router::new()
        .route("/signin", post(handlers::sign_in::<R, S>))
        .route("/refresh", post(handlers::refresh::<R, S>))
        .merge(protected)
        .with_state(state)
}

/// `/api/permissions`: grant checks happen in the permission service
pub fn permission_router<R, S>(state: AuthAppState<R, S>) -> Router
where
    R: AuthStore,
    S: KeyValueStore + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/{user_id}",
            get(handlers::list_permissions::<R, S>).post(handlers::grant_permission::<R, S>),
        )
        .route(
            "/{user_id}/{permission}",
            delete(handlers::revoke_permission::<R, S>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<R, S>,
        ))
        .with_state(state)
}
