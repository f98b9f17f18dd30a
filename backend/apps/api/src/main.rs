//! API Server Entry Point
//!
//! Builds every dependency once, wires the routers and starts the scheduler.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;
mod decorate;
mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;

use auth::{AuthAppState, PgAuthRepository, auth_router, optional_auth, permission_router};
use auth::domain::repository::UserSessionRepository;
use axum::{
    Json, Router, http,
    http::{Method, header},
    middleware,
    routing::get,
};
use bidding::{
    BiddingAppState, PgBiddingRepository, PgNotifier, Scheduler, bidding_router, contract_router,
    proposal_router,
};
use platform::clock::{Clock, SystemClock};
use platform::kv::RedisStore;
use platform::rate_limit::FixedWindowLimiter;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::decorate::{ResponsePipeline, decorate};
use crate::rate_limit::rate_limit;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

type AuthState = AuthAppState<PgAuthRepository, RedisStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,bidding=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let kv = Arc::new(RedisStore::connect(&config.redis_url).await?);
    tracing::info!("Connected to key-value store");

    let auth_repo = Arc::new(PgAuthRepository::new(pool.clone()));

    // Startup cleanup; errors here should not prevent server startup
    if let Err(e) = auth_repo.cleanup_expired(clock.now()).await {
        tracing::warn!(
            error = %e,
            "Auth session cleanup failed, continuing anyway"
        );
    }

    let auth_state: AuthState =
        AuthAppState::new(auth_repo, kv.clone(), config.auth, clock.clone());

    let bidding_store = Arc::new(PgBiddingRepository::new(pool.clone()));
    let notifier = Arc::new(PgNotifier::new(pool.clone()));
    let bidding_state = BiddingAppState::new(bidding_store.clone(), notifier.clone(), clock.clone());

    // Sweeps run beside the server, never inside a request
    let scheduler = Arc::new(Scheduler::new(
        bidding_store,
        notifier,
        clock.clone(),
        config.bidding,
    ));
    let scheduler_task = scheduler.spawn();

    let limiter = Arc::new(FixedWindowLimiter::new(kv, config.rate_limit));

    // Rate limit inside optional auth, so signed-in callers are keyed by user
    let with_caller = |router: Router| {
        router
            .layer(middleware::from_fn_with_state(
                limiter.clone(),
                rate_limit::<RedisStore>,
            ))
            .layer(middleware::from_fn_with_state(
                auth_state.clone(),
                optional_auth::<PgAuthRepository, RedisStore>,
            ))
    };
    let anonymous = |router: Router| {
        router.layer(middleware::from_fn_with_state(
            limiter.clone(),
            rate_limit::<RedisStore>,
        ))
    };

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .route("/api/health", get(health))
        .nest("/api/auth", anonymous(auth_router(auth_state.clone())))
        .nest("/api/permissions", anonymous(permission_router(auth_state.clone())))
        .nest("/api/biddings", with_caller(bidding_router(bidding_state.clone())))
        .nest("/api/proposals", with_caller(proposal_router(bidding_state.clone())))
        .nest("/api/contracts", with_caller(contract_router(bidding_state)))
        .layer(middleware::from_fn_with_state(
            ResponsePipeline::standard(),
            decorate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler_task.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
