//! Rate limiting middleware
//!
//! Fixed-window budget per route and caller. The caller is the signed-in
//! user when the auth layer ran first, otherwise the client IP.

use std::sync::Arc;

use axum::extract::{MatchedPath, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::actor::Actor;
use kernel::error::app_error::AppError;
use platform::client::ClientInfo;
use platform::kv::KeyValueStore;
use platform::rate_limit::{FixedWindowLimiter, RateLimitError, window_key};

pub const REMAINING: &str = "x-ratelimit-remaining";
pub const LIMIT: &str = "x-ratelimit-limit";

pub async fn rate_limit<S>(
    State(limiter): State<Arc<FixedWindowLimiter<S>>>,
    client: ClientInfo,
    request: Request,
    next: Next,
) -> Response
where
    S: KeyValueStore + Send + Sync + 'static,
{
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let caller = match request.extensions().get::<Actor>() {
        Some(actor) => format!("user:{}", actor.user_id),
        None => format!("ip:{}", client.ip_or_unknown()),
    };
    let key = window_key(&format!("{} {route}", request.method()), &caller);
    let limit = limiter.config().max_requests;

    match limiter.check(&key).await {
        Ok(result) => {
            let mut response = next.run(request).await;
            insert_counts(&mut response, limit, result.remaining);
            response
        }
        Err(RateLimitError::Exceeded { retry_after_secs }) => {
            tracing::warn!(route = %route, caller = %caller, retry_after_secs, "Rate limit exceeded");
            let mut response =
                AppError::rate_limited("Too many requests", retry_after_secs).into_response();
            insert_counts(&mut response, limit, 0);
            response
        }
        Err(RateLimitError::Store(e)) => {
            // A store outage must not take the API down with it
            tracing::error!(error = %e, route = %route, "Rate limit store unavailable, request let through");
            next.run(request).await
        }
    }
}

fn insert_counts(response: &mut Response, limit: u32, remaining: u32) {
    let headers = response.headers_mut();
    headers.insert(LIMIT, HeaderValue::from(limit));
    headers.insert(REMAINING, HeaderValue::from(remaining));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode, header};
    use axum::{Extension, Router, middleware, routing::get};
    use kernel::actor::Role;
    use kernel::id::UserId;
    use platform::clock::{Clock, ManualClock};
    use platform::kv::MemoryStore;
    use platform::rate_limit::RateLimitConfig;
    use tower::ServiceExt;

    fn limiter(max: u32) -> (Arc<ManualClock>, Arc<FixedWindowLimiter<MemoryStore>>) {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryStore::new(clock.clone() as Arc<dyn Clock>));
        let limiter = Arc::new(FixedWindowLimiter::new(store, RateLimitConfig::new(max, 60)));
        (clock, limiter)
    }

    fn app(limiter: Arc<FixedWindowLimiter<MemoryStore>>) -> Router {
        Router::new()
            .route("/api/biddings/{id}", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit::<MemoryStore>))
    }

    fn get_from(ip: &str, uri: &str) -> HttpRequest<Body> {
        HttpRequest::get(uri)
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_budget_is_per_route_and_caller() {
        let (_, limiter) = limiter(2);
        let app = app(limiter);

        let first = app.clone().oneshot(get_from("10.0.0.1", "/api/biddings/a")).await.unwrap();
        assert_eq!(first.headers()[REMAINING], "1");

        // same route template, different path parameter
        let second = app.clone().oneshot(get_from("10.0.0.1", "/api/biddings/b")).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers()[REMAINING], "0");

        let third = app.clone().oneshot(get_from("10.0.0.1", "/api/biddings/c")).await.unwrap();
        assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(third.headers()[header::RETRY_AFTER], "60");

        let other = app.oneshot(get_from("10.0.0.2", "/api/biddings/a")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_window_resets_after_expiry() {
        let (clock, limiter) = limiter(1);
        let app = app(limiter);

        app.clone().oneshot(get_from("10.0.0.1", "/api/biddings/a")).await.unwrap();
        let blocked = app.clone().oneshot(get_from("10.0.0.1", "/api/biddings/a")).await.unwrap();
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

        clock.advance(chrono::Duration::seconds(61));
        let again = app.oneshot(get_from("10.0.0.1", "/api/biddings/a")).await.unwrap();
        assert_eq!(again.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_signed_in_callers_are_keyed_by_user() {
        let (_, limiter) = limiter(1);
        let user = Actor::new(UserId::new(), Role::Citizen);
        let app = app(limiter).layer(Extension(user));

        app.clone().oneshot(get_from("10.0.0.1", "/api/biddings/a")).await.unwrap();
        // new IP, same user
        let res = app.oneshot(get_from("10.0.0.9", "/api/biddings/a")).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
