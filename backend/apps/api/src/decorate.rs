//! Response decoration
//!
//! Every response passes through an ordered list of pure decorators. Each
//! one sees the request context and the headers written by the ones before
//! it, so order is part of the contract.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;

pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");
pub const API_VERSION: HeaderName = HeaderName::from_static("x-api-version");

/// What a decorator may look at
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub elapsed: Duration,
}

pub type Decorator = fn(&RequestContext, &mut HeaderMap);

#[derive(Clone)]
pub struct ResponsePipeline {
    decorators: Arc<Vec<Decorator>>,
}

impl ResponsePipeline {
    pub fn new(decorators: Vec<Decorator>) -> Self {
        Self {
            decorators: Arc::new(decorators),
        }
    }

    /// Request id, timing, version, then content sniffing
    pub fn standard() -> Self {
        Self::new(vec![request_id, response_time, api_version, no_sniff])
    }

    pub fn apply(&self, ctx: &RequestContext, headers: &mut HeaderMap) {
        for decorate in self.decorators.iter() {
            decorate(ctx, headers);
        }
    }
}

pub fn request_id(ctx: &RequestContext, headers: &mut HeaderMap) {
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        headers.insert(REQUEST_ID, value);
    }
}

pub fn response_time(ctx: &RequestContext, headers: &mut HeaderMap) {
    let millis = ctx.elapsed.as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("{millis:.1}ms")) {
        headers.insert(RESPONSE_TIME, value);
    }
}

pub fn api_version(_: &RequestContext, headers: &mut HeaderMap) {
    headers.insert(API_VERSION, HeaderValue::from_static(env!("CARGO_PKG_VERSION")));
}

pub fn no_sniff(_: &RequestContext, headers: &mut HeaderMap) {
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
}

/// Reuses a caller-supplied `x-request-id`, otherwise mints one
pub async fn decorate(
    State(pipeline): State<ResponsePipeline>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let request_id = request
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut response = next.run(request).await;

    let ctx = RequestContext {
        request_id,
        elapsed: started.elapsed(),
    };
    pipeline.apply(&ctx, response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;
    use axum::{Router, body::Body, middleware, routing::get};
    use tower::ServiceExt;

    fn ctx() -> RequestContext {
        RequestContext {
            request_id: "req-1".to_string(),
            elapsed: Duration::from_micros(1500),
        }
    }

    #[test]
    fn test_standard_pipeline_headers() {
        let mut headers = HeaderMap::new();
        ResponsePipeline::standard().apply(&ctx(), &mut headers);

        assert_eq!(headers[&REQUEST_ID], "req-1");
        assert_eq!(headers[&RESPONSE_TIME], "1.5ms");
        assert_eq!(headers[&API_VERSION], env!("CARGO_PKG_VERSION"));
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[test]
    fn test_later_decorators_see_and_override_earlier_ones() {
        fn tag_first(_: &RequestContext, headers: &mut HeaderMap) {
            headers.insert(API_VERSION, HeaderValue::from_static("first"));
        }
        fn tag_second(_: &RequestContext, headers: &mut HeaderMap) {
            let seen = headers.contains_key(API_VERSION);
            headers.insert(
                API_VERSION,
                HeaderValue::from_static(if seen { "second-after-first" } else { "second" }),
            );
        }

        let mut headers = HeaderMap::new();
        ResponsePipeline::new(vec![tag_first, tag_second]).apply(&ctx(), &mut headers);
        assert_eq!(headers[&API_VERSION], "second-after-first");

        let mut headers = HeaderMap::new();
        ResponsePipeline::new(vec![tag_second, tag_first]).apply(&ctx(), &mut headers);
        assert_eq!(headers[&API_VERSION], "first");
    }

    async fn call(request: Request) -> Response {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn_with_state(
                ResponsePipeline::standard(),
                decorate,
            ))
            .oneshot(request)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_middleware_keeps_caller_request_id() {
        let res = call(
            HttpRequest::get("/ping")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(res.headers()[&REQUEST_ID], "abc-123");
        assert!(res.headers().contains_key(&RESPONSE_TIME));
    }

    #[tokio::test]
    async fn test_middleware_mints_request_id() {
        let res = call(HttpRequest::get("/ping").body(Body::empty()).unwrap()).await;
        let id = res.headers()[&REQUEST_ID].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }
}
