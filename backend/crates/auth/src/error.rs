//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::actor::Permission;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::kv::KvError;
use platform::rate_limit::RateLimitError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password (indistinguishable on purpose)
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    /// Missing, malformed, expired or logged-out session
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Access token was blacklisted at sign-out
    #[error("Token has been revoked")]
    TokenRevoked,

    /// Role allow-list or ownership check failed
    #[error("{0}")]
    Forbidden(String),

    /// Active grants do not cover the route's required permissions
    #[error("Missing permissions: {}", format_permissions(.0))]
    MissingPermissions(Vec<Permission>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Too many attempts, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Session store error: {0}")]
    Store(#[from] KvError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_permissions(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(Permission::code)
        .collect::<Vec<_>>()
        .join(", ")
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials | AuthError::SessionInvalid | AuthError::TokenRevoked => {
                ErrorKind::Unauthorized
            }
            AuthError::AccountDisabled
            | AuthError::Forbidden(_)
            | AuthError::MissingPermissions(_) => ErrorKind::Forbidden,
            AuthError::NotFound(_) => ErrorKind::NotFound,
            AuthError::Validation(_) => ErrorKind::UnprocessableEntity,
            AuthError::RateLimited { .. } => ErrorKind::TooManyRequests,
            AuthError::Store(_) => ErrorKind::ServiceUnavailable,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::RateLimited { retry_after_secs } => err.with_retry_after(*retry_after_secs),
            AuthError::SessionInvalid | AuthError::TokenRevoked => {
                err.with_action("Sign in again")
            }
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Session store error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::RateLimited { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Auth rate limit hit");
            }
            AuthError::MissingPermissions(missing) => {
                tracing::info!(missing = %format_permissions(missing), "Permission denied");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.to_app_error()
    }
}

impl From<RateLimitError> for AuthError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::Exceeded { retry_after_secs } => {
                AuthError::RateLimited { retry_after_secs }
            }
            RateLimitError::Store(e) => AuthError::Store(e),
        }
    }
}
