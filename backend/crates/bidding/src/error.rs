//! Bidding Error Types
//!
//! Every guard failure in the lifecycle engine ends up as one of these
//! variants, which map onto `kernel::error::AppError` at the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_object::TransitionError;

pub type BiddingResult<T> = Result<T, BiddingError>;

#[derive(Debug, Error)]
pub enum BiddingError {
    /// Bidding, proposal, contract or profile does not exist
    #[error("{0}")]
    NotFound(String),

    /// Caller lacks ownership or role for the mutation
    #[error("{0}")]
    Forbidden(String),

    /// Well-formed but not allowed now: wrong state, bad dates, missing fields
    #[error("{0}")]
    Validation(String),

    /// Uniqueness invariant or a concurrent transition won the race
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BiddingError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        BiddingError::NotFound(format!("{what} {id} not found"))
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BiddingError::NotFound(_) => ErrorKind::NotFound,
            BiddingError::Forbidden(_) => ErrorKind::Forbidden,
            BiddingError::Validation(_) => ErrorKind::UnprocessableEntity,
            BiddingError::Conflict(_) => ErrorKind::Conflict,
            BiddingError::Database(_) | BiddingError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            // Driver details stay in the logs
            BiddingError::Database(_) => AppError::internal("Database error"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            BiddingError::Database(e) => {
                tracing::error!(error = %e, "Bidding database error");
            }
            BiddingError::Internal(msg) => {
                tracing::error!(message = %msg, "Bidding internal error");
            }
            BiddingError::Forbidden(msg) => {
                tracing::warn!(message = %msg, "Bidding operation forbidden");
            }
            _ => {
                tracing::debug!(error = %self, "Bidding client error");
            }
        }
    }
}

impl From<TransitionError> for BiddingError {
    fn from(err: TransitionError) -> Self {
        BiddingError::Validation(err.to_string())
    }
}

impl IntoResponse for BiddingError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<BiddingError> for AppError {
    fn from(err: BiddingError) -> Self {
        err.to_app_error()
    }
}
