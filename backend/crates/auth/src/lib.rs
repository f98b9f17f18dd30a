//! Auth (Authentication & Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities and repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Email + password sign-in issuing a short-lived bearer token and a
//!   rotating refresh token
//! - Sessions in the shared key-value store; sign-out blacklists the token
//! - Named permission grants with optional expiry, checked on every request
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, verified off the async workers
//! - Refresh tokens are stored only as SHA-256 digests
//! - Consecutive failed sign-ins lock the client IP out for a window

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::{AuthConfig, AuthContext};
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::{AuthAppState, auth_router, optional_auth, permission_router, require_auth};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
