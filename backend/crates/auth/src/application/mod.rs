//! Application Layer
//!
//! Use cases and application services.

pub mod authenticate;
pub mod config;
pub mod permission;
pub mod refresh;
pub mod session_store;
pub mod sign_in;
pub mod sign_out;
pub mod token;

// Re-exports
pub use authenticate::{AuthContext, AuthenticateUseCase};
pub use config::AuthConfig;
pub use permission::{GrantInput, PermissionService};
pub use refresh::{RefreshOutput, RefreshUseCase};
pub use session_store::SessionStore;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use token::{AccessClaims, TokenIssuer};
