//! Domain Layer
//!
//! Contains entities and repository traits.

pub mod entity;
pub mod repository;

// Re-exports
pub use entity::{PermissionGrant, Session, User, UserSession};
pub use repository::{PermissionRepository, UserRepository, UserSessionRepository};
