//! Entities

pub mod permission_grant;
pub mod session;
pub mod user;

pub use permission_grant::PermissionGrant;
pub use session::{Session, UserSession};
pub use user::User;
