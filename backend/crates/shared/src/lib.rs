//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of procurement vocabulary:
//! - Common error types and result aliases
//! - Typed identifiers for users, entities, biddings, proposals and contracts
//! - The authenticated caller (`Actor`) with its role and granted permissions
//! - Per-route access rules (role allow-list + required permissions)
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod access;
pub mod actor;
pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
