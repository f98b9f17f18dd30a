//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Injectable wall clock (`Clock`, `SystemClock`, `ManualClock`)
//! - Key-value store with TTL (Redis-backed, in-memory for tests)
//! - Fixed-window rate limiting and login-failure tracking
//! - Password hashing (Argon2id) and cryptographic helpers
//! - Client identification and environment configuration helpers

pub mod client;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod kv;
pub mod password;
pub mod rate_limit;
