//! Infrastructure Layer
//!
//! PostgreSQL store and notification sink.

pub mod notifier;
pub mod postgres;

pub use notifier::PgNotifier;
pub use postgres::PgBiddingRepository;
