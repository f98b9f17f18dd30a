//! Bidding Lifecycle Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, status tables and repository traits
//! - `application/` - Lifecycle services and scheduler sweeps
//! - `infra/` - PostgreSQL store and notification sink
//! - `presentation/` - HTTP handlers, DTOs, routers
//!
//! ## Lifecycles
//! - Bidding: DRAFT → PUBLISHED → OPEN → CLOSED → AWARDED, or CANCELLED
//! - Proposal: DRAFT → SUBMITTED → UNDER_REVIEW → ACCEPTED | REJECTED, or WITHDRAWN
//! - Contract: DRAFT → ACTIVE ⇄ SUSPENDED → COMPLETED, or TERMINATED
//!
//! Each status enum owns its transition table; entities add the date and
//! parent-state guards. Stores write status changes conditionally on the
//! status that was read, so concurrent transitions cannot both succeed.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::{BiddingConfig, Scheduler, SweepReport};
pub use error::{BiddingError, BiddingResult};
pub use infra::{PgBiddingRepository, PgNotifier};
pub use presentation::{BiddingAppState, bidding_router, contract_router, proposal_router};

#[cfg(test)]
mod tests;
