//! Presentation Layer
//!
//! HTTP handlers, DTOs and routers.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::BiddingAppState;
pub use router::{bidding_router, contract_router, proposal_router};
