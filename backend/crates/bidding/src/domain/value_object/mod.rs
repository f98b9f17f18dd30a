//! Value Objects
//!
//! Status enums with their transition tables, the bidding modality and
//! stored amount precision.

pub mod amount;
pub mod bidding_status;
pub mod bidding_type;
pub mod contract_status;
pub mod proposal_status;

pub use amount::Precision;
pub use bidding_status::{BiddingEvent, BiddingStatus};
pub use bidding_type::BiddingType;
pub use contract_status::{ContractEvent, ContractStatus};
pub use proposal_status::{ProposalEvent, ProposalStatus};

use thiserror::Error;

/// A state/event pair that has no row in the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot {event} a {entity} in status {from}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub event: &'static str,
}
