//! Application Layer
//!
//! Lifecycle services, one per aggregate, plus the scheduler.

pub mod bidding_service;
pub mod config;
pub mod contract_service;
mod notify;
pub mod proposal_service;
pub mod scheduler;

// Re-exports
pub use bidding_service::{
    BiddingService, CreateBiddingInput, ListBiddingsQuery, ModerationAction, UpdateBiddingInput,
};
pub use config::BiddingConfig;
pub use contract_service::{ContractService, CreateContractInput};
pub use proposal_service::{
    CreateProposalInput, ProposalItemInput, ProposalService, UpdateProposalInput,
};
pub use scheduler::{Scheduler, SweepReport};
