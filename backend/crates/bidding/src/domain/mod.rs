//! Domain Layer
//!
//! Entities with their guarded transitions, value objects, and the
//! persistence and notification ports.

pub mod entity;
pub mod repository;
pub mod value_object;

pub use entity::{Bidding, BiddingSchedule, Contract, Notification, Proposal, ProposalItem};
pub use repository::{
    BiddingFilter, BiddingRepository, BiddingStore, ContractRepository, Notifier,
    ProposalRepository, Visibility,
};
