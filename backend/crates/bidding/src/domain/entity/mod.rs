//! Entities

pub mod bidding;
pub mod contract;
pub mod notification;
pub mod proposal;

pub use bidding::{Bidding, BiddingSchedule};
pub use contract::Contract;
pub use notification::{Notification, NotificationKind, NotificationTarget};
pub use proposal::{Proposal, ProposalItem};
