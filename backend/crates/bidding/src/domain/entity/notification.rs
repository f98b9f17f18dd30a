//! Notification Entity
//!
//! What the lifecycle engine asks the notification sink to deliver. The sink
//! resolves the target to concrete users.

use chrono::{DateTime, Utc};
use kernel::actor::Role;
use kernel::id::{NotificationId, PublicEntityId, SupplierId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    BiddingPublished,
    BiddingCancelled,
    BiddingClosingSoon,
    ProposalReceived,
    ProposalAccepted,
    ProposalRejected,
    ContractCreated,
}

impl NotificationKind {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BiddingPublished => "BIDDING_PUBLISHED",
            Self::BiddingCancelled => "BIDDING_CANCELLED",
            Self::BiddingClosingSoon => "BIDDING_CLOSING_SOON",
            Self::ProposalReceived => "PROPOSAL_RECEIVED",
            Self::ProposalAccepted => "PROPOSAL_ACCEPTED",
            Self::ProposalRejected => "PROPOSAL_REJECTED",
            Self::ContractCreated => "CONTRACT_CREATED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTarget {
    User(UserId),
    /// Every active user holding the role
    Role(Role),
    /// Users linked to the public entity
    PublicEntity(PublicEntityId),
    /// Users linked to the supplier
    Supplier(SupplierId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub target: NotificationTarget,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, target: NotificationTarget, payload: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            target,
            payload,
            created_at: now,
        }
    }
}
