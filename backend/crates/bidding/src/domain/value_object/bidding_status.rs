//! Bidding Status
//!
//! ```text
//! DRAFT -> PUBLISHED -> OPEN -> CLOSED -> AWARDED
//!   \_________\__________\_______\_____-> CANCELLED
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TransitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BiddingStatus {
    #[default]
    Draft,
    Published,
    Open,
    Closed,
    Awarded,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BiddingEvent {
    /// Owner/admin action
    Publish,
    /// Scheduler, at the opening date
    Open,
    /// Scheduler, at the closing date
    Close,
    /// A proposal was accepted
    Award,
    /// Owner/admin action
    Cancel,
}

impl BiddingEvent {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Open => "open",
            Self::Close => "close",
            Self::Award => "award",
            Self::Cancel => "cancel",
        }
    }
}

impl BiddingStatus {
    pub const ALL: [BiddingStatus; 6] = [
        Self::Draft,
        Self::Published,
        Self::Open,
        Self::Closed,
        Self::Awarded,
        Self::Cancelled,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Awarded => "AWARDED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// The transition table
    pub fn apply(self, event: BiddingEvent) -> Result<BiddingStatus, TransitionError> {
        use BiddingEvent as E;
        use BiddingStatus as S;

        match (self, event) {
            (S::Draft, E::Publish) => Ok(S::Published),
            (S::Published, E::Open) => Ok(S::Open),
            (S::Open, E::Close) => Ok(S::Closed),
            (S::Closed, E::Award) => Ok(S::Awarded),
            (S::Draft | S::Published | S::Open | S::Closed, E::Cancel) => Ok(S::Cancelled),
            (from, event) => Err(TransitionError {
                entity: "bidding",
                from: from.code(),
                event: event.code(),
            }),
        }
    }

    /// No event leaves this state
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Awarded | Self::Cancelled)
    }

    /// Content may still change (subject to the no-proposals rule)
    #[inline]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Published)
    }
}

impl fmt::Display for BiddingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
