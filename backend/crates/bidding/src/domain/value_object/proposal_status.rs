//! Proposal Status
//!
//! ```text
//! DRAFT -> SUBMITTED -> UNDER_REVIEW -> ACCEPTED | REJECTED
//!              \____________\-> WITHDRAWN
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TransitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    #[default]
    Draft,
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
    Withdrawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalEvent {
    Submit,
    Withdraw,
    Evaluate,
    Accept,
    Reject,
}

impl ProposalEvent {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Withdraw => "withdraw",
            Self::Evaluate => "evaluate",
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 6] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::Accepted,
        Self::Rejected,
        Self::Withdrawn,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn apply(self, event: ProposalEvent) -> Result<ProposalStatus, TransitionError> {
        use ProposalEvent as E;
        use ProposalStatus as S;

        match (self, event) {
            (S::Draft, E::Submit) => Ok(S::Submitted),
            (S::Submitted | S::UnderReview, E::Withdraw) => Ok(S::Withdrawn),
            (S::Submitted, E::Evaluate) => Ok(S::UnderReview),
            (S::UnderReview, E::Accept) => Ok(S::Accepted),
            (S::UnderReview, E::Reject) => Ok(S::Rejected),
            (from, event) => Err(TransitionError {
                entity: "proposal",
                from: from.code(),
                event: event.code(),
            }),
        }
    }

    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Withdrawn)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
