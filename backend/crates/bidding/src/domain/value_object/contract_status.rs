//! Contract Status

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TransitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    #[default]
    Draft,
    Active,
    Suspended,
    Terminated,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractEvent {
    /// DRAFT (signed) or SUSPENDED -> ACTIVE
    Activate,
    Suspend,
    Complete,
    Terminate,
}

impl ContractEvent {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Suspend => "suspend",
            Self::Complete => "complete",
            Self::Terminate => "terminate",
        }
    }
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 5] = [
        Self::Draft,
        Self::Active,
        Self::Suspended,
        Self::Terminated,
        Self::Completed,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Terminated => "TERMINATED",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn apply(self, event: ContractEvent) -> Result<ContractStatus, TransitionError> {
        use ContractEvent as E;
        use ContractStatus as S;

        match (self, event) {
            (S::Draft | S::Suspended, E::Activate) => Ok(S::Active),
            (S::Active, E::Suspend) => Ok(S::Suspended),
            (S::Active, E::Complete) => Ok(S::Completed),
            (S::Draft | S::Active | S::Suspended, E::Terminate) => Ok(S::Terminated),
            (from, event) => Err(TransitionError {
                entity: "contract",
                from: from.code(),
                event: event.code(),
            }),
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
