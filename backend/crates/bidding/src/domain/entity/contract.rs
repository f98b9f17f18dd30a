//! Contract Entity

use chrono::{DateTime, Utc};
use kernel::actor::Actor;
use kernel::id::{BiddingId, ContractId, ProposalId, PublicEntityId, SupplierId};
use rust_decimal::Decimal;

use crate::domain::entity::{Bidding, Proposal};
use crate::domain::value_object::{ContractEvent, ContractStatus, ProposalStatus};
use crate::error::{BiddingError, BiddingResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub id: ContractId,
    pub bidding_id: BiddingId,
    /// One contract per proposal
    pub proposal_id: ProposalId,
    pub public_entity_id: PublicEntityId,
    pub supplier_id: SupplierId,
    pub contract_number: String,
    pub total_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ContractStatus,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Draft contract from an accepted proposal
    pub fn from_accepted(
        bidding: &Bidding,
        proposal: &Proposal,
        contract_number: String,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> BiddingResult<Self> {
        if proposal.status != ProposalStatus::Accepted {
            return Err(BiddingError::Validation(
                "Contracts are created only from accepted proposals".to_string(),
            ));
        }
        if start_date >= end_date {
            return Err(BiddingError::Validation(
                "startDate must be before endDate".to_string(),
            ));
        }
        let contract_number = contract_number.trim().to_string();
        if contract_number.is_empty() {
            return Err(BiddingError::Validation(
                "contractNumber is required".to_string(),
            ));
        }

        Ok(Self {
            id: ContractId::new(),
            bidding_id: bidding.id,
            proposal_id: proposal.id,
            public_entity_id: bidding.public_entity_id,
            supplier_id: proposal.supplier_id,
            contract_number,
            total_value: proposal.total_value,
            start_date,
            end_date,
            status: ContractStatus::Draft,
            signed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Either party, or an administrator
    pub fn is_party(&self, actor: &Actor) -> bool {
        actor.owns_public_entity(self.public_entity_id) || actor.is_supplier(self.supplier_id)
    }

    pub fn ensure_owner(&self, actor: &Actor) -> BiddingResult<()> {
        if actor.owns_public_entity(self.public_entity_id) {
            Ok(())
        } else {
            Err(BiddingError::Forbidden(format!(
                "Only the contracting entity or an administrator may manage contract {}",
                self.contract_number
            )))
        }
    }

    pub fn sign(&mut self, now: DateTime<Utc>) -> BiddingResult<()> {
        if self.status != ContractStatus::Draft {
            return Err(BiddingError::Validation(format!(
                "Cannot sign a contract in status {}",
                self.status
            )));
        }
        if self.signed_at.is_some() {
            return Err(BiddingError::Validation(
                "Contract is already signed".to_string(),
            ));
        }
        self.signed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Returns the previous status for the conditional store update
    pub fn transition(&mut self, event: ContractEvent, now: DateTime<Utc>) -> BiddingResult<ContractStatus> {
        let from = self.status;
        let to = from.apply(event)?;

        if from == ContractStatus::Draft && event == ContractEvent::Activate && self.signed_at.is_none() {
            return Err(BiddingError::Validation(
                "Contract must be signed before activation".to_string(),
            ));
        }

        self.status = to;
        self.updated_at = now;
        Ok(from)
    }
}
