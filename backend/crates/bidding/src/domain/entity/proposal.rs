//! Proposal Entity
//!
//! A supplier's priced offer against one bidding. `total_value` is always
//! the sum of the item totals.

use chrono::{DateTime, Utc};
use kernel::actor::Actor;
use kernel::id::{BiddingId, ProposalId, SupplierId};
use rust_decimal::Decimal;

use crate::domain::entity::Bidding;
use crate::domain::value_object::{BiddingStatus, ProposalEvent, ProposalStatus, amount};
use crate::error::{BiddingError, BiddingResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// quantity × unit_price
    pub total_price: Decimal,
}

impl ProposalItem {
    pub fn new(description: String, quantity: Decimal, unit_price: Decimal) -> BiddingResult<Self> {
        if description.trim().is_empty() {
            return Err(BiddingError::Validation(
                "Item description is required".to_string(),
            ));
        }
        if quantity <= Decimal::ZERO {
            return Err(BiddingError::Validation(
                "Item quantity must be greater than zero".to_string(),
            ));
        }
        if unit_price < Decimal::ZERO {
            return Err(BiddingError::Validation(
                "Item unitPrice cannot be negative".to_string(),
            ));
        }
        amount::QUANTITY.ensure("Item quantity", quantity)?;
        amount::MONEY.ensure("Item unitPrice", unit_price)?;
        let total_price = quantity
            .checked_mul(unit_price)
            .ok_or_else(|| BiddingError::Validation("Item total is out of range".to_string()))?;
        amount::TOTAL.ensure("Item total", total_price)?;

        Ok(Self {
            description: description.trim().to_string(),
            quantity,
            unit_price,
            total_price,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    pub bidding_id: BiddingId,
    pub supplier_id: SupplierId,
    pub total_value: Decimal,
    pub status: ProposalStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub items: Vec<ProposalItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    pub fn new(
        bidding_id: BiddingId,
        supplier_id: SupplierId,
        items: Vec<ProposalItem>,
        now: DateTime<Utc>,
    ) -> BiddingResult<Self> {
        let mut proposal = Self {
            id: ProposalId::new(),
            bidding_id,
            supplier_id,
            total_value: Decimal::ZERO,
            status: ProposalStatus::Draft,
            submitted_at: None,
            valid_until: None,
            notes: None,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        proposal.replace_items(items)?;
        Ok(proposal)
    }

    /// Replaces the whole item set and recomputes the total
    pub fn replace_items(&mut self, items: Vec<ProposalItem>) -> BiddingResult<()> {
        let total = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.total_price))
            .ok_or_else(|| BiddingError::Validation("Proposal total is out of range".to_string()))?;
        amount::TOTAL.ensure("Proposal total", total)?;
        self.items = items;
        self.total_value = total;
        Ok(())
    }

    pub fn set_valid_until(&mut self, valid_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> BiddingResult<()> {
        if valid_until.is_some_and(|at| at <= now) {
            return Err(BiddingError::Validation(
                "validUntil must be in the future".to_string(),
            ));
        }
        self.valid_until = valid_until;
        Ok(())
    }

    pub fn ensure_supplier(&self, actor: &Actor) -> BiddingResult<()> {
        if actor.is_supplier(self.supplier_id) {
            Ok(())
        } else {
            Err(BiddingError::Forbidden(
                "Only the submitting supplier may modify this proposal".to_string(),
            ))
        }
    }

    /// The guarded transition. `bidding` is the parent at call time.
    /// Returns the previous status for the conditional store update.
    pub fn transition(
        &mut self,
        event: ProposalEvent,
        bidding: &Bidding,
        now: DateTime<Utc>,
    ) -> BiddingResult<ProposalStatus> {
        let from = self.status;
        let to = from.apply(event)?;

        match event {
            ProposalEvent::Submit => {
                if !bidding.accepts_proposals(now) {
                    return Err(BiddingError::Validation(
                        "Bidding is not open for proposals".to_string(),
                    ));
                }
                if self.items.is_empty() {
                    return Err(BiddingError::Validation(
                        "A proposal needs at least one item to be submitted".to_string(),
                    ));
                }
            }
            ProposalEvent::Withdraw => {
                if matches!(bidding.status, BiddingStatus::Closed | BiddingStatus::Awarded) {
                    return Err(BiddingError::Validation(format!(
                        "Cannot withdraw once the bidding is {}",
                        bidding.status
                    )));
                }
            }
            ProposalEvent::Evaluate | ProposalEvent::Accept => {
                if bidding.status != BiddingStatus::Closed {
                    return Err(BiddingError::Validation(
                        "Proposals are evaluated only after the bidding closes".to_string(),
                    ));
                }
            }
            ProposalEvent::Reject => {}
        }

        if event == ProposalEvent::Submit {
            self.submitted_at = Some(now);
        }
        self.status = to;
        self.updated_at = now;
        Ok(from)
    }
}
