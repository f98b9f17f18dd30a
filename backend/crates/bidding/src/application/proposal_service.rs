//! Proposal Service
//!
//! Supplier-side drafting and submission, owner-side evaluation. Acceptance
//! awards the parent bidding in the same store transaction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::actor::Actor;
use kernel::id::{BiddingId, ProposalId, SupplierId};
use platform::clock::Clock;
use rust_decimal::Decimal;
use serde_json::json;

use crate::application::notify::dispatch;
use crate::domain::entity::{
    Bidding, Notification, NotificationKind, NotificationTarget, Proposal, ProposalItem,
};
use crate::domain::repository::{BiddingStore, Notifier};
use crate::domain::value_object::{BiddingEvent, BiddingStatus, ProposalEvent, ProposalStatus};
use crate::error::{BiddingError, BiddingResult};

pub struct ProposalItemInput {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

pub struct CreateProposalInput {
    pub bidding_id: BiddingId,
    pub items: Vec<ProposalItemInput>,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// `items`, when present, replaces the whole item set and must not be empty
#[derive(Default)]
pub struct UpdateProposalInput {
    pub items: Option<Vec<ProposalItemInput>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

fn build_items(items: Vec<ProposalItemInput>) -> BiddingResult<Vec<ProposalItem>> {
    items
        .into_iter()
        .map(|i| ProposalItem::new(i.description, i.quantity, i.unit_price))
        .collect()
}

pub struct ProposalService<R, N>
where
    R: BiddingStore,
    N: Notifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<R, N> ProposalService<R, N>
where
    R: BiddingStore,
    N: Notifier,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            notifier,
            clock,
        }
    }

    pub async fn create(&self, actor: &Actor, input: CreateProposalInput) -> BiddingResult<Proposal> {
        let supplier_id = self.supplier_profile(actor).await?;
        let bidding = self.load_bidding(input.bidding_id).await?;

        let now = self.clock.now();
        if !bidding.accepts_proposals(now) {
            return Err(BiddingError::Validation(format!(
                "Bidding {} is not accepting proposals",
                bidding.bidding_number
            )));
        }

        let mut proposal = Proposal::new(bidding.id, supplier_id, build_items(input.items)?, now)?;
        proposal.set_valid_until(input.valid_until, now)?;
        proposal.notes = input.notes;

        // The unique (bidding, supplier) constraint settles concurrent creates
        self.repo.insert_proposal(&proposal).await?;

        tracing::info!(
            proposal_id = %proposal.id,
            bidding_id = %bidding.id,
            supplier_id = %supplier_id,
            total_value = %proposal.total_value,
            "Proposal created"
        );

        dispatch(
            self.notifier.as_ref(),
            Notification::new(
                NotificationKind::ProposalReceived,
                NotificationTarget::PublicEntity(bidding.public_entity_id),
                json!({
                    "biddingId": bidding.id,
                    "biddingNumber": bidding.bidding_number,
                    "proposalId": proposal.id,
                    "supplierId": supplier_id,
                }),
                now,
            ),
        )
        .await;

        Ok(proposal)
    }

    /// Submitting supplier, bidding owner or admin
    pub async fn get(&self, actor: &Actor, id: ProposalId) -> BiddingResult<Proposal> {
        let proposal = self.load(id).await?;
        if actor.is_supplier(proposal.supplier_id) {
            return Ok(proposal);
        }
        let bidding = self.load_bidding(proposal.bidding_id).await?;
        if bidding.is_owned_by(actor) {
            Ok(proposal)
        } else {
            Err(BiddingError::Forbidden(
                "Not allowed to view this proposal".to_string(),
            ))
        }
    }

    /// Owners see every proposal, suppliers only their own
    pub async fn list_for_bidding(&self, actor: &Actor, bidding_id: BiddingId) -> BiddingResult<Vec<Proposal>> {
        let bidding = self.load_bidding(bidding_id).await?;
        if bidding.is_owned_by(actor) {
            return self.repo.list_proposals(bidding_id, None).await;
        }
        match actor.supplier_id {
            Some(supplier_id) if actor.is_supplier(supplier_id) => {
                self.repo.list_proposals(bidding_id, Some(supplier_id)).await
            }
            _ => Err(BiddingError::Forbidden(
                "Not allowed to list proposals of this bidding".to_string(),
            )),
        }
    }

    pub async fn update(&self, actor: &Actor, id: ProposalId, input: UpdateProposalInput) -> BiddingResult<Proposal> {
        let mut proposal = self.load(id).await?;
        proposal.ensure_supplier(actor)?;

        if proposal.status != ProposalStatus::Draft {
            return Err(BiddingError::Validation(format!(
                "Cannot edit a proposal in status {}",
                proposal.status
            )));
        }
        let bidding = self.load_bidding(proposal.bidding_id).await?;
        let now = self.clock.now();
        if now >= bidding.closing_date {
            return Err(BiddingError::Validation(
                "Proposals cannot change after the closing date".to_string(),
            ));
        }

        if let Some(items) = input.items {
            if items.is_empty() {
                return Err(BiddingError::Validation(
                    "A proposal needs at least one item".to_string(),
                ));
            }
            proposal.replace_items(build_items(items)?)?;
        }
        if input.valid_until.is_some() {
            proposal.set_valid_until(input.valid_until, now)?;
        }
        if input.notes.is_some() {
            proposal.notes = input.notes;
        }
        proposal.updated_at = now;

        if !self.repo.update_proposal(&proposal).await? {
            return Err(BiddingError::Conflict(
                "Proposal changed while it was being edited".to_string(),
            ));
        }

        tracing::info!(proposal_id = %id, total_value = %proposal.total_value, "Proposal updated");
        Ok(proposal)
    }

    pub async fn submit(&self, actor: &Actor, id: ProposalId) -> BiddingResult<Proposal> {
        let mut proposal = self.load(id).await?;
        proposal.ensure_supplier(actor)?;
        let bidding = self.load_bidding(proposal.bidding_id).await?;

        let from = proposal.transition(ProposalEvent::Submit, &bidding, self.clock.now())?;
        self.persist_transition(&proposal, from).await?;

        tracing::info!(proposal_id = %id, bidding_id = %bidding.id, "Proposal submitted");
        Ok(proposal)
    }

    pub async fn withdraw(&self, actor: &Actor, id: ProposalId) -> BiddingResult<Proposal> {
        let mut proposal = self.load(id).await?;
        proposal.ensure_supplier(actor)?;
        let bidding = self.load_bidding(proposal.bidding_id).await?;

        let from = proposal.transition(ProposalEvent::Withdraw, &bidding, self.clock.now())?;
        self.persist_transition(&proposal, from).await?;

        tracing::info!(proposal_id = %id, from = %from, "Proposal withdrawn");
        Ok(proposal)
    }

    /// SUBMITTED → UNDER_REVIEW, once the bidding has closed
    pub async fn evaluate(&self, actor: &Actor, id: ProposalId) -> BiddingResult<Proposal> {
        let mut proposal = self.load(id).await?;
        let bidding = self.load_bidding(proposal.bidding_id).await?;
        bidding.ensure_owner(actor)?;

        let from = proposal.transition(ProposalEvent::Evaluate, &bidding, self.clock.now())?;
        self.persist_transition(&proposal, from).await?;

        tracing::info!(proposal_id = %id, evaluated_by = %actor.user_id, "Proposal under review");
        Ok(proposal)
    }

    /// Accepts the proposal and awards its bidding, both or neither
    pub async fn accept(&self, actor: &Actor, id: ProposalId) -> BiddingResult<(Proposal, Bidding)> {
        let mut proposal = self.load(id).await?;
        let mut bidding = self.load_bidding(proposal.bidding_id).await?;
        bidding.ensure_owner(actor)?;
        if bidding.status == BiddingStatus::Awarded {
            return Err(BiddingError::Conflict(format!(
                "Bidding {} has already been awarded",
                bidding.bidding_number
            )));
        }

        let now = self.clock.now();
        proposal.transition(ProposalEvent::Accept, &bidding, now)?;
        bidding.transition(BiddingEvent::Award, now)?;
        self.repo.accept_and_award(&proposal, &bidding).await?;

        tracing::info!(
            proposal_id = %id,
            bidding_id = %bidding.id,
            total_value = %proposal.total_value,
            accepted_by = %actor.user_id,
            "Proposal accepted, bidding awarded"
        );

        dispatch(
            self.notifier.as_ref(),
            Notification::new(
                NotificationKind::ProposalAccepted,
                NotificationTarget::Supplier(proposal.supplier_id),
                json!({
                    "biddingId": bidding.id,
                    "biddingNumber": bidding.bidding_number,
                    "proposalId": proposal.id,
                    "totalValue": proposal.total_value,
                }),
                now,
            ),
        )
        .await;

        Ok((proposal, bidding))
    }

    pub async fn reject(&self, actor: &Actor, id: ProposalId, reason: Option<String>) -> BiddingResult<Proposal> {
        let mut proposal = self.load(id).await?;
        let bidding = self.load_bidding(proposal.bidding_id).await?;
        bidding.ensure_owner(actor)?;

        let now = self.clock.now();
        let from = proposal.transition(ProposalEvent::Reject, &bidding, now)?;
        self.persist_transition(&proposal, from).await?;

        tracing::info!(proposal_id = %id, rejected_by = %actor.user_id, "Proposal rejected");

        dispatch(
            self.notifier.as_ref(),
            Notification::new(
                NotificationKind::ProposalRejected,
                NotificationTarget::Supplier(proposal.supplier_id),
                json!({
                    "biddingId": bidding.id,
                    "biddingNumber": bidding.bidding_number,
                    "proposalId": proposal.id,
                    "reason": reason,
                }),
                now,
            ),
        )
        .await;

        Ok(proposal)
    }

    /// Only drafts no contract references
    pub async fn delete(&self, actor: &Actor, id: ProposalId) -> BiddingResult<()> {
        let proposal = self.load(id).await?;
        proposal.ensure_supplier(actor)?;

        if proposal.status != ProposalStatus::Draft {
            return Err(BiddingError::Validation(format!(
                "Only DRAFT proposals can be deleted, this one is {}",
                proposal.status
            )));
        }
        if self.repo.contract_exists_for_proposal(id).await? {
            return Err(BiddingError::Validation(
                "Cannot delete a proposal referenced by a contract".to_string(),
            ));
        }
        if !self.repo.delete_draft_proposal(id).await? {
            return Err(BiddingError::Conflict(
                "Proposal changed while it was being deleted".to_string(),
            ));
        }

        tracing::info!(proposal_id = %id, "Proposal deleted");
        Ok(())
    }

    async fn supplier_profile(&self, actor: &Actor) -> BiddingResult<SupplierId> {
        let supplier_id = actor
            .supplier_id
            .filter(|id| actor.is_supplier(*id))
            .ok_or_else(|| BiddingError::NotFound("Supplier profile not found".to_string()))?;
        if !self.repo.supplier_exists(supplier_id).await? {
            return Err(BiddingError::not_found("Supplier", supplier_id));
        }
        Ok(supplier_id)
    }

    async fn persist_transition(&self, proposal: &Proposal, from: ProposalStatus) -> BiddingResult<()> {
        if self.repo.update_proposal_status(proposal, from).await? {
            Ok(())
        } else {
            Err(BiddingError::Conflict(format!("Proposal {} is no longer {from}", proposal.id)))
        }
    }

    async fn load(&self, id: ProposalId) -> BiddingResult<Proposal> {
        self.repo
            .find_proposal(id)
            .await?
            .ok_or_else(|| BiddingError::not_found("Proposal", id))
    }

    async fn load_bidding(&self, id: BiddingId) -> BiddingResult<Bidding> {
        self.repo
            .find_bidding(id)
            .await?
            .ok_or_else(|| BiddingError::not_found("Bidding", id))
    }
}
