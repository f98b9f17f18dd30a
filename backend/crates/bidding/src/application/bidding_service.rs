//! Bidding Service
//!
//! Owner-facing and moderation operations on a bidding. Every status change
//! goes through [`Bidding::transition`] and is persisted with a write scoped
//! to the status it was read in.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::actor::{Actor, Role};
use kernel::id::{BiddingId, PublicEntityId};
use platform::clock::Clock;
use rust_decimal::Decimal;
use serde_json::json;

use crate::application::notify::dispatch;
use crate::domain::entity::{
    Bidding, BiddingSchedule, Notification, NotificationKind, NotificationTarget,
};
use crate::domain::repository::{BiddingFilter, BiddingStore, Notifier, Visibility};
use crate::domain::value_object::{BiddingEvent, BiddingStatus, BiddingType};
use crate::error::{BiddingError, BiddingResult};

pub struct CreateBiddingInput {
    /// Required for administrators, ignored for public entities
    pub public_entity_id: Option<PublicEntityId>,
    pub title: String,
    pub description: String,
    pub bidding_number: String,
    pub bidding_type: BiddingType,
    pub estimated_value: Decimal,
    pub opening_date: DateTime<Utc>,
    pub closing_date: DateTime<Utc>,
    pub delivery_deadline: DateTime<Utc>,
    pub is_public: Option<bool>,
    pub requirements: Option<String>,
    pub evaluation_criteria: Option<String>,
}

/// Absent fields keep their current value
#[derive(Default)]
pub struct UpdateBiddingInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub bidding_type: Option<BiddingType>,
    pub estimated_value: Option<Decimal>,
    pub opening_date: Option<DateTime<Utc>>,
    pub closing_date: Option<DateTime<Utc>>,
    pub delivery_deadline: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
    pub requirements: Option<String>,
    pub evaluation_criteria: Option<String>,
}

#[derive(Default)]
pub struct ListBiddingsQuery {
    pub status: Option<BiddingStatus>,
    pub public_entity_id: Option<PublicEntityId>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Administrative status changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationAction {
    Publish,
    Cancel,
}

pub struct BiddingService<R, N>
where
    R: BiddingStore,
    N: Notifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<R, N> BiddingService<R, N>
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

    pub async fn create(&self, actor: &Actor, input: CreateBiddingInput) -> BiddingResult<Bidding> {
        let owner = match actor.role {
            Role::Admin => input.public_entity_id.ok_or_else(|| {
                BiddingError::Validation(
                    "publicEntityId is required when an administrator creates a bidding"
                        .to_string(),
                )
            })?,
            Role::PublicEntity => actor.public_entity_id.ok_or_else(|| {
                BiddingError::Forbidden("User is not linked to a public entity".to_string())
            })?,
            role => {
                return Err(BiddingError::Forbidden(format!(
                    "Role {role} may not create biddings"
                )));
            }
        };

        if !self.repo.public_entity_exists(owner).await? {
            return Err(BiddingError::not_found("Public entity", owner));
        }

        let now = self.clock.now();
        let schedule = BiddingSchedule::new(
            input.opening_date,
            input.closing_date,
            input.delivery_deadline,
        )?;
        let mut bidding = Bidding::new(
            owner,
            input.title,
            input.description,
            input.bidding_number,
            input.bidding_type,
            input.estimated_value,
            schedule,
            now,
        )?;
        if let Some(is_public) = input.is_public {
            bidding.is_public = is_public;
        }
        bidding.requirements = input.requirements;
        bidding.evaluation_criteria = input.evaluation_criteria;

        self.repo.insert_bidding(&bidding).await?;

        tracing::info!(
            bidding_id = %bidding.id,
            bidding_number = %bidding.bidding_number,
            public_entity_id = %owner,
            created_by = %actor.user_id,
            "Bidding created"
        );
        Ok(bidding)
    }

    /// Hidden biddings read as not found to everyone but owner and admins
    pub async fn get(&self, actor: Option<&Actor>, id: BiddingId) -> BiddingResult<Bidding> {
        let bidding = self.load(id).await?;
        if !bidding.is_visible_to(actor) {
            return Err(BiddingError::not_found("Bidding", id));
        }
        Ok(bidding)
    }

    pub async fn list(&self, actor: Option<&Actor>, query: ListBiddingsQuery) -> BiddingResult<Vec<Bidding>> {
        let visibility = match actor {
            Some(a) if a.is_admin() => Visibility::All,
            Some(Actor {
                role: Role::PublicEntity,
                public_entity_id: Some(owner),
                ..
            }) => Visibility::PublicOr(*owner),
            _ => Visibility::PublicOnly,
        };

        let mut filter = BiddingFilter::new(visibility).page(query.page, query.per_page);
        filter.status = query.status;
        filter.public_entity_id = query.public_entity_id;

        self.repo.list_biddings(&filter).await
    }

    /// Content edits: DRAFT or PUBLISHED, and only while no proposal exists
    pub async fn update(&self, actor: &Actor, id: BiddingId, input: UpdateBiddingInput) -> BiddingResult<Bidding> {
        let mut bidding = self.load(id).await?;
        bidding.ensure_owner(actor)?;

        if !bidding.status.is_editable() {
            return Err(BiddingError::Validation(format!(
                "Cannot edit a bidding in status {}",
                bidding.status
            )));
        }
        if self.repo.count_proposals(id).await? > 0 {
            return Err(BiddingError::Validation(
                "Cannot edit a bidding that already has proposals".to_string(),
            ));
        }

        if input.opening_date.is_some() || input.closing_date.is_some() || input.delivery_deadline.is_some() {
            let current = bidding.schedule();
            let schedule = BiddingSchedule::new(
                input.opening_date.unwrap_or(current.opening_date),
                input.closing_date.unwrap_or(current.closing_date),
                input.delivery_deadline.unwrap_or(current.delivery_deadline),
            )?;
            bidding.set_schedule(schedule);
        }

        if let Some(title) = input.title {
            bidding.title = title.trim().to_string();
        }
        if let Some(description) = input.description {
            bidding.description = description.trim().to_string();
        }
        if let Some(bidding_type) = input.bidding_type {
            bidding.bidding_type = bidding_type;
        }
        if let Some(value) = input.estimated_value {
            bidding.estimated_value = value;
        }
        if let Some(is_public) = input.is_public {
            bidding.is_public = is_public;
        }
        if input.requirements.is_some() {
            bidding.requirements = input.requirements;
        }
        if input.evaluation_criteria.is_some() {
            bidding.evaluation_criteria = input.evaluation_criteria;
        }
        bidding.validate_fields()?;
        bidding.updated_at = self.clock.now();

        if !self.repo.update_bidding(&bidding, bidding.status).await? {
            return Err(BiddingError::Conflict(
                "Bidding changed while it was being edited".to_string(),
            ));
        }

        tracing::info!(bidding_id = %id, updated_by = %actor.user_id, "Bidding updated");
        Ok(bidding)
    }

    pub async fn publish(&self, actor: &Actor, id: BiddingId) -> BiddingResult<Bidding> {
        let mut bidding = self.load(id).await?;
        bidding.ensure_owner(actor)?;
        self.publish_loaded(actor, &mut bidding).await?;
        Ok(bidding)
    }

    pub async fn cancel(&self, actor: &Actor, id: BiddingId, reason: Option<String>) -> BiddingResult<Bidding> {
        let mut bidding = self.load(id).await?;
        bidding.ensure_owner(actor)?;
        self.cancel_loaded(actor, &mut bidding, reason).await?;
        Ok(bidding)
    }

    /// Only proposal-free, contract-free drafts
    pub async fn delete(&self, actor: &Actor, id: BiddingId) -> BiddingResult<()> {
        let bidding = self.load(id).await?;
        bidding.ensure_owner(actor)?;

        if bidding.status != BiddingStatus::Draft {
            return Err(BiddingError::Validation(format!(
                "Only DRAFT biddings can be deleted, this one is {}",
                bidding.status
            )));
        }
        if self.repo.count_proposals(id).await? > 0 || self.repo.contract_exists_for_bidding(id).await? {
            return Err(BiddingError::Validation(
                "Cannot delete a bidding with proposals or contracts".to_string(),
            ));
        }
        if !self.repo.delete_draft_bidding(id).await? {
            return Err(BiddingError::Conflict(
                "Bidding changed while it was being deleted".to_string(),
            ));
        }

        tracing::info!(bidding_id = %id, deleted_by = %actor.user_id, "Bidding deleted");
        Ok(())
    }

    /// Administrator branch of publish and cancel: same table, same guards
    pub async fn moderate(
        &self,
        actor: &Actor,
        id: BiddingId,
        action: ModerationAction,
        reason: Option<String>,
    ) -> BiddingResult<Bidding> {
        if !actor.is_admin() {
            return Err(BiddingError::Forbidden(
                "Only administrators may moderate biddings".to_string(),
            ));
        }

        let mut bidding = self.load(id).await?;
        match action {
            ModerationAction::Publish => self.publish_loaded(actor, &mut bidding).await?,
            ModerationAction::Cancel => self.cancel_loaded(actor, &mut bidding, reason).await?,
        }

        tracing::info!(
            bidding_id = %id,
            action = ?action,
            moderator = %actor.user_id,
            "Bidding moderated"
        );
        Ok(bidding)
    }

    async fn publish_loaded(&self, actor: &Actor, bidding: &mut Bidding) -> BiddingResult<()> {
        let now = self.clock.now();
        let from = bidding.transition(BiddingEvent::Publish, now)?;
        self.persist_transition(bidding, from).await?;

        tracing::info!(bidding_id = %bidding.id, published_by = %actor.user_id, "Bidding published");

        dispatch(
            self.notifier.as_ref(),
            Notification::new(
                NotificationKind::BiddingPublished,
                NotificationTarget::Role(Role::Supplier),
                json!({
                    "biddingId": bidding.id,
                    "biddingNumber": bidding.bidding_number,
                    "title": bidding.title,
                    "openingDate": bidding.opening_date,
                    "closingDate": bidding.closing_date,
                }),
                now,
            ),
        )
        .await;
        Ok(())
    }

    async fn cancel_loaded(&self, actor: &Actor, bidding: &mut Bidding, reason: Option<String>) -> BiddingResult<()> {
        let now = self.clock.now();
        let from = bidding.transition(BiddingEvent::Cancel, now)?;
        self.persist_transition(bidding, from).await?;

        tracing::info!(
            bidding_id = %bidding.id,
            from = %from,
            cancelled_by = %actor.user_id,
            "Bidding cancelled"
        );

        let suppliers = match self.repo.supplier_ids_for_bidding(bidding.id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, bidding_id = %bidding.id, "Could not resolve participants");
                Vec::new()
            }
        };
        for supplier_id in suppliers {
            dispatch(
                self.notifier.as_ref(),
                Notification::new(
                    NotificationKind::BiddingCancelled,
                    NotificationTarget::Supplier(supplier_id),
                    json!({
                        "biddingId": bidding.id,
                        "biddingNumber": bidding.bidding_number,
                        "reason": reason,
                    }),
                    now,
                ),
            )
            .await;
        }
        Ok(())
    }

    async fn persist_transition(&self, bidding: &Bidding, from: BiddingStatus) -> BiddingResult<()> {
        if self.repo.update_bidding_status(bidding, from).await? {
            Ok(())
        } else {
            Err(BiddingError::Conflict(format!(
                "Bidding {} is no longer {from}",
                bidding.bidding_number
            )))
        }
    }

    async fn load(&self, id: BiddingId) -> BiddingResult<Bidding> {
        self.repo
            .find_bidding(id)
            .await?
            .ok_or_else(|| BiddingError::not_found("Bidding", id))
    }
}
