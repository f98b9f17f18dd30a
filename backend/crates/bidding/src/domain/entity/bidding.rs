//! Bidding Entity
//!
//! A procurement opportunity owned by one public entity. Status only moves
//! through [`Bidding::transition`], which pairs the transition table with the
//! date guards of each event.

use chrono::{DateTime, Utc};
use kernel::actor::Actor;
use kernel::id::{BiddingId, PublicEntityId};
use rust_decimal::Decimal;

use crate::domain::value_object::{BiddingEvent, BiddingStatus, BiddingType, amount};
use crate::error::{BiddingError, BiddingResult};

/// The three dates that must stay strictly ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiddingSchedule {
    pub opening_date: DateTime<Utc>,
    pub closing_date: DateTime<Utc>,
    pub delivery_deadline: DateTime<Utc>,
}

impl BiddingSchedule {
    pub fn new(
        opening_date: DateTime<Utc>,
        closing_date: DateTime<Utc>,
        delivery_deadline: DateTime<Utc>,
    ) -> BiddingResult<Self> {
        if opening_date >= closing_date {
            return Err(BiddingError::Validation(
                "openingDate must be before closingDate".to_string(),
            ));
        }
        if closing_date >= delivery_deadline {
            return Err(BiddingError::Validation(
                "closingDate must be before deliveryDeadline".to_string(),
            ));
        }
        Ok(Self {
            opening_date,
            closing_date,
            delivery_deadline,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bidding {
    pub id: BiddingId,
    pub public_entity_id: PublicEntityId,
    pub title: String,
    pub description: String,
    /// Globally unique
    pub bidding_number: String,
    pub bidding_type: BiddingType,
    pub status: BiddingStatus,
    pub estimated_value: Decimal,
    pub opening_date: DateTime<Utc>,
    pub closing_date: DateTime<Utc>,
    pub delivery_deadline: DateTime<Utc>,
    pub is_public: bool,
    pub requirements: Option<String>,
    pub evaluation_criteria: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub closing_reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bidding {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        public_entity_id: PublicEntityId,
        title: String,
        description: String,
        bidding_number: String,
        bidding_type: BiddingType,
        estimated_value: Decimal,
        schedule: BiddingSchedule,
        now: DateTime<Utc>,
    ) -> BiddingResult<Self> {
        let bidding = Self {
            id: BiddingId::new(),
            public_entity_id,
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            bidding_number: bidding_number.trim().to_string(),
            bidding_type,
            status: BiddingStatus::Draft,
            estimated_value,
            opening_date: schedule.opening_date,
            closing_date: schedule.closing_date,
            delivery_deadline: schedule.delivery_deadline,
            is_public: true,
            requirements: None,
            evaluation_criteria: None,
            published_at: None,
            closing_reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        };
        bidding.validate_fields()?;
        Ok(bidding)
    }

    pub fn schedule(&self) -> BiddingSchedule {
        BiddingSchedule {
            opening_date: self.opening_date,
            closing_date: self.closing_date,
            delivery_deadline: self.delivery_deadline,
        }
    }

    pub fn set_schedule(&mut self, schedule: BiddingSchedule) {
        self.opening_date = schedule.opening_date;
        self.closing_date = schedule.closing_date;
        self.delivery_deadline = schedule.delivery_deadline;
    }

    /// Required text is non-blank and the estimate is a positive storable amount
    pub fn validate_fields(&self) -> BiddingResult<()> {
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("biddingNumber", &self.bidding_number),
        ] {
            if value.trim().is_empty() {
                return Err(BiddingError::Validation(format!("{field} is required")));
            }
        }
        if self.estimated_value <= Decimal::ZERO {
            return Err(BiddingError::Validation(
                "estimatedValue must be greater than zero".to_string(),
            ));
        }
        amount::MONEY.ensure("estimatedValue", self.estimated_value)
    }

    /// ADMIN, or the PUBLIC_ENTITY linked to the owner
    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        actor.owns_public_entity(self.public_entity_id)
    }

    pub fn ensure_owner(&self, actor: &Actor) -> BiddingResult<()> {
        if self.is_owned_by(actor) {
            Ok(())
        } else {
            Err(BiddingError::Forbidden(format!(
                "Only the owning public entity or an administrator may modify bidding {}",
                self.bidding_number
            )))
        }
    }

    /// Public biddings are visible to everyone, the rest to owner and admins
    pub fn is_visible_to(&self, actor: Option<&Actor>) -> bool {
        self.is_public || actor.is_some_and(|a| self.is_owned_by(a))
    }

    /// Closed for new or changed proposals at `now`
    pub fn accepts_proposals(&self, now: DateTime<Utc>) -> bool {
        self.status == BiddingStatus::Open && now < self.closing_date
    }

    /// The guarded transition: table row plus the event's time guard.
    /// Returns the previous status for the conditional store update.
    pub fn transition(&mut self, event: BiddingEvent, now: DateTime<Utc>) -> BiddingResult<BiddingStatus> {
        let from = self.status;
        let to = from.apply(event)?;

        match event {
            BiddingEvent::Publish if self.opening_date <= now => {
                return Err(BiddingError::Validation(
                    "openingDate must be in the future to publish".to_string(),
                ));
            }
            BiddingEvent::Open if now < self.opening_date => {
                return Err(BiddingError::Validation(
                    "Bidding cannot open before its openingDate".to_string(),
                ));
            }
            BiddingEvent::Close if now < self.closing_date => {
                return Err(BiddingError::Validation(
                    "Bidding cannot close before its closingDate".to_string(),
                ));
            }
            _ => {}
        }

        if event == BiddingEvent::Publish {
            self.published_at = Some(now);
        }
        self.status = to;
        self.updated_at = now;
        Ok(from)
    }
}
