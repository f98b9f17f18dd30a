//! Repository Traits
//!
//! Persistence ports for the lifecycle engine. Status writes are conditional
//! on the status the entity was read with, so a concurrent transition makes
//! the second writer observe `false` instead of overwriting.

use chrono::{DateTime, Utc};
use kernel::id::{BiddingId, ContractId, ProposalId, PublicEntityId, SupplierId};

use crate::domain::entity::{Bidding, Contract, Notification, Proposal};
use crate::domain::value_object::{BiddingStatus, ContractStatus, ProposalStatus};
use crate::error::BiddingResult;

/// Which non-public biddings a listing may include
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Administrators
    All,
    /// Public biddings plus those owned by this entity
    PublicOr(PublicEntityId),
    PublicOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiddingFilter {
    pub status: Option<BiddingStatus>,
    pub public_entity_id: Option<PublicEntityId>,
    pub visibility: Visibility,
    pub limit: i64,
    pub offset: i64,
}

impl BiddingFilter {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(visibility: Visibility) -> Self {
        Self {
            status: None,
            public_entity_id: None,
            visibility,
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Page numbers start at 1
    pub fn page(mut self, page: Option<u32>, per_page: Option<u32>) -> Self {
        let limit = per_page
            .map(i64::from)
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        let page = i64::from(page.unwrap_or(1).max(1));
        self.limit = limit;
        self.offset = (page - 1) * limit;
        self
    }

    pub fn matches(&self, bidding: &Bidding) -> bool {
        let visible = match self.visibility {
            Visibility::All => true,
            Visibility::PublicOr(owner) => bidding.is_public || bidding.public_entity_id == owner,
            Visibility::PublicOnly => bidding.is_public,
        };
        visible
            && self.status.is_none_or(|s| bidding.status == s)
            && self
                .public_entity_id
                .is_none_or(|owner| bidding.public_entity_id == owner)
    }
}

#[trait_variant::make(BiddingRepository: Send)]
pub trait LocalBiddingRepository {
    /// Conflict when the bidding number is taken
    async fn insert_bidding(&self, bidding: &Bidding) -> BiddingResult<()>;

    async fn find_bidding(&self, id: BiddingId) -> BiddingResult<Option<Bidding>>;

    /// Newest first
    async fn list_biddings(&self, filter: &BiddingFilter) -> BiddingResult<Vec<Bidding>>;

    /// Field edits; `false` when the status moved since it was read
    async fn update_bidding(&self, bidding: &Bidding, expected: BiddingStatus) -> BiddingResult<bool>;

    /// Status-scoped write of a transition result
    async fn update_bidding_status(&self, bidding: &Bidding, from: BiddingStatus) -> BiddingResult<bool>;

    /// Deletes only a DRAFT bidding without proposals or contracts
    async fn delete_draft_bidding(&self, id: BiddingId) -> BiddingResult<bool>;

    /// PUBLISHED with openingDate ≤ now
    async fn find_due_for_opening(&self, now: DateTime<Utc>) -> BiddingResult<Vec<Bidding>>;

    /// OPEN with closingDate ≤ now
    async fn find_due_for_closing(&self, now: DateTime<Utc>) -> BiddingResult<Vec<Bidding>>;

    /// OPEN, closing in `(now, until]`, not yet reminded
    async fn find_closing_soon(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BiddingResult<Vec<Bidding>>;

    /// `false` when another sweep already stamped it
    async fn mark_reminder_sent(&self, id: BiddingId, at: DateTime<Utc>) -> BiddingResult<bool>;

    async fn count_proposals(&self, id: BiddingId) -> BiddingResult<i64>;

    async fn public_entity_exists(&self, id: PublicEntityId) -> BiddingResult<bool>;
}

#[trait_variant::make(ProposalRepository: Send)]
pub trait LocalProposalRepository {
    /// Conflict when the supplier already has a proposal for the bidding
    async fn insert_proposal(&self, proposal: &Proposal) -> BiddingResult<()>;

    async fn find_proposal(&self, id: ProposalId) -> BiddingResult<Option<Proposal>>;

    async fn list_proposals(
        &self,
        bidding_id: BiddingId,
        supplier_id: Option<SupplierId>,
    ) -> BiddingResult<Vec<Proposal>>;

    /// Items and fields of a DRAFT proposal; `false` when it left DRAFT
    async fn update_proposal(&self, proposal: &Proposal) -> BiddingResult<bool>;

    async fn update_proposal_status(&self, proposal: &Proposal, from: ProposalStatus) -> BiddingResult<bool>;

    /// One transaction: proposal UNDER_REVIEW → ACCEPTED and bidding
    /// CLOSED → AWARDED. Conflict and rollback when either row moved.
    async fn accept_and_award(&self, proposal: &Proposal, bidding: &Bidding) -> BiddingResult<()>;

    /// Deletes only a DRAFT proposal no contract references
    async fn delete_draft_proposal(&self, id: ProposalId) -> BiddingResult<bool>;

    /// Suppliers holding any non-DRAFT proposal on the bidding
    async fn supplier_ids_for_bidding(&self, bidding_id: BiddingId) -> BiddingResult<Vec<SupplierId>>;

    async fn supplier_exists(&self, id: SupplierId) -> BiddingResult<bool>;
}

#[trait_variant::make(ContractRepository: Send)]
pub trait LocalContractRepository {
    /// Conflict on a duplicate contract number or proposal
    async fn insert_contract(&self, contract: &Contract) -> BiddingResult<()>;

    async fn find_contract(&self, id: ContractId) -> BiddingResult<Option<Contract>>;

    async fn list_contracts(&self, bidding_id: BiddingId) -> BiddingResult<Vec<Contract>>;

    /// Records the signature on a DRAFT contract nobody has signed yet
    async fn sign_contract(&self, contract: &Contract) -> BiddingResult<bool>;

    /// Status-scoped write of a transition
    async fn update_contract(&self, contract: &Contract, from: ContractStatus) -> BiddingResult<bool>;

    async fn contract_exists_for_proposal(&self, id: ProposalId) -> BiddingResult<bool>;

    async fn contract_exists_for_bidding(&self, id: BiddingId) -> BiddingResult<bool>;
}

/// Notification sink. Callers log failures and carry on.
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    async fn notify(&self, notification: Notification) -> BiddingResult<()>;

    /// Delete read notifications older than `before`
    async fn purge_read(&self, before: DateTime<Utc>) -> BiddingResult<u64>;
}

/// Everything the lifecycle services persist through
pub trait BiddingStore:
    BiddingRepository + ProposalRepository + ContractRepository + Send + Sync + 'static
{
}

impl<T> BiddingStore for T where
    T: BiddingRepository + ProposalRepository + ContractRepository + Send + Sync + 'static
{
}
