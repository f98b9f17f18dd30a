//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{BiddingId, ContractId, ProposalId, PublicEntityId, SupplierId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::{
    CreateBiddingInput, CreateProposalInput, ListBiddingsQuery, ModerationAction,
    ProposalItemInput, UpdateBiddingInput, UpdateProposalInput,
};
use crate::domain::entity::{Bidding, Contract, Proposal, ProposalItem};
use crate::domain::value_object::{BiddingStatus, BiddingType, ContractStatus, ProposalStatus};

// ============================================================================
// Biddings
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBiddingRequest {
    pub public_entity_id: Option<PublicEntityId>,
    pub title: String,
    pub description: String,
    pub bidding_number: String,
    #[serde(rename = "type")]
    pub bidding_type: BiddingType,
    pub estimated_value: Decimal,
    pub opening_date: DateTime<Utc>,
    pub closing_date: DateTime<Utc>,
    pub delivery_deadline: DateTime<Utc>,
    pub is_public: Option<bool>,
    pub requirements: Option<String>,
    pub evaluation_criteria: Option<String>,
}

impl From<CreateBiddingRequest> for CreateBiddingInput {
    fn from(req: CreateBiddingRequest) -> Self {
        Self {
            public_entity_id: req.public_entity_id,
            title: req.title,
            description: req.description,
            bidding_number: req.bidding_number,
            bidding_type: req.bidding_type,
            estimated_value: req.estimated_value,
            opening_date: req.opening_date,
            closing_date: req.closing_date,
            delivery_deadline: req.delivery_deadline,
            is_public: req.is_public,
            requirements: req.requirements,
            evaluation_criteria: req.evaluation_criteria,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBiddingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub bidding_type: Option<BiddingType>,
    pub estimated_value: Option<Decimal>,
    pub opening_date: Option<DateTime<Utc>>,
    pub closing_date: Option<DateTime<Utc>>,
    pub delivery_deadline: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
    pub requirements: Option<String>,
    pub evaluation_criteria: Option<String>,
}

impl From<UpdateBiddingRequest> for UpdateBiddingInput {
    fn from(req: UpdateBiddingRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            bidding_type: req.bidding_type,
            estimated_value: req.estimated_value,
            opening_date: req.opening_date,
            closing_date: req.closing_date,
            delivery_deadline: req.delivery_deadline,
            is_public: req.is_public,
            requirements: req.requirements,
            evaluation_criteria: req.evaluation_criteria,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBiddingsParams {
    pub status: Option<BiddingStatus>,
    pub public_entity_id: Option<PublicEntityId>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<ListBiddingsParams> for ListBiddingsQuery {
    fn from(params: ListBiddingsParams) -> Self {
        Self {
            status: params.status,
            public_entity_id: params.public_entity_id,
            page: params.page,
            per_page: params.per_page,
        }
    }
}

/// `?reason=` on cancel and reject
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateRequest {
    pub action: ModerationAction,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiddingResponse {
    pub id: BiddingId,
    pub public_entity_id: PublicEntityId,
    pub title: String,
    pub description: String,
    pub bidding_number: String,
    #[serde(rename = "type")]
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bidding> for BiddingResponse {
    fn from(b: Bidding) -> Self {
        Self {
            id: b.id,
            public_entity_id: b.public_entity_id,
            title: b.title,
            description: b.description,
            bidding_number: b.bidding_number,
            bidding_type: b.bidding_type,
            status: b.status,
            estimated_value: b.estimated_value,
            opening_date: b.opening_date,
            closing_date: b.closing_date,
            delivery_deadline: b.delivery_deadline,
            is_public: b.is_public,
            requirements: b.requirements,
            evaluation_criteria: b.evaluation_criteria,
            published_at: b.published_at,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

// ============================================================================
// Proposals
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalItemRequest {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl From<ProposalItemRequest> for ProposalItemInput {
    fn from(req: ProposalItemRequest) -> Self {
        Self {
            description: req.description,
            quantity: req.quantity,
            unit_price: req.unit_price,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalRequest {
    #[serde(default)]
    pub items: Vec<ProposalItemRequest>,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl CreateProposalRequest {
    pub fn into_input(self, bidding_id: BiddingId) -> CreateProposalInput {
        CreateProposalInput {
            bidding_id,
            items: self.items.into_iter().map(Into::into).collect(),
            valid_until: self.valid_until,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProposalRequest {
    pub items: Option<Vec<ProposalItemRequest>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<UpdateProposalRequest> for UpdateProposalInput {
    fn from(req: UpdateProposalRequest) -> Self {
        Self {
            items: req
                .items
                .map(|items| items.into_iter().map(Into::into).collect()),
            valid_until: req.valid_until,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalItemResponse {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl From<ProposalItem> for ProposalItemResponse {
    fn from(item: ProposalItem) -> Self {
        Self {
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalResponse {
    pub id: ProposalId,
    pub bidding_id: BiddingId,
    pub supplier_id: SupplierId,
    pub total_value: Decimal,
    pub status: ProposalStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub items: Vec<ProposalItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Proposal> for ProposalResponse {
    fn from(p: Proposal) -> Self {
        Self {
            id: p.id,
            bidding_id: p.bidding_id,
            supplier_id: p.supplier_id,
            total_value: p.total_value,
            status: p.status,
            submitted_at: p.submitted_at,
            valid_until: p.valid_until,
            notes: p.notes,
            items: p.items.into_iter().map(Into::into).collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptProposalResponse {
    pub proposal: ProposalResponse,
    pub bidding: BiddingResponse,
}

// ============================================================================
// Contracts
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    pub proposal_id: ProposalId,
    pub contract_number: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractResponse {
    pub id: ContractId,
    pub bidding_id: BiddingId,
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

impl From<Contract> for ContractResponse {
    fn from(c: Contract) -> Self {
        Self {
            id: c.id,
            bidding_id: c.bidding_id,
            proposal_id: c.proposal_id,
            public_entity_id: c.public_entity_id,
            supplier_id: c.supplier_id,
            contract_number: c.contract_number,
            total_value: c.total_value,
            start_date: c.start_date,
            end_date: c.end_date,
            status: c.status,
            signed_at: c.signed_at,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
