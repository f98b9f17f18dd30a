//! HTTP Handlers
//!
//! Thin adapters: parse, call one service operation, shape the response.
//! Role and permission gates are route layers (see `router`); ownership and
//! state guards live in the services.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::actor::{Actor, MaybeActor};
use kernel::id::{BiddingId, ContractId, ProposalId};
use platform::clock::Clock;
use std::sync::Arc;

use crate::application::{BiddingService, ContractService, CreateContractInput, ProposalService};
use crate::domain::repository::{BiddingStore, Notifier};
use crate::error::BiddingResult;
use crate::presentation::dto::{
    AcceptProposalResponse, BiddingResponse, ContractResponse, CreateBiddingRequest,
    CreateContractRequest, CreateProposalRequest, ListBiddingsParams, ModerateRequest,
    ProposalResponse, ReasonRequest, UpdateBiddingRequest, UpdateProposalRequest,
};

/// Shared state for the lifecycle handlers
pub struct BiddingAppState<R, N>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub notifier: Arc<N>,
    pub clock: Arc<dyn Clock>,
}

impl<R, N> BiddingAppState<R, N>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            notifier,
            clock,
        }
    }

    pub fn biddings(&self) -> BiddingService<R, N> {
        BiddingService::new(self.repo.clone(), self.notifier.clone(), self.clock.clone())
    }

    pub fn proposals(&self) -> ProposalService<R, N> {
        ProposalService::new(self.repo.clone(), self.notifier.clone(), self.clock.clone())
    }

    pub fn contracts(&self) -> ContractService<R, N> {
        ContractService::new(self.repo.clone(), self.notifier.clone(), self.clock.clone())
    }
}

impl<R, N> Clone for BiddingAppState<R, N>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            notifier: self.notifier.clone(),
            clock: self.clock.clone(),
        }
    }
}

// ============================================================================
// Biddings
// ============================================================================

/// GET /api/biddings
pub async fn list_biddings<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    MaybeActor(actor): MaybeActor,
    Query(params): Query<ListBiddingsParams>,
) -> BiddingResult<Json<Vec<BiddingResponse>>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let biddings = state.biddings().list(actor.as_ref(), params.into()).await?;
    Ok(Json(biddings.into_iter().map(Into::into).collect()))
}

/// POST /api/biddings
pub async fn create_bidding<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Json(req): Json<CreateBiddingRequest>,
) -> BiddingResult<impl IntoResponse>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let bidding = state.biddings().create(&actor, req.into()).await?;
    Ok((StatusCode::CREATED, Json(BiddingResponse::from(bidding))))
}

/// GET /api/biddings/{id}
pub async fn get_bidding<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    MaybeActor(actor): MaybeActor,
    Path(id): Path<BiddingId>,
) -> BiddingResult<Json<BiddingResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let bidding = state.biddings().get(actor.as_ref(), id).await?;
    Ok(Json(bidding.into()))
}

/// PATCH /api/biddings/{id}
pub async fn update_bidding<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<BiddingId>,
    Json(req): Json<UpdateBiddingRequest>,
) -> BiddingResult<Json<BiddingResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let bidding = state.biddings().update(&actor, id, req.into()).await?;
    Ok(Json(bidding.into()))
}

/// DELETE /api/biddings/{id}
pub async fn delete_bidding<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<BiddingId>,
) -> BiddingResult<StatusCode>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    state.biddings().delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/biddings/{id}/publish
pub async fn publish_bidding<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<BiddingId>,
) -> BiddingResult<Json<BiddingResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let bidding = state.biddings().publish(&actor, id).await?;
    Ok(Json(bidding.into()))
}

/// POST /api/biddings/{id}/cancel?reason=
pub async fn cancel_bidding<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<BiddingId>,
    Query(req): Query<ReasonRequest>,
) -> BiddingResult<Json<BiddingResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let bidding = state.biddings().cancel(&actor, id, req.reason).await?;
    Ok(Json(bidding.into()))
}

/// POST /api/biddings/{id}/moderate
pub async fn moderate_bidding<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<BiddingId>,
    Json(req): Json<ModerateRequest>,
) -> BiddingResult<Json<BiddingResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let bidding = state
        .biddings()
        .moderate(&actor, id, req.action, req.reason)
        .await?;
    Ok(Json(bidding.into()))
}

// ============================================================================
// Proposals
// ============================================================================

/// GET /api/biddings/{id}/proposals
pub async fn list_proposals<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(bidding_id): Path<BiddingId>,
) -> BiddingResult<Json<Vec<ProposalResponse>>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let proposals = state.proposals().list_for_bidding(&actor, bidding_id).await?;
    Ok(Json(proposals.into_iter().map(Into::into).collect()))
}

/// POST /api/biddings/{id}/proposals
pub async fn create_proposal<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(bidding_id): Path<BiddingId>,
    Json(req): Json<CreateProposalRequest>,
) -> BiddingResult<impl IntoResponse>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let proposal = state
        .proposals()
        .create(&actor, req.into_input(bidding_id))
        .await?;
    Ok((StatusCode::CREATED, Json(ProposalResponse::from(proposal))))
}

/// GET /api/proposals/{id}
pub async fn get_proposal<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ProposalId>,
) -> BiddingResult<Json<ProposalResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let proposal = state.proposals().get(&actor, id).await?;
    Ok(Json(proposal.into()))
}

/// PATCH /api/proposals/{id}
pub async fn update_proposal<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ProposalId>,
    Json(req): Json<UpdateProposalRequest>,
) -> BiddingResult<Json<ProposalResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let proposal = state.proposals().update(&actor, id, req.into()).await?;
    Ok(Json(proposal.into()))
}

/// DELETE /api/proposals/{id}
pub async fn delete_proposal<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ProposalId>,
) -> BiddingResult<StatusCode>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    state.proposals().delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/proposals/{id}/submit
pub async fn submit_proposal<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ProposalId>,
) -> BiddingResult<Json<ProposalResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let proposal = state.proposals().submit(&actor, id).await?;
    Ok(Json(proposal.into()))
}

/// POST /api/proposals/{id}/withdraw
pub async fn withdraw_proposal<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ProposalId>,
) -> BiddingResult<Json<ProposalResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let proposal = state.proposals().withdraw(&actor, id).await?;
    Ok(Json(proposal.into()))
}

/// POST /api/proposals/{id}/evaluate
pub async fn evaluate_proposal<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ProposalId>,
) -> BiddingResult<Json<ProposalResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let proposal = state.proposals().evaluate(&actor, id).await?;
    Ok(Json(proposal.into()))
}

/// POST /api/proposals/{id}/accept
pub async fn accept_proposal<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ProposalId>,
) -> BiddingResult<Json<AcceptProposalResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let (proposal, bidding) = state.proposals().accept(&actor, id).await?;
    Ok(Json(AcceptProposalResponse {
        proposal: proposal.into(),
        bidding: bidding.into(),
    }))
}

/// POST /api/proposals/{id}/reject?reason=
pub async fn reject_proposal<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ProposalId>,
    Query(req): Query<ReasonRequest>,
) -> BiddingResult<Json<ProposalResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let proposal = state.proposals().reject(&actor, id, req.reason).await?;
    Ok(Json(proposal.into()))
}

// ============================================================================
// Contracts
// ============================================================================

/// POST /api/contracts
pub async fn create_contract<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Json(req): Json<CreateContractRequest>,
) -> BiddingResult<impl IntoResponse>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let input = CreateContractInput {
        proposal_id: req.proposal_id,
        contract_number: req.contract_number,
        start_date: req.start_date,
        end_date: req.end_date,
    };
    let contract = state.contracts().create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(ContractResponse::from(contract))))
}

/// GET /api/biddings/{id}/contracts
pub async fn list_contracts<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(bidding_id): Path<BiddingId>,
) -> BiddingResult<Json<Vec<ContractResponse>>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let contracts = state.contracts().list_for_bidding(&actor, bidding_id).await?;
    Ok(Json(contracts.into_iter().map(Into::into).collect()))
}

/// GET /api/contracts/{id}
pub async fn get_contract<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ContractId>,
) -> BiddingResult<Json<ContractResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let contract = state.contracts().get(&actor, id).await?;
    Ok(Json(contract.into()))
}

/// POST /api/contracts/{id}/sign
pub async fn sign_contract<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ContractId>,
) -> BiddingResult<Json<ContractResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let contract = state.contracts().sign(&actor, id).await?;
    Ok(Json(contract.into()))
}

/// POST /api/contracts/{id}/activate
pub async fn activate_contract<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ContractId>,
) -> BiddingResult<Json<ContractResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let contract = state.contracts().activate(&actor, id).await?;
    Ok(Json(contract.into()))
}

/// POST /api/contracts/{id}/suspend
pub async fn suspend_contract<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ContractId>,
) -> BiddingResult<Json<ContractResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let contract = state.contracts().suspend(&actor, id).await?;
    Ok(Json(contract.into()))
}

/// POST /api/contracts/{id}/complete
pub async fn complete_contract<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ContractId>,
) -> BiddingResult<Json<ContractResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let contract = state.contracts().complete(&actor, id).await?;
    Ok(Json(contract.into()))
}

/// POST /api/contracts/{id}/terminate
pub async fn terminate_contract<R, N>(
    State(state): State<BiddingAppState<R, N>>,
    actor: Actor,
    Path(id): Path<ContractId>,
) -> BiddingResult<Json<ContractResponse>>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let contract = state.contracts().terminate(&actor, id).await?;
    Ok(Json(contract.into()))
}
