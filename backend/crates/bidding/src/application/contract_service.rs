//! Contract Service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::actor::Actor;
use kernel::id::{BiddingId, ContractId, ProposalId};
use platform::clock::Clock;
use serde_json::json;

use crate::application::notify::dispatch;
use crate::domain::entity::{Contract, Notification, NotificationKind, NotificationTarget};
use crate::domain::repository::{BiddingStore, Notifier};
use crate::domain::value_object::{ContractEvent, ContractStatus};
use crate::error::{BiddingError, BiddingResult};

pub struct CreateContractInput {
    pub proposal_id: ProposalId,
    pub contract_number: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

pub struct ContractService<R, N>
where
    R: BiddingStore,
    N: Notifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<R, N> ContractService<R, N>
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

    pub async fn create(&self, actor: &Actor, input: CreateContractInput) -> BiddingResult<Contract> {
        let proposal = self
            .repo
            .find_proposal(input.proposal_id)
            .await?
            .ok_or_else(|| BiddingError::not_found("Proposal", input.proposal_id))?;
        let bidding = self
            .repo
            .find_bidding(proposal.bidding_id)
            .await?
            .ok_or_else(|| BiddingError::not_found("Bidding", proposal.bidding_id))?;
        bidding.ensure_owner(actor)?;

        if self.repo.contract_exists_for_proposal(proposal.id).await? {
            return Err(BiddingError::Conflict(
                "A contract already exists for this proposal".to_string(),
            ));
        }

        let now = self.clock.now();
        let contract = Contract::from_accepted(
            &bidding,
            &proposal,
            input.contract_number,
            input.start_date,
            input.end_date,
            now,
        )?;
        self.repo.insert_contract(&contract).await?;

        tracing::info!(
            contract_id = %contract.id,
            contract_number = %contract.contract_number,
            proposal_id = %proposal.id,
            total_value = %contract.total_value,
            "Contract created"
        );

        dispatch(
            self.notifier.as_ref(),
            Notification::new(
                NotificationKind::ContractCreated,
                NotificationTarget::Supplier(contract.supplier_id),
                json!({
                    "contractId": contract.id,
                    "contractNumber": contract.contract_number,
                    "biddingId": bidding.id,
                }),
                now,
            ),
        )
        .await;

        Ok(contract)
    }

    pub async fn get(&self, actor: &Actor, id: ContractId) -> BiddingResult<Contract> {
        let contract = self.load(id).await?;
        if contract.is_party(actor) {
            Ok(contract)
        } else {
            Err(BiddingError::Forbidden(
                "Not allowed to view this contract".to_string(),
            ))
        }
    }

    pub async fn list_for_bidding(&self, actor: &Actor, bidding_id: BiddingId) -> BiddingResult<Vec<Contract>> {
        let contracts = self.repo.list_contracts(bidding_id).await?;
        Ok(contracts.into_iter().filter(|c| c.is_party(actor)).collect())
    }

    /// Either party may sign; activation then needs the owner
    pub async fn sign(&self, actor: &Actor, id: ContractId) -> BiddingResult<Contract> {
        let mut contract = self.load(id).await?;
        if !contract.is_party(actor) {
            return Err(BiddingError::Forbidden(
                "Only a contract party may sign it".to_string(),
            ));
        }

        contract.sign(self.clock.now())?;
        if !self.repo.sign_contract(&contract).await? {
            return Err(BiddingError::Conflict(format!(
                "Contract {} was signed or changed concurrently",
                contract.contract_number
            )));
        }

        tracing::info!(contract_id = %id, signed_by = %actor.user_id, "Contract signed");
        Ok(contract)
    }

    pub async fn activate(&self, actor: &Actor, id: ContractId) -> BiddingResult<Contract> {
        self.transition(actor, id, ContractEvent::Activate).await
    }

    pub async fn suspend(&self, actor: &Actor, id: ContractId) -> BiddingResult<Contract> {
        self.transition(actor, id, ContractEvent::Suspend).await
    }

    pub async fn complete(&self, actor: &Actor, id: ContractId) -> BiddingResult<Contract> {
        self.transition(actor, id, ContractEvent::Complete).await
    }

    pub async fn terminate(&self, actor: &Actor, id: ContractId) -> BiddingResult<Contract> {
        self.transition(actor, id, ContractEvent::Terminate).await
    }

    async fn transition(&self, actor: &Actor, id: ContractId, event: ContractEvent) -> BiddingResult<Contract> {
        let mut contract = self.load(id).await?;
        contract.ensure_owner(actor)?;

        let from = contract.transition(event, self.clock.now())?;
        self.persist(&contract, from).await?;

        tracing::info!(
            contract_id = %id,
            from = %from,
            to = %contract.status,
            by = %actor.user_id,
            "Contract status changed"
        );
        Ok(contract)
    }

    async fn persist(&self, contract: &Contract, from: ContractStatus) -> BiddingResult<()> {
        if self.repo.update_contract(contract, from).await? {
            Ok(())
        } else {
            Err(BiddingError::Conflict(format!(
                "Contract {} is no longer {from}",
                contract.contract_number
            )))
        }
    }

    async fn load(&self, id: ContractId) -> BiddingResult<Contract> {
        self.repo
            .find_contract(id)
            .await?
            .ok_or_else(|| BiddingError::not_found("Contract", id))
    }
}
