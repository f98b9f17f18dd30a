//! Unit tests for Bidding crate

#[cfg(test)]
mod support {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, Utc};
    use kernel::actor::{Actor, Permission, Role};
    use kernel::id::{BiddingId, ContractId, ProposalId, PublicEntityId, SupplierId, UserId};
    use platform::clock::{Clock, ManualClock};
    use rust_decimal::Decimal;

    use crate::application::{
        BiddingConfig, CreateBiddingInput, CreateProposalInput, ProposalItemInput, Scheduler,
    };
    use crate::domain::entity::{Bidding, Contract, Notification, Proposal};
    use crate::domain::repository::{
        BiddingFilter, BiddingRepository, ContractRepository, Notifier, ProposalRepository,
    };
    use crate::domain::value_object::{
        BiddingStatus, BiddingType, ContractStatus, ProposalStatus,
    };
    use crate::error::{BiddingError, BiddingResult};
    use crate::presentation::BiddingAppState;

    #[derive(Default)]
    pub struct MemoryBiddingStore {
        pub biddings: Mutex<HashMap<BiddingId, Bidding>>,
        pub proposals: Mutex<HashMap<ProposalId, Proposal>>,
        pub contracts: Mutex<HashMap<ContractId, Contract>>,
        pub public_entities: Mutex<HashSet<PublicEntityId>>,
        pub suppliers: Mutex<HashSet<SupplierId>>,
        /// Status writes for this bidding fail with a store error
        pub broken_bidding: Mutex<Option<BiddingId>>,
    }

    impl MemoryBiddingStore {
        pub fn add_public_entity(&self) -> PublicEntityId {
            let id = PublicEntityId::new();
            self.public_entities.lock().unwrap().insert(id);
            id
        }

        pub fn add_supplier(&self) -> SupplierId {
            let id = SupplierId::new();
            self.suppliers.lock().unwrap().insert(id);
            id
        }

        pub fn bidding(&self, id: BiddingId) -> Bidding {
            self.biddings.lock().unwrap()[&id].clone()
        }

        pub fn proposal(&self, id: ProposalId) -> Proposal {
            self.proposals.lock().unwrap()[&id].clone()
        }

        pub fn contract(&self, id: ContractId) -> Contract {
            self.contracts.lock().unwrap()[&id].clone()
        }
    }

    impl BiddingRepository for MemoryBiddingStore {
        async fn insert_bidding(&self, bidding: &Bidding) -> BiddingResult<()> {
            let mut biddings = self.biddings.lock().unwrap();
            if biddings
                .values()
                .any(|b| b.bidding_number == bidding.bidding_number)
            {
                return Err(BiddingError::Conflict(
                    "Bidding number already exists".to_string(),
                ));
            }
            biddings.insert(bidding.id, bidding.clone());
            Ok(())
        }

        async fn find_bidding(&self, id: BiddingId) -> BiddingResult<Option<Bidding>> {
            Ok(self.biddings.lock().unwrap().get(&id).cloned())
        }

        async fn list_biddings(&self, filter: &BiddingFilter) -> BiddingResult<Vec<Bidding>> {
            let mut all: Vec<Bidding> = self
                .biddings
                .lock()
                .unwrap()
                .values()
                .filter(|b| filter.matches(b))
                .cloned()
                .collect();
            all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(all
                .into_iter()
                .skip(filter.offset as usize)
                .take(filter.limit as usize)
                .collect())
        }

        async fn update_bidding(&self, bidding: &Bidding, expected: BiddingStatus) -> BiddingResult<bool> {
            let mut biddings = self.biddings.lock().unwrap();
            match biddings.get_mut(&bidding.id) {
                Some(stored) if stored.status == expected => {
                    *stored = bidding.clone();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn update_bidding_status(&self, bidding: &Bidding, from: BiddingStatus) -> BiddingResult<bool> {
            if *self.broken_bidding.lock().unwrap() == Some(bidding.id) {
                return Err(BiddingError::Internal("store unavailable".to_string()));
            }
            let mut biddings = self.biddings.lock().unwrap();
            match biddings.get_mut(&bidding.id) {
                Some(stored) if stored.status == from => {
                    stored.status = bidding.status;
                    stored.published_at = bidding.published_at;
                    stored.updated_at = bidding.updated_at;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn delete_draft_bidding(&self, id: BiddingId) -> BiddingResult<bool> {
            let has_children = self.proposals.lock().unwrap().values().any(|p| p.bidding_id == id)
                || self.contracts.lock().unwrap().values().any(|c| c.bidding_id == id);
            let mut biddings = self.biddings.lock().unwrap();
            match biddings.get(&id) {
                Some(b) if b.status == BiddingStatus::Draft && !has_children => {
                    biddings.remove(&id);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn find_due_for_opening(&self, now: DateTime<Utc>) -> BiddingResult<Vec<Bidding>> {
            Ok(self
                .biddings
                .lock()
                .unwrap()
                .values()
                .filter(|b| b.status == BiddingStatus::Published && b.opening_date <= now)
                .cloned()
                .collect())
        }

        async fn find_due_for_closing(&self, now: DateTime<Utc>) -> BiddingResult<Vec<Bidding>> {
            Ok(self
                .biddings
                .lock()
                .unwrap()
                .values()
                .filter(|b| b.status == BiddingStatus::Open && b.closing_date <= now)
                .cloned()
                .collect())
        }

        async fn find_closing_soon(
            &self,
            now: DateTime<Utc>,
            until: DateTime<Utc>,
        ) -> BiddingResult<Vec<Bidding>> {
            Ok(self
                .biddings
                .lock()
                .unwrap()
                .values()
                .filter(|b| {
                    b.status == BiddingStatus::Open
                        && b.closing_reminder_sent_at.is_none()
                        && b.closing_date > now
                        && b.closing_date <= until
                })
                .cloned()
                .collect())
        }

        async fn mark_reminder_sent(&self, id: BiddingId, at: DateTime<Utc>) -> BiddingResult<bool> {
            let mut biddings = self.biddings.lock().unwrap();
            match biddings.get_mut(&id) {
                Some(b) if b.closing_reminder_sent_at.is_none() => {
                    b.closing_reminder_sent_at = Some(at);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn count_proposals(&self, id: BiddingId) -> BiddingResult<i64> {
            Ok(self
                .proposals
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.bidding_id == id)
                .count() as i64)
        }

        async fn public_entity_exists(&self, id: PublicEntityId) -> BiddingResult<bool> {
            Ok(self.public_entities.lock().unwrap().contains(&id))
        }
    }

    impl ProposalRepository for MemoryBiddingStore {
        async fn insert_proposal(&self, proposal: &Proposal) -> BiddingResult<()> {
            let mut proposals = self.proposals.lock().unwrap();
            if proposals
                .values()
                .any(|p| p.bidding_id == proposal.bidding_id && p.supplier_id == proposal.supplier_id)
            {
                return Err(BiddingError::Conflict(
                    "Supplier already has a proposal for this bidding".to_string(),
                ));
            }
            proposals.insert(proposal.id, proposal.clone());
            Ok(())
        }

        async fn find_proposal(&self, id: ProposalId) -> BiddingResult<Option<Proposal>> {
            Ok(self.proposals.lock().unwrap().get(&id).cloned())
        }

        async fn list_proposals(
            &self,
            bidding_id: BiddingId,
            supplier_id: Option<SupplierId>,
        ) -> BiddingResult<Vec<Proposal>> {
            Ok(self
                .proposals
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.bidding_id == bidding_id)
                .filter(|p| supplier_id.is_none_or(|s| p.supplier_id == s))
                .cloned()
                .collect())
        }

        async fn update_proposal(&self, proposal: &Proposal) -> BiddingResult<bool> {
            let mut proposals = self.proposals.lock().unwrap();
            match proposals.get_mut(&proposal.id) {
                Some(stored) if stored.status == ProposalStatus::Draft => {
                    *stored = proposal.clone();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn update_proposal_status(&self, proposal: &Proposal, from: ProposalStatus) -> BiddingResult<bool> {
            let mut proposals = self.proposals.lock().unwrap();
            match proposals.get_mut(&proposal.id) {
                Some(stored)
                    if stored.status == from
                        && (proposal.status != ProposalStatus::Submitted || !stored.items.is_empty()) =>
                {
                    stored.status = proposal.status;
                    stored.submitted_at = proposal.submitted_at;
                    stored.updated_at = proposal.updated_at;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn accept_and_award(&self, proposal: &Proposal, bidding: &Bidding) -> BiddingResult<()> {
            let mut proposals = self.proposals.lock().unwrap();
            let mut biddings = self.biddings.lock().unwrap();

            let proposal_ok = proposals
                .get(&proposal.id)
                .is_some_and(|p| p.status == ProposalStatus::UnderReview);
            let bidding_ok = biddings
                .get(&bidding.id)
                .is_some_and(|b| b.status == BiddingStatus::Closed);
            if !proposal_ok || !bidding_ok {
                return Err(BiddingError::Conflict("Acceptance lost the race".to_string()));
            }

            if let Some(p) = proposals.get_mut(&proposal.id) {
                p.status = ProposalStatus::Accepted;
                p.updated_at = proposal.updated_at;
            }
            if let Some(b) = biddings.get_mut(&bidding.id) {
                b.status = BiddingStatus::Awarded;
                b.updated_at = bidding.updated_at;
            }
            Ok(())
        }

        async fn delete_draft_proposal(&self, id: ProposalId) -> BiddingResult<bool> {
            let referenced = self.contracts.lock().unwrap().values().any(|c| c.proposal_id == id);
            let mut proposals = self.proposals.lock().unwrap();
            match proposals.get(&id) {
                Some(p) if p.status == ProposalStatus::Draft && !referenced => {
                    proposals.remove(&id);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn supplier_ids_for_bidding(&self, bidding_id: BiddingId) -> BiddingResult<Vec<SupplierId>> {
            let mut ids: Vec<SupplierId> = self
                .proposals
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.bidding_id == bidding_id && p.status != ProposalStatus::Draft)
                .map(|p| p.supplier_id)
                .collect();
            ids.sort();
            ids.dedup();
            Ok(ids)
        }

        async fn supplier_exists(&self, id: SupplierId) -> BiddingResult<bool> {
            Ok(self.suppliers.lock().unwrap().contains(&id))
        }
    }

    impl ContractRepository for MemoryBiddingStore {
        async fn insert_contract(&self, contract: &Contract) -> BiddingResult<()> {
            let mut contracts = self.contracts.lock().unwrap();
            if contracts.values().any(|c| {
                c.contract_number == contract.contract_number || c.proposal_id == contract.proposal_id
            }) {
                return Err(BiddingError::Conflict("Duplicate contract".to_string()));
            }
            contracts.insert(contract.id, contract.clone());
            Ok(())
        }

        async fn find_contract(&self, id: ContractId) -> BiddingResult<Option<Contract>> {
            Ok(self.contracts.lock().unwrap().get(&id).cloned())
        }

        async fn list_contracts(&self, bidding_id: BiddingId) -> BiddingResult<Vec<Contract>> {
            Ok(self
                .contracts
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.bidding_id == bidding_id)
                .cloned()
                .collect())
        }

        async fn sign_contract(&self, contract: &Contract) -> BiddingResult<bool> {
            let mut contracts = self.contracts.lock().unwrap();
            match contracts.get_mut(&contract.id) {
                Some(stored) if stored.status == ContractStatus::Draft && stored.signed_at.is_none() => {
                    stored.signed_at = contract.signed_at;
                    stored.updated_at = contract.updated_at;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn update_contract(&self, contract: &Contract, from: ContractStatus) -> BiddingResult<bool> {
            let mut contracts = self.contracts.lock().unwrap();
            match contracts.get_mut(&contract.id) {
                Some(stored) if stored.status == from => {
                    *stored = contract.clone();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn contract_exists_for_proposal(&self, id: ProposalId) -> BiddingResult<bool> {
            Ok(self.contracts.lock().unwrap().values().any(|c| c.proposal_id == id))
        }

        async fn contract_exists_for_bidding(&self, id: BiddingId) -> BiddingResult<bool> {
            Ok(self.contracts.lock().unwrap().values().any(|c| c.bidding_id == id))
        }
    }

    #[derive(Default)]
    pub struct MemoryNotifier {
        pub sent: Mutex<Vec<Notification>>,
        pub failing: AtomicBool,
        pub purged_before: Mutex<Option<DateTime<Utc>>>,
    }

    impl MemoryNotifier {
        pub fn kinds(&self) -> Vec<&'static str> {
            self.sent.lock().unwrap().iter().map(|n| n.kind.code()).collect()
        }
    }

    impl Notifier for MemoryNotifier {
        async fn notify(&self, notification: Notification) -> BiddingResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(BiddingError::Internal("sink down".to_string()));
            }
            self.sent.lock().unwrap().push(notification);
            Ok(())
        }

        async fn purge_read(&self, before: DateTime<Utc>) -> BiddingResult<u64> {
            *self.purged_before.lock().unwrap() = Some(before);
            Ok(0)
        }
    }

    pub struct Harness {
        pub clock: Arc<ManualClock>,
        pub store: Arc<MemoryBiddingStore>,
        pub notifier: Arc<MemoryNotifier>,
        pub state: BiddingAppState<MemoryBiddingStore, MemoryNotifier>,
        pub scheduler: Scheduler<MemoryBiddingStore, MemoryNotifier>,
        pub entity: PublicEntityId,
    }

    impl Harness {
        pub fn clock_now(&self) -> DateTime<Utc> {
            self.clock.now()
        }
    }

    pub fn harness() -> Harness {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryBiddingStore::default());
        let notifier = Arc::new(MemoryNotifier::default());
        let entity = store.add_public_entity();
        let state = BiddingAppState::new(store.clone(), notifier.clone(), clock.clone() as Arc<dyn Clock>);
        let scheduler = Scheduler::new(
            store.clone(),
            notifier.clone(),
            clock.clone(),
            BiddingConfig::default(),
        );
        Harness {
            clock,
            store,
            notifier,
            state,
            scheduler,
            entity,
        }
    }

    pub fn admin() -> Actor {
        Actor::new(UserId::new(), Role::Admin).with_permissions(Permission::ALL)
    }

    pub fn entity_user(entity: PublicEntityId) -> Actor {
        Actor::new(UserId::new(), Role::PublicEntity)
            .with_public_entity(entity)
            .with_permissions([
                Permission::CreateBidding,
                Permission::UpdateBidding,
                Permission::PublishBidding,
                Permission::CancelBidding,
                Permission::DeleteBidding,
                Permission::EvaluateProposal,
                Permission::ManageContracts,
            ])
    }

    pub fn supplier_user(supplier: SupplierId) -> Actor {
        Actor::new(UserId::new(), Role::Supplier)
            .with_supplier(supplier)
            .with_permissions([Permission::SubmitProposal])
    }

    /// opening +1h, closing +2h, delivery +3h from the clock
    pub fn bidding_input(h: &Harness, number: &str) -> CreateBiddingInput {
        let now = h.clock.now();
        CreateBiddingInput {
            public_entity_id: None,
            title: "Aquisição de merenda escolar".into(),
            description: "Gêneros alimentícios para a rede municipal".into(),
            bidding_number: number.into(),
            bidding_type: BiddingType::Pregao,
            estimated_value: Decimal::from(50_000),
            opening_date: now + Duration::hours(1),
            closing_date: now + Duration::hours(2),
            delivery_deadline: now + Duration::hours(3),
            is_public: None,
            requirements: None,
            evaluation_criteria: None,
        }
    }

    pub fn item(quantity: i64, price: i64) -> ProposalItemInput {
        ProposalItemInput {
            description: "Arroz tipo 1, 5kg".into(),
            quantity: Decimal::from(quantity),
            unit_price: Decimal::from(price),
        }
    }

    pub fn proposal_input(bidding_id: BiddingId, items: Vec<ProposalItemInput>) -> CreateProposalInput {
        CreateProposalInput {
            bidding_id,
            items,
            valid_until: None,
            notes: None,
        }
    }

    /// A published bidding moved to OPEN by the scheduler
    pub async fn open_bidding(h: &Harness, number: &str) -> Bidding {
        let owner = entity_user(h.entity);
        let services = h.state.biddings();
        let b = services.create(&owner, bidding_input(h, number)).await.unwrap();
        services.publish(&owner, b.id).await.unwrap();
        h.clock.set(b.opening_date + Duration::seconds(1));
        h.scheduler.sweep_open_transitions().await.unwrap();
        h.store.bidding(b.id)
    }
}

#[cfg(test)]
mod bidding_tests {
    use super::support::*;
    use crate::application::{ModerationAction, UpdateBiddingInput};
    use crate::domain::value_object::BiddingStatus;
    use crate::error::BiddingError;
    use chrono::Duration;
    use kernel::actor::{Actor, Role};
    use kernel::id::{PublicEntityId, UserId};

    #[tokio::test]
    async fn test_create_enforces_ownership_rules() {
        let h = harness();
        let services = h.state.biddings();

        // public entity always owns its own, whatever the input says
        let owner = entity_user(h.entity);
        let mut input = bidding_input(&h, "PE-001/2024");
        input.public_entity_id = Some(PublicEntityId::new());
        let b = services.create(&owner, input).await.unwrap();
        assert_eq!(b.public_entity_id, h.entity);
        assert_eq!(b.status, BiddingStatus::Draft);

        // admin must name the owner
        let err = services
            .create(&admin(), bidding_input(&h, "PE-002/2024"))
            .await
            .unwrap_err();
        assert!(matches!(err, BiddingError::Validation(_)));

        let mut input = bidding_input(&h, "PE-002/2024");
        input.public_entity_id = Some(h.entity);
        assert!(services.create(&admin(), input).await.is_ok());

        let supplier = supplier_user(h.store.add_supplier());
        let err = services
            .create(&supplier, bidding_input(&h, "PE-003/2024"))
            .await
            .unwrap_err();
        assert!(matches!(err, BiddingError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_validates_dates_fields_and_uniqueness() {
        let h = harness();
        let services = h.state.biddings();
        let owner = entity_user(h.entity);

        let mut input = bidding_input(&h, "PE-010/2024");
        input.delivery_deadline = input.closing_date;
        assert!(matches!(
            services.create(&owner, input).await,
            Err(BiddingError::Validation(_))
        ));

        let mut input = bidding_input(&h, "PE-010/2024");
        input.title = "  ".into();
        assert!(matches!(
            services.create(&owner, input).await,
            Err(BiddingError::Validation(_))
        ));

        services.create(&owner, bidding_input(&h, "PE-010/2024")).await.unwrap();
        assert!(matches!(
            services.create(&owner, bidding_input(&h, "PE-010/2024")).await,
            Err(BiddingError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_estimated_value_rejected_before_it_reaches_storage() {
        let h = harness();
        let services = h.state.biddings();
        let owner = entity_user(h.entity);

        // would round to 0.00 in the money column
        let mut input = bidding_input(&h, "PE-011/2024");
        input.estimated_value = rust_decimal::Decimal::new(1, 3);
        assert!(matches!(
            services.create(&owner, input).await,
            Err(BiddingError::Validation(_))
        ));

        let mut input = bidding_input(&h, "PE-011/2024");
        input.estimated_value = rust_decimal::Decimal::from(10_000_000_000_000u64);
        assert!(matches!(
            services.create(&owner, input).await,
            Err(BiddingError::Validation(_))
        ));
        assert!(h.store.biddings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_revalidates_dates_with_resulting_values() {
        let h = harness();
        let services = h.state.biddings();
        let owner = entity_user(h.entity);
        let b = services.create(&owner, bidding_input(&h, "PE-020/2024")).await.unwrap();

        // closing moved past the unchanged delivery deadline
        let err = services
            .update(
                &owner,
                b.id,
                UpdateBiddingInput {
                    closing_date: Some(b.delivery_deadline + Duration::hours(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BiddingError::Validation(_)));
        assert_eq!(h.store.bidding(b.id).closing_date, b.closing_date);

        let updated = services
            .update(
                &owner,
                b.id,
                UpdateBiddingInput {
                    closing_date: Some(b.closing_date + Duration::minutes(30)),
                    title: Some("Merenda 2025".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.opening_date < updated.closing_date);
        assert!(updated.closing_date < updated.delivery_deadline);
        assert_eq!(h.store.bidding(b.id).title, "Merenda 2025");
    }

    #[tokio::test]
    async fn test_edit_blocked_once_a_proposal_exists_even_for_admin() {
        let h = harness();
        let b = open_bidding(&h, "PE-030/2024").await;
        let supplier = supplier_user(h.store.add_supplier());
        h.state
            .proposals()
            .create(&supplier, proposal_input(b.id, vec![item(1, 10)]))
            .await
            .unwrap();

        for actor in [admin(), entity_user(h.entity)] {
            let err = h
                .state
                .biddings()
                .update(
                    &actor,
                    b.id,
                    UpdateBiddingInput {
                        title: Some("Novo título".into()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, BiddingError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_publish_guards_and_notifies_suppliers() {
        let h = harness();
        let services = h.state.biddings();
        let owner = entity_user(h.entity);

        let late = services.create(&owner, bidding_input(&h, "PE-040/2024")).await.unwrap();
        h.clock.advance(Duration::hours(1));
        assert!(matches!(
            services.publish(&owner, late.id).await,
            Err(BiddingError::Validation(_))
        ));
        assert_eq!(h.store.bidding(late.id).status, BiddingStatus::Draft);

        let b = services.create(&owner, bidding_input(&h, "PE-041/2024")).await.unwrap();
        let published = services.publish(&owner, b.id).await.unwrap();
        assert_eq!(published.status, BiddingStatus::Published);
        assert_eq!(h.store.bidding(b.id).published_at, Some(h.clock_now()));
        assert_eq!(h.notifier.kinds(), vec!["BIDDING_PUBLISHED"]);
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden() {
        let h = harness();
        let services = h.state.biddings();
        let b = services
            .create(&entity_user(h.entity), bidding_input(&h, "PE-050/2024"))
            .await
            .unwrap();

        let stranger = entity_user(h.store.add_public_entity());
        assert!(matches!(
            services.publish(&stranger, b.id).await,
            Err(BiddingError::Forbidden(_))
        ));
        assert!(matches!(
            services.cancel(&stranger, b.id, None).await,
            Err(BiddingError::Forbidden(_))
        ));
        assert!(matches!(
            services.delete(&stranger, b.id).await,
            Err(BiddingError::Forbidden(_))
        ));
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Draft);
    }

    #[tokio::test]
    async fn test_cancel_notifies_participants_and_is_terminal() {
        let h = harness();
        let b = open_bidding(&h, "PE-060/2024").await;
        let supplier = supplier_user(h.store.add_supplier());
        let p = h
            .state
            .proposals()
            .create(&supplier, proposal_input(b.id, vec![item(2, 50)]))
            .await
            .unwrap();
        h.state.proposals().submit(&supplier, p.id).await.unwrap();

        let owner = entity_user(h.entity);
        let cancelled = h
            .state
            .biddings()
            .cancel(&owner, b.id, Some("Dotação orçamentária suspensa".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, BiddingStatus::Cancelled);
        assert!(h.notifier.kinds().contains(&"BIDDING_CANCELLED"));

        assert!(matches!(
            h.state.biddings().cancel(&owner, b.id, None).await,
            Err(BiddingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_only_empty_drafts() {
        let h = harness();
        let owner = entity_user(h.entity);
        let services = h.state.biddings();

        let draft = services.create(&owner, bidding_input(&h, "PE-070/2024")).await.unwrap();
        services.delete(&owner, draft.id).await.unwrap();
        assert!(h.store.biddings.lock().unwrap().get(&draft.id).is_none());

        let published = services.create(&owner, bidding_input(&h, "PE-071/2024")).await.unwrap();
        services.publish(&owner, published.id).await.unwrap();
        assert!(matches!(
            services.delete(&owner, published.id).await,
            Err(BiddingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_moderation_is_the_admin_branch() {
        let h = harness();
        let owner = entity_user(h.entity);
        let services = h.state.biddings();
        let b = services.create(&owner, bidding_input(&h, "PE-080/2024")).await.unwrap();

        assert!(matches!(
            services.moderate(&owner, b.id, ModerationAction::Publish, None).await,
            Err(BiddingError::Forbidden(_))
        ));

        let moderated = services
            .moderate(&admin(), b.id, ModerationAction::Publish, None)
            .await
            .unwrap();
        assert_eq!(moderated.status, BiddingStatus::Published);

        // same table: publishing twice is not a transition
        assert!(matches!(
            services.moderate(&admin(), b.id, ModerationAction::Publish, None).await,
            Err(BiddingError::Validation(_))
        ));

        let cancelled = services
            .moderate(&admin(), b.id, ModerationAction::Cancel, Some("Irregular".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, BiddingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_private_biddings_are_hidden() {
        let h = harness();
        let owner = entity_user(h.entity);
        let services = h.state.biddings();

        let mut input = bidding_input(&h, "PE-090/2024");
        input.is_public = Some(false);
        let hidden = services.create(&owner, input).await.unwrap();
        services.create(&owner, bidding_input(&h, "PE-091/2024")).await.unwrap();

        let citizen = Actor::new(UserId::new(), Role::Citizen);
        assert!(matches!(
            services.get(Some(&citizen), hidden.id).await,
            Err(BiddingError::NotFound(_))
        ));
        assert!(services.get(Some(&owner), hidden.id).await.is_ok());

        let anonymous = services.list(None, Default::default()).await.unwrap();
        assert_eq!(anonymous.len(), 1);
        let own = services.list(Some(&owner), Default::default()).await.unwrap();
        assert_eq!(own.len(), 2);
        let all = services.list(Some(&admin()), Default::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}

#[cfg(test)]
mod proposal_tests {
    use super::support::*;
    use crate::application::UpdateProposalInput;
    use crate::domain::value_object::{BiddingStatus, ProposalStatus};
    use crate::error::BiddingError;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_create_requires_profile_and_open_bidding() {
        let h = harness();
        let owner = entity_user(h.entity);
        let draft = h
            .state
            .biddings()
            .create(&owner, bidding_input(&h, "PE-100/2024"))
            .await
            .unwrap();

        let unknown = supplier_user(kernel::id::SupplierId::new());
        assert!(matches!(
            h.state.proposals().create(&unknown, proposal_input(draft.id, vec![item(1, 1)])).await,
            Err(BiddingError::NotFound(_))
        ));

        let supplier = supplier_user(h.store.add_supplier());
        assert!(matches!(
            h.state.proposals().create(&supplier, proposal_input(draft.id, vec![item(1, 1)])).await,
            Err(BiddingError::Validation(_))
        ));

        let open = open_bidding(&h, "PE-101/2024").await;
        let p = h
            .state
            .proposals()
            .create(&supplier, proposal_input(open.id, vec![item(3, 10), item(1, 5)]))
            .await
            .unwrap();
        assert_eq!(p.status, ProposalStatus::Draft);
        assert_eq!(p.total_value, Decimal::from(35));
        assert!(h.notifier.kinds().contains(&"PROPOSAL_RECEIVED"));
    }

    #[tokio::test]
    async fn test_second_proposal_from_same_supplier_conflicts() {
        let h = harness();
        let b = open_bidding(&h, "PE-110/2024").await;
        let supplier = supplier_user(h.store.add_supplier());

        h.state
            .proposals()
            .create(&supplier, proposal_input(b.id, vec![item(1, 10)]))
            .await
            .unwrap();
        assert!(matches!(
            h.state.proposals().create(&supplier, proposal_input(b.id, vec![item(2, 9)])).await,
            Err(BiddingError::Conflict(_))
        ));

        let other = supplier_user(h.store.add_supplier());
        assert!(
            h.state
                .proposals()
                .create(&other, proposal_input(b.id, vec![item(2, 9)]))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_submit_requires_items() {
        let h = harness();
        let b = open_bidding(&h, "PE-120/2024").await;
        let supplier = supplier_user(h.store.add_supplier());
        let proposals = h.state.proposals();

        let p = proposals.create(&supplier, proposal_input(b.id, vec![])).await.unwrap();
        assert!(matches!(
            proposals.submit(&supplier, p.id).await,
            Err(BiddingError::Validation(_))
        ));

        proposals
            .update(
                &supplier,
                p.id,
                UpdateProposalInput {
                    items: Some(vec![item(4, 25)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        // emptying the item set again is refused
        assert!(matches!(
            proposals
                .update(
                    &supplier,
                    p.id,
                    UpdateProposalInput {
                        items: Some(vec![]),
                        ..Default::default()
                    },
                )
                .await,
            Err(BiddingError::Validation(_))
        ));
        assert_eq!(h.store.proposal(p.id).items.len(), 1);

        let submitted = proposals.submit(&supplier, p.id).await.unwrap();
        assert_eq!(submitted.status, ProposalStatus::Submitted);
        assert_eq!(submitted.submitted_at, Some(h.clock_now()));
        assert_eq!(h.store.proposal(p.id).total_value, Decimal::from(100));
    }

    #[tokio::test]
    async fn test_update_replaces_items_and_stops_at_closing() {
        let h = harness();
        let b = open_bidding(&h, "PE-130/2024").await;
        let supplier = supplier_user(h.store.add_supplier());
        let proposals = h.state.proposals();
        let p = proposals
            .create(&supplier, proposal_input(b.id, vec![item(1, 10), item(1, 20)]))
            .await
            .unwrap();

        let updated = proposals
            .update(
                &supplier,
                p.id,
                UpdateProposalInput {
                    items: Some(vec![item(2, 7)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.total_value, Decimal::from(14));

        let rival = supplier_user(h.store.add_supplier());
        assert!(matches!(
            proposals.update(&rival, p.id, UpdateProposalInput::default()).await,
            Err(BiddingError::Forbidden(_))
        ));

        h.clock.set(b.closing_date);
        assert!(matches!(
            proposals.update(&supplier, p.id, UpdateProposalInput::default()).await,
            Err(BiddingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_withdraw_only_before_close() {
        let h = harness();
        let b = open_bidding(&h, "PE-140/2024").await;
        let proposals = h.state.proposals();

        let early = supplier_user(h.store.add_supplier());
        let p = proposals.create(&early, proposal_input(b.id, vec![item(1, 1)])).await.unwrap();
        proposals.submit(&early, p.id).await.unwrap();
        let withdrawn = proposals.withdraw(&early, p.id).await.unwrap();
        assert_eq!(withdrawn.status, ProposalStatus::Withdrawn);

        let late = supplier_user(h.store.add_supplier());
        let q = proposals.create(&late, proposal_input(b.id, vec![item(1, 1)])).await.unwrap();
        proposals.submit(&late, q.id).await.unwrap();

        h.clock.set(b.closing_date + Duration::seconds(1));
        h.scheduler.sweep_close_transitions().await.unwrap();
        assert!(matches!(
            proposals.withdraw(&late, q.id).await,
            Err(BiddingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_evaluation_waits_for_close() {
        let h = harness();
        let b = open_bidding(&h, "PE-150/2024").await;
        let supplier = supplier_user(h.store.add_supplier());
        let owner = entity_user(h.entity);
        let proposals = h.state.proposals();

        let p = proposals.create(&supplier, proposal_input(b.id, vec![item(1, 1)])).await.unwrap();
        proposals.submit(&supplier, p.id).await.unwrap();
        assert!(matches!(
            proposals.evaluate(&owner, p.id).await,
            Err(BiddingError::Validation(_))
        ));

        h.clock.set(b.closing_date + Duration::seconds(1));
        h.scheduler.sweep_close_transitions().await.unwrap();

        let stranger = entity_user(h.store.add_public_entity());
        assert!(matches!(
            proposals.evaluate(&stranger, p.id).await,
            Err(BiddingError::Forbidden(_))
        ));

        let reviewed = proposals.evaluate(&owner, p.id).await.unwrap();
        assert_eq!(reviewed.status, ProposalStatus::UnderReview);
    }

    #[tokio::test]
    async fn test_only_one_concurrent_accept_wins() {
        let h = harness();
        let b = open_bidding(&h, "PE-160/2024").await;
        let owner = entity_user(h.entity);
        let proposals = h.state.proposals();

        let mut ids = Vec::new();
        for price in [10, 12] {
            let s = supplier_user(h.store.add_supplier());
            let p = proposals.create(&s, proposal_input(b.id, vec![item(1, price)])).await.unwrap();
            proposals.submit(&s, p.id).await.unwrap();
            ids.push(p.id);
        }

        h.clock.set(b.closing_date + Duration::seconds(1));
        h.scheduler.sweep_close_transitions().await.unwrap();
        for id in &ids {
            proposals.evaluate(&owner, *id).await.unwrap();
        }

        let (first, second) = tokio::join!(
            proposals.accept(&owner, ids[0]),
            proposals.accept(&owner, ids[1])
        );
        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(BiddingError::Conflict(_))))
        );

        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Awarded);
        let accepted = ids
            .iter()
            .filter(|id| h.store.proposal(**id).status == ProposalStatus::Accepted)
            .count();
        assert_eq!(accepted, 1);
    }

    #[tokio::test]
    async fn test_accept_and_award_rolls_back_on_stale_bidding() {
        use crate::domain::repository::ProposalRepository;

        let h = harness();
        let b = open_bidding(&h, "PE-170/2024").await;
        let owner = entity_user(h.entity);
        let supplier = supplier_user(h.store.add_supplier());
        let proposals = h.state.proposals();

        let p = proposals.create(&supplier, proposal_input(b.id, vec![item(1, 1)])).await.unwrap();
        proposals.submit(&supplier, p.id).await.unwrap();
        h.clock.set(b.closing_date + Duration::seconds(1));
        h.scheduler.sweep_close_transitions().await.unwrap();
        let reviewed = proposals.evaluate(&owner, p.id).await.unwrap();

        // the bidding is cancelled between read and write
        let stale = h.store.bidding(b.id);
        h.state.biddings().cancel(&owner, b.id, None).await.unwrap();

        let err = h.store.accept_and_award(&reviewed, &stale).await.unwrap_err();
        assert!(matches!(err, BiddingError::Conflict(_)));
        assert_eq!(h.store.proposal(p.id).status, ProposalStatus::UnderReview);
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_reject_leaves_bidding_alone() {
        let h = harness();
        let b = open_bidding(&h, "PE-180/2024").await;
        let owner = entity_user(h.entity);
        let supplier = supplier_user(h.store.add_supplier());
        let proposals = h.state.proposals();

        let p = proposals.create(&supplier, proposal_input(b.id, vec![item(1, 1)])).await.unwrap();
        proposals.submit(&supplier, p.id).await.unwrap();
        h.clock.set(b.closing_date + Duration::seconds(1));
        h.scheduler.sweep_close_transitions().await.unwrap();
        proposals.evaluate(&owner, p.id).await.unwrap();

        let rejected = proposals
            .reject(&owner, p.id, Some("Preço inexequível".into()))
            .await
            .unwrap();
        assert_eq!(rejected.status, ProposalStatus::Rejected);
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Closed);
        assert!(h.notifier.kinds().contains(&"PROPOSAL_REJECTED"));
    }

    #[tokio::test]
    async fn test_delete_only_drafts() {
        let h = harness();
        let b = open_bidding(&h, "PE-190/2024").await;
        let supplier = supplier_user(h.store.add_supplier());
        let proposals = h.state.proposals();

        let p = proposals.create(&supplier, proposal_input(b.id, vec![item(1, 1)])).await.unwrap();
        proposals.submit(&supplier, p.id).await.unwrap();
        assert!(matches!(
            proposals.delete(&supplier, p.id).await,
            Err(BiddingError::Validation(_))
        ));

        let other = supplier_user(h.store.add_supplier());
        let q = proposals.create(&other, proposal_input(b.id, vec![item(1, 1)])).await.unwrap();
        proposals.delete(&other, q.id).await.unwrap();
        assert!(h.store.proposals.lock().unwrap().get(&q.id).is_none());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_the_operation() {
        let h = harness();
        let b = open_bidding(&h, "PE-195/2024").await;
        h.notifier.failing.store(true, Ordering::SeqCst);

        let supplier = supplier_user(h.store.add_supplier());
        let p = h
            .state
            .proposals()
            .create(&supplier, proposal_input(b.id, vec![item(1, 1)]))
            .await
            .unwrap();
        assert_eq!(h.store.proposal(p.id).status, ProposalStatus::Draft);
    }

    #[tokio::test]
    async fn test_listing_scopes_to_caller() {
        let h = harness();
        let b = open_bidding(&h, "PE-197/2024").await;
        let proposals = h.state.proposals();

        let a = supplier_user(h.store.add_supplier());
        let c = supplier_user(h.store.add_supplier());
        proposals.create(&a, proposal_input(b.id, vec![item(1, 1)])).await.unwrap();
        proposals.create(&c, proposal_input(b.id, vec![item(1, 2)])).await.unwrap();

        assert_eq!(proposals.list_for_bidding(&a, b.id).await.unwrap().len(), 1);
        assert_eq!(
            proposals
                .list_for_bidding(&entity_user(h.entity), b.id)
                .await
                .unwrap()
                .len(),
            2
        );
        let stranger = entity_user(h.store.add_public_entity());
        assert!(matches!(
            proposals.list_for_bidding(&stranger, b.id).await,
            Err(BiddingError::Forbidden(_))
        ));
    }
}

#[cfg(test)]
mod scheduler_tests {
    use super::support::*;
    use crate::domain::value_object::BiddingStatus;
    use chrono::Duration;

    #[tokio::test]
    async fn test_open_sweep_is_idempotent() {
        let h = harness();
        let owner = entity_user(h.entity);
        let services = h.state.biddings();
        let b = services.create(&owner, bidding_input(&h, "PE-200/2024")).await.unwrap();
        services.publish(&owner, b.id).await.unwrap();

        let early = h.scheduler.sweep_open_transitions().await.unwrap();
        assert_eq!(early.examined, 0);

        h.clock.set(b.opening_date + Duration::seconds(1));
        let first = h.scheduler.sweep_open_transitions().await.unwrap();
        assert_eq!((first.examined, first.transitioned, first.failed), (1, 1, 0));
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Open);

        let second = h.scheduler.sweep_open_transitions().await.unwrap();
        assert_eq!((second.examined, second.transitioned), (0, 0));
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Open);
    }

    #[tokio::test]
    async fn test_close_sweep_is_idempotent() {
        let h = harness();
        let b = open_bidding(&h, "PE-210/2024").await;

        h.clock.set(b.closing_date + Duration::seconds(1));
        let first = h.scheduler.sweep_close_transitions().await.unwrap();
        assert_eq!(first.transitioned, 1);
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Closed);

        let second = h.scheduler.sweep_close_transitions().await.unwrap();
        assert_eq!(second.transitioned, 0);
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Closed);
    }

    #[tokio::test]
    async fn test_one_failing_row_does_not_block_the_rest() {
        let h = harness();
        let owner = entity_user(h.entity);
        let services = h.state.biddings();

        let a = services.create(&owner, bidding_input(&h, "PE-220/2024")).await.unwrap();
        let b = services.create(&owner, bidding_input(&h, "PE-221/2024")).await.unwrap();
        services.publish(&owner, a.id).await.unwrap();
        services.publish(&owner, b.id).await.unwrap();
        *h.store.broken_bidding.lock().unwrap() = Some(a.id);

        h.clock.set(a.opening_date + Duration::seconds(1));
        let report = h.scheduler.sweep_open_transitions().await.unwrap();
        assert_eq!((report.examined, report.transitioned, report.failed), (2, 1, 1));
        assert_eq!(h.store.bidding(a.id).status, BiddingStatus::Published);
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Open);
    }

    #[tokio::test]
    async fn test_closing_reminder_is_sent_once() {
        let h = harness();
        let b = open_bidding(&h, "PE-230/2024").await;
        let supplier = supplier_user(h.store.add_supplier());
        let p = h
            .state
            .proposals()
            .create(&supplier, proposal_input(b.id, vec![item(1, 1)]))
            .await
            .unwrap();
        h.state.proposals().submit(&supplier, p.id).await.unwrap();

        let first = h.scheduler.notify_closing_soon().await.unwrap();
        assert_eq!(first.transitioned, 1);
        let second = h.scheduler.notify_closing_soon().await.unwrap();
        assert_eq!(second.examined, 0);

        let reminders = h
            .notifier
            .kinds()
            .into_iter()
            .filter(|k| *k == "BIDDING_CLOSING_SOON")
            .count();
        assert_eq!(reminders, 1);
        assert!(h.store.bidding(b.id).closing_reminder_sent_at.is_some());
    }

    #[tokio::test]
    async fn test_purge_uses_retention() {
        let h = harness();
        h.scheduler.purge_read_notifications().await.unwrap();
        let before = h.notifier.purged_before.lock().unwrap().unwrap();
        assert_eq!(h.clock_now() - before, Duration::days(30));
    }
}

#[cfg(test)]
mod contract_tests {
    use super::support::*;
    use crate::application::CreateContractInput;
    use crate::domain::repository::ContractRepository;
    use crate::domain::value_object::ContractStatus;
    use crate::error::BiddingError;
    use chrono::Duration;
    use kernel::id::ProposalId;

    async fn accepted_proposal(h: &Harness) -> (ProposalId, kernel::actor::Actor) {
        let b = open_bidding(h, "PE-300/2024").await;
        let supplier = supplier_user(h.store.add_supplier());
        let owner = entity_user(h.entity);
        let proposals = h.state.proposals();
        let p = proposals.create(&supplier, proposal_input(b.id, vec![item(3, 10), item(1, 5)])).await.unwrap();
        proposals.submit(&supplier, p.id).await.unwrap();
        h.clock.set(b.closing_date + Duration::seconds(1));
        h.scheduler.sweep_close_transitions().await.unwrap();
        proposals.evaluate(&owner, p.id).await.unwrap();
        proposals.accept(&owner, p.id).await.unwrap();
        (p.id, supplier)
    }

    fn contract_input(h: &Harness, proposal_id: ProposalId, number: &str) -> CreateContractInput {
        let now = h.clock_now();
        CreateContractInput {
            proposal_id,
            contract_number: number.into(),
            start_date: now + Duration::days(1),
            end_date: now + Duration::days(366),
        }
    }

    #[tokio::test]
    async fn test_contract_lifecycle() {
        let h = harness();
        let (proposal_id, supplier) = accepted_proposal(&h).await;
        let owner = entity_user(h.entity);
        let contracts = h.state.contracts();

        let c = contracts
            .create(&owner, contract_input(&h, proposal_id, "CT-001/2024"))
            .await
            .unwrap();
        assert_eq!(c.status, ContractStatus::Draft);
        assert_eq!(c.total_value, rust_decimal::Decimal::from(35));

        assert!(matches!(
            contracts.activate(&owner, c.id).await,
            Err(BiddingError::Validation(_))
        ));
        contracts.sign(&supplier, c.id).await.unwrap();

        // suppliers sign but do not manage
        assert!(matches!(
            contracts.activate(&supplier, c.id).await,
            Err(BiddingError::Forbidden(_))
        ));

        assert_eq!(contracts.activate(&owner, c.id).await.unwrap().status, ContractStatus::Active);
        assert_eq!(contracts.suspend(&owner, c.id).await.unwrap().status, ContractStatus::Suspended);
        assert_eq!(contracts.activate(&owner, c.id).await.unwrap().status, ContractStatus::Active);
        assert_eq!(contracts.complete(&owner, c.id).await.unwrap().status, ContractStatus::Completed);
        assert!(matches!(
            contracts.terminate(&owner, c.id).await,
            Err(BiddingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_second_signature_cannot_overwrite_the_first() {
        let h = harness();
        let (proposal_id, supplier) = accepted_proposal(&h).await;
        let owner = entity_user(h.entity);
        let contracts = h.state.contracts();
        let c = contracts
            .create(&owner, contract_input(&h, proposal_id, "CT-005/2024"))
            .await
            .unwrap();

        // the owner read the contract before the supplier signed
        let mut stale = h.store.contract(c.id);
        let signed = contracts.sign(&supplier, c.id).await.unwrap();

        h.clock.advance(Duration::minutes(1));
        stale.sign(h.clock_now()).unwrap();
        assert!(!h.store.sign_contract(&stale).await.unwrap());
        assert_eq!(h.store.contract(c.id).signed_at, signed.signed_at);

        assert!(matches!(
            contracts.sign(&owner, c.id).await,
            Err(BiddingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_one_contract_per_proposal() {
        let h = harness();
        let (proposal_id, _) = accepted_proposal(&h).await;
        let owner = entity_user(h.entity);
        let contracts = h.state.contracts();

        contracts
            .create(&owner, contract_input(&h, proposal_id, "CT-010/2024"))
            .await
            .unwrap();
        assert!(matches!(
            contracts
                .create(&owner, contract_input(&h, proposal_id, "CT-011/2024"))
                .await,
            Err(BiddingError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_contract_needs_accepted_proposal_and_ordered_dates() {
        let h = harness();
        let b = open_bidding(&h, "PE-320/2024").await;
        let supplier = supplier_user(h.store.add_supplier());
        let owner = entity_user(h.entity);
        let p = h
            .state
            .proposals()
            .create(&supplier, proposal_input(b.id, vec![item(1, 1)]))
            .await
            .unwrap();

        assert!(matches!(
            h.state
                .contracts()
                .create(&owner, contract_input(&h, p.id, "CT-020/2024"))
                .await,
            Err(BiddingError::Validation(_))
        ));

        let (accepted, _) = accepted_proposal(&h).await;
        let mut input = contract_input(&h, accepted, "CT-021/2024");
        input.end_date = input.start_date;
        assert!(matches!(
            h.state.contracts().create(&owner, input).await,
            Err(BiddingError::Validation(_))
        ));
    }
}

#[cfg(test)]
mod scenario_tests {
    use super::support::*;
    use crate::domain::value_object::{BiddingStatus, ProposalStatus};
    use chrono::Duration;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_bidding_from_draft_to_award() {
        let h = harness();
        let start = h.clock_now();
        let owner = entity_user(h.entity);
        let supplier = supplier_user(h.store.add_supplier());

        let b = h
            .state
            .biddings()
            .create(&owner, bidding_input(&h, "PE-999/2024"))
            .await
            .unwrap();
        assert_eq!(b.opening_date, start + Duration::hours(1));

        h.state.biddings().publish(&owner, b.id).await.unwrap();

        h.clock.set(start + Duration::hours(1) + Duration::seconds(1));
        h.scheduler.sweep_open_transitions().await.unwrap();
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Open);

        let proposals = h.state.proposals();
        let p = proposals
            .create(&supplier, proposal_input(b.id, vec![item(3, 10), item(1, 5)]))
            .await
            .unwrap();
        assert_eq!(p.total_value, Decimal::from(35));
        proposals.submit(&supplier, p.id).await.unwrap();

        h.clock.set(start + Duration::hours(2) + Duration::seconds(1));
        h.scheduler.sweep_close_transitions().await.unwrap();
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Closed);

        proposals.evaluate(&owner, p.id).await.unwrap();
        let (accepted, awarded) = proposals.accept(&owner, p.id).await.unwrap();

        assert_eq!(accepted.status, ProposalStatus::Accepted);
        assert_eq!(awarded.status, BiddingStatus::Awarded);
        assert_eq!(h.store.proposal(p.id).status, ProposalStatus::Accepted);
        assert_eq!(h.store.bidding(b.id).status, BiddingStatus::Awarded);
        assert!(h.notifier.kinds().contains(&"PROPOSAL_ACCEPTED"));
    }
}

#[cfg(test)]
mod router_tests {
    use super::support::*;
    use crate::presentation::{bidding_router, proposal_router};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::{Extension, Router};
    use kernel::actor::{Actor, Permission, Role};
    use kernel::id::UserId;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(h: &Harness, actor: Option<Actor>) -> Router {
        let router = Router::new()
            .nest("/api/biddings", bidding_router(h.state.clone()))
            .nest("/api/proposals", proposal_router(h.state.clone()));
        match actor {
            Some(actor) => router.layer(Extension(actor)),
            None => router,
        }
    }

    fn create_body(h: &Harness, number: &str) -> String {
        let input = bidding_input(h, number);
        json!({
            "title": input.title,
            "description": input.description,
            "biddingNumber": number,
            "type": "PREGAO",
            "estimatedValue": 50000,
            "openingDate": input.opening_date,
            "closingDate": input.closing_date,
            "deliveryDeadline": input.delivery_deadline,
        })
        .to_string()
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_can_list_but_not_create() {
        let h = harness();

        let res = app(&h, None)
            .oneshot(Request::get("/api/biddings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!([]));

        let res = app(&h, None)
            .oneshot(post_json("/api/biddings", create_body(&h, "PE-400/2024")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_role_and_permission_gates() {
        let h = harness();

        let supplier = supplier_user(h.store.add_supplier());
        let res = app(&h, Some(supplier))
            .oneshot(post_json("/api/biddings", create_body(&h, "PE-410/2024")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        // right role, no grant
        let bare = Actor::new(UserId::new(), Role::PublicEntity).with_public_entity(h.entity);
        let res = app(&h, Some(bare))
            .oneshot(post_json("/api/biddings", create_body(&h, "PE-410/2024")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body = body_json(res).await;
        assert!(body.to_string().contains("CREATE_BIDDING"));

        let granted = Actor::new(UserId::new(), Role::PublicEntity)
            .with_public_entity(h.entity)
            .with_permissions([Permission::CreateBidding]);
        let res = app(&h, Some(granted))
            .oneshot(post_json("/api/biddings", create_body(&h, "PE-410/2024")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = body_json(res).await;
        assert_eq!(body["status"], "DRAFT");
        assert_eq!(body["biddingNumber"], "PE-410/2024");
    }

    #[tokio::test]
    async fn test_guard_failures_map_to_statuses() {
        let h = harness();
        let owner = entity_user(h.entity);
        let b = h
            .state
            .biddings()
            .create(&owner, bidding_input(&h, "PE-420/2024"))
            .await
            .unwrap();

        let stranger = entity_user(h.store.add_public_entity());
        let res = app(&h, Some(stranger))
            .oneshot(post_json(&format!("/api/biddings/{}/publish", b.id), String::new()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        h.clock.advance(chrono::Duration::hours(2));
        let res = app(&h, Some(owner))
            .oneshot(post_json(&format!("/api/biddings/{}/publish", b.id), String::new()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = app(&h, Some(admin()))
            .oneshot(
                Request::get(format!("/api/biddings/{}", kernel::id::BiddingId::new()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_supplier_creates_and_submits_over_http() {
        let h = harness();
        let b = open_bidding(&h, "PE-430/2024").await;
        let supplier = supplier_user(h.store.add_supplier());

        let res = app(&h, Some(supplier.clone()))
            .oneshot(post_json(
                &format!("/api/biddings/{}/proposals", b.id),
                json!({
                    "items": [
                        { "description": "Arroz", "quantity": 3, "unitPrice": 10 },
                        { "description": "Feijão", "quantity": 1, "unitPrice": 5 }
                    ]
                })
                .to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = body_json(res).await;
        assert_eq!(body["totalValue"], json!(35.0));
        let id = body["id"].as_str().unwrap().to_string();

        let res = app(&h, Some(supplier))
            .oneshot(post_json(&format!("/api/proposals/{id}/submit"), String::new()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["status"], "SUBMITTED");
    }
}
