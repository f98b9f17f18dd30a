//! PostgreSQL Repository Implementations
//!
//! Status writes are `UPDATE … WHERE status = <from>`; zero affected rows
//! means another writer got there first.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kernel::error::conversions::{is_unique_violation, violated_constraint};
use kernel::id::{BiddingId, ContractId, ProposalId, PublicEntityId, SupplierId};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::domain::entity::{Bidding, Contract, Proposal, ProposalItem};
use crate::domain::repository::{
    BiddingFilter, BiddingRepository, ContractRepository, ProposalRepository, Visibility,
};
use crate::domain::value_object::{BiddingStatus, BiddingType, ContractStatus, ProposalStatus};
use crate::error::{BiddingError, BiddingResult};

/// PostgreSQL-backed lifecycle store
#[derive(Clone)]
pub struct PgBiddingRepository {
    pool: PgPool,
}

impl PgBiddingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_for(&self, proposal_ids: &[Uuid]) -> BiddingResult<HashMap<Uuid, Vec<ProposalItem>>> {
        let rows = sqlx::query_as::<_, ProposalItemRow>(
            r#"
            SELECT proposal_id, description, quantity, unit_price, total_price
            FROM proposal_items
            WHERE proposal_id = ANY($1)
            ORDER BY proposal_id, position
            "#,
        )
        .bind(proposal_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<ProposalItem>> = HashMap::new();
        for row in rows {
            items.entry(row.proposal_id).or_default().push(row.into_item());
        }
        Ok(items)
    }

    async fn with_items(&self, rows: Vec<ProposalRow>) -> BiddingResult<Vec<Proposal>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.proposal_id).collect();
        let mut items = self.items_for(&ids).await?;
        rows.into_iter()
            .map(|r| {
                let proposal_items = items.remove(&r.proposal_id).unwrap_or_default();
                r.into_proposal(proposal_items)
            })
            .collect()
    }
}

/// Unique violations become Conflict, named by the constraint
fn conflict_or(err: sqlx::Error) -> BiddingError {
    if !is_unique_violation(&err) {
        return BiddingError::Database(err);
    }
    let message = match violated_constraint(&err) {
        Some("biddings_bidding_number_key") => "Bidding number already exists",
        Some("proposals_bidding_supplier_key") => {
            "Supplier already has a proposal for this bidding"
        }
        Some("contracts_contract_number_key") => "Contract number already exists",
        Some("contracts_proposal_id_key") => "A contract already exists for this proposal",
        _ => "Duplicate value",
    };
    BiddingError::Conflict(message.to_string())
}

async fn insert_items(
    tx: &mut Transaction<'_, Postgres>,
    proposal_id: ProposalId,
    items: &[ProposalItem],
) -> BiddingResult<()> {
    if items.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO proposal_items (proposal_id, position, description, quantity, unit_price, total_price) ",
    );
    builder.push_values(items.iter().enumerate(), |mut b, (position, item)| {
        b.push_bind(proposal_id.into_uuid())
            .push_bind(position as i32)
            .push_bind(item.description.clone())
            .push_bind(item.quantity)
            .push_bind(item.unit_price)
            .push_bind(item.total_price);
    });
    builder.build().execute(&mut **tx).await?;
    Ok(())
}

const BIDDING_COLUMNS: &str = r#"
    bidding_id,
    public_entity_id,
    title,
    description,
    bidding_number,
    bidding_type,
    status,
    estimated_value,
    opening_date,
    closing_date,
    delivery_deadline,
    is_public,
    requirements,
    evaluation_criteria,
    published_at,
    closing_reminder_sent_at,
    created_at,
    updated_at
"#;

const PROPOSAL_COLUMNS: &str = r#"
    proposal_id,
    bidding_id,
    supplier_id,
    total_value,
    status,
    submitted_at,
    valid_until,
    notes,
    created_at,
    updated_at
"#;

const CONTRACT_COLUMNS: &str = r#"
    contract_id,
    bidding_id,
    proposal_id,
    public_entity_id,
    supplier_id,
    contract_number,
    total_value,
    start_date,
    end_date,
    status,
    signed_at,
    created_at,
    updated_at
"#;

// ============================================================================
// Bidding Repository Implementation
// ============================================================================

impl BiddingRepository for PgBiddingRepository {
    async fn insert_bidding(&self, bidding: &Bidding) -> BiddingResult<()> {
        sqlx::query(&format!(
            "INSERT INTO biddings ({BIDDING_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)"
        ))
        .bind(bidding.id.into_uuid())
        .bind(bidding.public_entity_id.into_uuid())
        .bind(&bidding.title)
        .bind(&bidding.description)
        .bind(&bidding.bidding_number)
        .bind(bidding.bidding_type.code())
        .bind(bidding.status.code())
        .bind(bidding.estimated_value)
        .bind(bidding.opening_date)
        .bind(bidding.closing_date)
        .bind(bidding.delivery_deadline)
        .bind(bidding.is_public)
        .bind(&bidding.requirements)
        .bind(&bidding.evaluation_criteria)
        .bind(bidding.published_at)
        .bind(bidding.closing_reminder_sent_at)
        .bind(bidding.created_at)
        .bind(bidding.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conflict_or)?;

        Ok(())
    }

    async fn find_bidding(&self, id: BiddingId) -> BiddingResult<Option<Bidding>> {
        let row = sqlx::query_as::<_, BiddingRow>(&format!(
            "SELECT {BIDDING_COLUMNS} FROM biddings WHERE bidding_id = $1"
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(BiddingRow::into_bidding).transpose()
    }

    async fn list_biddings(&self, filter: &BiddingFilter) -> BiddingResult<Vec<Bidding>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {BIDDING_COLUMNS} FROM biddings WHERE TRUE"));

        match filter.visibility {
            Visibility::All => {}
            Visibility::PublicOr(owner) => {
                builder
                    .push(" AND (is_public OR public_entity_id = ")
                    .push_bind(owner.into_uuid())
                    .push(")");
            }
            Visibility::PublicOnly => {
                builder.push(" AND is_public");
            }
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.code());
        }
        if let Some(owner) = filter.public_entity_id {
            builder
                .push(" AND public_entity_id = ")
                .push_bind(owner.into_uuid());
        }
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows = builder
            .build_query_as::<BiddingRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(BiddingRow::into_bidding).collect()
    }

    async fn update_bidding(&self, bidding: &Bidding, expected: BiddingStatus) -> BiddingResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE biddings SET
                title = $3,
                description = $4,
                bidding_type = $5,
                estimated_value = $6,
                opening_date = $7,
                closing_date = $8,
                delivery_deadline = $9,
                is_public = $10,
                requirements = $11,
                evaluation_criteria = $12,
                updated_at = $13
            WHERE bidding_id = $1 AND status = $2
            "#,
        )
        .bind(bidding.id.into_uuid())
        .bind(expected.code())
        .bind(&bidding.title)
        .bind(&bidding.description)
        .bind(bidding.bidding_type.code())
        .bind(bidding.estimated_value)
        .bind(bidding.opening_date)
        .bind(bidding.closing_date)
        .bind(bidding.delivery_deadline)
        .bind(bidding.is_public)
        .bind(&bidding.requirements)
        .bind(&bidding.evaluation_criteria)
        .bind(bidding.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_bidding_status(&self, bidding: &Bidding, from: BiddingStatus) -> BiddingResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE biddings
            SET status = $3, published_at = $4, updated_at = $5
            WHERE bidding_id = $1 AND status = $2
            "#,
        )
        .bind(bidding.id.into_uuid())
        .bind(from.code())
        .bind(bidding.status.code())
        .bind(bidding.published_at)
        .bind(bidding.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_draft_bidding(&self, id: BiddingId) -> BiddingResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM biddings b
            WHERE b.bidding_id = $1
              AND b.status = 'DRAFT'
              AND NOT EXISTS (SELECT 1 FROM proposals p WHERE p.bidding_id = b.bidding_id)
              AND NOT EXISTS (SELECT 1 FROM contracts c WHERE c.bidding_id = b.bidding_id)
            "#,
        )
        .bind(id.into_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_due_for_opening(&self, now: DateTime<Utc>) -> BiddingResult<Vec<Bidding>> {
        let rows = sqlx::query_as::<_, BiddingRow>(&format!(
            "SELECT {BIDDING_COLUMNS} FROM biddings \
             WHERE status = 'PUBLISHED' AND opening_date <= $1 ORDER BY opening_date"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BiddingRow::into_bidding).collect()
    }

    async fn find_due_for_closing(&self, now: DateTime<Utc>) -> BiddingResult<Vec<Bidding>> {
        let rows = sqlx::query_as::<_, BiddingRow>(&format!(
            "SELECT {BIDDING_COLUMNS} FROM biddings \
             WHERE status = 'OPEN' AND closing_date <= $1 ORDER BY closing_date"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BiddingRow::into_bidding).collect()
    }

    async fn find_closing_soon(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BiddingResult<Vec<Bidding>> {
        let rows = sqlx::query_as::<_, BiddingRow>(&format!(
            "SELECT {BIDDING_COLUMNS} FROM biddings \
             WHERE status = 'OPEN' AND closing_reminder_sent_at IS NULL \
               AND closing_date > $1 AND closing_date <= $2 \
             ORDER BY closing_date"
        ))
        .bind(now)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BiddingRow::into_bidding).collect()
    }

    async fn mark_reminder_sent(&self, id: BiddingId, at: DateTime<Utc>) -> BiddingResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE biddings SET closing_reminder_sent_at = $2
            WHERE bidding_id = $1 AND closing_reminder_sent_at IS NULL
            "#,
        )
        .bind(id.into_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_proposals(&self, id: BiddingId) -> BiddingResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM proposals WHERE bidding_id = $1")
            .bind(id.into_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn public_entity_exists(&self, id: PublicEntityId) -> BiddingResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM public_entities WHERE public_entity_id = $1)",
        )
        .bind(id.into_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

// ============================================================================
// Proposal Repository Implementation
// ============================================================================

impl ProposalRepository for PgBiddingRepository {
    async fn insert_proposal(&self, proposal: &Proposal) -> BiddingResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO proposals ({PROPOSAL_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(proposal.id.into_uuid())
        .bind(proposal.bidding_id.into_uuid())
        .bind(proposal.supplier_id.into_uuid())
        .bind(proposal.total_value)
        .bind(proposal.status.code())
        .bind(proposal.submitted_at)
        .bind(proposal.valid_until)
        .bind(&proposal.notes)
        .bind(proposal.created_at)
        .bind(proposal.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(conflict_or)?;

        insert_items(&mut tx, proposal.id, &proposal.items).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn find_proposal(&self, id: ProposalId) -> BiddingResult<Option<Proposal>> {
        let row = sqlx::query_as::<_, ProposalRow>(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE proposal_id = $1"
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.with_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_proposals(
        &self,
        bidding_id: BiddingId,
        supplier_id: Option<SupplierId>,
    ) -> BiddingResult<Vec<Proposal>> {
        let rows = sqlx::query_as::<_, ProposalRow>(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals \
             WHERE bidding_id = $1 AND ($2::uuid IS NULL OR supplier_id = $2) \
             ORDER BY created_at"
        ))
        .bind(bidding_id.into_uuid())
        .bind(supplier_id.map(SupplierId::into_uuid))
        .fetch_all(&self.pool)
        .await?;

        self.with_items(rows).await
    }

    async fn update_proposal(&self, proposal: &Proposal) -> BiddingResult<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE proposals
            SET total_value = $2, valid_until = $3, notes = $4, updated_at = $5
            WHERE proposal_id = $1 AND status = 'DRAFT'
            "#,
        )
        .bind(proposal.id.into_uuid())
        .bind(proposal.total_value)
        .bind(proposal.valid_until)
        .bind(&proposal.notes)
        .bind(proposal.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM proposal_items WHERE proposal_id = $1")
            .bind(proposal.id.into_uuid())
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, proposal.id, &proposal.items).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn update_proposal_status(&self, proposal: &Proposal, from: ProposalStatus) -> BiddingResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE proposals
            SET status = $3, submitted_at = $4, updated_at = $5
            WHERE proposal_id = $1 AND status = $2
              AND ($3 <> 'SUBMITTED'
                   OR EXISTS (SELECT 1 FROM proposal_items WHERE proposal_id = $1))
            "#,
        )
        .bind(proposal.id.into_uuid())
        .bind(from.code())
        .bind(proposal.status.code())
        .bind(proposal.submitted_at)
        .bind(proposal.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn accept_and_award(&self, proposal: &Proposal, bidding: &Bidding) -> BiddingResult<()> {
        let mut tx = self.pool.begin().await?;

        let accepted = sqlx::query(
            r#"
            UPDATE proposals SET status = 'ACCEPTED', updated_at = $2
            WHERE proposal_id = $1 AND status = 'UNDER_REVIEW'
            "#,
        )
        .bind(proposal.id.into_uuid())
        .bind(proposal.updated_at)
        .execute(&mut *tx)
        .await?;

        if accepted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(BiddingError::Conflict(
                "Proposal is no longer under review".to_string(),
            ));
        }

        // Scoped to CLOSED: a second concurrent accept finds it AWARDED
        let awarded = sqlx::query(
            r#"
            UPDATE biddings SET status = 'AWARDED', updated_at = $2
            WHERE bidding_id = $1 AND status = 'CLOSED'
            "#,
        )
        .bind(bidding.id.into_uuid())
        .bind(bidding.updated_at)
        .execute(&mut *tx)
        .await?;

        if awarded.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(BiddingError::Conflict(format!(
                "Bidding {} has already been awarded",
                bidding.bidding_number
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_draft_proposal(&self, id: ProposalId) -> BiddingResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM proposals p
            WHERE p.proposal_id = $1
              AND p.status = 'DRAFT'
              AND NOT EXISTS (SELECT 1 FROM contracts c WHERE c.proposal_id = p.proposal_id)
            "#,
        )
        .bind(id.into_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn supplier_ids_for_bidding(&self, bidding_id: BiddingId) -> BiddingResult<Vec<SupplierId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT DISTINCT supplier_id FROM proposals WHERE bidding_id = $1 AND status <> 'DRAFT'",
        )
        .bind(bidding_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(SupplierId::from).collect())
    }

    async fn supplier_exists(&self, id: SupplierId) -> BiddingResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM suppliers WHERE supplier_id = $1)")
                .bind(id.into_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

// ============================================================================
// Contract Repository Implementation
// ============================================================================

impl ContractRepository for PgBiddingRepository {
    async fn insert_contract(&self, contract: &Contract) -> BiddingResult<()> {
        sqlx::query(&format!(
            "INSERT INTO contracts ({CONTRACT_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(contract.id.into_uuid())
        .bind(contract.bidding_id.into_uuid())
        .bind(contract.proposal_id.into_uuid())
        .bind(contract.public_entity_id.into_uuid())
        .bind(contract.supplier_id.into_uuid())
        .bind(&contract.contract_number)
        .bind(contract.total_value)
        .bind(contract.start_date)
        .bind(contract.end_date)
        .bind(contract.status.code())
        .bind(contract.signed_at)
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conflict_or)?;

        Ok(())
    }

    async fn find_contract(&self, id: ContractId) -> BiddingResult<Option<Contract>> {
        let row = sqlx::query_as::<_, ContractRow>(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE contract_id = $1"
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ContractRow::into_contract).transpose()
    }

    async fn list_contracts(&self, bidding_id: BiddingId) -> BiddingResult<Vec<Contract>> {
        let rows = sqlx::query_as::<_, ContractRow>(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE bidding_id = $1 ORDER BY created_at"
        ))
        .bind(bidding_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ContractRow::into_contract).collect()
    }

    async fn sign_contract(&self, contract: &Contract) -> BiddingResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE contracts
            SET signed_at = $2, updated_at = $3
            WHERE contract_id = $1 AND status = 'DRAFT' AND signed_at IS NULL
            "#,
        )
        .bind(contract.id.into_uuid())
        .bind(contract.signed_at)
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_contract(&self, contract: &Contract, from: ContractStatus) -> BiddingResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE contracts
            SET status = $3, updated_at = $4
            WHERE contract_id = $1 AND status = $2
            "#,
        )
        .bind(contract.id.into_uuid())
        .bind(from.code())
        .bind(contract.status.code())
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn contract_exists_for_proposal(&self, id: ProposalId) -> BiddingResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM contracts WHERE proposal_id = $1)")
                .bind(id.into_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn contract_exists_for_bidding(&self, id: BiddingId) -> BiddingResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM contracts WHERE bidding_id = $1)")
                .bind(id.into_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct BiddingRow {
    bidding_id: Uuid,
    public_entity_id: Uuid,
    title: String,
    description: String,
    bidding_number: String,
    bidding_type: String,
    status: String,
    estimated_value: Decimal,
    opening_date: DateTime<Utc>,
    closing_date: DateTime<Utc>,
    delivery_deadline: DateTime<Utc>,
    is_public: bool,
    requirements: Option<String>,
    evaluation_criteria: Option<String>,
    published_at: Option<DateTime<Utc>>,
    closing_reminder_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BiddingRow {
    fn into_bidding(self) -> BiddingResult<Bidding> {
        let status = BiddingStatus::from_code(&self.status)
            .ok_or_else(|| BiddingError::Internal(format!("Unknown bidding status: {}", self.status)))?;
        let bidding_type = BiddingType::from_code(&self.bidding_type).ok_or_else(|| {
            BiddingError::Internal(format!("Unknown bidding type: {}", self.bidding_type))
        })?;

        Ok(Bidding {
            id: self.bidding_id.into(),
            public_entity_id: self.public_entity_id.into(),
            title: self.title,
            description: self.description,
            bidding_number: self.bidding_number,
            bidding_type,
            status,
            estimated_value: self.estimated_value,
            opening_date: self.opening_date,
            closing_date: self.closing_date,
            delivery_deadline: self.delivery_deadline,
            is_public: self.is_public,
            requirements: self.requirements,
            evaluation_criteria: self.evaluation_criteria,
            published_at: self.published_at,
            closing_reminder_sent_at: self.closing_reminder_sent_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProposalRow {
    proposal_id: Uuid,
    bidding_id: Uuid,
    supplier_id: Uuid,
    total_value: Decimal,
    status: String,
    submitted_at: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProposalRow {
    fn into_proposal(self, items: Vec<ProposalItem>) -> BiddingResult<Proposal> {
        let status = ProposalStatus::from_code(&self.status).ok_or_else(|| {
            BiddingError::Internal(format!("Unknown proposal status: {}", self.status))
        })?;

        Ok(Proposal {
            id: self.proposal_id.into(),
            bidding_id: self.bidding_id.into(),
            supplier_id: self.supplier_id.into(),
            total_value: self.total_value,
            status,
            submitted_at: self.submitted_at,
            valid_until: self.valid_until,
            notes: self.notes,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProposalItemRow {
    proposal_id: Uuid,
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
    total_price: Decimal,
}

impl ProposalItemRow {
    fn into_item(self) -> ProposalItem {
        ProposalItem {
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContractRow {
    contract_id: Uuid,
    bidding_id: Uuid,
    proposal_id: Uuid,
    public_entity_id: Uuid,
    supplier_id: Uuid,
    contract_number: String,
    total_value: Decimal,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    signed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContractRow {
    fn into_contract(self) -> BiddingResult<Contract> {
        let status = ContractStatus::from_code(&self.status).ok_or_else(|| {
            BiddingError::Internal(format!("Unknown contract status: {}", self.status))
        })?;

        Ok(Contract {
            id: self.contract_id.into(),
            bidding_id: self.bidding_id.into(),
            proposal_id: self.proposal_id.into(),
            public_entity_id: self.public_entity_id.into(),
            supplier_id: self.supplier_id.into(),
            contract_number: self.contract_number,
            total_value: self.total_value,
            start_date: self.start_date,
            end_date: self.end_date,
            status,
            signed_at: self.signed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
