//! PostgreSQL Notification Sink
//!
//! Resolves a target to its active users and writes one row per recipient.
//! Delivery beyond the table is someone else's job.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entity::{Notification, NotificationTarget};
use crate::domain::repository::Notifier;
use crate::error::BiddingResult;

#[derive(Clone)]
pub struct PgNotifier {
    pool: PgPool,
}

impl PgNotifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Notifier for PgNotifier {
    async fn notify(&self, notification: Notification) -> BiddingResult<()> {
        let (recipients, target) = match notification.target {
            NotificationTarget::User(id) => ("user_id::text = $4", id.into_uuid().to_string()),
            NotificationTarget::Role(role) => ("role = $4", role.code().to_string()),
            NotificationTarget::PublicEntity(id) => {
                ("public_entity_id::text = $4", id.into_uuid().to_string())
            }
            NotificationTarget::Supplier(id) => ("supplier_id::text = $4", id.into_uuid().to_string()),
        };

        let sql = format!(
            r#"
            INSERT INTO notifications (notification_id, user_id, kind, payload, created_at)
            SELECT gen_random_uuid(), user_id, $1, $2, $3
            FROM users
            WHERE is_active AND {recipients}
            "#
        );

        let delivered = sqlx::query(&sql)
            .bind(notification.kind.code())
            .bind(&notification.payload)
            .bind(notification.created_at)
            .bind(target)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!(
            kind = notification.kind.code(),
            recipients = delivered,
            "Notification stored"
        );
        Ok(())
    }

    async fn purge_read(&self, before: DateTime<Utc>) -> BiddingResult<u64> {
        let deleted = sqlx::query(
            "DELETE FROM notifications WHERE read_at IS NOT NULL AND read_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }
}
