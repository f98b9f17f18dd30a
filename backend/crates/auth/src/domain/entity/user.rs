//! User Entity
//!
//! Login identity linked to at most one public entity or supplier profile.
//! Accounts are provisioned outside this service; sign-in only reads them.

use chrono::{DateTime, Utc};
use kernel::actor::{Actor, Permission, Role};
use kernel::id::{PublicEntityId, SupplierId, UserId};
use platform::password::HashedPassword;

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Lower-cased, trimmed
    pub email: String,
    pub password_hash: HashedPassword,
    pub role: Role,
    pub public_entity_id: Option<PublicEntityId>,
    pub supplier_id: Option<SupplierId>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, password_hash: HashedPassword, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            user_id: UserId::new(),
            email: normalize_email(email),
            password_hash,
            role,
            public_entity_id: None,
            supplier_id: None,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_login(&self) -> bool {
        self.is_active
    }

    /// Caller identity with the given active grants
    pub fn to_actor(&self, permissions: impl IntoIterator<Item = Permission>) -> Actor {
        let mut actor = Actor::new(self.user_id, self.role).with_permissions(permissions);
        // Profile links only count for the matching role
        if self.role == Role::PublicEntity {
            actor.public_entity_id = self.public_entity_id;
        }
        if self.role == Role::Supplier {
            actor.supplier_id = self.supplier_id;
        }
        actor
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::ClearTextPassword;

    fn hash() -> HashedPassword {
        ClearTextPassword::for_verification("irrelevant".to_string())
            .hash(None)
            .unwrap()
    }

    #[test]
    fn test_email_is_normalized() {
        let user = User::new("  Compras@Prefeitura.GOV.br ", hash(), Role::PublicEntity, Utc::now());
        assert_eq!(user.email, "compras@prefeitura.gov.br");
    }

    #[test]
    fn test_actor_links_follow_role() {
        let mut user = User::new("a@b.c", hash(), Role::Supplier, Utc::now());
        user.supplier_id = Some(SupplierId::new());
        user.public_entity_id = Some(PublicEntityId::new());

        let actor = user.to_actor([Permission::SubmitProposal]);
        assert_eq!(actor.supplier_id, user.supplier_id);
        assert_eq!(actor.public_entity_id, None);
        assert!(actor.has_permission(Permission::SubmitProposal));
    }
}
