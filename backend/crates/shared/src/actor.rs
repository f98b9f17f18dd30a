//! Caller identity
//!
//! [`Actor`] is the authenticated caller as seen by every state-changing
//! operation: who they are, which coarse role they hold, which public entity
//! or supplier profile they are linked to, and which fine-grained permissions
//! are currently granted to them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{PublicEntityId, SupplierId, UserId};

/// Coarse user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    PublicEntity,
    Supplier,
    Citizen,
}

impl Role {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::PublicEntity => "PUBLIC_ENTITY",
            Role::Supplier => "SUPPLIER",
            Role::Citizen => "CITIZEN",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ADMIN" => Some(Role::Admin),
            "PUBLIC_ENTITY" => Some(Role::PublicEntity),
            "SUPPLIER" => Some(Role::Supplier),
            "CITIZEN" => Some(Role::Citizen),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Named fine-grained permission, granted per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    CreateBidding,
    UpdateBidding,
    PublishBidding,
    CancelBidding,
    DeleteBidding,
    ModerateBidding,
    SubmitProposal,
    EvaluateProposal,
    ManageContracts,
    ManagePermissions,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::CreateBidding,
        Permission::UpdateBidding,
        Permission::PublishBidding,
        Permission::CancelBidding,
        Permission::DeleteBidding,
        Permission::ModerateBidding,
        Permission::SubmitProposal,
        Permission::EvaluateProposal,
        Permission::ManageContracts,
        Permission::ManagePermissions,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Permission::CreateBidding => "CREATE_BIDDING",
            Permission::UpdateBidding => "UPDATE_BIDDING",
            Permission::PublishBidding => "PUBLISH_BIDDING",
            Permission::CancelBidding => "CANCEL_BIDDING",
            Permission::DeleteBidding => "DELETE_BIDDING",
            Permission::ModerateBidding => "MODERATE_BIDDING",
            Permission::SubmitProposal => "SUBMIT_PROPOSAL",
            Permission::EvaluateProposal => "EVALUATE_PROPOSAL",
            Permission::ManageContracts => "MANAGE_CONTRACTS",
            Permission::ManagePermissions => "MANAGE_PERMISSIONS",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    /// Set when `role` is `PublicEntity`
    pub public_entity_id: Option<PublicEntityId>,
    /// Set when `role` is `Supplier`
    pub supplier_id: Option<SupplierId>,
    pub permissions: BTreeSet<Permission>,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            public_entity_id: None,
            supplier_id: None,
            permissions: BTreeSet::new(),
        }
    }

    pub fn with_public_entity(mut self, id: PublicEntityId) -> Self {
        self.public_entity_id = Some(id);
        self
    }

    pub fn with_supplier(mut self, id: SupplierId) -> Self {
        self.supplier_id = Some(id);
        self
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    /// ADMIN, or PUBLIC_ENTITY linked to `owner`.
    pub fn owns_public_entity(&self, owner: PublicEntityId) -> bool {
        self.is_admin()
            || (self.role == Role::PublicEntity && self.public_entity_id == Some(owner))
    }

    /// Supplier profile linked to `supplier`. Admins are not implied.
    pub fn is_supplier(&self, supplier: SupplierId) -> bool {
        self.role == Role::Supplier && self.supplier_id == Some(supplier)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// AND semantics: every required permission must be granted.
    pub fn has_all_permissions(&self, required: &[Permission]) -> bool {
        required.iter().all(|p| self.permissions.contains(p))
    }

    pub fn missing_permissions(&self, required: &[Permission]) -> Vec<Permission> {
        required
            .iter()
            .copied()
            .filter(|p| !self.permissions.contains(p))
            .collect()
    }
}

#[cfg(feature = "axum")]
impl<S> axum::extract::FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = crate::error::app_error::AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Actor>().cloned().ok_or_else(|| {
            crate::error::app_error::AppError::unauthorized("Authentication required")
        })
    }
}

/// The caller when a token was presented, for routes open to anonymous reads
#[derive(Debug, Clone, Default)]
pub struct MaybeActor(pub Option<Actor>);

#[cfg(feature = "axum")]
impl<S> axum::extract::FromRequestParts<S> for MaybeActor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Actor>().cloned()))
    }
}
