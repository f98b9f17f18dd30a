//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::actor::{Actor, Permission, Role};
use kernel::id::{PublicEntityId, SupplierId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::PermissionGrant;

// ============================================================================
// Sign In / Refresh
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"Bearer"`
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<MeResponse>,
}

impl TokenResponse {
    pub fn bearer(access_token: String, refresh_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in,
            user: None,
        }
    }
}

// ============================================================================
// Current caller
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: UserId,
    pub role: Role,
    pub public_entity_id: Option<PublicEntityId>,
    pub supplier_id: Option<SupplierId>,
    pub permissions: Vec<Permission>,
}

impl From<&Actor> for MeResponse {
    fn from(actor: &Actor) -> Self {
        Self {
            user_id: actor.user_id,
            role: actor.role,
            public_entity_id: actor.public_entity_id,
            supplier_id: actor.supplier_id,
            permissions: actor.permissions.iter().copied().collect(),
        }
    }
}

// ============================================================================
// Permissions
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantPermissionRequest {
    pub permission: Permission,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrantResponse {
    pub user_id: UserId,
    pub permission: Permission,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub granted_by: Option<UserId>,
    pub granted_at: DateTime<Utc>,
}

impl From<PermissionGrant> for PermissionGrantResponse {
    fn from(grant: PermissionGrant) -> Self {
        Self {
            user_id: grant.user_id,
            permission: grant.permission,
            is_active: grant.is_active,
            expires_at: grant.expires_at,
            granted_by: grant.granted_by,
            granted_at: grant.granted_at,
        }
    }
}
