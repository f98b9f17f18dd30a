//! Permission Service
//!
//! Named permission grants on top of coarse roles. Grants are read from the
//! shared store on every check; nothing is cached in-process.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::actor::{Actor, Permission};
use kernel::id::UserId;
use platform::clock::Clock;

use crate::domain::entity::PermissionGrant;
use crate::domain::repository::{PermissionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

pub struct GrantInput {
    pub user_id: UserId,
    pub permission: Permission,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct PermissionService<R>
where
    R: PermissionRepository + UserRepository,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> PermissionService<R>
where
    R: PermissionRepository + UserRepository,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn check_permission(&self, user_id: UserId, permission: Permission) -> AuthResult<bool> {
        Ok(self.active_permissions(user_id).await?.contains(&permission))
    }

    pub async fn active_permissions(&self, user_id: UserId) -> AuthResult<BTreeSet<Permission>> {
        let now = self.clock.now();
        let grants = self.repo.find_effective(user_id, now).await?;
        Ok(grants
            .into_iter()
            .filter(|g| g.is_effective(now))
            .map(|g| g.permission)
            .collect())
    }

    /// Re-granting reactivates and replaces the expiry. Admins may grant to
    /// themselves.
    pub async fn grant(&self, actor: &Actor, input: GrantInput) -> AuthResult<PermissionGrant> {
        Self::require_manager(actor, input.permission)?;

        let now = self.clock.now();
        if input.expires_at.is_some_and(|at| at <= now) {
            return Err(AuthError::Validation(
                "expiresAt must be in the future".to_string(),
            ));
        }

        self.repo
            .find_by_id(input.user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("User {} not found", input.user_id)))?;

        let grant = PermissionGrant::new(
            input.user_id,
            input.permission,
            input.expires_at,
            actor.user_id,
            now,
        );
        self.repo.upsert(&grant).await?;

        tracing::info!(
            user_id = %grant.user_id,
            permission = grant.permission.code(),
            granted_by = %actor.user_id,
            "Permission granted"
        );

        Ok(grant)
    }

    pub async fn revoke(&self, actor: &Actor, user_id: UserId, permission: Permission) -> AuthResult<()> {
        Self::require_manager(actor, permission)?;

        if !self.repo.deactivate(user_id, permission).await? {
            return Err(AuthError::NotFound(format!(
                "No active {} grant for user {user_id}",
                permission.code()
            )));
        }

        tracing::info!(
            %user_id,
            permission = permission.code(),
            revoked_by = %actor.user_id,
            "Permission revoked"
        );
        Ok(())
    }

    /// Own grants, or anyone's for permission managers
    pub async fn list(&self, actor: &Actor, user_id: UserId) -> AuthResult<Vec<PermissionGrant>> {
        let manager = actor.is_admin() || actor.has_permission(Permission::ManagePermissions);
        if !manager && actor.user_id != user_id {
            return Err(AuthError::Forbidden(
                "Cannot list another user's permissions".to_string(),
            ));
        }
        self.repo.find_all(user_id).await
    }

    /// Admins always; delegates holding MANAGE_PERMISSIONS for everything
    /// except MANAGE_PERMISSIONS itself
    fn require_manager(actor: &Actor, target: Permission) -> AuthResult<()> {
        if actor.is_admin() {
            return Ok(());
        }
        if !actor.has_permission(Permission::ManagePermissions) {
            return Err(AuthError::MissingPermissions(vec![
                Permission::ManagePermissions,
            ]));
        }
        if target == Permission::ManagePermissions {
            return Err(AuthError::Forbidden(
                "Only administrators delegate permission management".to_string(),
            ));
        }
        Ok(())
    }
}
