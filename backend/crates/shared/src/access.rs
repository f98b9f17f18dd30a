//! Route access rules
//!
//! An [`AccessRule`] is the per-route gate that runs after authentication:
//! an optional role allow-list, then a set of permissions that must all be
//! granted to the caller.

use crate::actor::{Actor, Permission, Role};
use crate::error::app_error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRule {
    /// Empty means any authenticated role
    roles: Vec<Role>,
    permissions: Vec<Permission>,
}

impl AccessRule {
    /// Any authenticated caller
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            permissions: Vec::new(),
        }
    }

    pub fn require(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn check(&self, actor: &Actor) -> Result<(), AppError> {
        if !self.roles.is_empty() && !actor.has_role(&self.roles) {
            return Err(AppError::forbidden(format!(
                "Role {} may not access this resource",
                actor.role
            )));
        }

        let missing = actor.missing_permissions(&self.permissions);
        if !missing.is_empty() {
            let codes = missing
                .iter()
                .map(Permission::code)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::forbidden(format!("Missing permissions: {codes}")));
        }

        Ok(())
    }
}

/// Route-layer middleware: `from_fn_with_state(rule, enforce_access)`
#[cfg(feature = "axum")]
pub async fn enforce_access(
    axum::extract::State(rule): axum::extract::State<AccessRule>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<axum::response::Response, AppError> {
    let actor = req
        .extensions()
        .get::<Actor>()
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;
    rule.check(actor)?;
    Ok(next.run(req).await)
}
