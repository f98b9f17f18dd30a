//! Permission Grant Entity

use chrono::{DateTime, Utc};
use kernel::actor::Permission;
use kernel::id::UserId;

/// A (user, permission) grant. Revocation is logical: `is_active = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub user_id: UserId,
    pub permission: Permission,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub granted_by: Option<UserId>,
    pub granted_at: DateTime<Utc>,
}

impl PermissionGrant {
    pub fn new(
        user_id: UserId,
        permission: Permission,
        expires_at: Option<DateTime<Utc>>,
        granted_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            permission,
            is_active: true,
            expires_at,
            granted_by: Some(granted_by),
            granted_at: now,
        }
    }

    /// Active and not past its expiry
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|at| at > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_effective_window() {
        let now = Utc::now();
        let admin = UserId::new();
        let grant = PermissionGrant::new(
            UserId::new(),
            Permission::CreateBidding,
            Some(now + Duration::hours(1)),
            admin,
            now,
        );
        assert!(grant.is_effective(now));
        assert!(!grant.is_effective(now + Duration::hours(1)));

        let revoked = PermissionGrant {
            is_active: false,
            ..grant
        };
        assert!(!revoked.is_effective(now));
    }
}
