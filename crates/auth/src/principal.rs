use std::collections::BTreeSet;

use innkeep_core::UserId;

use crate::{Permission, Role, User, role_permissions};

/// A fully resolved actor for authorization decisions.
///
/// The capability set is computed once from the user's role; callers never
/// inspect roles directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub display_name: String,
    pub department: Option<String>,
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
}

impl Principal {
    /// Resolve a stored user. Suspended users get an empty capability set.
    pub fn from_user(user: &User) -> Self {
        let permissions = if user.is_active() {
            role_permissions(&user.role).into_iter().collect()
        } else {
            BTreeSet::new()
        };

        Self {
            user_id: user.id,
            display_name: user.display_name.clone(),
            department: user.department.clone(),
            role: user.role.clone(),
            permissions,
        }
    }

    /// Principal with an explicit capability set (tests, system jobs).
    pub fn with_permissions(
        user_id: UserId,
        display_name: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            department: None,
            role: Role::new("custom"),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn has(&self, permission: &Permission) -> bool {
        self.permissions.contains(&Permission::WILDCARD) || self.permissions.contains(permission)
    }

    pub fn belongs_to(&self, department: &str) -> bool {
        self.department
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case(department))
    }
}
