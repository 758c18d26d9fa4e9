use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
///
/// A user carries exactly one role; [`role_permissions`] expands it into the
/// capability set checked by [`crate::authorize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const MANAGER: Role = Role(Cow::Borrowed("manager"));
    pub const DEPARTMENT_HEAD: Role = Role(Cow::Borrowed("department_head"));
    pub const STOREKEEPER: Role = Role(Cow::Borrowed("storekeeper"));
    pub const STAFF: Role = Role(Cow::Borrowed("staff"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role → permission policy. Unknown roles get nothing.
pub fn role_permissions(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "admin" => vec![Permission::WILDCARD],
        "manager" => Permission::all()
            .into_iter()
            .filter(|p| *p != Permission::USERS_MANAGE)
            .collect(),
        "department_head" => vec![
            Permission::INVENTORY_READ,
            Permission::ASSETS_READ,
            Permission::REQUESTS_READ,
            Permission::REQUESTS_CREATE,
            Permission::REQUESTS_APPROVE_DEPARTMENT,
            Permission::REPORTS_EXPORT,
        ],
        "storekeeper" => vec![
            Permission::INVENTORY_READ,
            Permission::INVENTORY_WRITE,
            Permission::INVENTORY_TRANSACT,
            Permission::ASSETS_READ,
            Permission::ASSETS_WRITE,
            Permission::ASSETS_CHECKOUT,
            Permission::PURCHASING_READ,
            Permission::PURCHASING_RECEIVE,
            Permission::REQUESTS_READ,
            Permission::REQUESTS_FULFILL,
            Permission::REPORTS_EXPORT,
        ],
        "staff" => vec![
            Permission::INVENTORY_READ,
            Permission::ASSETS_READ,
            Permission::REQUESTS_READ,
            Permission::REQUESTS_CREATE,
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_cannot_manage_users() {
        let perms = role_permissions(&Role::MANAGER);
        assert!(perms.contains(&Permission::REQUESTS_APPROVE));
        assert!(!perms.contains(&Permission::USERS_MANAGE));
    }

    #[test]
    fn unknown_role_has_no_permissions() {
        assert!(role_permissions(&Role::new("night_auditor")).is_empty());
    }
}
