use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings of the form `area.action` (e.g. "inventory.transact").
/// The wildcard `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub const INVENTORY_READ: Permission = Permission(Cow::Borrowed("inventory.read"));
    pub const INVENTORY_WRITE: Permission = Permission(Cow::Borrowed("inventory.write"));
    pub const INVENTORY_TRANSACT: Permission = Permission(Cow::Borrowed("inventory.transact"));

    pub const ASSETS_READ: Permission = Permission(Cow::Borrowed("assets.read"));
    pub const ASSETS_WRITE: Permission = Permission(Cow::Borrowed("assets.write"));
    pub const ASSETS_CHECKOUT: Permission = Permission(Cow::Borrowed("assets.checkout"));

    pub const PURCHASING_READ: Permission = Permission(Cow::Borrowed("purchasing.read"));
    pub const PURCHASING_WRITE: Permission = Permission(Cow::Borrowed("purchasing.write"));
    pub const PURCHASING_APPROVE: Permission = Permission(Cow::Borrowed("purchasing.approve"));
    pub const PURCHASING_RECEIVE: Permission = Permission(Cow::Borrowed("purchasing.receive"));

    pub const REQUESTS_READ: Permission = Permission(Cow::Borrowed("requests.read"));
    pub const REQUESTS_CREATE: Permission = Permission(Cow::Borrowed("requests.create"));
    pub const REQUESTS_APPROVE_DEPARTMENT: Permission =
        Permission(Cow::Borrowed("requests.approve_department"));
    pub const REQUESTS_APPROVE: Permission = Permission(Cow::Borrowed("requests.approve"));
    pub const REQUESTS_FULFILL: Permission = Permission(Cow::Borrowed("requests.fulfill"));

    pub const USERS_MANAGE: Permission = Permission(Cow::Borrowed("users.manage"));
    pub const REPORTS_EXPORT: Permission = Permission(Cow::Borrowed("reports.export"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Every named permission (excluding the wildcard).
    pub fn all() -> Vec<Permission> {
        vec![
            Self::INVENTORY_READ,
            Self::INVENTORY_WRITE,
            Self::INVENTORY_TRANSACT,
            Self::ASSETS_READ,
            Self::ASSETS_WRITE,
            Self::ASSETS_CHECKOUT,
            Self::PURCHASING_READ,
            Self::PURCHASING_WRITE,
            Self::PURCHASING_APPROVE,
            Self::PURCHASING_RECEIVE,
            Self::REQUESTS_READ,
            Self::REQUESTS_CREATE,
            Self::REQUESTS_APPROVE_DEPARTMENT,
            Self::REQUESTS_APPROVE,
            Self::REQUESTS_FULFILL,
            Self::USERS_MANAGE,
            Self::REPORTS_EXPORT,
        ]
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
