//! Staff user records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{DomainError, DomainResult, Entity, UserId};

use crate::Role;

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// User can sign in and act.
    #[default]
    Active,
    /// User is kept for history but has no permissions.
    Suspended,
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "Active"),
            UserStatus::Suspended => write!(f, "Suspended"),
        }
    }
}

/// A member of hotel staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    /// Housekeeping, Front Office, F&B, Maintenance... `None` for hotel-wide roles.
    pub department: Option<String>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

/// Form input for a new user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub department: Option<String>,
}

impl NewUser {
    pub fn into_user(self, id: UserId, created_at: DateTime<Utc>) -> DomainResult<User> {
        let username = self.username.trim().to_lowercase();
        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if username.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("username cannot contain whitespace"));
        }
        if self.display_name.trim().is_empty() {
            return Err(DomainError::validation("display name cannot be empty"));
        }

        Ok(User {
            id,
            username,
            display_name: self.display_name.trim().to_string(),
            role: self.role,
            department: self
                .department
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            status: UserStatus::Active,
            created_at,
        })
    }
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn suspend(&mut self) -> DomainResult<()> {
        if self.status == UserStatus::Suspended {
            return Err(DomainError::invariant("user is already suspended"));
        }
        self.status = UserStatus::Suspended;
        Ok(())
    }

    pub fn activate(&mut self) -> DomainResult<()> {
        if self.status == UserStatus::Active {
            return Err(DomainError::invariant("user is already active"));
        }
        self.status = UserStatus::Active;
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
