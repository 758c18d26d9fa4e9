use std::sync::Arc;

use chrono::Utc;

use innkeep_auth::{NewUser, Permission, Principal, User, authorize};
use innkeep_core::{DomainError, DomainResult, UserId};

use crate::error::ServiceError;
use crate::services::position_of;
use crate::snapshot::{Persistence, Snapshot};

/// Staff directory. Also resolves who is acting.
pub struct UserService {
    persistence: Arc<Persistence>,
    users: Snapshot<User>,
}

impl UserService {
    pub fn new(persistence: Arc<Persistence>, users: Snapshot<User>) -> Self {
        Self { persistence, users }
    }

    /// Resolve a username to a principal.
    ///
    /// There are no credentials; this stands in for a login screen that picks a
    /// staff member. Suspended users are refused.
    pub fn sign_in(&self, username: &str) -> Result<Principal, ServiceError> {
        let username = username.trim().to_lowercase();
        let users = self.users.read()?;
        let user = users
            .iter()
            .find(|u| u.username == username)
            .ok_or_else(|| DomainError::not_found(format!("user '{username}'")))?;
        if !user.is_active() {
            tracing::warn!(%username, "sign-in refused for suspended user");
            return Err(DomainError::invariant("this account is suspended").into());
        }
        tracing::info!(%username, role = %user.role, "signed in");
        Ok(Principal::from_user(user))
    }

    pub fn principal_for(&self, id: UserId) -> Result<Principal, ServiceError> {
        let users = self.users.read()?;
        let idx = position_of(users.as_slice(), &id, "user")?;
        Ok(Principal::from_user(&users[idx]))
    }

    pub fn list(&self, principal: &Principal) -> Result<Vec<User>, ServiceError> {
        authorize(principal, &Permission::USERS_MANAGE)?;
        Ok(self.users.all()?)
    }

    pub fn create(&self, principal: &Principal, new_user: NewUser) -> Result<User, ServiceError> {
        authorize(principal, &Permission::USERS_MANAGE)?;
        let user = new_user.into_user(UserId::new(), Utc::now())?;

        self.users.mutate(&self.persistence, |users| {
            ensure_unique(users, &user.username, None)?;
            users.push(user.clone());
            Ok::<_, ServiceError>(())
        })?;

        tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    /// Overwrite username, display name, role and department. Status is unchanged.
    pub fn update(&self, principal: &Principal, id: UserId, form: NewUser) -> Result<User, ServiceError> {
        authorize(principal, &Permission::USERS_MANAGE)?;

        let user = self.users.mutate(&self.persistence, |users| {
            let idx = position_of(users, &id, "user")?;
            let current = &users[idx];
            let mut updated = form.into_user(id, current.created_at)?;
            updated.status = current.status;
            ensure_unique(users, &updated.username, Some(id))?;
            users[idx] = updated.clone();
            Ok::<_, ServiceError>(updated)
        })?;

        tracing::info!(user_id = %id, by = %principal.display_name, "user updated");
        Ok(user)
    }

    pub fn suspend(&self, principal: &Principal, id: UserId) -> Result<User, ServiceError> {
        authorize(principal, &Permission::USERS_MANAGE)?;
        if principal.user_id == id {
            return Err(DomainError::invariant("you cannot suspend your own account").into());
        }
        let user = self.change(id, User::suspend)?;
        tracing::info!(user_id = %id, by = %principal.display_name, "user suspended");
        Ok(user)
    }

    pub fn activate(&self, principal: &Principal, id: UserId) -> Result<User, ServiceError> {
        authorize(principal, &Permission::USERS_MANAGE)?;
        let user = self.change(id, User::activate)?;
        tracing::info!(user_id = %id, by = %principal.display_name, "user activated");
        Ok(user)
    }

    pub fn delete(&self, principal: &Principal, id: UserId) -> Result<(), ServiceError> {
        authorize(principal, &Permission::USERS_MANAGE)?;
        if principal.user_id == id {
            return Err(DomainError::invariant("you cannot delete your own account").into());
        }
        self.users.mutate(&self.persistence, |users| {
            let idx = position_of(users, &id, "user")?;
            users.remove(idx);
            Ok::<_, ServiceError>(())
        })?;
        tracing::info!(user_id = %id, by = %principal.display_name, "user deleted");
        Ok(())
    }

    pub(crate) fn reload(&self) -> Result<bool, ServiceError> {
        Ok(self.users.reload(&self.persistence)?)
    }

    fn change(&self, id: UserId, f: impl FnOnce(&mut User) -> DomainResult<()>) -> Result<User, ServiceError> {
        self.users.mutate(&self.persistence, |users| {
            let idx = position_of(users, &id, "user")?;
            f(&mut users[idx])?;
            Ok::<_, ServiceError>(users[idx].clone())
        })
    }
}

fn ensure_unique(users: &[User], username: &str, except: Option<UserId>) -> DomainResult<()> {
    let taken = users
        .iter()
        .any(|u| u.username == username && Some(u.id) != except);
    if taken {
        return Err(DomainError::conflict(format!("username '{username}' is taken")));
    }
    Ok(())
}
