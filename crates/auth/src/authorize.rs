use thiserror::Error;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: {0}")]
    OutOfScope(String),
}

/// Command-side authorization contract.
///
/// Implemented by commands that require permissions; services check these
/// before handing the command to the aggregate.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> Vec<Permission>;
}

/// The single authorization check.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.has(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Authorize every permission a command declares.
pub fn authorize_command<C: CommandAuthorization>(
    principal: &Principal,
    command: &C,
) -> Result<(), AuthzError> {
    for perm in command.required_permissions() {
        authorize(principal, &perm)?;
    }
    Ok(())
}
