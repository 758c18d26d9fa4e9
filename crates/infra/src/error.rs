//! Infrastructure and service-level errors.

use thiserror::Error;

use innkeep_auth::AuthzError;
use innkeep_core::DomainError;

use crate::export::ExportError;

/// Failure reading or writing a storage key.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    /// A lock was poisoned by a panicking writer.
    #[error("storage lock poisoned: {0}")]
    Poisoned(&'static str),
}

/// Error returned by every service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ServiceError {
    /// Text safe to show to the person who triggered the operation.
    ///
    /// Domain and authorization failures are specific; anything below the service
    /// layer collapses into one generic message.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Domain(DomainError::Validation(msg)) => msg.clone(),
            ServiceError::Domain(DomainError::InvariantViolation(msg)) => msg.clone(),
            ServiceError::Domain(DomainError::NotFound(what)) => format!("{what} not found"),
            ServiceError::Domain(DomainError::Conflict(msg)) => msg.clone(),
            ServiceError::Domain(DomainError::InvalidId(_)) => "Invalid identifier.".to_string(),
            ServiceError::Unauthorized(_) => {
                "You do not have permission to do that.".to_string()
            }
            ServiceError::Storage(_) | ServiceError::Export(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Domain(DomainError::NotFound(_)))
    }
}
