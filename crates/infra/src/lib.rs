//! Infrastructure layer: storage strategy, snapshot persistence, services,
//! change notification, exports and configuration.

pub mod config;
pub mod error;
pub mod export;
pub mod hotel;
pub mod seed;
pub mod services;
pub mod snapshot;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod integration_tests;

pub use config::{Config, ConfigError, StorageKind};
pub use error::{ServiceError, StorageError};
pub use hotel::Hotel;
pub use snapshot::{Collection, SYNC_KEY};
pub use storage::{FileStore, InMemoryStore, KeyValueStore};
pub use sync::{ChangeFeed, ChangeListener};
