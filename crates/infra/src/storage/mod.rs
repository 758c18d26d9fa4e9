//! Key/value storage strategy.
//!
//! Collections are stored as one JSON document per key. The strategy only moves
//! strings; encoding lives in [`crate::snapshot`].

mod file;
mod memory;

use std::sync::Arc;

use crate::error::StorageError;

pub use file::FileStore;
pub use memory::InMemoryStore;

/// Injected persistence strategy.
///
/// Writes replace the whole value. There is no compare-and-swap: the last writer
/// wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently present, sorted.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}
