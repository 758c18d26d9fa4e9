use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::StorageError;

use super::KeyValueStore;

/// Process-local store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<BTreeMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.inner.read().map_err(|_| StorageError::Poisoned("memory store"))?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(|_| StorageError::Poisoned("memory store"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(|_| StorageError::Poisoned("memory store"))?;
        map.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let map = self.inner.read().map_err(|_| StorageError::Poisoned("memory store"))?;
        Ok(map.keys().cloned().collect())
    }
}
