//! Whole-collection snapshot persistence.
//!
//! Every collection lives under one storage key as a JSON array and is rewritten
//! in full on every change. A service mutates a copy, writes it through, and only
//! swaps the copy in once the write succeeded.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;
use crate::storage::KeyValueStore;
use crate::sync::ChangeFeed;

/// Sentinel key rewritten with the current time after every collection write.
pub const SYNC_KEY: &str = "innkeep.sync";

/// A persisted collection and its storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Items,
    Transactions,
    Requests,
    Receipts,
    Suppliers,
    Users,
    PurchaseOrders,
    Assets,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Items,
        Collection::Transactions,
        Collection::Requests,
        Collection::Receipts,
        Collection::Suppliers,
        Collection::Users,
        Collection::PurchaseOrders,
        Collection::Assets,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Collection::Items => "innkeep.items",
            Collection::Transactions => "innkeep.transactions",
            Collection::Requests => "innkeep.requests",
            Collection::Receipts => "innkeep.receipts",
            Collection::Suppliers => "innkeep.suppliers",
            Collection::Users => "innkeep.users",
            Collection::PurchaseOrders => "innkeep.purchase_orders",
            Collection::Assets => "innkeep.assets",
        }
    }

    pub fn from_key(key: &str) -> Option<Collection> {
        Collection::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

/// Storage strategy plus the change feed of the owning session.
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
    feed: ChangeFeed,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Read a collection.
    ///
    /// A missing key yields `None`. A payload that does not parse is logged and also
    /// yields `None`, so the caller falls back to seed data.
    pub fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Option<Vec<T>>, StorageError> {
        let Some(text) = self.store.get(collection.key())? else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(records) => Ok(Some(records)),
            Err(error) => {
                tracing::warn!(collection = %collection, %error, "stored collection is corrupt; using seed data");
                Ok(None)
            }
        }
    }

    /// Write a collection without announcing it.
    pub fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<(), StorageError> {
        let text = serde_json::to_string(records).map_err(|source| StorageError::Encode {
            key: collection.key().to_string(),
            source,
        })?;
        self.store.put(collection.key(), &text).inspect_err(|error| {
            tracing::error!(collection = %collection, %error, "failed to write collection");
        })
    }

    /// Touch the sentinel key and tell other sessions `collection` changed.
    ///
    /// Failures here are logged only; the data write already happened.
    pub fn announce(&self, collection: Collection) {
        let now = Utc::now();
        if let Err(error) = self.store.put(SYNC_KEY, &now.to_rfc3339()) {
            tracing::error!(%error, "failed to write sync sentinel");
        }
        self.feed.publish(collection, now);
    }
}

/// One collection held in memory behind a lock.
pub struct Snapshot<T> {
    collection: Collection,
    records: RwLock<Vec<T>>,
}

impl<T> Snapshot<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// Load from storage, falling back to `seed` when the key is missing or corrupt.
    ///
    /// A seed that was used is written back so other sessions load the same records.
    pub fn load(
        persistence: &Persistence,
        collection: Collection,
        seed: impl FnOnce() -> Vec<T>,
    ) -> Result<Self, StorageError> {
        let records = match persistence.load(collection)? {
            Some(records) => records,
            None => {
                let seeded = seed();
                if !seeded.is_empty() {
                    persistence.save(collection, &seeded)?;
                    tracing::info!(collection = %collection, count = seeded.len(), "seeded collection");
                }
                seeded
            }
        };

        Ok(Self {
            collection,
            records: RwLock::new(records),
        })
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Vec<T>>, StorageError> {
        self.records
            .read()
            .map_err(|_| StorageError::Poisoned(self.collection.key()))
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<T>>, StorageError> {
        self.records
            .write()
            .map_err(|_| StorageError::Poisoned(self.collection.key()))
    }

    /// Clone of every record.
    pub fn all(&self) -> Result<Vec<T>, StorageError> {
        Ok(self.read()?.clone())
    }

    /// Replace the in-memory copy with what storage currently holds.
    ///
    /// Missing or corrupt data leaves the current records untouched.
    pub fn reload(&self, persistence: &Persistence) -> Result<bool, StorageError> {
        let Some(records) = persistence.load(self.collection)? else {
            return Ok(false);
        };
        *self.write()? = records;
        Ok(true)
    }

    /// Copy, mutate, persist, swap, announce.
    ///
    /// Nothing changes in memory or storage when `f` fails or the write fails.
    pub fn mutate<R, E>(
        &self,
        persistence: &Persistence,
        f: impl FnOnce(&mut Vec<T>) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StorageError>,
    {
        let mut guard = self.write()?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        persistence.save(self.collection, &next)?;
        *guard = next;
        drop(guard);

        persistence.announce(self.collection);
        Ok(out)
    }
}
