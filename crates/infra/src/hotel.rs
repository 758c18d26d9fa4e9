//! Wiring: one session over a storage backend.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use innkeep_events::{ChangeNotice, InMemoryEventBus, SessionId};

use crate::config::{Config, StorageKind};
use crate::error::{ServiceError, StorageError};
use crate::seed::SeedData;
use crate::services::{AssetService, InventoryService, PurchasingService, RequestService, UserService};
use crate::snapshot::{Collection, Persistence, Snapshot};
use crate::storage::{FileStore, InMemoryStore, KeyValueStore};
use crate::sync::{ChangeFeed, ChangeListener};

/// Every service of one session, sharing one storage backend.
///
/// Open several sessions over the same store and bus to get the multi-tab
/// behaviour: each writes through, and the others reload on notice.
pub struct Hotel {
    persistence: Arc<Persistence>,
    pub inventory: Arc<InventoryService>,
    pub assets: Arc<AssetService>,
    pub purchasing: PurchasingService,
    pub requests: RequestService,
    pub users: UserService,
}

impl Hotel {
    /// Read configuration from the environment and open a session.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::from_env().context("invalid configuration")?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn KeyValueStore> = match config.storage {
            StorageKind::Memory => Arc::new(InMemoryStore::new()),
            StorageKind::File => Arc::new(
                FileStore::open(&config.data_dir)
                    .with_context(|| format!("cannot open data directory {}", config.data_dir.display()))?,
            ),
        };
        tracing::info!(storage = ?config.storage, seed = config.seed, "opening session");

        Self::open(store, Arc::new(InMemoryEventBus::new()), config).context("cannot load collections")
    }

    /// Open a session on an existing store and bus.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        bus: Arc<InMemoryEventBus<ChangeNotice>>,
        config: &Config,
    ) -> Result<Self, ServiceError> {
        let persistence = Arc::new(Persistence::new(store, ChangeFeed::new(bus)));
        let seed = if config.seed {
            SeedData::generate(Utc::now())?
        } else {
            SeedData::empty()
        };
        let SeedData {
            users,
            items,
            transactions,
            suppliers,
            assets,
        } = seed;

        let p = persistence.as_ref();
        let inventory = Arc::new(InventoryService::new(
            persistence.clone(),
            Snapshot::load(p, Collection::Items, || items)?,
            Snapshot::load(p, Collection::Transactions, || transactions)?,
            config.expiry_warning_days,
        ));
        let assets = Arc::new(AssetService::new(
            persistence.clone(),
            Snapshot::load(p, Collection::Assets, || assets)?,
        ));
        let purchasing = PurchasingService::new(
            persistence.clone(),
            Snapshot::load(p, Collection::Suppliers, || suppliers)?,
            Snapshot::load(p, Collection::PurchaseOrders, Vec::new)?,
            inventory.clone(),
        );
        let requests = RequestService::new(
            persistence.clone(),
            Snapshot::load(p, Collection::Requests, Vec::new)?,
            Snapshot::load(p, Collection::Receipts, Vec::new)?,
            inventory.clone(),
            assets.clone(),
        );
        let users = UserService::new(persistence.clone(), Snapshot::load(p, Collection::Users, || users)?);

        Ok(Self {
            persistence,
            inventory,
            assets,
            purchasing,
            requests,
            users,
        })
    }

    pub fn session(&self) -> SessionId {
        self.persistence.feed().session()
    }

    /// The bus this session publishes on; pass it to [`Hotel::open`] for a sibling session.
    pub fn bus(&self) -> Arc<InMemoryEventBus<ChangeNotice>> {
        self.persistence.feed().bus().clone()
    }

    pub fn listen(&self) -> ChangeListener {
        self.persistence.feed().listen()
    }

    /// Reload one collection from storage.
    pub fn reload(&self, collection: Collection) -> Result<bool, ServiceError> {
        let reloaded = match collection {
            Collection::Items | Collection::Transactions => self.inventory.reload(collection)?,
            Collection::Assets => self.assets.reload()?,
            Collection::Suppliers | Collection::PurchaseOrders => self.purchasing.reload(collection)?,
            Collection::Requests | Collection::Receipts => self.requests.reload(collection)?,
            Collection::Users => self.users.reload()?,
        };
        tracing::debug!(collection = %collection, reloaded, "collection reloaded");
        Ok(reloaded)
    }

    /// Reload whatever other sessions announced since the last call.
    pub fn catch_up(&self, listener: &ChangeListener) -> Result<Vec<Collection>, ServiceError> {
        let changed = listener.pending();
        for collection in &changed {
            self.reload(*collection)?;
        }
        Ok(changed)
    }

    /// Time of the most recent write by any session, from the sentinel key.
    pub fn last_write(&self) -> Result<Option<String>, StorageError> {
        self.persistence.store().get(crate::snapshot::SYNC_KEY)
    }
}
