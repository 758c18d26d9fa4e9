//! Inventory domain module.
//!
//! Consumable stock (linen, amenities, cleaning supplies, minibar, food) and the
//! transaction ledger that moves it. Pure domain logic: no IO, no storage.

pub mod item;
pub mod reconcile;
pub mod summary;
pub mod transaction;

pub use item::{InventoryItem, InventoryItemId, ItemDraft};
pub use reconcile::{StockLevel, reconcile, replay};
pub use summary::{
    CategorySummary, ExpiryAlert, InventorySummary, LowStockAlert, expiring_within, is_low_stock,
    low_stock, summarize,
};
pub use transaction::{StockTransaction, StockTransactionId, TransactionKind};
