use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{DomainError, DomainResult, Entity, Money};

use crate::reconcile::{StockLevel, reconcile};
use crate::transaction::StockTransaction;

innkeep_core::typed_id!(InventoryItemId, "Inventory item identifier.");

/// A stocked consumable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub name: String,
    pub category: String,
    pub quantity: u64,
    /// Counting unit ("pcs", "bottles", "kg").
    pub unit: String,
    pub min_stock_level: u64,
    pub current_value: Money,
    pub location: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    /// Supplier name as entered on the item form.
    #[serde(default)]
    pub supplier: Option<String>,
}

impl InventoryItem {
    pub fn stock_level(&self) -> StockLevel {
        StockLevel {
            quantity: self.quantity,
            current_value: self.current_value,
            expiry_date: self.expiry_date,
        }
    }

    /// Apply a ledger entry to this item.
    ///
    /// The caller is responsible for matching `tx.item_id`; this only reconciles.
    pub fn apply_transaction(&mut self, tx: &StockTransaction) {
        let next = reconcile(&self.stock_level(), tx);
        self.quantity = next.quantity;
        self.current_value = next.current_value;
        self.expiry_date = next.expiry_date;
        self.last_updated = tx.date;
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock_level
    }

    /// Units needed to get back above the minimum level.
    pub fn shortfall(&self) -> u64 {
        if self.is_low_stock() {
            self.min_stock_level - self.quantity + 1
        } else {
            0
        }
    }
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Item form input, used for both create and direct edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub category: String,
    pub quantity: u64,
    pub unit: String,
    pub min_stock_level: u64,
    pub current_value: Money,
    pub location: String,
    pub expiry_date: Option<NaiveDate>,
    pub supplier: Option<String>,
}

impl ItemDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        if self.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        if self.current_value.is_negative() {
            return Err(DomainError::validation("current value cannot be negative"));
        }
        Ok(())
    }

    pub fn into_item(self, id: InventoryItemId, at: DateTime<Utc>) -> DomainResult<InventoryItem> {
        self.validate()?;
        Ok(InventoryItem {
            id,
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            quantity: self.quantity,
            unit: self.unit.trim().to_string(),
            min_stock_level: self.min_stock_level,
            current_value: self.current_value,
            location: self.location.trim().to_string(),
            last_updated: at,
            expiry_date: self.expiry_date,
            supplier: clean(self.supplier),
        })
    }

    /// Overwrite every editable field of `item`. Identity is kept.
    pub fn apply_to(self, item: &mut InventoryItem, at: DateTime<Utc>) -> DomainResult<()> {
        let updated = self.into_item(item.id, at)?;
        *item = updated;
        Ok(())
    }
}

impl From<&InventoryItem> for ItemDraft {
    fn from(item: &InventoryItem) -> Self {
        Self {
            name: item.name.clone(),
            category: item.category.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            min_stock_level: item.min_stock_level,
            current_value: item.current_value,
            location: item.location.clone(),
            expiry_date: item.expiry_date,
            supplier: item.supplier.clone(),
        }
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
