//! Dashboard aggregation over the full item collection.
//!
//! Recomputed from scratch on every change; collections are small.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use innkeep_core::Money;

use crate::{InventoryItem, InventoryItemId};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategorySummary {
    pub items: usize,
    pub quantity: u64,
    pub value: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub item_id: InventoryItemId,
    pub name: String,
    pub quantity: u64,
    pub min_stock_level: u64,
    pub shortfall: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryAlert {
    pub item_id: InventoryItemId,
    pub name: String,
    pub expiry_date: NaiveDate,
    /// Negative once the date has passed.
    pub days_remaining: i64,
}

impl ExpiryAlert {
    pub fn is_expired(&self) -> bool {
        self.days_remaining < 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_items: usize,
    pub total_quantity: u64,
    pub total_value: Money,
    pub by_category: BTreeMap<String, CategorySummary>,
    pub low_stock: Vec<LowStockAlert>,
    pub expiring: Vec<ExpiryAlert>,
}

pub fn is_low_stock(item: &InventoryItem) -> bool {
    item.is_low_stock()
}

/// Low-stock items, largest shortfall first.
pub fn low_stock(items: &[InventoryItem]) -> Vec<LowStockAlert> {
    let mut alerts: Vec<LowStockAlert> = items
        .iter()
        .filter(|i| is_low_stock(i))
        .map(|i| LowStockAlert {
            item_id: i.id,
            name: i.name.clone(),
            quantity: i.quantity,
            min_stock_level: i.min_stock_level,
            shortfall: i.shortfall(),
        })
        .collect();

    alerts.sort_by(|a, b| b.shortfall.cmp(&a.shortfall).then_with(|| a.name.cmp(&b.name)));
    alerts
}

/// In-stock items whose expiry date is on or before `today + days` (already expired included),
/// soonest first.
pub fn expiring_within(items: &[InventoryItem], today: NaiveDate, days: u32) -> Vec<ExpiryAlert> {
    let mut alerts: Vec<ExpiryAlert> = items
        .iter()
        .filter(|i| i.quantity > 0)
        .filter_map(|i| {
            let expiry_date = i.expiry_date?;
            let days_remaining = (expiry_date - today).num_days();
            (days_remaining <= i64::from(days)).then(|| ExpiryAlert {
                item_id: i.id,
                name: i.name.clone(),
                expiry_date,
                days_remaining,
            })
        })
        .collect();

    alerts.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date).then_with(|| a.name.cmp(&b.name)));
    alerts
}

pub fn summarize(items: &[InventoryItem], today: NaiveDate, expiry_warning_days: u32) -> InventorySummary {
    let mut by_category: BTreeMap<String, CategorySummary> = BTreeMap::new();
    for item in items {
        let entry = by_category.entry(item.category.clone()).or_default();
        entry.items += 1;
        entry.quantity = entry.quantity.saturating_add(item.quantity);
        entry.value = entry.value + item.current_value;
    }

    InventorySummary {
        total_items: items.len(),
        total_quantity: items.iter().fold(0u64, |acc, i| acc.saturating_add(i.quantity)),
        total_value: items.iter().map(|i| i.current_value).sum(),
        by_category,
        low_stock: low_stock(items),
        expiring: expiring_within(items, today, expiry_warning_days),
    }
}
