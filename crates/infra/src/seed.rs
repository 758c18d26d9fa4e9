//! Demo dataset used when a collection has never been written (or is corrupt).
//!
//! Item stock is produced by replaying the seeded `received` transactions, so the
//! seeded ledger and the seeded items always agree.

use chrono::{DateTime, Days, NaiveDate, Utc};

use innkeep_assets::{Asset, AssetDraft, AssetId};
use innkeep_auth::{NewUser, Role, User};
use innkeep_core::{DomainResult, Money, UserId};
use innkeep_inventory::{InventoryItem, InventoryItemId, ItemDraft, StockTransaction, TransactionKind};
use innkeep_purchasing::{ContactInfo, Supplier, SupplierDraft, SupplierId};

#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub users: Vec<User>,
    pub items: Vec<InventoryItem>,
    /// Newest first, like the live ledger.
    pub transactions: Vec<StockTransaction>,
    pub suppliers: Vec<Supplier>,
    pub assets: Vec<Asset>,
}

struct SeedItem {
    name: &'static str,
    category: &'static str,
    unit: &'static str,
    min_stock_level: u64,
    location: &'static str,
    supplier: &'static str,
    received: i64,
    unit_cents: i64,
    shelf_life_days: Option<u64>,
}

const ITEMS: &[SeedItem] = &[
    SeedItem { name: "Bath towel", category: "Linen", unit: "pcs", min_stock_level: 40, location: "Linen room", supplier: "Coastal Linen Co.", received: 120, unit_cents: 850, shelf_life_days: None },
    SeedItem { name: "King bed sheet", category: "Linen", unit: "pcs", min_stock_level: 30, location: "Linen room", supplier: "Coastal Linen Co.", received: 25, unit_cents: 2400, shelf_life_days: None },
    SeedItem { name: "Shampoo 30ml", category: "Amenities", unit: "bottles", min_stock_level: 200, location: "Store B2", supplier: "Harbor Amenities", received: 600, unit_cents: 45, shelf_life_days: Some(365) },
    SeedItem { name: "Glass cleaner", category: "Cleaning", unit: "litres", min_stock_level: 10, location: "Store B1", supplier: "Harbor Amenities", received: 8, unit_cents: 390, shelf_life_days: Some(540) },
    SeedItem { name: "Fresh milk", category: "F&B", unit: "litres", min_stock_level: 20, location: "Cold room", supplier: "Valley Dairy", received: 48, unit_cents: 120, shelf_life_days: Some(5) },
    SeedItem { name: "Minibar water 500ml", category: "Minibar", unit: "bottles", min_stock_level: 100, location: "Store B2", supplier: "Valley Dairy", received: 240, unit_cents: 35, shelf_life_days: Some(300) },
];

impl SeedData {
    /// Nothing at all; used when seeding is switched off.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn generate(now: DateTime<Utc>) -> DomainResult<Self> {
        let today = now.date_naive();

        let users = vec![
            user("admin", "Alex Admin", Role::ADMIN, None, now)?,
            user("gm", "Morgan Reyes", Role::MANAGER, None, now)?,
            user("hk.head", "Sam Okafor", Role::DEPARTMENT_HEAD, Some("Housekeeping"), now)?,
            user("store", "Jordan Lee", Role::STOREKEEPER, Some("Stores"), now)?,
            user("hk.staff", "Riley Chen", Role::STAFF, Some("Housekeeping"), now)?,
        ];
        let receiver = users
            .iter()
            .find(|u| u.role == Role::STOREKEEPER)
            .map(|u| u.display_name.clone())
            .unwrap_or_default();

        let mut items = Vec::with_capacity(ITEMS.len());
        let mut transactions = Vec::with_capacity(ITEMS.len());
        for seed in ITEMS {
            let mut item = ItemDraft {
                name: seed.name.to_string(),
                category: seed.category.to_string(),
                quantity: 0,
                unit: seed.unit.to_string(),
                min_stock_level: seed.min_stock_level,
                current_value: Money::ZERO,
                location: seed.location.to_string(),
                expiry_date: None,
                supplier: Some(seed.supplier.to_string()),
            }
            .into_item(InventoryItemId::generate(), now)?;

            let mut tx = StockTransaction::new(
                item.id,
                &item.name,
                TransactionKind::Received,
                seed.received,
                &receiver,
                now,
            )
            .with_value(Money::from_cents(seed.unit_cents * seed.received))
            .with_notes("Opening stock");
            if let Some(days) = seed.shelf_life_days {
                tx = tx.with_expiry(add_days(today, days));
            }

            item.apply_transaction(&tx);
            items.push(item);
            transactions.push(tx);
        }
        transactions.reverse();

        let suppliers = vec![
            supplier("Coastal Linen Co.", "orders@coastallinen.example", &["Linen"], now)?,
            supplier("Harbor Amenities", "sales@harbor.example", &["Amenities", "Cleaning"], now)?,
            supplier("Valley Dairy", "dispatch@valleydairy.example", &["F&B", "Minibar"], now)?,
        ];

        let assets = vec![
            asset("Vacuum cleaner #1", "Housekeeping equipment", Some("VC-1001"), "Housekeeping office", 32_000, now)?,
            asset("Vacuum cleaner #2", "Housekeeping equipment", Some("VC-1002"), "Housekeeping office", 32_000, now)?,
            asset("Two-way radio 3", "Communication", Some("RD-0003"), "Front office", 14_500, now)?,
            asset("Banquet projector", "AV equipment", None, "Store B1", 89_900, now)?,
        ];

        Ok(Self {
            users,
            items,
            transactions,
            suppliers,
            assets,
        })
    }
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(date)
}

fn user(
    username: &str,
    display_name: &str,
    role: Role,
    department: Option<&str>,
    now: DateTime<Utc>,
) -> DomainResult<User> {
    NewUser {
        username: username.to_string(),
        display_name: display_name.to_string(),
        role,
        department: department.map(str::to_string),
    }
    .into_user(UserId::new(), now)
}

fn supplier(name: &str, email: &str, categories: &[&str], now: DateTime<Utc>) -> DomainResult<Supplier> {
    SupplierDraft {
        name: name.to_string(),
        contact: ContactInfo {
            email: Some(email.to_string()),
            ..ContactInfo::default()
        },
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
    .into_supplier(SupplierId::generate(), now)
}

fn asset(
    name: &str,
    category: &str,
    serial_number: Option<&str>,
    location: &str,
    value_cents: i64,
    now: DateTime<Utc>,
) -> DomainResult<Asset> {
    AssetDraft {
        name: name.to_string(),
        category: category.to_string(),
        serial_number: serial_number.map(str::to_string),
        location: location.to_string(),
        purchase_date: None,
        purchase_value: Money::from_cents(value_cents),
        notes: None,
    }
    .into_asset(AssetId::generate(), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use innkeep_inventory::replay;

    #[test]
    fn items_match_their_opening_transactions() {
        let seed = SeedData::generate(Utc::now()).unwrap();
        assert_eq!(seed.items.len(), ITEMS.len());

        for item in &seed.items {
            let ledger: Vec<_> = seed
                .transactions
                .iter()
                .rev()
                .filter(|t| t.item_id == item.id)
                .collect();
            assert_eq!(replay(ledger.into_iter()), item.stock_level(), "{}", item.name);
        }
    }

    #[test]
    fn seed_contains_low_stock_and_every_role() {
        let seed = SeedData::generate(Utc::now()).unwrap();
        assert!(seed.items.iter().any(|i| i.is_low_stock()));
        for role in [Role::ADMIN, Role::MANAGER, Role::DEPARTMENT_HEAD, Role::STOREKEEPER, Role::STAFF] {
            assert!(seed.users.iter().any(|u| u.role == role), "{role}");
        }
    }
}
