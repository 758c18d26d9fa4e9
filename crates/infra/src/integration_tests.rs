//! End-to-end tests across services, storage and the change feed.
//!
//! Pipeline under test: principal → service → domain rule → KeyValueStore →
//! change notice → sibling session reload.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{Days, NaiveDate, Utc};

    use innkeep_assets::{AssetDraft, AssetStatus};
    use innkeep_auth::{AuthzError, NewUser, Permission, Principal, Role};
    use innkeep_core::{DomainError, Money, UserId};
    use innkeep_events::InMemoryEventBus;
    use innkeep_inventory::{InventoryItem, InventoryItemId, ItemDraft, StockTransaction, TransactionKind};
    use innkeep_purchasing::{ContactInfo, PurchaseOrderStatus, SupplierDraft};
    use innkeep_requests::RequestStatus;

    use crate::config::Config;
    use crate::error::{ServiceError, StorageError};
    use crate::hotel::Hotel;
    use crate::services::{NewRequest, RequestTarget};
    use crate::snapshot::{Collection, SYNC_KEY};
    use crate::storage::{FileStore, InMemoryStore, KeyValueStore};

    fn unseeded() -> Config {
        Config {
            seed: false,
            ..Config::default()
        }
    }

    fn root() -> Principal {
        Principal::with_permissions(UserId::new(), "System", [Permission::WILDCARD])
    }

    fn hotel() -> Hotel {
        Hotel::open(Arc::new(InMemoryStore::new()), Arc::new(InMemoryEventBus::new()), &unseeded()).unwrap()
    }

    fn staff(hotel: &Hotel, username: &str, role: Role, department: &str) -> Principal {
        hotel
            .users
            .create(
                &root(),
                NewUser {
                    username: username.to_string(),
                    display_name: username.to_string(),
                    role,
                    department: Some(department.to_string()),
                },
            )
            .unwrap();
        hotel.users.sign_in(username).unwrap()
    }

    fn item(hotel: &Hotel, name: &str) -> InventoryItem {
        hotel
            .inventory
            .create_item(
                &root(),
                ItemDraft {
                    name: name.to_string(),
                    category: "Linen".to_string(),
                    quantity: 0,
                    unit: "pcs".to_string(),
                    min_stock_level: 5,
                    current_value: Money::ZERO,
                    location: "Linen room".to_string(),
                    expiry_date: None,
                    supplier: None,
                },
            )
            .unwrap()
    }

    fn receive(hotel: &Hotel, item: &InventoryItem, quantity: i64, cents: i64) {
        let tx = StockTransaction::new(item.id, &item.name, TransactionKind::Received, quantity, "Store", Utc::now())
            .with_value(Money::from_cents(cents));
        hotel.inventory.record_transaction(&root(), tx).unwrap();
    }

    fn current(hotel: &Hotel, id: InventoryItemId) -> InventoryItem {
        hotel.inventory.get_item(&root(), id).unwrap()
    }

    #[test]
    fn transactions_reconcile_items_and_log_newest_first() {
        let hotel = hotel();
        let towel = item(&hotel, "Bath towel");

        receive(&hotel, &towel, 10, 10000);
        let used = StockTransaction::new(towel.id, &towel.name, TransactionKind::Used, 15, "Housekeeping", Utc::now());
        hotel.inventory.record_transaction(&root(), used).unwrap();

        let towel_now = current(&hotel, towel.id);
        assert_eq!(towel_now.quantity, 0);
        assert_eq!(towel_now.current_value, Money::ZERO);

        let log = hotel.inventory.list_transactions(&root()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, TransactionKind::Used);
        assert_eq!(log[1].kind, TransactionKind::Received);
    }

    #[test]
    fn unknown_item_transactions_are_logged_without_effect() {
        let hotel = hotel();
        let towel = item(&hotel, "Bath towel");

        let ghost = StockTransaction::new(InventoryItemId::generate(), "Ghost", TransactionKind::Received, 5, "Store", Utc::now());
        hotel.inventory.record_transaction(&root(), ghost).unwrap();

        assert_eq!(hotel.inventory.list_transactions(&root()).unwrap().len(), 1);
        assert_eq!(current(&hotel, towel.id).quantity, 0);
    }

    #[test]
    fn invalid_transactions_and_missing_permissions_change_nothing() {
        let hotel = hotel();
        let towel = item(&hotel, "Bath towel");
        let clerk = staff(&hotel, "clerk", Role::STAFF, "Housekeeping");

        let tx = StockTransaction::new(towel.id, &towel.name, TransactionKind::Received, 4, "clerk", Utc::now());
        let err = hotel.inventory.record_transaction(&clerk, tx).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(AuthzError::Forbidden(_))));

        let zero = StockTransaction::new(towel.id, &towel.name, TransactionKind::Used, 0, "Store", Utc::now());
        let err = hotel.inventory.record_transaction(&root(), zero).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));

        assert!(hotel.inventory.list_transactions(&root()).unwrap().is_empty());
    }

    #[test]
    fn summary_reports_low_stock_and_expiry() {
        let hotel = hotel();
        let towel = item(&hotel, "Bath towel");
        let milk = item(&hotel, "Milk");
        receive(&hotel, &towel, 50, 5000);

        let today = Utc::now().date_naive();
        let tx = StockTransaction::new(milk.id, &milk.name, TransactionKind::Received, 3, "Store", Utc::now())
            .with_expiry(today.checked_add_days(Days::new(2)).unwrap());
        hotel.inventory.record_transaction(&root(), tx).unwrap();

        let summary = hotel.inventory.summary(&root(), today).unwrap();
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.by_category["Linen"].items, 2);
        assert_eq!(summary.low_stock.len(), 1);
        assert_eq!(summary.low_stock[0].name, "Milk");
        assert_eq!(summary.expiring.len(), 1);
        assert_eq!(summary.expiring[0].days_remaining, 2);
    }

    #[test]
    fn purchase_order_receipt_books_received_stock() {
        let hotel = hotel();
        let towel = item(&hotel, "Bath towel");
        receive(&hotel, &towel, 20, 5000);

        let supplier = hotel
            .purchasing
            .create_supplier(
                &root(),
                SupplierDraft {
                    name: "Coastal Linen Co.".to_string(),
                    contact: ContactInfo::default(),
                    categories: vec!["Linen".to_string()],
                },
            )
            .unwrap();

        let order = hotel.purchasing.create_order(&root(), supplier.id).unwrap();
        assert_eq!(order.order_number(), "PO-0001");

        let expiry = NaiveDate::from_ymd_opt(2031, 1, 1).unwrap();
        hotel
            .purchasing
            .add_line(&root(), order.id_typed(), towel.id, 30, Money::from_cents(250), Some(expiry))
            .unwrap();
        hotel.purchasing.approve_order(&root(), order.id_typed()).unwrap();
        let (order, booked) = hotel.purchasing.receive_order(&root(), order.id_typed()).unwrap();

        assert_eq!(order.status(), PurchaseOrderStatus::Received);
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].value, Some(Money::from_cents(7500)));

        let towel_now = current(&hotel, towel.id);
        assert_eq!(towel_now.quantity, 50);
        assert_eq!(towel_now.current_value, Money::from_cents(12500));
        // No prior expiry, so the batch's date is taken.
        assert_eq!(towel_now.expiry_date, Some(expiry));

        let again = hotel.purchasing.receive_order(&root(), order.id_typed()).unwrap_err();
        assert!(matches!(again, ServiceError::Domain(DomainError::InvariantViolation(_))));
        assert_eq!(current(&hotel, towel.id).quantity, 50);
    }

    #[test]
    fn suspended_suppliers_get_no_new_orders() {
        let hotel = hotel();
        let supplier = hotel
            .purchasing
            .create_supplier(
                &root(),
                SupplierDraft {
                    name: "Valley Dairy".to_string(),
                    contact: ContactInfo::default(),
                    categories: vec![],
                },
            )
            .unwrap();
        hotel.purchasing.suspend_supplier(&root(), supplier.id).unwrap();

        assert!(hotel.purchasing.create_order(&root(), supplier.id).is_err());
        assert!(hotel.purchasing.list_orders(&root()).unwrap().is_empty());
    }

    #[test]
    fn inventory_request_runs_the_full_workflow() {
        let hotel = hotel();
        let towel = item(&hotel, "Bath towel");
        receive(&hotel, &towel, 40, 40000);

        let attendant = staff(&hotel, "attendant", Role::STAFF, "Housekeeping");
        let head = staff(&hotel, "hk.head", Role::DEPARTMENT_HEAD, "Housekeeping");
        let gm = staff(&hotel, "gm", Role::MANAGER, "Management");
        let store = staff(&hotel, "store", Role::STOREKEEPER, "Stores");

        let request = hotel
            .requests
            .submit(
                &attendant,
                NewRequest {
                    target: RequestTarget::Inventory { item_id: towel.id, quantity: 12 },
                    purpose: "Floor 4".to_string(),
                    department: None,
                },
            )
            .unwrap();
        assert_eq!(request.request_number(), "REQ-0001");
        assert_eq!(request.department(), "Housekeeping");

        let id = request.id_typed();
        assert_eq!(hotel.requests.actionable(&head).unwrap().len(), 1);
        hotel.requests.department_approve(&head, id).unwrap();
        hotel.requests.approve(&gm, id).unwrap();

        let err = hotel.requests.fulfill(&attendant, id, None).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let (request, receipt) = hotel.requests.fulfill(&store, id, Some("Cart 2".to_string())).unwrap();
        assert_eq!(request.status(), RequestStatus::Fulfilled);
        assert_eq!(request.receipt_id(), Some(receipt.id_typed()));

        let today = Utc::now().date_naive().format("%Y%m%d").to_string();
        assert_eq!(receipt.receipt_number(), format!("RCP-{today}-0001"));
        assert_eq!(receipt.issued_to(), "attendant");
        assert_eq!(receipt.total_value(), Money::from_cents(12000));

        let towel_now = current(&hotel, towel.id);
        assert_eq!(towel_now.quantity, 28);
        assert_eq!(towel_now.current_value, Money::from_cents(28000));

        let log = hotel.inventory.list_transactions(&root()).unwrap();
        assert_eq!(log[0].kind, TransactionKind::Used);
        assert_eq!(log[0].quantity, 12);

        let html = hotel.requests.receipt_html(&store, receipt.id_typed()).unwrap();
        assert!(html.contains(receipt.receipt_number()));
        assert!(html.contains("Cart 2"));
    }

    #[test]
    fn department_heads_stay_in_their_department() {
        let hotel = hotel();
        let towel = item(&hotel, "Bath towel");
        receive(&hotel, &towel, 5, 500);

        let waiter = staff(&hotel, "waiter", Role::STAFF, "F&B");
        let hk_head = staff(&hotel, "hk.head", Role::DEPARTMENT_HEAD, "Housekeeping");

        let request = hotel
            .requests
            .submit(
                &waiter,
                NewRequest {
                    target: RequestTarget::Inventory { item_id: towel.id, quantity: 2 },
                    purpose: String::new(),
                    department: None,
                },
            )
            .unwrap();

        let err = hotel.requests.department_approve(&hk_head, request.id_typed()).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(AuthzError::OutOfScope(_))));
        let err = hotel.requests.reject(&hk_head, request.id_typed(), "no").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(AuthzError::OutOfScope(_))));
        assert!(hotel.requests.actionable(&hk_head).unwrap().is_empty());

        let err = hotel.requests.approve(&hk_head, request.id_typed()).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(AuthzError::Forbidden(_))));
    }

    #[test]
    fn insufficient_stock_blocks_fulfilment_before_any_change() {
        let hotel = hotel();
        let towel = item(&hotel, "Bath towel");
        receive(&hotel, &towel, 3, 300);

        let request = hotel
            .requests
            .submit(
                &root(),
                NewRequest {
                    target: RequestTarget::Inventory { item_id: towel.id, quantity: 5 },
                    purpose: String::new(),
                    department: Some("Housekeeping".to_string()),
                },
            )
            .unwrap();
        hotel.requests.approve(&root(), request.id_typed()).unwrap();

        let err = hotel.requests.fulfill(&root(), request.id_typed(), None).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));

        assert_eq!(current(&hotel, towel.id).quantity, 3);
        assert!(hotel.requests.list_receipts(&root()).unwrap().is_empty());
        let request = hotel.requests.get(&root(), request.id_typed()).unwrap();
        assert_eq!(request.status(), RequestStatus::Approved);
    }

    #[test]
    fn asset_request_checks_the_asset_out_to_the_requester() {
        let hotel = hotel();
        let radio = hotel
            .assets
            .create(
                &root(),
                AssetDraft {
                    name: "Radio 3".to_string(),
                    category: "Communication".to_string(),
                    serial_number: Some("RD-3".to_string()),
                    location: "Front office".to_string(),
                    purchase_date: None,
                    purchase_value: Money::from_cents(14500),
                    notes: None,
                },
            )
            .unwrap();
        let clerk = staff(&hotel, "frontdesk", Role::STAFF, "Front Office");

        let submit = |who: &Principal| {
            hotel
                .requests
                .submit(
                    who,
                    NewRequest {
                        target: RequestTarget::Asset { asset_id: radio.id },
                        purpose: "Night shift".to_string(),
                        department: None,
                    },
                )
                .unwrap()
        };
        let first = submit(&clerk);
        let second = submit(&clerk);
        hotel.requests.approve(&root(), first.id_typed()).unwrap();
        hotel.requests.approve(&root(), second.id_typed()).unwrap();

        let (_, receipt) = hotel.requests.fulfill(&root(), first.id_typed(), None).unwrap();
        assert_eq!(receipt.lines()[0].description, "Radio 3");

        let radio_now = hotel.assets.get(&root(), radio.id).unwrap();
        assert_eq!(radio_now.status, AssetStatus::CheckedOut);
        assert_eq!(radio_now.assigned_to.as_deref(), Some("frontdesk"));

        let err = hotel.requests.fulfill(&root(), second.id_typed(), None).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert_eq!(hotel.requests.list_receipts(&root()).unwrap().len(), 1);
    }

    #[test]
    fn sibling_sessions_reload_on_notice() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let a = Hotel::open(store.clone(), bus.clone(), &unseeded()).unwrap();
        let b = Hotel::open(store.clone(), bus, &unseeded()).unwrap();
        let b_listener = b.listen();
        let a_listener = a.listen();

        let towel = item(&a, "Bath towel");
        assert!(b.inventory.list_items(&root()).unwrap().is_empty());

        let changed = b.catch_up(&b_listener).unwrap();
        assert_eq!(changed, vec![Collection::Items]);
        assert_eq!(b.inventory.list_items(&root()).unwrap()[0].id, towel.id);

        assert!(a_listener.pending().is_empty());
        assert!(store.get(SYNC_KEY).unwrap().is_some());
        assert_ne!(a.session(), b.session());
    }

    #[test]
    fn seeded_session_survives_reopening_a_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = || -> Arc<dyn KeyValueStore> { Arc::new(FileStore::open(dir.path()).unwrap()) };

        let first = Hotel::open(store(), Arc::new(InMemoryEventBus::new()), &Config::default()).unwrap();
        let admin = first.users.sign_in("admin").unwrap();
        let items = first.inventory.list_items(&admin).unwrap();
        assert!(!items.is_empty());

        let second = Hotel::open(store(), Arc::new(InMemoryEventBus::new()), &Config::default()).unwrap();
        let admin = second.users.sign_in("ADMIN").unwrap();
        assert_eq!(second.inventory.list_items(&admin).unwrap(), items);
    }

    #[test]
    fn corrupt_collection_falls_back_to_seed() {
        let store = Arc::new(InMemoryStore::new());
        store.put(Collection::Users.key(), "][").unwrap();

        let hotel = Hotel::open(store.clone(), Arc::new(InMemoryEventBus::new()), &Config::default()).unwrap();
        assert!(hotel.users.sign_in("gm").is_ok());
        assert!(store.get(Collection::Users.key()).unwrap().unwrap().starts_with('['));
    }

    /// Store whose writes to chosen keys start failing after a number of further
    /// successful writes.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryStore,
        budgets: Mutex<HashMap<String, usize>>,
    }

    impl FlakyStore {
        fn fail(&self, collection: Collection, after: usize) {
            self.budgets.lock().unwrap().insert(collection.key().to_string(), after);
        }

        fn heal(&self) {
            self.budgets.lock().unwrap().clear();
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if let Some(left) = self.budgets.lock().unwrap().get_mut(key) {
                if *left == 0 {
                    return Err(StorageError::Io {
                        key: key.to_string(),
                        source: std::io::Error::other("disk full"),
                    });
                }
                *left -= 1;
            }
            self.inner.put(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>, StorageError> {
            self.inner.keys()
        }
    }

    fn flaky_hotel() -> (Arc<FlakyStore>, Hotel) {
        let store = Arc::new(FlakyStore::default());
        let hotel = Hotel::open(store.clone(), Arc::new(InMemoryEventBus::new()), &unseeded()).unwrap();
        (store, hotel)
    }

    fn reopen(store: &Arc<FlakyStore>) -> Hotel {
        Hotel::open(store.clone(), Arc::new(InMemoryEventBus::new()), &unseeded()).unwrap()
    }

    #[test]
    fn failed_writes_leave_previous_state_intact() {
        let (store, hotel) = flaky_hotel();
        let towel = item(&hotel, "Bath towel");

        store.fail(Collection::Items, 0);
        store.fail(Collection::Transactions, 0);
        let tx = StockTransaction::new(towel.id, &towel.name, TransactionKind::Received, 9, "Store", Utc::now());
        let err = hotel.inventory.record_transaction(&root(), tx).unwrap_err();

        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
        assert_eq!(current(&hotel, towel.id).quantity, 0);
        assert!(hotel.inventory.list_transactions(&root()).unwrap().is_empty());
    }

    #[test]
    fn failed_ledger_write_never_reaches_stored_items() {
        let (store, hotel) = flaky_hotel();
        let towel = item(&hotel, "Bath towel");

        store.fail(Collection::Transactions, 0);
        let tx = StockTransaction::new(towel.id, &towel.name, TransactionKind::Received, 9, "Store", Utc::now());
        assert!(hotel.inventory.record_transaction(&root(), tx).is_err());
        assert_eq!(current(&hotel, towel.id).quantity, 0);

        store.heal();
        let reopened = reopen(&store);
        assert_eq!(current(&reopened, towel.id).quantity, 0);
        assert!(reopened.inventory.list_transactions(&root()).unwrap().is_empty());
    }

    #[test]
    fn failed_item_write_restores_the_stored_ledger() {
        let (store, hotel) = flaky_hotel();
        let towel = item(&hotel, "Bath towel");

        store.fail(Collection::Items, 0);
        let tx = StockTransaction::new(towel.id, &towel.name, TransactionKind::Received, 9, "Store", Utc::now());
        assert!(hotel.inventory.record_transaction(&root(), tx).is_err());

        store.heal();
        let reopened = reopen(&store);
        assert_eq!(current(&reopened, towel.id).quantity, 0);
        assert!(reopened.inventory.list_transactions(&root()).unwrap().is_empty());
    }

    fn approved_request(hotel: &Hotel, item: &InventoryItem, quantity: u64) -> innkeep_requests::RequestId {
        let request = hotel
            .requests
            .submit(
                &root(),
                NewRequest {
                    target: RequestTarget::Inventory { item_id: item.id, quantity },
                    purpose: String::new(),
                    department: Some("Housekeeping".to_string()),
                },
            )
            .unwrap();
        hotel.requests.approve(&root(), request.id_typed()).unwrap();
        request.id_typed()
    }

    #[test]
    fn failed_request_write_reverts_stock_and_receipt() {
        let (store, hotel) = flaky_hotel();
        let towel = item(&hotel, "Bath towel");
        receive(&hotel, &towel, 10, 1000);
        let id = approved_request(&hotel, &towel, 4);

        store.fail(Collection::Requests, 0);
        assert!(hotel.requests.fulfill(&root(), id, None).is_err());

        assert_eq!(current(&hotel, towel.id).quantity, 10);
        assert_eq!(hotel.inventory.list_transactions(&root()).unwrap().len(), 1);
        assert!(hotel.requests.list_receipts(&root()).unwrap().is_empty());
        assert_eq!(hotel.requests.get(&root(), id).unwrap().status(), RequestStatus::Approved);

        store.heal();
        hotel.requests.fulfill(&root(), id, None).unwrap();
        assert_eq!(current(&hotel, towel.id).quantity, 6);
        assert_eq!(hotel.requests.list_receipts(&root()).unwrap().len(), 1);

        let reopened = reopen(&store);
        assert_eq!(current(&reopened, towel.id).quantity, 6);
        assert_eq!(reopened.requests.list_receipts(&root()).unwrap().len(), 1);
    }

    #[test]
    fn failed_receipt_write_reverts_the_hand_over() {
        let (store, hotel) = flaky_hotel();
        let towel = item(&hotel, "Bath towel");
        receive(&hotel, &towel, 10, 1000);
        let id = approved_request(&hotel, &towel, 4);

        store.fail(Collection::Receipts, 0);
        assert!(hotel.requests.fulfill(&root(), id, None).is_err());

        assert_eq!(current(&hotel, towel.id).quantity, 10);
        assert_eq!(hotel.inventory.list_transactions(&root()).unwrap().len(), 1);
    }

    #[test]
    fn retry_completes_from_a_receipt_that_could_not_be_withdrawn() {
        let (store, hotel) = flaky_hotel();
        let towel = item(&hotel, "Bath towel");
        receive(&hotel, &towel, 10, 1000);
        let id = approved_request(&hotel, &towel, 4);

        // The receipt is written once, then neither the request nor the withdrawal lands.
        store.fail(Collection::Requests, 0);
        store.fail(Collection::Receipts, 1);
        assert!(hotel.requests.fulfill(&root(), id, None).is_err());

        let kept = hotel.requests.list_receipts(&root()).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(current(&hotel, towel.id).quantity, 6);

        store.heal();
        let (request, receipt) = hotel.requests.fulfill(&root(), id, None).unwrap();
        assert_eq!(request.status(), RequestStatus::Fulfilled);
        assert_eq!(receipt.id_typed(), kept[0].id_typed());
        assert_eq!(request.receipt_id(), Some(receipt.id_typed()));
        assert_eq!(current(&hotel, towel.id).quantity, 6);
        assert_eq!(hotel.requests.list_receipts(&root()).unwrap().len(), 1);
        assert_eq!(hotel.inventory.list_transactions(&root()).unwrap().len(), 2);
    }

    #[test]
    fn failed_order_write_reverts_received_stock() {
        let (store, hotel) = flaky_hotel();
        let towel = item(&hotel, "Bath towel");
        let supplier = hotel
            .purchasing
            .create_supplier(
                &root(),
                SupplierDraft {
                    name: "Coastal Linen Co.".to_string(),
                    contact: ContactInfo::default(),
                    categories: vec![],
                },
            )
            .unwrap();
        let order = hotel.purchasing.create_order(&root(), supplier.id).unwrap();
        hotel
            .purchasing
            .add_line(&root(), order.id_typed(), towel.id, 30, Money::from_cents(250), None)
            .unwrap();
        hotel.purchasing.approve_order(&root(), order.id_typed()).unwrap();

        store.fail(Collection::PurchaseOrders, 0);
        assert!(hotel.purchasing.receive_order(&root(), order.id_typed()).is_err());
        assert_eq!(current(&hotel, towel.id).quantity, 0);
        assert!(hotel.inventory.list_transactions(&root()).unwrap().is_empty());

        store.heal();
        let (order, _) = hotel.purchasing.receive_order(&root(), order.id_typed()).unwrap();
        assert_eq!(order.status(), PurchaseOrderStatus::Received);
        assert_eq!(current(&hotel, towel.id).quantity, 30);
        assert_eq!(current(&hotel, towel.id).current_value, Money::from_cents(7500));

        let reopened = reopen(&store);
        assert_eq!(current(&reopened, towel.id).quantity, 30);
    }

    #[test]
    fn csv_exports_need_the_export_permission() {
        let hotel = hotel();
        item(&hotel, "Bath towel");
        let clerk = staff(&hotel, "clerk", Role::STAFF, "Housekeeping");

        assert!(hotel.inventory.export_items_csv(&clerk).is_err());
        let csv = hotel.inventory.export_items_csv(&root()).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }
}
