use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use innkeep_auth::{Permission, Principal, authorize};
use innkeep_core::DomainError;
use innkeep_inventory::{
    InventoryItem, InventoryItemId, InventorySummary, ItemDraft, StockTransaction, summarize,
};

use crate::error::ServiceError;
use crate::export;
use crate::services::position_of;
use crate::snapshot::{Collection, Persistence, Snapshot};

/// Stock transactions written by one [`InventoryService::apply_transactions`] call,
/// with the touched items as they were before.
#[derive(Debug, Default)]
pub(crate) struct StockBooking {
    pub transactions: Vec<StockTransaction>,
    previous: Vec<InventoryItem>,
}

/// Items and the stock ledger.
pub struct InventoryService {
    persistence: Arc<Persistence>,
    items: Snapshot<InventoryItem>,
    /// Newest first.
    transactions: Snapshot<StockTransaction>,
    expiry_warning_days: u32,
}

impl InventoryService {
    pub fn new(
        persistence: Arc<Persistence>,
        items: Snapshot<InventoryItem>,
        transactions: Snapshot<StockTransaction>,
        expiry_warning_days: u32,
    ) -> Self {
        Self {
            persistence,
            items,
            transactions,
            expiry_warning_days,
        }
    }

    pub fn list_items(&self, principal: &Principal) -> Result<Vec<InventoryItem>, ServiceError> {
        authorize(principal, &Permission::INVENTORY_READ)?;
        Ok(self.items.all()?)
    }

    pub fn get_item(&self, principal: &Principal, id: InventoryItemId) -> Result<InventoryItem, ServiceError> {
        authorize(principal, &Permission::INVENTORY_READ)?;
        self.find_item(id)?
            .ok_or_else(|| DomainError::not_found("inventory item").into())
    }

    pub fn create_item(&self, principal: &Principal, draft: ItemDraft) -> Result<InventoryItem, ServiceError> {
        authorize(principal, &Permission::INVENTORY_WRITE)?;
        let item = draft.into_item(InventoryItemId::generate(), Utc::now())?;

        self.items.mutate(&self.persistence, |items| {
            if items.iter().any(|i| i.name.eq_ignore_ascii_case(&item.name)) {
                return Err(DomainError::conflict(format!("an item named '{}' already exists", item.name)).into());
            }
            items.push(item.clone());
            Ok::<_, ServiceError>(())
        })?;

        tracing::info!(item_id = %item.id, name = %item.name, by = %principal.display_name, "inventory item created");
        Ok(item)
    }

    /// Direct edit. Bypasses the ledger: no transaction is recorded.
    pub fn update_item(
        &self,
        principal: &Principal,
        id: InventoryItemId,
        draft: ItemDraft,
    ) -> Result<InventoryItem, ServiceError> {
        authorize(principal, &Permission::INVENTORY_WRITE)?;

        let updated = self.items.mutate(&self.persistence, |items| {
            let idx = position_of(items, &id, "inventory item")?;
            draft.apply_to(&mut items[idx], Utc::now())?;
            Ok::<_, ServiceError>(items[idx].clone())
        })?;

        tracing::info!(item_id = %id, by = %principal.display_name, "inventory item updated");
        Ok(updated)
    }

    /// Remove an item. Its ledger entries stay in the log.
    pub fn delete_item(&self, principal: &Principal, id: InventoryItemId) -> Result<(), ServiceError> {
        authorize(principal, &Permission::INVENTORY_WRITE)?;

        let removed = self.items.mutate(&self.persistence, |items| {
            let idx = position_of(items, &id, "inventory item")?;
            Ok::<_, ServiceError>(items.remove(idx))
        })?;

        tracing::info!(item_id = %id, name = %removed.name, by = %principal.display_name, "inventory item deleted");
        Ok(())
    }

    /// Validate and record one stock transaction.
    pub fn record_transaction(
        &self,
        principal: &Principal,
        tx: StockTransaction,
    ) -> Result<StockTransaction, ServiceError> {
        authorize(principal, &Permission::INVENTORY_TRANSACT)?;
        if let Err(error) = tx.validate() {
            tracing::warn!(item_id = %tx.item_id, kind = %tx.kind, %error, "stock transaction rejected");
            return Err(error.into());
        }

        let mut booking = self.apply_transactions(vec![tx])?;
        booking
            .transactions
            .pop()
            .ok_or_else(|| DomainError::invariant("transaction was not recorded").into())
    }

    /// Append `txs` (oldest first) to the log and reconcile the items they touch.
    ///
    /// Callers authorize and validate. Entries for items that no longer exist are
    /// still logged but change nothing. The log is written before the items; when
    /// the items write fails the previous log is written back, so stored items never
    /// carry stock the ledger does not explain.
    pub(crate) fn apply_transactions(&self, txs: Vec<StockTransaction>) -> Result<StockBooking, ServiceError> {
        if txs.is_empty() {
            return Ok(StockBooking::default());
        }

        // Lock order: items, then transactions.
        let mut items = self.items.write()?;
        let mut log = self.transactions.write()?;

        let mut next_items = items.clone();
        let mut previous: Vec<InventoryItem> = Vec::new();
        for tx in &txs {
            match next_items.iter_mut().find(|i| i.id == tx.item_id) {
                Some(item) => {
                    if !previous.iter().any(|p| p.id == item.id) {
                        previous.push(item.clone());
                    }
                    item.apply_transaction(tx);
                }
                None => tracing::warn!(
                    item_id = %tx.item_id,
                    item_name = %tx.item_name,
                    "stock transaction references an unknown item; logged without effect"
                ),
            }
        }
        let touched_items = !previous.is_empty();

        let mut next_log = Vec::with_capacity(log.len() + txs.len());
        next_log.extend(txs.iter().rev().cloned());
        next_log.extend(log.iter().cloned());

        self.persistence.save(Collection::Transactions, &next_log)?;
        if touched_items {
            if let Err(error) = self.persistence.save(Collection::Items, &next_items) {
                self.restore_log(log.as_slice());
                return Err(error.into());
            }
        }

        *items = next_items;
        *log = next_log;
        drop(log);
        drop(items);

        if touched_items {
            self.persistence.announce(Collection::Items);
        }
        self.persistence.announce(Collection::Transactions);

        for tx in &txs {
            tracing::info!(
                item_id = %tx.item_id,
                kind = %tx.kind,
                quantity = tx.quantity,
                by = %tx.performed_by,
                "stock transaction recorded"
            );
        }
        Ok(StockBooking {
            transactions: txs,
            previous,
        })
    }

    /// Undo a booking whose enclosing workflow failed to commit.
    ///
    /// Touched items go back to their state before the booking and the booked
    /// entries leave the log. Items are written first.
    pub(crate) fn revert(&self, booking: StockBooking) -> Result<(), ServiceError> {
        if booking.transactions.is_empty() {
            return Ok(());
        }

        let mut items = self.items.write()?;
        let mut log = self.transactions.write()?;

        let mut next_items = items.clone();
        for before in &booking.previous {
            if let Some(item) = next_items.iter_mut().find(|i| i.id == before.id) {
                *item = before.clone();
            }
        }
        let next_log: Vec<StockTransaction> = log
            .iter()
            .filter(|tx| !booking.transactions.iter().any(|b| b.id == tx.id))
            .cloned()
            .collect();

        if !booking.previous.is_empty() {
            self.persistence.save(Collection::Items, &next_items)?;
            *items = next_items;
        }
        self.persistence.save(Collection::Transactions, &next_log)?;
        *log = next_log;
        drop(log);
        drop(items);

        if !booking.previous.is_empty() {
            self.persistence.announce(Collection::Items);
        }
        self.persistence.announce(Collection::Transactions);
        tracing::warn!(entries = booking.transactions.len(), "stock booking reverted");
        Ok(())
    }

    fn restore_log(&self, log: &[StockTransaction]) {
        if let Err(error) = self.persistence.save(Collection::Transactions, log) {
            tracing::error!(%error, "stored ledger could not be restored after a failed item write");
        }
    }

    /// The full ledger, newest first.
    pub fn list_transactions(&self, principal: &Principal) -> Result<Vec<StockTransaction>, ServiceError> {
        authorize(principal, &Permission::INVENTORY_READ)?;
        Ok(self.transactions.all()?)
    }

    /// Ledger entries for one item, newest first.
    pub fn item_history(
        &self,
        principal: &Principal,
        id: InventoryItemId,
    ) -> Result<Vec<StockTransaction>, ServiceError> {
        authorize(principal, &Permission::INVENTORY_READ)?;
        Ok(self
            .transactions
            .read()?
            .iter()
            .filter(|t| t.item_id == id)
            .cloned()
            .collect())
    }

    pub fn summary(&self, principal: &Principal, today: NaiveDate) -> Result<InventorySummary, ServiceError> {
        authorize(principal, &Permission::INVENTORY_READ)?;
        Ok(summarize(&self.items.read()?, today, self.expiry_warning_days))
    }

    pub fn export_items_csv(&self, principal: &Principal) -> Result<String, ServiceError> {
        authorize(principal, &Permission::REPORTS_EXPORT)?;
        Ok(export::items_csv(&self.items.read()?)?)
    }

    pub fn export_transactions_csv(&self, principal: &Principal) -> Result<String, ServiceError> {
        authorize(principal, &Permission::REPORTS_EXPORT)?;
        Ok(export::transactions_csv(&self.transactions.read()?)?)
    }

    pub(crate) fn find_item(&self, id: InventoryItemId) -> Result<Option<InventoryItem>, ServiceError> {
        Ok(self.items.read()?.iter().find(|i| i.id == id).cloned())
    }

    pub(crate) fn reload(&self, collection: Collection) -> Result<bool, ServiceError> {
        Ok(match collection {
            Collection::Items => self.items.reload(&self.persistence)?,
            Collection::Transactions => self.transactions.reload(&self.persistence)?,
            _ => false,
        })
    }
}
