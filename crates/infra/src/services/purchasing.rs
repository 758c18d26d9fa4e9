use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use innkeep_auth::{Permission, Principal, authorize, authorize_command};
use innkeep_core::{Aggregate, DomainError, DomainResult, Money};
use innkeep_inventory::{InventoryItemId, StockTransaction, TransactionKind};
use innkeep_purchasing::{
    AddLine, Approve, Cancel, CreatePurchaseOrder, GoodsReceived, LineItem, PurchaseOrder,
    PurchaseOrderCommand, PurchaseOrderEvent, PurchaseOrderId, PurchaseOrderStatus, ReceiveGoods,
    Supplier, SupplierDraft, SupplierId,
};

use crate::error::ServiceError;
use crate::services::inventory::{InventoryService, StockBooking};
use crate::services::{execute, next_number, position_of};
use crate::snapshot::{Collection, Persistence, Snapshot};

/// Suppliers and purchase orders.
pub struct PurchasingService {
    persistence: Arc<Persistence>,
    suppliers: Snapshot<Supplier>,
    orders: Snapshot<PurchaseOrder>,
    inventory: Arc<InventoryService>,
}

impl PurchasingService {
    pub fn new(
        persistence: Arc<Persistence>,
        suppliers: Snapshot<Supplier>,
        orders: Snapshot<PurchaseOrder>,
        inventory: Arc<InventoryService>,
    ) -> Self {
        Self {
            persistence,
            suppliers,
            orders,
            inventory,
        }
    }

    pub fn list_suppliers(&self, principal: &Principal) -> Result<Vec<Supplier>, ServiceError> {
        authorize(principal, &Permission::PURCHASING_READ)?;
        Ok(self.suppliers.all()?)
    }

    pub fn create_supplier(&self, principal: &Principal, draft: SupplierDraft) -> Result<Supplier, ServiceError> {
        authorize(principal, &Permission::PURCHASING_WRITE)?;
        let supplier = draft.into_supplier(SupplierId::generate(), Utc::now())?;

        self.suppliers.mutate(&self.persistence, |suppliers| {
            if suppliers.iter().any(|s| s.name.eq_ignore_ascii_case(&supplier.name)) {
                return Err(DomainError::conflict(format!("supplier '{}' already exists", supplier.name)).into());
            }
            suppliers.push(supplier.clone());
            Ok::<_, ServiceError>(())
        })?;

        tracing::info!(supplier_id = %supplier.id, name = %supplier.name, "supplier created");
        Ok(supplier)
    }

    pub fn update_supplier(
        &self,
        principal: &Principal,
        id: SupplierId,
        draft: SupplierDraft,
    ) -> Result<Supplier, ServiceError> {
        authorize(principal, &Permission::PURCHASING_WRITE)?;
        let supplier = self.change_supplier(id, |s| draft.apply_to(s))?;
        tracing::info!(supplier_id = %id, "supplier updated");
        Ok(supplier)
    }

    pub fn suspend_supplier(&self, principal: &Principal, id: SupplierId) -> Result<Supplier, ServiceError> {
        authorize(principal, &Permission::PURCHASING_WRITE)?;
        let supplier = self.change_supplier(id, Supplier::suspend)?;
        tracing::info!(supplier_id = %id, "supplier suspended");
        Ok(supplier)
    }

    pub fn activate_supplier(&self, principal: &Principal, id: SupplierId) -> Result<Supplier, ServiceError> {
        authorize(principal, &Permission::PURCHASING_WRITE)?;
        let supplier = self.change_supplier(id, Supplier::activate)?;
        tracing::info!(supplier_id = %id, "supplier activated");
        Ok(supplier)
    }

    /// Suppliers with open (draft or approved) orders cannot be deleted.
    pub fn delete_supplier(&self, principal: &Principal, id: SupplierId) -> Result<(), ServiceError> {
        authorize(principal, &Permission::PURCHASING_WRITE)?;
        let has_open_orders = self.orders.read()?.iter().any(|o| {
            o.supplier_id() == Some(id)
                && matches!(o.status(), PurchaseOrderStatus::Draft | PurchaseOrderStatus::Approved)
        });
        if has_open_orders {
            return Err(DomainError::conflict("supplier has open purchase orders").into());
        }

        self.suppliers.mutate(&self.persistence, |suppliers| {
            let idx = position_of(suppliers, &id, "supplier")?;
            suppliers.remove(idx);
            Ok::<_, ServiceError>(())
        })?;
        tracing::info!(supplier_id = %id, "supplier deleted");
        Ok(())
    }

    pub fn list_orders(&self, principal: &Principal) -> Result<Vec<PurchaseOrder>, ServiceError> {
        authorize(principal, &Permission::PURCHASING_READ)?;
        Ok(self.orders.all()?)
    }

    pub fn get_order(&self, principal: &Principal, id: PurchaseOrderId) -> Result<PurchaseOrder, ServiceError> {
        authorize(principal, &Permission::PURCHASING_READ)?;
        let orders = self.orders.read()?;
        let idx = position_of(orders.as_slice(), &id, "purchase order")?;
        Ok(orders[idx].clone())
    }

    /// Open a draft order with an active supplier.
    pub fn create_order(&self, principal: &Principal, supplier_id: SupplierId) -> Result<PurchaseOrder, ServiceError> {
        let supplier = {
            let suppliers = self.suppliers.read()?;
            let idx = position_of(suppliers.as_slice(), &supplier_id, "supplier")?;
            suppliers[idx].clone()
        };
        if !supplier.can_transact() {
            return Err(DomainError::invariant(format!("supplier '{}' is suspended", supplier.name)).into());
        }

        let order = self.orders.mutate(&self.persistence, |orders| {
            let order_id = PurchaseOrderId::generate();
            let command = PurchaseOrderCommand::CreatePurchaseOrder(CreatePurchaseOrder {
                order_id,
                order_number: next_number("PO", orders.iter().map(|o| o.order_number())),
                supplier_id,
                supplier_name: supplier.name.clone(),
                created_by: principal.display_name.clone(),
                occurred_at: Utc::now(),
            });
            let mut order = PurchaseOrder::empty(order_id);
            execute(principal, &mut order, &command)?;
            orders.push(order.clone());
            Ok::<_, ServiceError>(order)
        })?;

        tracing::info!(order = %order.order_number(), supplier = %supplier.name, "purchase order created");
        Ok(order)
    }

    pub fn add_line(
        &self,
        principal: &Principal,
        order_id: PurchaseOrderId,
        item_id: InventoryItemId,
        quantity: u64,
        unit_cost: Money,
        expiry_date: Option<NaiveDate>,
    ) -> Result<PurchaseOrder, ServiceError> {
        let item = self
            .inventory
            .find_item(item_id)?
            .ok_or_else(|| DomainError::not_found("inventory item"))?;

        self.run(
            principal,
            order_id,
            PurchaseOrderCommand::AddLine(AddLine {
                order_id,
                item_id,
                item_name: item.name,
                quantity,
                unit_cost,
                expiry_date,
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn approve_order(&self, principal: &Principal, order_id: PurchaseOrderId) -> Result<PurchaseOrder, ServiceError> {
        self.run(
            principal,
            order_id,
            PurchaseOrderCommand::Approve(Approve {
                order_id,
                approved_by: principal.display_name.clone(),
                occurred_at: Utc::now(),
            }),
        )
    }

    pub fn cancel_order(
        &self,
        principal: &Principal,
        order_id: PurchaseOrderId,
        reason: &str,
    ) -> Result<PurchaseOrder, ServiceError> {
        self.run(
            principal,
            order_id,
            PurchaseOrderCommand::Cancel(Cancel {
                order_id,
                reason: reason.to_string(),
                occurred_at: Utc::now(),
            }),
        )
    }

    /// Receive an approved order: one `received` stock transaction per line, valued at
    /// quantity × unit cost and carrying the line's expiry date.
    ///
    /// Stock is booked before the order is marked received. If the order write then
    /// fails the booking is reverted, so a retry cannot book the goods twice.
    pub fn receive_order(
        &self,
        principal: &Principal,
        order_id: PurchaseOrderId,
    ) -> Result<(PurchaseOrder, Vec<StockTransaction>), ServiceError> {
        let command = PurchaseOrderCommand::ReceiveGoods(ReceiveGoods {
            order_id,
            received_by: principal.display_name.clone(),
            occurred_at: Utc::now(),
        });
        authorize_command(principal, &command)?;

        let mut uncommitted: Option<StockBooking> = None;
        let result = self.orders.mutate(&self.persistence, |orders| {
            let idx = position_of(orders, &order_id, "purchase order")?;
            let events = orders[idx].handle(&command)?;

            let mut txs = Vec::new();
            for event in &events {
                if let PurchaseOrderEvent::GoodsReceived(received) = event {
                    for line in &received.lines {
                        txs.push(received_transaction(received, line)?);
                    }
                }
            }
            let booking = self.inventory.apply_transactions(txs)?;
            let booked = booking.transactions.clone();
            uncommitted = Some(booking);

            for event in &events {
                orders[idx].apply(event);
            }
            Ok::<_, ServiceError>((orders[idx].clone(), booked))
        });

        match &result {
            Ok((order, booked)) => tracing::info!(
                order = %order.order_number(),
                lines = booked.len(),
                total = %order.total(),
                "purchase order received"
            ),
            Err(error) => {
                tracing::warn!(order_id = %order_id, %error, "purchase order receipt rejected");
                if let Some(booking) = uncommitted {
                    if let Err(error) = self.inventory.revert(booking) {
                        tracing::error!(order_id = %order_id, %error, "received stock could not be reverted");
                    }
                }
            }
        }
        result
    }

    pub(crate) fn reload(&self, collection: Collection) -> Result<bool, ServiceError> {
        Ok(match collection {
            Collection::Suppliers => self.suppliers.reload(&self.persistence)?,
            Collection::PurchaseOrders => self.orders.reload(&self.persistence)?,
            _ => false,
        })
    }

    fn run(
        &self,
        principal: &Principal,
        order_id: PurchaseOrderId,
        command: PurchaseOrderCommand,
    ) -> Result<PurchaseOrder, ServiceError> {
        let result = self.orders.mutate(&self.persistence, |orders| {
            let idx = position_of(orders, &order_id, "purchase order")?;
            execute(principal, &mut orders[idx], &command)?;
            Ok::<_, ServiceError>(orders[idx].clone())
        });

        match &result {
            Ok(order) => tracing::info!(order = %order.order_number(), status = ?order.status(), "purchase order updated"),
            Err(error) => tracing::warn!(order_id = %order_id, %error, "purchase order command rejected"),
        }
        result
    }

    fn change_supplier(
        &self,
        id: SupplierId,
        f: impl FnOnce(&mut Supplier) -> DomainResult<()>,
    ) -> Result<Supplier, ServiceError> {
        self.suppliers.mutate(&self.persistence, |suppliers| {
            let idx = position_of(suppliers, &id, "supplier")?;
            f(&mut suppliers[idx])?;
            Ok::<_, ServiceError>(suppliers[idx].clone())
        })
    }
}

fn received_transaction(received: &GoodsReceived, line: &LineItem) -> DomainResult<StockTransaction> {
    let quantity =
        i64::try_from(line.quantity).map_err(|_| DomainError::validation("line quantity is too large"))?;
    let tx = StockTransaction::new(
        line.item_id,
        &line.item_name,
        TransactionKind::Received,
        quantity,
        &received.received_by,
        received.occurred_at,
    )
    .with_value(line.total())
    .with_notes(format!("{} from {}", received.order_number, received.supplier_name));
    Ok(match line.expiry_date {
        Some(expiry) => tx.with_expiry(expiry),
        None => tx,
    })
}
