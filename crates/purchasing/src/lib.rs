//! Purchasing domain module: suppliers and purchase orders.
//!
//! Pure domain logic (no IO, no storage). Receiving a purchase order yields the
//! lines that the infrastructure layer books into the stock ledger.

pub mod order;
pub mod supplier;

pub use order::{
    AddLine, Approve, Cancel, CreatePurchaseOrder, GoodsReceived, LineItem, PurchaseOrder,
    PurchaseOrderApproved, PurchaseOrderCancelled, PurchaseOrderCommand, PurchaseOrderCreated,
    PurchaseOrderEvent, PurchaseOrderId, PurchaseOrderLineAdded, PurchaseOrderStatus, ReceiveGoods,
};
pub use supplier::{ContactInfo, Supplier, SupplierDraft, SupplierId, SupplierStatus};
