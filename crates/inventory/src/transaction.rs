use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{DomainError, DomainResult, Entity, Money};
use innkeep_events::Event;

use crate::InventoryItemId;

innkeep_core::typed_id!(StockTransactionId, "Stock transaction identifier.");

/// What a stock transaction does to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Stock delivered (purchase order, direct delivery).
    Received,
    /// Stock consumed or issued to a department.
    Used,
    /// Stock written off past its expiry date.
    Expired,
    /// Stock-take correction; quantity is signed.
    Adjusted,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Received => "received",
            TransactionKind::Used => "used",
            TransactionKind::Expired => "expired",
            TransactionKind::Adjusted => "adjusted",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: StockTransactionId,
    pub item_id: InventoryItemId,
    /// Copy of the item name at the time of the transaction.
    pub item_name: String,
    pub kind: TransactionKind,
    /// Signed for `Adjusted`; a count of units otherwise.
    pub quantity: i64,
    pub date: DateTime<Utc>,
    pub performed_by: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Batch expiry. Only read for `Received`.
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    /// Batch value for `Received`, value delta for `Adjusted`.
    #[serde(default)]
    pub value: Option<Money>,
}

impl StockTransaction {
    pub fn new(
        item_id: InventoryItemId,
        item_name: impl Into<String>,
        kind: TransactionKind,
        quantity: i64,
        performed_by: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StockTransactionId::generate(),
            item_id,
            item_name: item_name.into(),
            kind,
            quantity,
            date,
            performed_by: performed_by.into(),
            notes: None,
            expiry_date: None,
            value: None,
        }
    }

    pub fn with_expiry(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    pub fn with_value(mut self, value: Money) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Unit count for the unsigned kinds. Negative input counts as zero.
    pub fn units(&self) -> u64 {
        u64::try_from(self.quantity).unwrap_or(0)
    }

    /// Form-level checks before a transaction is recorded.
    ///
    /// Over-deduction is *not* an error here; the reconciliation rule clamps it.
    pub fn validate(&self) -> DomainResult<()> {
        if self.item_name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if self.performed_by.trim().is_empty() {
            return Err(DomainError::validation("performed_by cannot be empty"));
        }

        match self.kind {
            TransactionKind::Received | TransactionKind::Used | TransactionKind::Expired => {
                if self.quantity <= 0 {
                    return Err(DomainError::validation(format!(
                        "{} quantity must be positive",
                        self.kind
                    )));
                }
            }
            TransactionKind::Adjusted => {
                if self.quantity == 0 && self.value.is_none_or(|v| v.is_zero()) {
                    return Err(DomainError::validation(
                        "adjustment must change quantity or value",
                    ));
                }
            }
        }

        if self.kind == TransactionKind::Received && self.value.is_some_and(|v| v.is_negative()) {
            return Err(DomainError::validation("received value cannot be negative"));
        }

        Ok(())
    }
}

impl Entity for StockTransaction {
    type Id = StockTransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Event for StockTransaction {
    fn event_type(&self) -> &'static str {
        match self.kind {
            TransactionKind::Received => "inventory.stock.received",
            TransactionKind::Used => "inventory.stock.used",
            TransactionKind::Expired => "inventory.stock.expired",
            TransactionKind::Adjusted => "inventory.stock.adjusted",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.date
    }
}
