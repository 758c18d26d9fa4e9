//! Stock transaction reconciliation.
//!
//! Applies one ledger entry to an item's quantity, value and expiry date. Batches
//! are not tracked individually: once merged, an item carries a single expiry date.
//!
//! Nothing here fails. Deductions beyond available stock are clamped to zero.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use innkeep_core::{Money, ValueObject};

use crate::transaction::{StockTransaction, TransactionKind};

/// The part of an item a stock transaction touches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockLevel {
    pub quantity: u64,
    pub current_value: Money,
    pub expiry_date: Option<NaiveDate>,
}

impl ValueObject for StockLevel {}

impl StockLevel {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Compute the stock level after `tx`.
pub fn reconcile(level: &StockLevel, tx: &StockTransaction) -> StockLevel {
    match tx.kind {
        TransactionKind::Received => receive(level, tx.units(), tx.expiry_date, tx.value),
        TransactionKind::Used | TransactionKind::Expired => deduct(level, tx.units()),
        TransactionKind::Adjusted => adjust(level, tx.quantity, tx.value),
    }
}

/// Fold a ledger (oldest first) starting from an empty item.
pub fn replay<'a>(transactions: impl IntoIterator<Item = &'a StockTransaction>) -> StockLevel {
    transactions
        .into_iter()
        .fold(StockLevel::empty(), |level, tx| reconcile(&level, tx))
}

fn receive(
    level: &StockLevel,
    units: u64,
    expiry: Option<NaiveDate>,
    value: Option<Money>,
) -> StockLevel {
    let expiry_date = match expiry {
        Some(incoming) if incoming_batch_sets_expiry(level, units, incoming) => Some(incoming),
        _ => level.expiry_date,
    };

    let current_value = match value {
        Some(v) => level.current_value + v,
        None => level.current_value,
    };

    StockLevel {
        quantity: level.quantity.saturating_add(units),
        current_value,
        expiry_date,
    }
}

/// Whether a received batch's expiry replaces the item's.
///
/// The soonest date wins, except that a batch more than twice the size of the
/// stock on hand is assumed to dominate the shelf.
fn incoming_batch_sets_expiry(level: &StockLevel, units: u64, incoming: NaiveDate) -> bool {
    if level.quantity == 0 {
        return true;
    }
    match level.expiry_date {
        None => true,
        Some(current) if incoming < current => true,
        Some(_) => units > level.quantity.saturating_mul(2),
    }
}

fn deduct(level: &StockLevel, units: u64) -> StockLevel {
    let deducted = units.min(level.quantity);
    let quantity = level.quantity - deducted;

    if quantity == 0 {
        return StockLevel {
            quantity: 0,
            current_value: Money::ZERO,
            expiry_date: None,
        };
    }

    let removed = level
        .current_value
        .per_unit(level.quantity)
        .map(|per_unit| per_unit.saturating_mul(Decimal::from(deducted)))
        .unwrap_or(Decimal::ZERO);

    StockLevel {
        quantity,
        current_value: Money::new(level.current_value.amount().saturating_sub(removed))
            .non_negative(),
        expiry_date: level.expiry_date,
    }
}

fn adjust(level: &StockLevel, delta: i64, value_delta: Option<Money>) -> StockLevel {
    let adjusted = i128::from(level.quantity) + i128::from(delta);
    let quantity = u64::try_from(adjusted.max(0)).unwrap_or(u64::MAX);

    let current_value = match value_delta {
        Some(d) => (level.current_value + d).non_negative(),
        None => level.current_value,
    };

    StockLevel {
        quantity,
        current_value,
        expiry_date: level.expiry_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InventoryItemId;
    use chrono::Utc;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn level(quantity: u64, cents: i64, expiry_date: Option<NaiveDate>) -> StockLevel {
        StockLevel {
            quantity,
            current_value: Money::from_cents(cents),
            expiry_date,
        }
    }

    fn tx(kind: TransactionKind, quantity: i64) -> StockTransaction {
        StockTransaction::new(
            InventoryItemId::generate(),
            "Shampoo 30ml",
            kind,
            quantity,
            "tester",
            Utc::now(),
        )
    }

    #[test]
    fn over_use_empties_the_item() {
        let before = level(10, 10_000, Some(d(2026, 3, 1)));
        let after = reconcile(&before, &tx(TransactionKind::Used, 15));
        assert_eq!(after, StockLevel::empty());
    }

    #[test]
    fn first_batch_sets_quantity_value_and_expiry() {
        let t = tx(TransactionKind::Received, 20)
            .with_expiry(d(2026, 6, 30))
            .with_value(Money::from_cents(5_000));
        let after = reconcile(&StockLevel::empty(), &t);
        assert_eq!(after, level(20, 5_000, Some(d(2026, 6, 30))));
    }

    #[test]
    fn batch_into_empty_stock_replaces_a_stale_expiry() {
        // Adjusted down to zero keeps the old date; the next batch must not inherit it.
        let before = level(0, 0, Some(d(2026, 1, 1)));
        let t = tx(TransactionKind::Received, 1).with_expiry(d(2026, 9, 1));
        let after = reconcile(&before, &t);
        assert_eq!(after, level(1, 0, Some(d(2026, 9, 1))));
    }

    #[test]
    fn later_small_batch_keeps_soonest_expiry() {
        let before = level(20, 0, Some(d(2026, 1, 10)));
        let t = tx(TransactionKind::Received, 5).with_expiry(d(2026, 4, 1));
        let after = reconcile(&before, &t);
        assert_eq!(after.quantity, 25);
        assert_eq!(after.expiry_date, Some(d(2026, 1, 10)));
    }

    #[test]
    fn earlier_batch_takes_over_expiry() {
        let before = level(20, 0, Some(d(2026, 4, 1)));
        let t = tx(TransactionKind::Received, 1).with_expiry(d(2026, 2, 1));
        assert_eq!(reconcile(&before, &t).expiry_date, Some(d(2026, 2, 1)));
    }

    #[test]
    fn dominant_batch_takes_over_later_expiry() {
        let before = level(10, 0, Some(d(2026, 1, 10)));

        let exactly_double = tx(TransactionKind::Received, 20).with_expiry(d(2026, 9, 1));
        assert_eq!(reconcile(&before, &exactly_double).expiry_date, Some(d(2026, 1, 10)));

        let more_than_double = tx(TransactionKind::Received, 21).with_expiry(d(2026, 9, 1));
        assert_eq!(reconcile(&before, &more_than_double).expiry_date, Some(d(2026, 9, 1)));
    }

    #[test]
    fn batch_without_expiry_leaves_expiry_alone() {
        let before = level(3, 300, Some(d(2026, 1, 10)));
        let after = reconcile(&before, &tx(TransactionKind::Received, 2));
        assert_eq!(after, level(5, 300, Some(d(2026, 1, 10))));
    }

    #[test]
    fn partial_use_removes_proportional_value() {
        let before = level(3, 1_000, None);
        let after = reconcile(&before, &tx(TransactionKind::Used, 1));
        // 10.00 / 3 = 3.333.. per unit; 10.00 - 3.33 = 6.67 after rounding.
        assert_eq!(after, level(2, 667, None));
    }

    #[test]
    fn expired_behaves_like_used() {
        let before = level(8, 800, Some(d(2025, 12, 1)));
        let used = reconcile(&before, &tx(TransactionKind::Used, 3));
        let expired = reconcile(&before, &tx(TransactionKind::Expired, 3));
        assert_eq!(used, expired);
        assert_eq!(expired, level(5, 500, Some(d(2025, 12, 1))));
    }

    #[test]
    fn adjustment_clamps_quantity_and_value() {
        let before = level(4, 400, Some(d(2026, 1, 1)));
        let t = tx(TransactionKind::Adjusted, -10).with_value(Money::from_cents(-1_000));
        let after = reconcile(&before, &t);
        assert_eq!(after, level(0, 0, Some(d(2026, 1, 1))));
    }

    #[test]
    fn adjustment_without_value_keeps_value() {
        let before = level(4, 400, None);
        let after = reconcile(&before, &tx(TransactionKind::Adjusted, 6));
        assert_eq!(after, level(10, 400, None));
    }

    fn arb_kind() -> impl Strategy<Value = TransactionKind> {
        prop_oneof![
            Just(TransactionKind::Received),
            Just(TransactionKind::Used),
            Just(TransactionKind::Expired),
            Just(TransactionKind::Adjusted),
        ]
    }

    fn arb_tx() -> impl Strategy<Value = StockTransaction> {
        (
            arb_kind(),
            1i64..500,
            any::<bool>(),
            proptest::option::of(0i64..100_000),
            proptest::option::of(0i64..365),
        )
            .prop_map(|(kind, qty, negative, cents, expiry_offset)| {
                let quantity = if kind == TransactionKind::Adjusted && negative { -qty } else { qty };
                let mut t = tx(kind, quantity);
                if let Some(c) = cents {
                    let c = if kind == TransactionKind::Adjusted && negative { -c } else { c };
                    t = t.with_value(Money::from_cents(c));
                }
                if let Some(off) = expiry_offset {
                    t = t.with_expiry(d(2026, 1, 1) + chrono::Days::new(off as u64));
                }
                t
            })
    }

    fn arb_level() -> impl Strategy<Value = StockLevel> {
        (0u64..1_000, 0i64..1_000_000, proptest::option::of(0u64..365)).prop_map(
            |(quantity, cents, expiry)| StockLevel {
                quantity,
                current_value: Money::from_cents(cents),
                expiry_date: expiry.map(|off| d(2026, 1, 1) + chrono::Days::new(off)),
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Receiving without an expiry date is plain addition.
        #[test]
        fn received_without_expiry_adds(before in arb_level(), qty in 1i64..10_000, cents in proptest::option::of(0i64..1_000_000)) {
            let mut t = tx(TransactionKind::Received, qty);
            if let Some(c) = cents {
                t = t.with_value(Money::from_cents(c));
            }
            let after = reconcile(&before, &t);
            prop_assert_eq!(after.quantity, before.quantity + qty as u64);
            prop_assert_eq!(after.current_value, before.current_value + Money::from_cents(cents.unwrap_or(0)));
            prop_assert_eq!(after.expiry_date, before.expiry_date);
        }

        /// Deductions never drive quantity below zero.
        #[test]
        fn deductions_clamp_at_zero(before in arb_level(), qty in 1i64..5_000, expired in any::<bool>()) {
            let kind = if expired { TransactionKind::Expired } else { TransactionKind::Used };
            let after = reconcile(&before, &tx(kind, qty));
            prop_assert_eq!(after.quantity, before.quantity.saturating_sub(qty as u64));
            prop_assert!(!after.current_value.is_negative());
            if after.quantity == 0 {
                prop_assert_eq!(after.current_value, Money::ZERO);
                prop_assert_eq!(after.expiry_date, None);
            }
        }

        /// Large negative adjustments land on zero.
        #[test]
        fn negative_adjustment_clamps(before in arb_level(), extra in 1i64..1_000) {
            let delta = -(before.quantity as i64) - extra;
            let after = reconcile(&before, &tx(TransactionKind::Adjusted, delta));
            prop_assert_eq!(after.quantity, 0);
        }

        /// Quantity and value stay non-negative over any sequence.
        #[test]
        fn sequences_keep_invariants(txs in prop::collection::vec(arb_tx(), 0..40)) {
            let mut state = StockLevel::empty();
            for t in &txs {
                state = reconcile(&state, t);
                prop_assert!(!state.current_value.is_negative());
            }
        }

        /// Replaying the whole ledger equals applying it step by step.
        #[test]
        fn replay_matches_incremental(txs in prop::collection::vec(arb_tx(), 0..40)) {
            let mut incremental = StockLevel::empty();
            for t in &txs {
                incremental = reconcile(&incremental, t);
            }
            prop_assert_eq!(replay(&txs), incremental);
        }
    }
}
