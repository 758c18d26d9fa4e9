use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{Days, NaiveDate, TimeZone, Utc};
use innkeep_core::Money;
use innkeep_inventory::{
    replay, summarize, InventoryItem, InventoryItemId, StockTransaction, TransactionKind,
};

fn ledger(len: usize) -> Vec<StockTransaction> {
    let item_id = InventoryItemId::generate();
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
    (0..len)
        .map(|i| {
            let date = start + chrono::Duration::minutes(i as i64);
            match i % 4 {
                0 => StockTransaction::new(item_id, "Bath towel", TransactionKind::Received, 40, "Store", date)
                    .with_value(Money::from_cents(40_000))
                    .with_expiry(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()),
                3 => StockTransaction::new(item_id, "Bath towel", TransactionKind::Adjusted, -2, "Store", date),
                _ => StockTransaction::new(item_id, "Bath towel", TransactionKind::Used, 12, "Housekeeping", date),
            }
        })
        .collect()
}

fn catalogue(len: usize, today: NaiveDate) -> Vec<InventoryItem> {
    (0..len)
        .map(|i| InventoryItem {
            id: InventoryItemId::generate(),
            name: format!("Item {i}"),
            category: ["Linen", "Toiletries", "Cleaning", "F&B"][i % 4].to_string(),
            quantity: (i % 50) as u64,
            unit: "pcs".to_string(),
            min_stock_level: 10,
            current_value: Money::from_cents((i as i64) * 125),
            location: "Store room".to_string(),
            last_updated: Utc::now(),
            expiry_date: today.checked_add_days(Days::new((i % 30) as u64)),
            supplier: None,
        })
        .collect()
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_replay");

    for len in [100usize, 1_000, 10_000] {
        let txs = ledger(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &txs, |b, txs| {
            b.iter(|| replay(black_box(txs.iter())));
        });
    }

    group.finish();
}

fn bench_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("dashboard_summary");
    let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

    for len in [50usize, 500, 5_000] {
        let items = catalogue(len, today);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &items, |b, items| {
            b.iter(|| summarize(black_box(items), today, 7));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_replay, bench_summary);
criterion_main!(benches);
