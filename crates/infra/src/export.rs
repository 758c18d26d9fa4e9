//! Presentation exports: CSV for spreadsheets, HTML for printed receipts.

use serde::Serialize;
use thiserror::Error;

use innkeep_inventory::{InventoryItem, StockTransaction};
use innkeep_requests::Receipt;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv output was not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("csv writer could not be flushed: {0}")]
    Flush(String),
}

#[derive(Serialize)]
struct ItemRow<'a> {
    name: &'a str,
    category: &'a str,
    quantity: u64,
    unit: &'a str,
    min_stock_level: u64,
    low_stock: bool,
    current_value: String,
    location: &'a str,
    expiry_date: Option<String>,
    supplier: Option<&'a str>,
    last_updated: String,
}

#[derive(Serialize)]
struct TransactionRow<'a> {
    date: String,
    item: &'a str,
    kind: &'a str,
    quantity: i64,
    value: Option<String>,
    expiry_date: Option<String>,
    performed_by: &'a str,
    notes: Option<&'a str>,
}

fn write_rows<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

/// One row per item, in collection order.
pub fn items_csv(items: &[InventoryItem]) -> Result<String, ExportError> {
    write_rows(items.iter().map(|item| ItemRow {
        name: &item.name,
        category: &item.category,
        quantity: item.quantity,
        unit: &item.unit,
        min_stock_level: item.min_stock_level,
        low_stock: item.is_low_stock(),
        current_value: item.current_value.to_string(),
        location: &item.location,
        expiry_date: item.expiry_date.map(|d| d.to_string()),
        supplier: item.supplier.as_deref(),
        last_updated: item.last_updated.to_rfc3339(),
    }))
}

/// The ledger in the order given (the service passes it newest first).
pub fn transactions_csv(transactions: &[StockTransaction]) -> Result<String, ExportError> {
    write_rows(transactions.iter().map(|tx| TransactionRow {
        date: tx.date.to_rfc3339(),
        item: &tx.item_name,
        kind: tx.kind.as_str(),
        quantity: tx.quantity,
        value: tx.value.map(|v| v.to_string()),
        expiry_date: tx.expiry_date.map(|d| d.to_string()),
        performed_by: &tx.performed_by,
        notes: tx.notes.as_deref(),
    }))
}

/// Self-contained printable receipt.
pub fn receipt_html(receipt: &Receipt) -> String {
    let mut rows = String::new();
    for line in receipt.lines() {
        rows.push_str(&format!(
            "      <tr><td>{}</td><td class=\"num\">{}</td><td>{}</td><td class=\"num\">{}</td></tr>\n",
            escape(&line.description),
            line.quantity,
            escape(&line.unit),
            line.value.map(|v| v.to_string()).unwrap_or_default(),
        ));
    }

    let notes = receipt
        .notes()
        .map(|n| format!("  <p class=\"notes\">{}</p>\n", escape(n)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Receipt {number}</title>
  <style>
    body {{ font-family: sans-serif; margin: 2em; }}
    table {{ border-collapse: collapse; width: 100%; }}
    th, td {{ border-bottom: 1px solid #ccc; padding: 0.4em; text-align: left; }}
    .num {{ text-align: right; }}
  </style>
</head>
<body>
  <h1>Receipt {number}</h1>
  <dl>
    <dt>Request</dt><dd>{request}</dd>
    <dt>Issued</dt><dd>{issued_at}</dd>
    <dt>Issued by</dt><dd>{issued_by}</dd>
    <dt>Issued to</dt><dd>{issued_to}</dd>
    <dt>Department</dt><dd>{department}</dd>
  </dl>
  <table>
    <thead>
      <tr><th>Description</th><th class="num">Qty</th><th>Unit</th><th class="num">Value</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
    <tfoot>
      <tr><th colspan="3">Total</th><th class="num">{total}</th></tr>
    </tfoot>
  </table>
{notes}</body>
</html>
"#,
        number = escape(receipt.receipt_number()),
        request = escape(receipt.request_number()),
        issued_at = receipt.issued_at().format("%Y-%m-%d %H:%M UTC"),
        issued_by = escape(receipt.issued_by()),
        issued_to = escape(receipt.issued_to()),
        department = escape(receipt.department()),
        total = receipt.total_value(),
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
