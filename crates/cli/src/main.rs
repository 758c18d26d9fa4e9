//! Command-line front end over the Innkeep data layer.
//!
//! Storage and seeding come from the `INNKEEP_*` environment variables; every
//! command runs as the user named by `--user`.

use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use innkeep_auth::Principal;
use innkeep_core::Money;
use innkeep_infra::{Hotel, ServiceError};
use innkeep_inventory::{StockTransaction, TransactionKind};

#[derive(Parser, Debug)]
#[command(name = "innkeep")]
#[command(about = "Hotel inventory, assets, purchasing and requests")]
#[command(version)]
struct Cli {
    /// Username to act as
    #[arg(long, short, default_value = "admin")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dashboard totals, low-stock and expiry alerts
    Summary,

    /// List inventory items
    Items,

    /// Record a stock transaction against an item (matched by name)
    Record {
        item: String,

        #[arg(long, value_enum)]
        kind: Kind,

        /// Units; may be negative for adjustments
        #[arg(long, allow_hyphen_values = true)]
        quantity: i64,

        /// Value of the batch (received) or value delta (adjusted)
        #[arg(long, allow_hyphen_values = true)]
        value: Option<Money>,

        /// Expiry date of a received batch (YYYY-MM-DD)
        #[arg(long)]
        expiry: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Requests waiting on the current user
    Requests,

    /// Write a CSV export to a file or stdout
    Export {
        #[arg(value_enum)]
        what: ExportKind,

        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Print a receipt as HTML
    Receipt {
        /// Receipt number, e.g. RCP-20260101-0001
        number: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Received,
    Used,
    Expired,
    Adjusted,
}

impl From<Kind> for TransactionKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Received => TransactionKind::Received,
            Kind::Used => TransactionKind::Used,
            Kind::Expired => TransactionKind::Expired,
            Kind::Adjusted => TransactionKind::Adjusted,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExportKind {
    Items,
    Transactions,
}

fn main() -> anyhow::Result<()> {
    innkeep_observability::init();
    let cli = Cli::parse();

    let hotel = Hotel::from_env()?;
    let principal = hotel
        .users
        .sign_in(&cli.user)
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("cannot sign in as '{}'", cli.user))?;

    let result = run(&hotel, &principal, cli.command);
    if let Err(error) = &result {
        tracing::error!(%error, user = %cli.user, "command failed");
    }
    result
}

fn run(hotel: &Hotel, principal: &Principal, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Summary => summary(hotel, principal),
        Commands::Items => {
            for item in hotel.inventory.list_items(principal).map_err(friendly)? {
                let flag = if item.is_low_stock() { "  LOW" } else { "" };
                println!(
                    "{:<28} {:>6} {:<8} {:>10}  {}{flag}",
                    item.name,
                    item.quantity,
                    item.unit,
                    item.current_value.to_string(),
                    item.location
                );
            }
            Ok(())
        }
        Commands::Record {
            item,
            kind,
            quantity,
            value,
            expiry,
            notes,
        } => {
            let target = hotel
                .inventory
                .list_items(principal)
                .map_err(friendly)?
                .into_iter()
                .find(|i| i.name.eq_ignore_ascii_case(item.trim()));
            let Some(target) = target else {
                bail!("no inventory item named '{item}'");
            };

            let mut tx = StockTransaction::new(
                target.id,
                &target.name,
                kind.into(),
                quantity,
                &principal.display_name,
                Utc::now(),
            );
            if let Some(value) = value {
                tx = tx.with_value(value);
            }
            if let Some(expiry) = expiry {
                tx = tx.with_expiry(expiry);
            }
            if let Some(notes) = notes {
                tx = tx.with_notes(notes);
            }
            let recorded = hotel.inventory.record_transaction(principal, tx).map_err(friendly)?;
            println!("recorded {} {} of {}", recorded.kind, recorded.quantity, recorded.item_name);
            Ok(())
        }
        Commands::Requests => {
            for request in hotel.requests.actionable(principal).map_err(friendly)? {
                let what = request.subject().map(|s| s.describe()).unwrap_or_default();
                println!(
                    "{}  {:<18} {:<16} {}",
                    request.request_number(),
                    request.status().to_string(),
                    request.department(),
                    what
                );
            }
            Ok(())
        }
        Commands::Export { what, out } => {
            let csv = match what {
                ExportKind::Items => hotel.inventory.export_items_csv(principal),
                ExportKind::Transactions => hotel.inventory.export_transactions_csv(principal),
            }
            .map_err(friendly)?;
            match out {
                Some(path) => std::fs::write(&path, csv)
                    .with_context(|| format!("cannot write {}", path.display()))?,
                None => print!("{csv}"),
            }
            Ok(())
        }
        Commands::Receipt { number } => {
            let receipt = hotel
                .requests
                .list_receipts(principal)
                .map_err(friendly)?
                .into_iter()
                .find(|r| r.receipt_number().eq_ignore_ascii_case(number.trim()));
            let Some(receipt) = receipt else {
                bail!("no receipt numbered '{number}'");
            };
            println!("{}", hotel.requests.receipt_html(principal, receipt.id_typed()).map_err(friendly)?);
            Ok(())
        }
    }
}

fn summary(hotel: &Hotel, principal: &Principal) -> anyhow::Result<()> {
    let summary = hotel
        .inventory
        .summary(principal, Utc::now().date_naive())
        .map_err(friendly)?;

    println!(
        "{} items, {} units, value {}",
        summary.total_items, summary.total_quantity, summary.total_value
    );
    for (category, totals) in &summary.by_category {
        println!("  {category:<16} {:>4} items {:>10}", totals.items, totals.value.to_string());
    }
    if !summary.low_stock.is_empty() {
        println!("Low stock:");
        for alert in &summary.low_stock {
            println!("  {} ({} of min {}, short {})", alert.name, alert.quantity, alert.min_stock_level, alert.shortfall);
        }
    }
    if !summary.expiring.is_empty() {
        println!("Expiring soon:");
        for alert in &summary.expiring {
            println!("  {} on {} ({} days)", alert.name, alert.expiry_date, alert.days_remaining);
        }
    }
    Ok(())
}

/// Log the full error and surface only the user-facing message.
fn friendly(error: ServiceError) -> anyhow::Error {
    tracing::debug!(?error, "service error");
    anyhow::anyhow!(error.user_message())
}
