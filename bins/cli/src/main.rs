//! Khata ledger CLI.
//!
//! Headless harness over the ledger engine. Every subcommand boots the
//! engine from the configured store and cache, runs one operation, and
//! prints the result as JSON on stdout. Failures print a structured
//! `{"error", "message"}` object on stderr and exit non-zero, so scripts
//! can match on the stable error code.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use khata_core::ledger::{AccountKind, EntryKind};
use khata_engine::Engine;
use khata_shared::types::{AccountId, EntryId};
use khata_shared::{AppConfig, AppError};
use khata_store::{BlobCache, JsonStore, LocalCache, RemoteStore};

#[derive(Parser)]
#[command(name = "khata", version, about = "Ledger bookkeeping for import/export trading")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a counterparty account.
    CreateAccount {
        /// Account kind: customer, supplier, agent, bank, or wallet.
        #[arg(long)]
        kind: String,
        /// Human-facing account name.
        #[arg(long)]
        name: String,
        /// Phone number or bank account number.
        #[arg(long)]
        contact: Option<String>,
        /// Balance the account starts at, in its native unit.
        #[arg(long, default_value = "0")]
        opening_balance: Decimal,
    },
    /// Change an account's display name and contact.
    UpdateAccount {
        #[arg(long)]
        account: AccountId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        contact: Option<String>,
    },
    /// Post a single entry to an account.
    PostEntry {
        #[arg(long)]
        account: AccountId,
        /// Entry kind: order, bill, payment, dhs, deposit, withdraw, credit, or debit.
        #[arg(long)]
        kind: String,
        /// Amount in the unit the kind expects.
        #[arg(long)]
        amount: Decimal,
        /// Conversion rate, required for agent dhs and payment entries.
        #[arg(long)]
        rate: Option<Decimal>,
        #[arg(long, default_value = "")]
        description: String,
        /// Entry date as YYYY-MM-DD, defaulting to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Replace an entry's kind, amount, rate, description, and date.
    EditEntry {
        #[arg(long)]
        account: AccountId,
        #[arg(long)]
        entry: EntryId,
        #[arg(long)]
        kind: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        rate: Option<Decimal>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete an entry, reversing its balance effect. A dual-posted entry
    /// takes its counterpart on the linked account with it.
    DeleteEntry {
        #[arg(long)]
        account: AccountId,
        #[arg(long)]
        entry: EntryId,
    },
    /// Book a customer order together with its supplier bill at frozen rates.
    DualPostOrder {
        #[arg(long)]
        customer: AccountId,
        #[arg(long)]
        supplier: AccountId,
        /// Order size in RMB.
        #[arg(long)]
        rmb_amount: Decimal,
        /// BDT per RMB charged to the customer.
        #[arg(long)]
        customer_rate: Decimal,
        /// RMB per USD owed to the supplier.
        #[arg(long)]
        supplier_rate: Decimal,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Record a customer payment landing in a bank account.
    DualPostPayment {
        #[arg(long)]
        customer: AccountId,
        #[arg(long)]
        bank: AccountId,
        /// Payment amount in BDT.
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print one account's materialized balance.
    GetBalance {
        #[arg(long)]
        account: AccountId,
    },
    /// List all accounts, sorted by id.
    ListAccounts,
    /// List an account's entries, newest first.
    ListEntries {
        #[arg(long)]
        account: AccountId,
    },
    /// Print the aggregate position across all account kinds.
    NetWorth,
    /// Flush degraded accounts back to the remote store, then pull fresh state.
    Refresh,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing; logs go to stderr so stdout stays parseable JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "khata=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let payload = serde_json::json!({
                "error": err.error_code(),
                "message": err.to_string(),
            });
            eprintln!("{payload}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<(), AppError> {
    let config =
        AppConfig::load().map_err(|e| AppError::Internal(format!("configuration: {e}")))?;
    info!(
        store_root = %config.store.root,
        cache_root = %config.cache.root,
        "Opening ledger stores"
    );
    let store = JsonStore::new(&config.store.root).map_err(|e| AppError::Store(e.to_string()))?;
    let cache = BlobCache::new(&config.cache.root).map_err(|e| AppError::Store(e.to_string()))?;

    let engine = Engine::new(
        Arc::new(store) as Arc<dyn RemoteStore>,
        Arc::new(cache) as Arc<dyn LocalCache>,
    );
    engine.load().await?;

    match cli.command {
        Command::CreateAccount {
            kind,
            name,
            contact,
            opening_balance,
        } => {
            let kind = parse_account_kind(&kind)?;
            let account = engine
                .create_account(kind, name, contact, opening_balance)
                .await?;
            print_json(&account)
        }
        Command::UpdateAccount {
            account,
            name,
            contact,
        } => {
            let account = engine.update_account(account, name, contact).await?;
            print_json(&account)
        }
        Command::PostEntry {
            account,
            kind,
            amount,
            rate,
            description,
            date,
        } => {
            let kind = parse_entry_kind(&kind)?;
            let outcome = engine
                .post_entry(account, kind, amount, rate, description, entry_date(date))
                .await?;
            print_json(&outcome)
        }
        Command::EditEntry {
            account,
            entry,
            kind,
            amount,
            rate,
            description,
            date,
        } => {
            let kind = parse_entry_kind(&kind)?;
            let outcome = engine
                .edit_entry(
                    account,
                    entry,
                    kind,
                    amount,
                    rate,
                    description,
                    entry_date(date),
                )
                .await?;
            print_json(&outcome)
        }
        Command::DeleteEntry { account, entry } => {
            let outcome = engine.delete_entry(account, entry).await?;
            print_json(&outcome)
        }
        Command::DualPostOrder {
            customer,
            supplier,
            rmb_amount,
            customer_rate,
            supplier_rate,
            description,
            date,
        } => {
            let outcome = engine
                .create_order(
                    customer,
                    supplier,
                    rmb_amount,
                    customer_rate,
                    supplier_rate,
                    description,
                    entry_date(date),
                )
                .await?;
            print_json(&outcome)
        }
        Command::DualPostPayment {
            customer,
            bank,
            amount,
            description,
            date,
        } => {
            let outcome = engine
                .receive_payment(customer, bank, amount, description, entry_date(date))
                .await?;
            print_json(&outcome)
        }
        Command::GetBalance { account } => {
            let record = engine.account(account).await?;
            let balance = engine.balance(account).await?;
            print_json(&serde_json::json!({
                "account_id": record.id,
                "display_name": record.display_name,
                "kind": record.kind,
                "balance": balance.amount,
                "unit": balance.unit,
                "display": balance.display_amount(),
            }))
        }
        Command::ListAccounts => {
            let accounts = engine.accounts().await;
            print_json(&accounts)
        }
        Command::ListEntries { account } => {
            let entries = engine.entries(account).await?;
            print_json(&entries)
        }
        Command::NetWorth => {
            let summary = engine.net_worth().await;
            print_json(&summary)
        }
        Command::Refresh => {
            let outcome = engine.refresh().await?;
            print_json(&outcome)
        }
    }
}

fn parse_account_kind(s: &str) -> Result<AccountKind, AppError> {
    AccountKind::parse(s)
        .ok_or_else(|| AppError::Validation(format!("unknown account kind '{s}'")))
}

fn parse_entry_kind(s: &str) -> Result<EntryKind, AppError> {
    EntryKind::parse(s).ok_or_else(|| AppError::Validation(format!("unknown entry kind '{s}'")))
}

fn entry_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Utc::now().date_naive())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| AppError::Internal(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}
