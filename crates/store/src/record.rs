//! Persisted document shapes and typed codecs.
//!
//! Records are flat key/value documents with camelCase field names; that
//! layout is the compatibility contract with existing data and must not
//! change. Absent optional fields are omitted, not written as null.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use khata_core::ledger::{Account, AccountKind, EntryKind, LedgerEntry};
use khata_shared::types::{AccountId, EntryId};

use crate::error::StoreError;

/// A flat key/value document in a named collection.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Collection names in the remote store.
pub mod collections {
    use khata_core::ledger::AccountKind;

    /// Customer accounts.
    pub const CUSTOMERS: &str = "customers";
    /// Supplier accounts.
    pub const SUPPLIERS: &str = "suppliers";
    /// Agent accounts.
    pub const AGENTS: &str = "agents";
    /// Bank accounts.
    pub const BANKS: &str = "banks";
    /// Cash wallet accounts.
    pub const WALLETS: &str = "wallets";
    /// All ledger entries, across every account.
    pub const ENTRIES: &str = "entries";

    /// The five account collections, one per kind.
    pub const ACCOUNT_COLLECTIONS: [&str; 5] = [CUSTOMERS, SUPPLIERS, AGENTS, BANKS, WALLETS];

    /// The account collection for a kind.
    #[must_use]
    pub fn for_kind(kind: AccountKind) -> &'static str {
        match kind {
            AccountKind::Customer => CUSTOMERS,
            AccountKind::Supplier => SUPPLIERS,
            AccountKind::Agent => AGENTS,
            AccountKind::Bank => BANKS,
            AccountKind::Wallet => WALLETS,
        }
    }
}

/// Persisted form of an [`Account`].
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDoc {
    /// Account id.
    pub id: AccountId,
    /// Counterparty classification.
    pub kind: AccountKind,
    /// Human-facing name.
    pub display_name: String,
    /// Phone number or bank account number.
    pub contact: Option<String>,
    /// Balance at account creation.
    pub opening_balance: Decimal,
    /// Materialized balance.
    pub balance: Decimal,
    /// Record creation instant.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountDoc {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            kind: account.kind,
            display_name: account.display_name.clone(),
            contact: account.contact.clone(),
            opening_balance: account.opening_balance,
            balance: account.balance,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

impl From<AccountDoc> for Account {
    fn from(doc: AccountDoc) -> Self {
        Self {
            id: doc.id,
            kind: doc.kind,
            display_name: doc.display_name,
            contact: doc.contact,
            opening_balance: doc.opening_balance,
            balance: doc.balance,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Persisted form of a [`LedgerEntry`].
///
/// The entry kind is stored under the key `type`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDoc {
    /// Entry id.
    pub id: EntryId,
    /// The owning account.
    pub account_id: AccountId,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Amount in the account's native unit.
    pub amount: Decimal,
    /// Secondary amount in the source unit, for converted entries.
    pub secondary_amount: Option<Decimal>,
    /// The conversion rate frozen at posting time.
    pub rate: Option<Decimal>,
    /// Free-text description.
    pub description: String,
    /// Calendar day the entry belongs to.
    pub date: NaiveDate,
    /// Creation instant, used for ordering.
    pub timestamp: DateTime<Utc>,
    /// Record creation instant.
    pub created_at: DateTime<Utc>,
    /// The other account of a dual posting.
    pub linked_account_id: Option<AccountId>,
    /// The counterpart entry of a dual posting.
    pub linked_entry_id: Option<EntryId>,
}

impl From<&LedgerEntry> for EntryDoc {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id,
            account_id: entry.account_id,
            kind: entry.kind,
            amount: entry.amount,
            secondary_amount: entry.secondary_amount,
            rate: entry.rate,
            description: entry.description.clone(),
            date: entry.date,
            timestamp: entry.timestamp,
            created_at: entry.created_at,
            linked_account_id: entry.linked_account_id,
            linked_entry_id: entry.linked_entry_id,
        }
    }
}

impl From<EntryDoc> for LedgerEntry {
    fn from(doc: EntryDoc) -> Self {
        Self {
            id: doc.id,
            account_id: doc.account_id,
            kind: doc.kind,
            amount: doc.amount,
            secondary_amount: doc.secondary_amount,
            rate: doc.rate,
            description: doc.description,
            date: doc.date,
            timestamp: doc.timestamp,
            created_at: doc.created_at,
            linked_account_id: doc.linked_account_id,
            linked_entry_id: doc.linked_entry_id,
        }
    }
}

/// Serializes a document into a flat record.
///
/// # Errors
///
/// Returns `Serialization` if the document does not serialize to a JSON
/// object.
pub fn to_record<T: Serialize>(doc: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(doc)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "expected a flat object, got {other}"
        ))),
    }
}

/// Deserializes a flat record into a document.
///
/// # Errors
///
/// Returns `Serialization` if required fields are missing or malformed.
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T, StoreError> {
    Ok(serde_json::from_value(serde_json::Value::Object(record))?)
}

/// Reads the `id` field of a record, if present.
#[must_use]
pub fn record_id(record: &Record) -> Option<String> {
    record
        .get("id")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}
