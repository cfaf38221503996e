//! Ledger accounts and immutable entries.
//!
//! This module implements the core bookkeeping functionality:
//! - Account and entry kinds with their pairing rules
//! - Ledger entries and signed balance deltas
//! - Account state with a materialized, derivable balance
//! - Balance guards for money-holding accounts
//! - Error types for ledger operations

pub mod account;
pub mod entry;
pub mod error;
pub mod kind;
pub mod validation;

#[cfg(test)]
mod account_props;

pub use account::{Account, AccountState};
pub use entry::{LedgerEntry, NewEntry};
pub use error::LedgerError;
pub use kind::{AccountKind, EntryKind};
