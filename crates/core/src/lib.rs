//! Core ledger logic for Khata.
//!
//! This crate contains pure domain logic with ZERO I/O dependencies.
//! All entry types, balance rules, posting plans, and the mutation state
//! machine live here.
//!
//! # Modules
//!
//! - `fx` - Cross-unit conversion arithmetic
//! - `ledger` - Accounts, entries, and the balance delta rule
//! - `posting` - Dual-posting plans, the edit protocol, and the mutation pipeline
//! - `networth` - Per-kind balance aggregation

pub mod fx;
pub mod ledger;
pub mod networth;
pub mod posting;
