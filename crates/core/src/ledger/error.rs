//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during ledger operations,
//! including field validation errors, balance guard errors, rate errors,
//! and lookup errors for accounts and entries.

use rust_decimal::Decimal;
use thiserror::Error;

use khata_shared::types::{AccountId, EntryId};

use super::kind::{AccountKind, EntryKind};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry amount cannot be zero.
    #[error("Entry amount cannot be zero")]
    ZeroAmount,

    /// Entry amount cannot be negative.
    #[error("Entry amount cannot be negative")]
    NegativeAmount,

    /// Entry kind is not permitted for the account kind.
    #[error("Entry kind '{entry_kind}' is not valid for {account_kind} accounts")]
    EntryKindMismatch {
        /// The account's counterparty kind.
        account_kind: AccountKind,
        /// The attempted entry kind.
        entry_kind: EntryKind,
    },

    /// A required field is missing or unparseable.
    #[error("Validation error: {0}")]
    Validation(String),

    // ========== Rate Errors ==========
    /// A conversion rate is required for this entry kind but was not given.
    #[error("A conversion rate is required for this entry kind")]
    RateRequired,

    /// A conversion rate was zero or negative where division is required.
    #[error("Conversion rate must be positive, got {rate}")]
    InvalidRate {
        /// The offending rate.
        rate: Decimal,
    },

    // ========== Balance Guard Errors ==========
    /// A withdrawal would drive a bank or wallet balance negative.
    #[error(
        "Insufficient balance for account {account_id}: balance {balance}, requested {requested}"
    )]
    InsufficientBalance {
        /// The guarded account.
        account_id: AccountId,
        /// The balance available before the withdrawal.
        balance: Decimal,
        /// The amount the withdrawal asked for.
        requested: Decimal,
    },

    // ========== Lookup Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Entry not found on the account.
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    /// A dual-posted entry's counterpart could not be found.
    #[error("Linked entry {linked_entry_id} for entry {entry_id} not found")]
    LinkedEntryMissing {
        /// The entry whose counterpart is missing.
        entry_id: EntryId,
        /// The counterpart id recorded on the entry.
        linked_entry_id: EntryId,
    },
}

impl LedgerError {
    /// Returns the error code for structured responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::EntryKindMismatch { .. } => "ENTRY_KIND_MISMATCH",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::RateRequired => "RATE_REQUIRED",
            Self::InvalidRate { .. } => "INVALID_RATE",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::LinkedEntryMissing { .. } => "LINKED_ENTRY_MISSING",
        }
    }

    /// Returns true if this error is a pre-mutation rejection.
    ///
    /// Rejections leave no state mutated anywhere; the mutation pipeline maps
    /// them to its `Rejected` terminal.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::LinkedEntryMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::ZeroAmount.error_code(), "ZERO_AMOUNT");
        assert_eq!(LedgerError::NegativeAmount.error_code(), "NEGATIVE_AMOUNT");
        assert_eq!(
            LedgerError::EntryKindMismatch {
                account_kind: AccountKind::Customer,
                entry_kind: EntryKind::Bill,
            }
            .error_code(),
            "ENTRY_KIND_MISMATCH"
        );
        assert_eq!(LedgerError::RateRequired.error_code(), "RATE_REQUIRED");
        assert_eq!(
            LedgerError::InvalidRate { rate: dec!(0) }.error_code(),
            "INVALID_RATE"
        );
        assert_eq!(
            LedgerError::InsufficientBalance {
                account_id: AccountId::new(),
                balance: dec!(100),
                requested: dec!(150),
            }
            .error_code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            LedgerError::AccountNotFound(AccountId::new()).error_code(),
            "ACCOUNT_NOT_FOUND"
        );
        assert_eq!(
            LedgerError::EntryNotFound(EntryId::new()).error_code(),
            "ENTRY_NOT_FOUND"
        );
    }

    #[test]
    fn test_rejection_classification() {
        assert!(LedgerError::ZeroAmount.is_rejection());
        assert!(
            LedgerError::InsufficientBalance {
                account_id: AccountId::new(),
                balance: dec!(100),
                requested: dec!(150),
            }
            .is_rejection()
        );
        // A missing counterpart is a warning: the primary delete proceeds.
        assert!(
            !LedgerError::LinkedEntryMissing {
                entry_id: EntryId::new(),
                linked_entry_id: EntryId::new(),
            }
            .is_rejection()
        );
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::EntryKindMismatch {
            account_kind: AccountKind::Customer,
            entry_kind: EntryKind::Bill,
        };
        assert_eq!(
            err.to_string(),
            "Entry kind 'bill' is not valid for customer accounts"
        );

        let err = LedgerError::InvalidRate { rate: dec!(-1.5) };
        assert_eq!(err.to_string(), "Conversion rate must be positive, got -1.5");
    }
}
