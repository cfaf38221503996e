//! Engine error type and its mapping to the application surface.

use thiserror::Error;

use khata_core::ledger::LedgerError;
use khata_core::posting::PostingError;
use khata_shared::AppError;
use khata_store::{CacheError, StoreError};

/// Errors returned by engine operations.
///
/// Remote write failures during a mutation are not errors: the mutation
/// finishes in the `Degraded` phase with a warning instead. `Store` here
/// means an operation could not even start, such as a bootstrap with both
/// the remote store and the cache unreachable.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A ledger rule rejected the operation; nothing was mutated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Posting coordination failed.
    #[error(transparent)]
    Posting(#[from] PostingError),

    /// The store failed outside a degradable mutation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The cache failed outside a degradable mutation.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl EngineError {
    /// Returns a stable machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Posting(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Cache(_) => "CACHE_ERROR",
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Ledger(e) => ledger_to_app(e),
            EngineError::Posting(PostingError::Ledger(e)) => ledger_to_app(e),
            EngineError::Posting(e @ PostingError::InvalidTransition { .. }) => {
                Self::Internal(e.to_string())
            }
            EngineError::Store(e @ StoreError::Unavailable(_)) => Self::RemoteWrite(e.to_string()),
            EngineError::Store(e) => Self::Store(e.to_string()),
            EngineError::Cache(e) => Self::Store(e.to_string()),
        }
    }
}

fn ledger_to_app(err: LedgerError) -> AppError {
    match err {
        LedgerError::ZeroAmount
        | LedgerError::NegativeAmount
        | LedgerError::EntryKindMismatch { .. }
        | LedgerError::Validation(_)
        | LedgerError::RateRequired => AppError::Validation(err.to_string()),
        LedgerError::InvalidRate { .. } => AppError::InvalidRate(err.to_string()),
        LedgerError::InsufficientBalance { .. } => AppError::InsufficientBalance(err.to_string()),
        LedgerError::AccountNotFound(_) | LedgerError::EntryNotFound(_) => {
            AppError::NotFound(err.to_string())
        }
        LedgerError::LinkedEntryMissing { .. } => AppError::LinkedEntryMissing(err.to_string()),
    }
}
