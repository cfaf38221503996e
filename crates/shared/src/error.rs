//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// This is the outermost error surface: domain and engine errors are mapped
/// into these variants at the binary boundary, and `error_code()` is what a
/// harness or script matches on.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input failed validation; nothing was mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A withdrawal would drive a bank or wallet balance negative.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// A conversion rate was zero or negative where a usable rate is required.
    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    /// The authoritative store rejected a write; local state is optimistic.
    #[error("Remote write failure: {0}")]
    RemoteWrite(String),

    /// A dual-posted entry's counterpart could not be found.
    #[error("Linked entry missing: {0}")]
    LinkedEntryMissing(String),

    /// Store or cache backend error.
    #[error("Store error: {0}")]
    Store(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable error code for structured output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            Self::InvalidRate(_) => "INVALID_RATE",
            Self::RemoteWrite(_) => "REMOTE_WRITE_FAILURE",
            Self::LinkedEntryMissing(_) => "LINKED_ENTRY_MISSING",
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::NotFound(String::new()).error_code(), "NOT_FOUND");
        assert_eq!(
            AppError::Validation(String::new()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::InsufficientBalance(String::new()).error_code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            AppError::InvalidRate(String::new()).error_code(),
            "INVALID_RATE"
        );
        assert_eq!(
            AppError::RemoteWrite(String::new()).error_code(),
            "REMOTE_WRITE_FAILURE"
        );
        assert_eq!(
            AppError::LinkedEntryMissing(String::new()).error_code(),
            "LINKED_ENTRY_MISSING"
        );
        assert_eq!(AppError::Store(String::new()).error_code(), "STORE_ERROR");
        assert_eq!(
            AppError::Internal(String::new()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound("account abc".into()).to_string(),
            "Not found: account abc"
        );
        assert_eq!(
            AppError::InsufficientBalance("balance 100, requested 150".into()).to_string(),
            "Insufficient balance: balance 100, requested 150"
        );
        assert_eq!(
            AppError::RemoteWrite("store unavailable".into()).to_string(),
            "Remote write failure: store unavailable"
        );
    }
}
