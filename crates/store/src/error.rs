//! Error types for remote stores and local caches.

use thiserror::Error;

/// Remote store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found in the collection.
    #[error("record not found: {collection}/{id}")]
    NotFound {
        /// The collection that was searched.
        collection: String,
        /// The record id that was not found.
        id: String,
    },

    /// The store backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A record failed to serialize or deserialize.
    #[error("record serialization failed: {0}")]
    Serialization(String),

    /// The backend reported an operation failure.
    #[error("store operation failed: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Returns a stable machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "RECORD_NOT_FOUND",
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
            Self::Serialization(_) => "RECORD_SERIALIZATION",
            Self::Backend(_) => "STORE_BACKEND",
        }
    }
}

impl From<opendal::Error> for StoreError {
    fn from(err: opendal::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Local cache operation errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache backend reported an operation failure.
    #[error("cache operation failed: {0}")]
    Backend(String),
}

impl From<opendal::Error> for CacheError {
    fn from(err: opendal::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
