//! Error types for dual posting and the mutation pipeline.

use thiserror::Error;

use super::pipeline::MutationPhase;
use crate::ledger::LedgerError;

/// Errors that can occur while planning or driving a posting.
#[derive(Debug, Error)]
pub enum PostingError {
    // ========== Pipeline Errors ==========
    /// A mutation attempted a phase transition the pipeline does not allow.
    #[error("Invalid mutation phase transition from '{from}' to '{to}'")]
    InvalidTransition {
        /// The phase the mutation is currently in.
        from: MutationPhase,
        /// The phase the transition targeted.
        to: MutationPhase,
    },

    // ========== Ledger Errors ==========
    /// An underlying ledger rule rejected the posting.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl PostingError {
    /// Returns a stable machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_PHASE_TRANSITION",
            Self::Ledger(inner) => inner.error_code(),
        }
    }
}
