//! Phase machine for a single ledger mutation.
//!
//! Every mutation request moves through the same phases from intake to
//! durability. The valid transitions are:
//! - Pending → Validating (rules and balance guards run)
//! - Validating → Applying (all checks passed)
//! - Validating → Rejected (a check failed, nothing mutated)
//! - Applying → PersistingRemote (optimistic local state updated)
//! - PersistingRemote → PersistingCache (remote write acknowledged)
//! - PersistingRemote → Degraded (remote write failed, local state kept)
//! - PersistingCache → Committed (cache mirrored, or cache failure logged)
//!
//! `Degraded` keeps the optimistic local update; the remote write is retried
//! only on the next explicit refresh, never in a loop.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::PostingError;

/// Phase of a mutation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    /// Request received, not yet checked.
    Pending,
    /// Rules and balance guards are running.
    Validating,
    /// Local balance and entry log are being updated.
    Applying,
    /// The remote store write is in flight.
    PersistingRemote,
    /// The cache mirror write is in flight.
    PersistingCache,
    /// Fully durable: local, remote, and cache agree.
    Committed,
    /// Local state updated but the remote write failed.
    Degraded,
    /// A validation check failed; nothing was mutated.
    Rejected,
}

impl MutationPhase {
    /// Returns the string representation of the phase.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::Applying => "applying",
            Self::PersistingRemote => "persisting_remote",
            Self::PersistingCache => "persisting_cache",
            Self::Committed => "committed",
            Self::Degraded => "degraded",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a phase from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "validating" => Some(Self::Validating),
            "applying" => Some(Self::Applying),
            "persisting_remote" => Some(Self::PersistingRemote),
            "persisting_cache" => Some(Self::PersistingCache),
            "committed" => Some(Self::Committed),
            "degraded" => Some(Self::Degraded),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the mutation has reached a final phase.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Degraded | Self::Rejected)
    }

    /// Returns true if the local ledger state was updated.
    ///
    /// Degraded mutations count: the optimistic local update survives even
    /// though the remote write failed.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Committed | Self::Degraded)
    }
}

impl fmt::Display for MutationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stateless transition rules for the mutation phase machine.
pub struct MutationPipeline;

impl MutationPipeline {
    /// Check if a phase transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: MutationPhase, to: MutationPhase) -> bool {
        matches!(
            (from, to),
            (MutationPhase::Pending, MutationPhase::Validating)
                | (
                    MutationPhase::Validating,
                    MutationPhase::Applying | MutationPhase::Rejected
                )
                | (MutationPhase::Applying, MutationPhase::PersistingRemote)
                | (
                    MutationPhase::PersistingRemote,
                    MutationPhase::PersistingCache | MutationPhase::Degraded
                )
                | (MutationPhase::PersistingCache, MutationPhase::Committed)
        )
    }

    /// Validate a phase transition, returning the new phase on success.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the phase machine does not permit
    /// moving from `from` to `to`.
    pub fn advance(from: MutationPhase, to: MutationPhase) -> Result<MutationPhase, PostingError> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(PostingError::InvalidTransition { from, to })
        }
    }
}
