//! Mutation outcomes returned to callers.
//!
//! A mutation that reaches an applied phase returns an outcome even when the
//! remote write failed; anything non-fatal that happened on the way is
//! attached as a [`Warning`] instead of an error.

use serde::Serialize;

use khata_core::posting::MutationPhase;
use khata_shared::types::{AccountId, EntryId, Money, MutationId};

/// A non-fatal problem observed during a mutation.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl Warning {
    /// The remote store rejected a write; local state is authoritative until
    /// a refresh flushes it.
    pub const REMOTE_WRITE_FAILURE: &'static str = "REMOTE_WRITE_FAILURE";
    /// A linked counterpart entry could not be found during a cascade.
    pub const LINKED_ENTRY_MISSING: &'static str = "LINKED_ENTRY_MISSING";
    /// The cache mirror could not be written.
    pub const CACHE_WRITE_FAILURE: &'static str = "CACHE_WRITE_FAILURE";
    /// A dependent entry was persisted but its primary was not.
    pub const ORPHANED_COUNTERPART: &'static str = "ORPHANED_COUNTERPART";

    /// Creates a [`Self::REMOTE_WRITE_FAILURE`] warning.
    #[must_use]
    pub fn remote_write(message: impl Into<String>) -> Self {
        Self {
            code: Self::REMOTE_WRITE_FAILURE,
            message: message.into(),
        }
    }

    /// Creates a [`Self::LINKED_ENTRY_MISSING`] warning.
    #[must_use]
    pub fn linked_entry_missing(message: impl Into<String>) -> Self {
        Self {
            code: Self::LINKED_ENTRY_MISSING,
            message: message.into(),
        }
    }

    /// Creates a [`Self::CACHE_WRITE_FAILURE`] warning.
    #[must_use]
    pub fn cache_write(message: impl Into<String>) -> Self {
        Self {
            code: Self::CACHE_WRITE_FAILURE,
            message: message.into(),
        }
    }

    /// Creates a [`Self::ORPHANED_COUNTERPART`] warning.
    #[must_use]
    pub fn orphaned_counterpart(message: impl Into<String>) -> Self {
        Self {
            code: Self::ORPHANED_COUNTERPART,
            message: message.into(),
        }
    }
}

/// Result of a single-account mutation.
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome {
    /// Identifier of the pipeline run that produced this outcome.
    pub mutation_id: MutationId,
    /// Terminal phase the mutation reached, `Committed` or `Degraded`.
    pub phase: MutationPhase,
    /// Account the mutation was posted against.
    pub account_id: AccountId,
    /// Entry created or edited; `None` for deletions.
    pub entry_id: Option<EntryId>,
    /// Account balance after the mutation.
    pub balance: Money,
    /// Non-fatal problems observed on the way.
    pub warnings: Vec<Warning>,
}

/// One side of an applied dual posting.
#[derive(Debug, Clone, Serialize)]
pub struct PostedLeg {
    /// Account the leg was posted against.
    pub account_id: AccountId,
    /// Entry the leg created.
    pub entry_id: EntryId,
    /// Account balance after the posting.
    pub balance: Money,
}

/// Result of a dual posting: both legs plus shared pipeline state.
#[derive(Debug, Clone, Serialize)]
pub struct DualPostingOutcome {
    /// Identifier of the pipeline run that produced this outcome.
    pub mutation_id: MutationId,
    /// Terminal phase the mutation reached, `Committed` or `Degraded`.
    pub phase: MutationPhase,
    /// The side the caller asked for.
    pub primary: PostedLeg,
    /// The side created to keep dual symmetry.
    pub dependent: PostedLeg,
    /// Non-fatal problems observed on the way.
    pub warnings: Vec<Warning>,
}

/// Result of an explicit refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    /// Accounts whose degraded local state was flushed to the remote store.
    pub flushed: usize,
    /// Accounts still degraded after the flush attempt.
    pub still_degraded: usize,
    /// Whether remote state was pulled and re-materialized.
    pub pulled: bool,
    /// Non-fatal problems observed on the way.
    pub warnings: Vec<Warning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_constructors_set_codes() {
        assert_eq!(Warning::remote_write("x").code, "REMOTE_WRITE_FAILURE");
        assert_eq!(
            Warning::linked_entry_missing("x").code,
            "LINKED_ENTRY_MISSING"
        );
        assert_eq!(Warning::cache_write("x").code, "CACHE_WRITE_FAILURE");
        assert_eq!(
            Warning::orphaned_counterpart("x").code,
            "ORPHANED_COUNTERPART"
        );
    }

    #[test]
    fn test_warning_serializes_with_code_and_message() {
        let json = serde_json::to_value(Warning::remote_write("store offline")).unwrap();
        assert_eq!(json["code"], "REMOTE_WRITE_FAILURE");
        assert_eq!(json["message"], "store offline");
    }
}
