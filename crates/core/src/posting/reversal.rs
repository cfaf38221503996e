//! Delete planning for single and dual-posted entries.
//!
//! Deleting an entry reverses its delta on the owning account. For a
//! dual-posted entry the delete cascades: the counterpart entry is removed
//! and its delta reversed on the linked account too. Edits never cascade;
//! revising one leg leaves the other leg untouched.

use khata_shared::types::{AccountId, EntryId};

use crate::ledger::entry::LedgerEntry;

/// One entry removal on one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// The account whose balance the reversal adjusts.
    pub account_id: AccountId,
    /// The entry to remove.
    pub entry_id: EntryId,
}

/// The full set of removals a delete implies.
#[derive(Debug, Clone)]
pub struct DeletePlan {
    /// The entry the caller asked to delete.
    pub primary: Removal,
    /// The linked counterpart, present only for dual-posted entries.
    pub cascade: Option<Removal>,
}

/// Stateless planner for entry deletion.
pub struct ReversalProtocol;

impl ReversalProtocol {
    /// Plans the removals for deleting `entry`.
    ///
    /// The cascade is included only when both link fields are present. An
    /// orphaned dependent leg, left behind by a partial dual-posting
    /// failure, carries a linked account but no counterpart id and deletes
    /// standalone.
    #[must_use]
    pub fn delete_plan(entry: &LedgerEntry) -> DeletePlan {
        let cascade = match (entry.linked_account_id, entry.linked_entry_id) {
            (Some(account_id), Some(entry_id)) => Some(Removal {
                account_id,
                entry_id,
            }),
            _ => None,
        };
        DeletePlan {
            primary: Removal {
                account_id: entry.account_id,
                entry_id: entry.id,
            },
            cascade,
        }
    }
}
