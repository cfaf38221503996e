//! Single-account mutations: post, edit, and delete.
//!
//! Every mutation follows the same phase sequence. Validation runs under
//! the account's mutation lock against the live balance, so the in-memory
//! apply that follows cannot fail. Remote persistence happens last; its
//! failure degrades the mutation instead of rolling the local state back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use khata_core::ledger::{validation, Account, EntryKind, LedgerError, NewEntry};
use khata_core::posting::{MutationPhase, MutationPipeline, ReversalProtocol};
use khata_shared::types::{AccountId, EntryId, MutationId};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::outcome::{MutationOutcome, Warning};

/// Logs a rejection and converts the failed check into an engine error.
///
/// Only valid while the mutation is in `Validating`; calling it from any
/// other phase surfaces the broken transition instead.
pub(crate) fn reject(
    mutation_id: MutationId,
    from: MutationPhase,
    err: LedgerError,
) -> EngineError {
    match MutationPipeline::advance(from, MutationPhase::Rejected) {
        Ok(phase) => {
            debug!(
                mutation_id = %mutation_id,
                phase = %phase,
                error = %err,
                "Mutation rejected"
            );
            err.into()
        }
        Err(transition) => transition.into(),
    }
}

impl Engine {
    /// Posts a new entry to one account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown account and any validation
    /// failure from the entry rules or the overdraft guard. A failed remote
    /// write is not an error; the outcome comes back `Degraded` with a
    /// warning.
    pub async fn post_entry(
        &self,
        account_id: AccountId,
        kind: EntryKind,
        amount: Decimal,
        rate: Option<Decimal>,
        description: String,
        date: NaiveDate,
    ) -> Result<MutationOutcome, EngineError> {
        let mutation_id = MutationId::new();
        let handle = self.registry.require(account_id)?;
        let _mutation = handle.begin_mutation().await;

        let phase = MutationPipeline::advance(MutationPhase::Pending, MutationPhase::Validating)?;
        let entry = {
            let state = handle.read().await;
            let account_kind = state.account().kind;
            let input =
                match NewEntry::from_parts(account_kind, kind, amount, rate, description, date) {
                    Ok(input) => input,
                    Err(e) => return Err(reject(mutation_id, phase, e)),
                };
            let entry = input.into_entry(account_id);
            if let Err(e) =
                validation::check_withdrawal(account_kind, account_id, state.balance(), &entry)
            {
                return Err(reject(mutation_id, phase, e));
            }
            entry
        };

        let phase = MutationPipeline::advance(phase, MutationPhase::Applying)?;
        let (account, balance) = {
            let mut state = handle.write().await;
            state.apply(entry.clone())?;
            (state.account().clone(), state.account().balance_money())
        };

        let phase = MutationPipeline::advance(phase, MutationPhase::PersistingRemote)?;
        let remote = self.sync.push_posting(&account, &entry).await;

        let mut warnings = Vec::new();
        let phase = self
            .finish_mutation(mutation_id, phase, remote, &[account_id], &mut warnings)
            .await?;

        info!(
            mutation_id = %mutation_id,
            account_id = %account_id,
            entry_id = %entry.id,
            phase = %phase,
            "Entry posted"
        );
        Ok(MutationOutcome {
            mutation_id,
            phase,
            account_id,
            entry_id: Some(entry.id),
            balance,
            warnings,
        })
    }

    /// Replaces an entry's mutable fields, repricing the account balance.
    ///
    /// Edits never cascade: revising one leg of a dual posting leaves the
    /// counterpart leg untouched. The overdraft guard runs against the
    /// balance as it stands with the original entry reversed.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `EntryNotFound`, or a validation failure.
    pub async fn edit_entry(
        &self,
        account_id: AccountId,
        entry_id: EntryId,
        kind: EntryKind,
        amount: Decimal,
        rate: Option<Decimal>,
        description: String,
        date: NaiveDate,
    ) -> Result<MutationOutcome, EngineError> {
        let mutation_id = MutationId::new();
        let handle = self.registry.require(account_id)?;
        let _mutation = handle.begin_mutation().await;

        let phase = MutationPipeline::advance(MutationPhase::Pending, MutationPhase::Validating)?;
        let input = {
            let state = handle.read().await;
            let account_kind = state.account().kind;
            let input =
                match NewEntry::from_parts(account_kind, kind, amount, rate, description, date) {
                    Ok(input) => input,
                    Err(e) => return Err(reject(mutation_id, phase, e)),
                };
            let Some(original) = state.entry(entry_id) else {
                return Err(reject(
                    mutation_id,
                    phase,
                    LedgerError::EntryNotFound(entry_id),
                ));
            };
            let revised = original.revised(&input);
            let after_reversal = state.balance() + original.reverse_delta();
            if let Err(e) =
                validation::check_withdrawal(account_kind, account_id, after_reversal, &revised)
            {
                return Err(reject(mutation_id, phase, e));
            }
            input
        };

        let phase = MutationPipeline::advance(phase, MutationPhase::Applying)?;
        let (account, entry, balance) = {
            let mut state = handle.write().await;
            let (entry, _) = state.edit(entry_id, &input)?;
            (state.account().clone(), entry, state.account().balance_money())
        };

        let phase = MutationPipeline::advance(phase, MutationPhase::PersistingRemote)?;
        let remote = self.sync.push_revision(&account, &entry).await;

        let mut warnings = Vec::new();
        let phase = self
            .finish_mutation(mutation_id, phase, remote, &[account_id], &mut warnings)
            .await?;

        info!(
            mutation_id = %mutation_id,
            account_id = %account_id,
            entry_id = %entry_id,
            phase = %phase,
            "Entry edited"
        );
        Ok(MutationOutcome {
            mutation_id,
            phase,
            account_id,
            entry_id: Some(entry_id),
            balance,
            warnings,
        })
    }

    /// Deletes an entry, reversing its delta.
    ///
    /// Deleting one leg of a dual posting cascades to the counterpart leg
    /// so dual symmetry survives. A counterpart that cannot be found is
    /// logged and skipped; the primary deletion still goes through.
    /// Reversal is unconditional and may drive a guarded balance negative.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `EntryNotFound`.
    pub async fn delete_entry(
        &self,
        account_id: AccountId,
        entry_id: EntryId,
    ) -> Result<MutationOutcome, EngineError> {
        let mutation_id = MutationId::new();
        let handle = self.registry.require(account_id)?;

        // Peek the entry to learn which accounts the delete touches. The
        // peeked plan only fixes the lock set; everything else is
        // re-checked once the locks are held.
        let peeked = {
            let state = handle.read().await;
            let entry = state
                .entry(entry_id)
                .ok_or(LedgerError::EntryNotFound(entry_id))?;
            ReversalProtocol::delete_plan(entry)
        };

        let mut lock_set = vec![(account_id, handle.clone())];
        if let Some(cascade) = &peeked.cascade
            && cascade.account_id != account_id
            && let Some(cascade_handle) = self.registry.get(cascade.account_id)
        {
            lock_set.push((cascade.account_id, cascade_handle));
        }
        // Both dual mutations and cascading deletes take their account
        // locks in ascending id order, so they can never deadlock.
        lock_set.sort_by_key(|(id, _)| *id);
        let mut guards = Vec::with_capacity(lock_set.len());
        for (_, locked) in &lock_set {
            guards.push(locked.begin_mutation().await);
        }

        let phase = MutationPipeline::advance(MutationPhase::Pending, MutationPhase::Validating)?;
        let plan = {
            let state = handle.read().await;
            let Some(entry) = state.entry(entry_id) else {
                return Err(reject(
                    mutation_id,
                    phase,
                    LedgerError::EntryNotFound(entry_id),
                ));
            };
            ReversalProtocol::delete_plan(entry)
        };

        let phase = MutationPipeline::advance(phase, MutationPhase::Applying)?;
        let mut warnings = Vec::new();
        let (account, balance) = {
            let mut state = handle.write().await;
            state.reverse(entry_id)?;
            (state.account().clone(), state.account().balance_money())
        };

        let mut cascade_removal = None;
        if let Some(cascade) = &plan.cascade {
            match self.cascade_reverse(cascade.account_id, cascade.entry_id).await {
                Ok(removed) => cascade_removal = Some(removed),
                Err(e) => {
                    warn!(
                        mutation_id = %mutation_id,
                        entry_id = %entry_id,
                        linked_entry_id = %cascade.entry_id,
                        error = %e,
                        "Cascade reversal skipped, deleting the primary leg alone"
                    );
                    warnings.push(Warning::linked_entry_missing(e.to_string()));
                }
            }
        }

        let phase = MutationPipeline::advance(phase, MutationPhase::PersistingRemote)?;
        let remote = async {
            self.sync.push_removal(&account, entry_id).await?;
            if let Some((cascade_account, cascade_entry_id)) = &cascade_removal {
                self.sync
                    .push_removal(cascade_account, *cascade_entry_id)
                    .await?;
            }
            Ok(())
        }
        .await;

        let mut degraded = vec![account_id];
        if let Some((cascade_account, _)) = &cascade_removal {
            degraded.push(cascade_account.id);
        }
        let phase = self
            .finish_mutation(mutation_id, phase, remote, &degraded, &mut warnings)
            .await?;
        drop(guards);

        info!(
            mutation_id = %mutation_id,
            account_id = %account_id,
            entry_id = %entry_id,
            cascaded = cascade_removal.is_some(),
            phase = %phase,
            "Entry deleted"
        );
        Ok(MutationOutcome {
            mutation_id,
            phase,
            account_id,
            entry_id: None,
            balance,
            warnings,
        })
    }

    /// Reverses the counterpart leg of a cascading delete.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the linked account is not loaded and
    /// `EntryNotFound` if the counterpart entry is not in its log.
    async fn cascade_reverse(
        &self,
        account_id: AccountId,
        entry_id: EntryId,
    ) -> Result<(Account, EntryId), LedgerError> {
        let handle = self.registry.require(account_id)?;
        let mut state = handle.write().await;
        let (entry, _) = state.reverse(entry_id)?;
        Ok((state.account().clone(), entry.id))
    }
}
