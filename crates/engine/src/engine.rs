//! The ledger engine: registry, sync layer, and mutation plumbing.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use khata_core::ledger::{Account, AccountKind, AccountState, LedgerEntry, LedgerError};
use khata_core::networth::{self, NetWorth};
use khata_core::posting::{MutationPhase, MutationPipeline};
use khata_shared::types::{AccountId, Money, MutationId};
use khata_store::{CacheError, ChangeEvent, LocalCache, RemoteStore, StoreError};

use crate::error::EngineError;
use crate::outcome::{RefreshOutcome, Warning};
use crate::registry::AccountRegistry;
use crate::sync::SyncLayer;

/// The ledger engine.
///
/// Owns the in-memory account registry and the sync layer. All mutations go
/// through the phase machine in [`MutationPipeline`]; reads come straight
/// from materialized state.
pub struct Engine {
    pub(crate) registry: AccountRegistry,
    pub(crate) sync: SyncLayer,
}

impl Engine {
    /// Creates an engine over a remote store and a local cache.
    ///
    /// The registry starts empty; call [`Engine::load`] to materialize
    /// persisted state.
    pub fn new(remote: Arc<dyn RemoteStore>, cache: Arc<dyn LocalCache>) -> Self {
        Self {
            registry: AccountRegistry::new(),
            sync: SyncLayer::new(remote, cache),
        }
    }

    // ========== Bootstrap ==========

    /// Loads all accounts and entries into the registry.
    ///
    /// The remote store is authoritative; the cache mirror is used only
    /// when the remote load fails.
    ///
    /// # Errors
    ///
    /// Returns an error when both the remote store and the cache are
    /// unreadable.
    pub async fn load(&self) -> Result<(), EngineError> {
        let (accounts, entries, from_cache) = match self.sync.load_remote().await {
            Ok((accounts, entries)) => (accounts, entries, false),
            Err(remote_err) => {
                warn!(
                    error = %remote_err,
                    "Remote load failed, falling back to cache mirror"
                );
                let (accounts, entries) = self.sync.load_cached().await?;
                (accounts, entries, true)
            }
        };

        for state in Self::materialize(accounts, entries) {
            self.registry.insert(state);
        }

        info!(
            accounts = self.registry.len(),
            from_cache, "Ledger loaded into registry"
        );
        Ok(())
    }

    /// Groups entries under their accounts and rebuilds account states.
    ///
    /// Entries without a loaded account are dropped with a warning. An
    /// account whose stored balance disagrees with its replayed entry log
    /// keeps the stored balance; the mismatch is logged for manual review.
    fn materialize(accounts: Vec<Account>, entries: Vec<LedgerEntry>) -> Vec<AccountState> {
        let mut by_account: HashMap<AccountId, Vec<LedgerEntry>> = HashMap::new();
        let known: std::collections::HashSet<AccountId> =
            accounts.iter().map(|account| account.id).collect();
        for entry in entries {
            if known.contains(&entry.account_id) {
                by_account.entry(entry.account_id).or_default().push(entry);
            } else {
                warn!(
                    entry_id = %entry.id,
                    account_id = %entry.account_id,
                    "Dropping entry whose account is not loaded"
                );
            }
        }

        accounts
            .into_iter()
            .map(|account| {
                let log = by_account.remove(&account.id).unwrap_or_default();
                let state = AccountState::from_parts(account, log);
                if !state.is_derivable() {
                    warn!(
                        account_id = %state.account().id,
                        balance = %state.balance(),
                        derived = %state.derived_balance(),
                        "Stored balance does not match the entry log, keeping stored balance"
                    );
                }
                state
            })
            .collect()
    }

    // ========== Accounts ==========

    /// Creates a new account and persists it.
    ///
    /// A failed remote write leaves the account usable locally and marks it
    /// degraded for the next refresh.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty display name.
    pub async fn create_account(
        &self,
        kind: AccountKind,
        display_name: String,
        contact: Option<String>,
        opening_balance: Decimal,
    ) -> Result<Account, EngineError> {
        if display_name.trim().is_empty() {
            return Err(
                LedgerError::Validation("display name must not be empty".to_string()).into(),
            );
        }

        let account = Account::new(kind, display_name, contact, opening_balance);
        self.registry.insert(AccountState::new(account.clone()));

        if let Err(e) = self.sync.upsert_account(&account).await {
            warn!(
                account_id = %account.id,
                error = %e,
                "Remote write failed for new account, marking degraded"
            );
            self.sync.mark_degraded(account.id);
        }
        if let Err(e) = self.mirror_all().await {
            warn!(account_id = %account.id, error = %e, "Cache mirror write failed");
        }

        info!(
            account_id = %account.id,
            kind = %account.kind,
            "Account created"
        );
        Ok(account)
    }

    /// Updates an account's display name and contact.
    ///
    /// Balance and entry log are untouched. Persistence follows the same
    /// path as account creation: a failed remote write marks the account
    /// degraded instead of failing the call.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown id and a validation error
    /// for an empty display name.
    pub async fn update_account(
        &self,
        id: AccountId,
        display_name: String,
        contact: Option<String>,
    ) -> Result<Account, EngineError> {
        if display_name.trim().is_empty() {
            return Err(
                LedgerError::Validation("display name must not be empty".to_string()).into(),
            );
        }

        let handle = self.registry.require(id)?;
        let _mutation = handle.begin_mutation().await;
        let account = {
            let mut state = handle.write().await;
            state.update_profile(display_name, contact);
            state.account().clone()
        };

        if let Err(e) = self.sync.upsert_account(&account).await {
            warn!(
                account_id = %account.id,
                error = %e,
                "Remote write failed for profile update, marking degraded"
            );
            self.sync.mark_degraded(account.id);
        }
        if let Err(e) = self.mirror_all().await {
            warn!(account_id = %account.id, error = %e, "Cache mirror write failed");
        }

        info!(account_id = %account.id, "Account profile updated");
        Ok(account)
    }

    /// Fetches one account header.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown id.
    pub async fn account(&self, id: AccountId) -> Result<Account, EngineError> {
        Ok(self.registry.require(id)?.snapshot().await)
    }

    /// Snapshots every account, sorted by id.
    pub async fn accounts(&self) -> Vec<Account> {
        self.registry.accounts().await
    }

    /// Current balance of one account in its native unit.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown id.
    pub async fn balance(&self, id: AccountId) -> Result<Money, EngineError> {
        let handle = self.registry.require(id)?;
        let state = handle.read().await;
        Ok(state.account().balance_money())
    }

    /// Entries of one account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown id.
    pub async fn entries(&self, id: AccountId) -> Result<Vec<LedgerEntry>, EngineError> {
        let handle = self.registry.require(id)?;
        let state = handle.read().await;
        Ok(state.entries().into_iter().cloned().collect())
    }

    /// Net position across all accounts.
    pub async fn net_worth(&self) -> NetWorth {
        let accounts = self.registry.accounts().await;
        networth::net_worth(&accounts)
    }

    /// Subscribes to remote change notifications for one collection.
    #[must_use]
    pub fn subscribe(&self, collection: &str) -> broadcast::Receiver<ChangeEvent> {
        self.sync.subscribe(collection)
    }

    /// Ids of accounts whose remote copy is behind local state.
    #[must_use]
    pub fn degraded_accounts(&self) -> Vec<AccountId> {
        self.sync.degraded_accounts()
    }

    // ========== Refresh ==========

    /// Flushes degraded accounts, then re-pulls remote state.
    ///
    /// Accounts that stay degraded after the flush attempt are skipped
    /// during the pull so their unflushed local state is never overwritten.
    /// The cache mirror is rewritten at the end either way.
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for parity with the other engine
    /// operations.
    pub async fn refresh(&self) -> Result<RefreshOutcome, EngineError> {
        let mut warnings = Vec::new();
        let mut flushed = 0;

        for id in self.sync.degraded_accounts() {
            let Some(handle) = self.registry.get(id) else {
                self.sync.clear_degraded(id);
                continue;
            };
            // Hold the mutation lock through the flush so a concurrent
            // mutation cannot slip between the snapshot and the prune.
            let _mutation = handle.begin_mutation().await;
            let (account, entries) = handle.snapshot_full().await;
            match self.sync.flush_account(&account, &entries).await {
                Ok(()) => {
                    self.sync.clear_degraded(id);
                    flushed += 1;
                    info!(account_id = %id, "Degraded account flushed to remote store");
                }
                Err(e) => {
                    warn!(
                        account_id = %id,
                        error = %e,
                        "Flush failed, account stays degraded"
                    );
                    warnings.push(Warning::remote_write(format!(
                        "account {id} is still degraded: {e}"
                    )));
                }
            }
        }
        let still_degraded = self.sync.degraded_accounts().len();

        let pulled = match self.sync.load_remote().await {
            Ok((accounts, entries)) => {
                let mut refreshed = 0usize;
                for state in Self::materialize(accounts, entries) {
                    let id = state.account().id;
                    if self.sync.is_degraded(id) {
                        debug!(
                            account_id = %id,
                            "Skipping pull for degraded account, local state wins"
                        );
                        continue;
                    }
                    // Swap in place under the handle's own locks so a
                    // mutation racing this refresh never writes into a
                    // detached handle.
                    match self.registry.get(id) {
                        Some(handle) => {
                            let _mutation = handle.begin_mutation().await;
                            *handle.write().await = state;
                        }
                        None => {
                            self.registry.insert(state);
                        }
                    }
                    refreshed += 1;
                }
                debug!(accounts = refreshed, "Pulled remote state");
                true
            }
            Err(e) => {
                warn!(error = %e, "Refresh pull failed, keeping local state");
                warnings.push(Warning::remote_write(format!("refresh pull failed: {e}")));
                false
            }
        };

        if let Err(e) = self.mirror_all().await {
            warn!(error = %e, "Cache mirror write failed after refresh");
            warnings.push(Warning::cache_write(e.to_string()));
        }

        info!(
            flushed,
            still_degraded, pulled, "Refresh finished"
        );
        Ok(RefreshOutcome {
            flushed,
            still_degraded,
            pulled,
            warnings,
        })
    }

    // ========== Mutation plumbing ==========

    /// Rewrites the cache mirror from the full registry.
    pub(crate) async fn mirror_all(&self) -> Result<(), CacheError> {
        let mut accounts = Vec::new();
        let mut entries = Vec::new();
        for (_, handle) in self.registry.handles() {
            let (account, mut log) = handle.snapshot_full().await;
            accounts.push(account);
            entries.append(&mut log);
        }
        accounts.sort_by_key(|account| account.id);
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        self.sync.mirror(&accounts, &entries).await
    }

    /// Runs the persistence tail of a mutation that already applied
    /// locally.
    ///
    /// A successful remote write commits; a failed one degrades the named
    /// accounts and keeps the optimistic local state. The cache mirror is
    /// rewritten in both cases, with a failure downgraded to a warning.
    pub(crate) async fn finish_mutation(
        &self,
        mutation_id: MutationId,
        phase: MutationPhase,
        remote_result: Result<(), StoreError>,
        accounts: &[AccountId],
        warnings: &mut Vec<Warning>,
    ) -> Result<MutationPhase, EngineError> {
        let phase = match remote_result {
            Ok(()) => {
                let phase = MutationPipeline::advance(phase, MutationPhase::PersistingCache)?;
                if let Err(e) = self.mirror_all().await {
                    warn!(
                        mutation_id = %mutation_id,
                        error = %e,
                        "Cache mirror write failed"
                    );
                    warnings.push(Warning::cache_write(e.to_string()));
                }
                MutationPipeline::advance(phase, MutationPhase::Committed)?
            }
            Err(e) => {
                let phase = MutationPipeline::advance(phase, MutationPhase::Degraded)?;
                for id in accounts {
                    self.sync.mark_degraded(*id);
                }
                warn!(
                    mutation_id = %mutation_id,
                    error = %e,
                    "Remote write failed, keeping local state until refresh"
                );
                warnings.push(Warning::remote_write(e.to_string()));
                if let Err(cache_err) = self.mirror_all().await {
                    warn!(
                        mutation_id = %mutation_id,
                        error = %cache_err,
                        "Cache mirror write failed"
                    );
                    warnings.push(Warning::cache_write(cache_err.to_string()));
                }
                phase
            }
        };
        Ok(phase)
    }
}
