//! In-memory account registry.
//!
//! Every loaded account lives behind an [`AccountHandle`]: a `RwLock` over
//! its materialized state plus a separate mutation mutex. Readers take the
//! `RwLock` freely; mutations first take the mutex, so at most one mutation
//! per account is in flight at a time even while it awaits store I/O.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use khata_core::ledger::{Account, AccountState, LedgerEntry, LedgerError};
use khata_shared::types::AccountId;

/// Shared handle for one account's live state.
#[derive(Debug)]
pub struct AccountHandle {
    mutation: Mutex<()>,
    state: RwLock<AccountState>,
}

impl AccountHandle {
    fn new(state: AccountState) -> Self {
        Self {
            mutation: Mutex::new(()),
            state: RwLock::new(state),
        }
    }

    /// Acquires this account's mutation lock.
    ///
    /// Held across the whole mutation pipeline, including store I/O, so
    /// concurrent mutations against the same account are serialized. Plain
    /// reads do not need it.
    pub async fn begin_mutation(&self) -> MutexGuard<'_, ()> {
        self.mutation.lock().await
    }

    /// Read access to the account state.
    pub async fn read(&self) -> RwLockReadGuard<'_, AccountState> {
        self.state.read().await
    }

    /// Write access to the account state. Callers must hold the mutation
    /// lock first.
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, AccountState> {
        self.state.write().await
    }

    /// Clones the account header out of the state.
    pub async fn snapshot(&self) -> Account {
        self.state.read().await.account().clone()
    }

    /// Clones the account header together with its entry log.
    pub async fn snapshot_full(&self) -> (Account, Vec<LedgerEntry>) {
        let state = self.state.read().await;
        (state.account().clone(), state.raw_entries().to_vec())
    }
}

/// Registry of all loaded accounts, keyed by id.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: DashMap<AccountId, Arc<AccountHandle>>,
}

impl AccountRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an account state, replacing any previous handle for the same
    /// id. Returns the new handle.
    pub fn insert(&self, state: AccountState) -> Arc<AccountHandle> {
        let id = state.account().id;
        let handle = Arc::new(AccountHandle::new(state));
        self.accounts.insert(id, Arc::clone(&handle));
        handle
    }

    /// Looks up an account handle.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<Arc<AccountHandle>> {
        self.accounts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Looks up an account handle, failing if it is not loaded.
    pub fn require(&self, id: AccountId) -> Result<Arc<AccountHandle>, LedgerError> {
        self.get(id).ok_or(LedgerError::AccountNotFound(id))
    }

    /// Removes an account handle.
    pub fn remove(&self, id: AccountId) -> Option<Arc<AccountHandle>> {
        self.accounts.remove(&id).map(|(_, handle)| handle)
    }

    /// All registered handles with their ids.
    #[must_use]
    pub fn handles(&self) -> Vec<(AccountId, Arc<AccountHandle>)> {
        self.accounts
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect()
    }

    /// Snapshots every account header, sorted by id for stable output.
    pub async fn accounts(&self) -> Vec<Account> {
        let mut out = Vec::with_capacity(self.accounts.len());
        for (_, handle) in self.handles() {
            out.push(handle.snapshot().await);
        }
        out.sort_by_key(|account| account.id);
        out
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if no accounts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
