//! Persistence coordination between the remote store and the local cache.
//!
//! Every write targets the remote store first; the cache holds one JSON
//! blob per collection and is rewritten from materialized state after each
//! applied mutation, degraded or not. Accounts whose remote copy fell
//! behind local state are tracked in the degraded set until an explicit
//! refresh flushes them.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashSet;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use khata_core::ledger::{Account, LedgerEntry};
use khata_shared::types::{AccountId, EntryId};
use khata_store::record::{from_record, record_id, to_record};
use khata_store::{
    collections, AccountDoc, CacheError, ChangeEvent, EntryDoc, LocalCache, RemoteStore,
    StoreError,
};

/// Remote and cache plumbing shared by all mutations.
pub struct SyncLayer {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn LocalCache>,
    degraded: DashSet<AccountId>,
}

impl SyncLayer {
    /// Creates a sync layer over a remote store and a cache.
    pub fn new(remote: Arc<dyn RemoteStore>, cache: Arc<dyn LocalCache>) -> Self {
        Self {
            remote,
            cache,
            degraded: DashSet::new(),
        }
    }

    /// Subscribes to remote change notifications for one collection.
    #[must_use]
    pub fn subscribe(&self, collection: &str) -> broadcast::Receiver<ChangeEvent> {
        self.remote.subscribe(collection)
    }

    // ========== Remote writes ==========

    /// Writes an account document, adding it when the remote store has no
    /// copy yet.
    pub async fn upsert_account(&self, account: &Account) -> Result<(), StoreError> {
        let collection = collections::for_kind(account.kind);
        let record = to_record(&AccountDoc::from(account))?;
        let id = account.id.to_string();
        match self.remote.update(collection, &id, record.clone()).await {
            Err(StoreError::NotFound { .. }) => {
                self.remote.add(collection, record).await?;
                Ok(())
            }
            other => other,
        }
    }

    /// Adds one entry row.
    pub async fn add_entry(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        let record = to_record(&EntryDoc::from(entry))?;
        self.remote.add(collections::ENTRIES, record).await?;
        Ok(())
    }

    /// Replaces one entry row.
    pub async fn update_entry(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        let record = to_record(&EntryDoc::from(entry))?;
        self.remote
            .update(collections::ENTRIES, &entry.id.to_string(), record)
            .await
    }

    /// Removes one entry row. A row already absent remotely counts as
    /// removed.
    pub async fn remove_entry(&self, entry_id: EntryId) -> Result<(), StoreError> {
        match self
            .remote
            .delete(collections::ENTRIES, &entry_id.to_string())
            .await
        {
            Err(StoreError::NotFound { .. }) => {
                warn!(
                    entry_id = %entry_id,
                    "Entry already absent from remote store, treating removal as applied"
                );
                Ok(())
            }
            other => other,
        }
    }

    /// Persists a new entry together with its account's updated balance.
    pub async fn push_posting(
        &self,
        account: &Account,
        entry: &LedgerEntry,
    ) -> Result<(), StoreError> {
        self.add_entry(entry).await?;
        self.upsert_account(account).await
    }

    /// Persists a revised entry together with its account's updated balance.
    pub async fn push_revision(
        &self,
        account: &Account,
        entry: &LedgerEntry,
    ) -> Result<(), StoreError> {
        self.update_entry(entry).await?;
        self.upsert_account(account).await
    }

    /// Persists an entry removal together with its account's updated
    /// balance.
    pub async fn push_removal(
        &self,
        account: &Account,
        entry_id: EntryId,
    ) -> Result<(), StoreError> {
        self.remove_entry(entry_id).await?;
        self.upsert_account(account).await
    }

    // ========== Cache mirror ==========

    /// Rewrites every cache blob from materialized state.
    pub async fn mirror(
        &self,
        accounts: &[Account],
        entries: &[LedgerEntry],
    ) -> Result<(), CacheError> {
        for collection in collections::ACCOUNT_COLLECTIONS {
            let docs: Vec<AccountDoc> = accounts
                .iter()
                .filter(|account| collections::for_kind(account.kind) == collection)
                .map(AccountDoc::from)
                .collect();
            self.put_blob(collection, &docs).await?;
        }
        let docs: Vec<EntryDoc> = entries.iter().map(EntryDoc::from).collect();
        self.put_blob(collections::ENTRIES, &docs).await?;

        debug!(
            accounts = accounts.len(),
            entries = entries.len(),
            "Cache mirror rewritten"
        );
        Ok(())
    }

    async fn put_blob<T: Serialize>(&self, key: &str, docs: &[T]) -> Result<(), CacheError> {
        let bytes =
            serde_json::to_vec(docs).map_err(|e| CacheError::Backend(e.to_string()))?;
        self.cache.put(key, bytes).await
    }

    // ========== Loads ==========

    /// Loads every account and entry from the remote store.
    ///
    /// Entries come back oldest-first so replaying them rebuilds each
    /// account's log in posting order.
    pub async fn load_remote(&self) -> Result<(Vec<Account>, Vec<LedgerEntry>), StoreError> {
        let mut accounts = Vec::new();
        for collection in collections::ACCOUNT_COLLECTIONS {
            for record in self.remote.list_collection(collection).await? {
                let doc: AccountDoc = from_record(record)?;
                accounts.push(Account::from(doc));
            }
        }

        let mut entries = Vec::new();
        for record in self.remote.list_collection(collections::ENTRIES).await? {
            let doc: EntryDoc = from_record(record)?;
            entries.push(LedgerEntry::from(doc));
        }
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        Ok((accounts, entries))
    }

    /// Loads every account and entry from the cache mirror.
    ///
    /// A blob that was never written reads as an empty collection.
    pub async fn load_cached(&self) -> Result<(Vec<Account>, Vec<LedgerEntry>), CacheError> {
        let mut accounts = Vec::new();
        for collection in collections::ACCOUNT_COLLECTIONS {
            let docs: Vec<AccountDoc> = self.get_blob(collection).await?;
            accounts.extend(docs.into_iter().map(Account::from));
        }

        let docs: Vec<EntryDoc> = self.get_blob(collections::ENTRIES).await?;
        let mut entries: Vec<LedgerEntry> = docs.into_iter().map(LedgerEntry::from).collect();
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        Ok((accounts, entries))
    }

    async fn get_blob<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Vec<T>, CacheError> {
        match self.cache.get(key).await? {
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| CacheError::Backend(e.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    // ========== Degraded account flushing ==========

    /// Reconciles the remote store with one account's local state.
    ///
    /// Upserts the account document and every local entry, then deletes
    /// remote entry rows for this account that no longer exist locally.
    /// Local state wins on every difference.
    pub async fn flush_account(
        &self,
        account: &Account,
        entries: &[LedgerEntry],
    ) -> Result<(), StoreError> {
        self.upsert_account(account).await?;

        let mut local_ids = HashSet::with_capacity(entries.len());
        for entry in entries {
            let record = to_record(&EntryDoc::from(entry))?;
            let id = entry.id.to_string();
            match self
                .remote
                .update(collections::ENTRIES, &id, record.clone())
                .await
            {
                Err(StoreError::NotFound { .. }) => {
                    self.remote.add(collections::ENTRIES, record).await?;
                }
                other => other?,
            }
            local_ids.insert(id);
        }

        let account_id = account.id.to_string();
        for record in self.remote.list_collection(collections::ENTRIES).await? {
            let owner = record
                .get("accountId")
                .and_then(serde_json::Value::as_str);
            if owner != Some(account_id.as_str()) {
                continue;
            }
            if let Some(id) = record_id(&record)
                && !local_ids.contains(&id)
            {
                self.remote.delete(collections::ENTRIES, &id).await?;
            }
        }

        debug!(
            account_id = %account.id,
            entries = entries.len(),
            "Flushed local account state to the remote store"
        );
        Ok(())
    }

    // ========== Degraded set ==========

    /// Marks an account as ahead of its remote copy.
    pub fn mark_degraded(&self, id: AccountId) {
        self.degraded.insert(id);
    }

    /// Clears an account's degraded mark.
    pub fn clear_degraded(&self, id: AccountId) {
        self.degraded.remove(&id);
    }

    /// Returns true if the account has unflushed local state.
    #[must_use]
    pub fn is_degraded(&self, id: AccountId) -> bool {
        self.degraded.contains(&id)
    }

    /// True if any account has unflushed local state.
    #[must_use]
    pub fn has_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Ids of all degraded accounts, sorted for stable iteration.
    #[must_use]
    pub fn degraded_accounts(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.degraded.iter().map(|id| *id).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use khata_core::ledger::{AccountKind, EntryKind, NewEntry};
    use khata_store::{MemoryCache, MemoryStore};
    use rust_decimal_macros::dec;

    fn layer() -> (Arc<MemoryStore>, Arc<MemoryCache>, SyncLayer) {
        let remote = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let sync = SyncLayer::new(
            Arc::clone(&remote) as Arc<dyn RemoteStore>,
            Arc::clone(&cache) as Arc<dyn LocalCache>,
        );
        (remote, cache, sync)
    }

    fn customer(name: &str) -> Account {
        Account::new(AccountKind::Customer, name.to_string(), None, dec!(0))
    }

    fn order_entry(account: &Account, amount: rust_decimal::Decimal) -> LedgerEntry {
        NewEntry {
            kind: EntryKind::Order,
            amount,
            secondary_amount: None,
            rate: None,
            description: "goods".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
        }
        .into_entry(account.id)
    }

    #[tokio::test]
    async fn test_upsert_account_adds_then_updates() {
        let (remote, _, sync) = layer();
        let mut account = customer("Rahim");

        sync.upsert_account(&account).await.unwrap();
        assert_eq!(remote.len(collections::CUSTOMERS), 1);

        account.balance = dec!(500);
        sync.upsert_account(&account).await.unwrap();
        assert_eq!(remote.len(collections::CUSTOMERS), 1);

        let record = remote
            .get(collections::CUSTOMERS, &account.id.to_string())
            .await
            .unwrap();
        assert_eq!(record["balance"], "500");
    }

    #[tokio::test]
    async fn test_push_posting_writes_entry_and_account() {
        let (remote, _, sync) = layer();
        let account = customer("Rahim");
        let entry = order_entry(&account, dec!(250));

        sync.push_posting(&account, &entry).await.unwrap();

        assert_eq!(remote.len(collections::ENTRIES), 1);
        assert_eq!(remote.len(collections::CUSTOMERS), 1);
        let record = remote
            .get(collections::ENTRIES, &entry.id.to_string())
            .await
            .unwrap();
        assert_eq!(record["type"], "order");
    }

    #[tokio::test]
    async fn test_remove_entry_tolerates_missing_row() {
        let (_, _, sync) = layer();
        assert!(sync.remove_entry(EntryId::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_mirror_then_load_cached_round_trips() {
        let (_, _, sync) = layer();
        let account = customer("Rahim");
        let entry = order_entry(&account, dec!(250));

        sync.mirror(&[account.clone()], &[entry.clone()]).await.unwrap();

        let (accounts, entries) = sync.load_cached().await.unwrap();
        assert_eq!(accounts, vec![account]);
        assert_eq!(entries, vec![entry]);
    }

    #[tokio::test]
    async fn test_load_cached_empty_cache_is_empty_ledger() {
        let (_, _, sync) = layer();
        let (accounts, entries) = sync.load_cached().await.unwrap();
        assert!(accounts.is_empty());
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_load_remote_orders_entries_oldest_first() {
        let (_, _, sync) = layer();
        let account = customer("Rahim");
        let first = order_entry(&account, dec!(100));
        let second = order_entry(&account, dec!(200));

        sync.push_posting(&account, &second).await.unwrap();
        sync.push_posting(&account, &first).await.unwrap();

        let (accounts, entries) = sync.load_remote().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }

    #[tokio::test]
    async fn test_flush_account_prunes_locally_deleted_entries() {
        let (remote, _, sync) = layer();
        let account = customer("Rahim");
        let kept = order_entry(&account, dec!(100));
        let deleted = order_entry(&account, dec!(200));

        sync.push_posting(&account, &kept).await.unwrap();
        sync.push_posting(&account, &deleted).await.unwrap();
        assert_eq!(remote.len(collections::ENTRIES), 2);

        // Locally only `kept` survives plus one new entry posted offline.
        let offline = order_entry(&account, dec!(300));
        sync.flush_account(&account, &[kept.clone(), offline.clone()])
            .await
            .unwrap();

        assert_eq!(remote.len(collections::ENTRIES), 2);
        assert!(remote
            .get(collections::ENTRIES, &kept.id.to_string())
            .await
            .is_ok());
        assert!(remote
            .get(collections::ENTRIES, &offline.id.to_string())
            .await
            .is_ok());
        assert!(remote
            .get(collections::ENTRIES, &deleted.id.to_string())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_flush_leaves_other_accounts_entries_alone() {
        let (remote, _, sync) = layer();
        let rahim = customer("Rahim");
        let karim = customer("Karim");
        let karims_entry = order_entry(&karim, dec!(50));

        sync.push_posting(&karim, &karims_entry).await.unwrap();
        sync.flush_account(&rahim, &[]).await.unwrap();

        assert!(remote
            .get(collections::ENTRIES, &karims_entry.id.to_string())
            .await
            .is_ok());
    }

    #[test]
    fn test_degraded_set_tracks_and_sorts() {
        let (_, _, sync) = layer();
        let a = AccountId::new();
        let b = AccountId::new();

        assert!(!sync.has_degraded());
        sync.mark_degraded(b);
        sync.mark_degraded(a);
        assert!(sync.is_degraded(a));
        assert_eq!(sync.degraded_accounts(), vec![a, b]);

        sync.clear_degraded(a);
        assert!(!sync.is_degraded(a));
        assert!(sync.has_degraded());
    }
}
