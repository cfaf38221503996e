//! In-memory store for tests and ephemeral runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::{record_id, Record};
use crate::remote::{ChangeEvent, ChangeKind, RemoteStore};

const CHANNEL_CAPACITY: usize = 64;

/// A [`RemoteStore`] backed by process memory.
///
/// Supports per-collection fault injection so callers can exercise their
/// degraded paths: a failing collection rejects reads or writes with
/// `Unavailable` until healed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, BTreeMap<String, Record>>,
    senders: DashMap<String, broadcast::Sender<ChangeEvent>>,
    failing_reads: DashSet<String>,
    failing_writes: DashSet<String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every read of `collection` fail until healed.
    pub fn fail_reads(&self, collection: &str) {
        self.failing_reads.insert(collection.to_string());
    }

    /// Makes every write to `collection` fail until healed.
    pub fn fail_writes(&self, collection: &str) {
        self.failing_writes.insert(collection.to_string());
    }

    /// Clears all injected faults for `collection`.
    pub fn heal(&self, collection: &str) {
        self.failing_reads.remove(collection);
        self.failing_writes.remove(collection);
    }

    /// Number of records currently in `collection`.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.len())
    }

    /// True if `collection` holds no records.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn check_read(&self, collection: &str) -> Result<(), StoreError> {
        if self.failing_reads.contains(collection) {
            return Err(StoreError::unavailable(format!(
                "injected read fault on '{collection}'"
            )));
        }
        Ok(())
    }

    fn check_write(&self, collection: &str) -> Result<(), StoreError> {
        if self.failing_writes.contains(collection) {
            return Err(StoreError::unavailable(format!(
                "injected write fault on '{collection}'"
            )));
        }
        Ok(())
    }

    fn emit(&self, collection: &str, kind: ChangeKind, id: &str) {
        if let Some(sender) = self.senders.get(collection) {
            // Nobody listening is fine.
            let _ = sender.send(ChangeEvent {
                collection: collection.to_string(),
                kind,
                id: id.to_string(),
            });
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_collection(&self, name: &str) -> Result<Vec<Record>, StoreError> {
        self.check_read(name)?;
        Ok(self
            .collections
            .get(name)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, name: &str, id: &str) -> Result<Record, StoreError> {
        self.check_read(name)?;
        self.collections
            .get(name)
            .and_then(|c| c.get(id).cloned())
            .ok_or_else(|| StoreError::not_found(name, id))
    }

    async fn add(&self, name: &str, record: Record) -> Result<String, StoreError> {
        self.check_write(name)?;
        let id = record_id(&record).unwrap_or_else(|| Uuid::now_v7().to_string());
        self.collections
            .entry(name.to_string())
            .or_default()
            .insert(id.clone(), record);
        self.emit(name, ChangeKind::Added, &id);
        Ok(id)
    }

    async fn update(&self, name: &str, id: &str, record: Record) -> Result<(), StoreError> {
        self.check_write(name)?;
        let mut collection = self
            .collections
            .get_mut(name)
            .ok_or_else(|| StoreError::not_found(name, id))?;
        if !collection.contains_key(id) {
            return Err(StoreError::not_found(name, id));
        }
        collection.insert(id.to_string(), record);
        drop(collection);
        self.emit(name, ChangeKind::Updated, id);
        Ok(())
    }

    async fn delete(&self, name: &str, id: &str) -> Result<(), StoreError> {
        self.check_write(name)?;
        let removed = self
            .collections
            .get_mut(name)
            .and_then(|mut c| c.remove(id));
        if removed.is_none() {
            return Err(StoreError::not_found(name, id));
        }
        self.emit(name, ChangeKind::Deleted, id);
        Ok(())
    }

    fn subscribe(&self, name: &str) -> broadcast::Receiver<ChangeEvent> {
        self.senders
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }
}
