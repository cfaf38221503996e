//! File-backed store: one JSON document per collection.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use opendal::{services, ErrorKind, Operator};
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::{record_id, Record};
use crate::remote::{ChangeEvent, ChangeKind, RemoteStore};

const CHANNEL_CAPACITY: usize = 64;

/// A [`RemoteStore`] persisting each collection as `<name>.json` under a
/// root directory.
///
/// Every write is a read-modify-write of the whole collection file,
/// serialized on one lock. Collections here are a single shop's books;
/// they stay small.
pub struct JsonStore {
    op: Operator,
    senders: DashMap<String, broadcast::Sender<ChangeEvent>>,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Opens a store rooted at `root`, creating the directory lazily on
    /// first write.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the filesystem operator cannot be built.
    pub fn new(root: &str) -> Result<Self, StoreError> {
        let builder = services::Fs::default().root(root);
        let op = Operator::new(builder)?.finish();
        Ok(Self {
            op,
            senders: DashMap::new(),
            write_lock: Mutex::new(()),
        })
    }

    fn path(name: &str) -> String {
        format!("{name}.json")
    }

    async fn read_collection(&self, name: &str) -> Result<BTreeMap<String, Record>, StoreError> {
        match self.op.read(&Self::path(name)).await {
            Ok(buffer) => Ok(serde_json::from_slice(&buffer.to_vec())?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_collection(
        &self,
        name: &str,
        collection: &BTreeMap<String, Record>,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(collection)?;
        self.op.write(&Self::path(name), bytes).await?;
        Ok(())
    }

    fn emit(&self, collection: &str, kind: ChangeKind, id: &str) {
        if let Some(sender) = self.senders.get(collection) {
            let _ = sender.send(ChangeEvent {
                collection: collection.to_string(),
                kind,
                id: id.to_string(),
            });
        }
    }
}

#[async_trait]
impl RemoteStore for JsonStore {
    async fn list_collection(&self, name: &str) -> Result<Vec<Record>, StoreError> {
        Ok(self.read_collection(name).await?.into_values().collect())
    }

    async fn get(&self, name: &str, id: &str) -> Result<Record, StoreError> {
        self.read_collection(name)
            .await?
            .remove(id)
            .ok_or_else(|| StoreError::not_found(name, id))
    }

    async fn add(&self, name: &str, record: Record) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().await;
        let id = record_id(&record).unwrap_or_else(|| Uuid::now_v7().to_string());
        let mut collection = self.read_collection(name).await?;
        collection.insert(id.clone(), record);
        self.write_collection(name, &collection).await?;
        self.emit(name, ChangeKind::Added, &id);
        Ok(id)
    }

    async fn update(&self, name: &str, id: &str, record: Record) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut collection = self.read_collection(name).await?;
        if !collection.contains_key(id) {
            return Err(StoreError::not_found(name, id));
        }
        collection.insert(id.to_string(), record);
        self.write_collection(name, &collection).await?;
        self.emit(name, ChangeKind::Updated, id);
        Ok(())
    }

    async fn delete(&self, name: &str, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut collection = self.read_collection(name).await?;
        if collection.remove(id).is_none() {
            return Err(StoreError::not_found(name, id));
        }
        self.write_collection(name, &collection).await?;
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
