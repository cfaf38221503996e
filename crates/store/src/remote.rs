//! The remote store contract.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::record::Record;

/// How a record changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A record was added to the collection.
    Added,
    /// An existing record was replaced.
    Updated,
    /// A record was removed.
    Deleted,
}

/// A change notification for one record in one collection.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The collection the change happened in.
    pub collection: String,
    /// What happened.
    pub kind: ChangeKind,
    /// The affected record id.
    pub id: String,
}

/// Authoritative document store, addressed by collection name.
///
/// Implementations must be safe to share across tasks. Write operations
/// report failure through [`StoreError`]; callers decide whether a failure
/// degrades or aborts the surrounding mutation.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Lists every record in a collection. A collection that was never
    /// written to is empty, not an error.
    async fn list_collection(&self, name: &str) -> Result<Vec<Record>, StoreError>;

    /// Fetches one record by id.
    async fn get(&self, name: &str, id: &str) -> Result<Record, StoreError>;

    /// Adds a record, returning its id.
    ///
    /// A record carrying an `id` field keeps it; otherwise one is minted.
    async fn add(&self, name: &str, record: Record) -> Result<String, StoreError>;

    /// Replaces an existing record.
    async fn update(&self, name: &str, id: &str, record: Record) -> Result<(), StoreError>;

    /// Removes a record.
    async fn delete(&self, name: &str, id: &str) -> Result<(), StoreError>;

    /// Subscribes to change notifications for one collection.
    fn subscribe(&self, name: &str) -> broadcast::Receiver<ChangeEvent>;
}
