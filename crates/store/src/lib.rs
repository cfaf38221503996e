//! Remote store and local cache implementations.
//!
//! This crate provides:
//! - The [`RemoteStore`] and [`LocalCache`] contracts
//! - Persisted document shapes and typed codecs
//! - A file-backed JSON store and blob cache for real runs
//! - In-memory doubles with fault injection for tests

pub mod cache;
pub mod error;
pub mod json;
pub mod memory;
pub mod record;
pub mod remote;

pub use cache::{BlobCache, LocalCache, MemoryCache};
pub use error::{CacheError, StoreError};
pub use json::JsonStore;
pub use memory::MemoryStore;
pub use record::{collections, AccountDoc, EntryDoc, Record};
pub use remote::{ChangeEvent, ChangeKind, RemoteStore};
