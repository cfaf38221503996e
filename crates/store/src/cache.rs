//! Local blob cache: the offline fallback mirror.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use opendal::{services, ErrorKind, Operator};

use crate::error::CacheError;

/// Key/value blob cache mirroring remote collections.
///
/// The cache never validates content; it stores whatever bytes the sync
/// layer hands it and returns them verbatim. A missing key is an absence,
/// not an error.
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Reads a blob, `None` if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Writes a blob, replacing any previous value.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), CacheError>;

    /// Removes a blob. Removing an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// A [`LocalCache`] storing one file per key under a root directory.
pub struct BlobCache {
    op: Operator,
}

impl BlobCache {
    /// Opens a cache rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the filesystem operator cannot be built.
    pub fn new(root: &str) -> Result<Self, CacheError> {
        let builder = services::Fs::default().root(root);
        let op = Operator::new(builder)?.finish();
        Ok(Self { op })
    }
}

#[async_trait]
impl LocalCache for BlobCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self.op.read(key).await {
            Ok(buffer) => Ok(Some(buffer.to_vec())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), CacheError> {
        self.op.write(key, bytes).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.op.delete(key).await?;
        Ok(())
    }
}

/// A [`LocalCache`] backed by process memory, with a put-failure switch
/// for exercising cache-write warnings.
#[derive(Debug, Default)]
pub struct MemoryCache {
    blobs: DashMap<String, Vec<u8>>,
    failing_puts: AtomicBool,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `put` fail until disabled.
    pub fn fail_puts(&self, failing: bool) {
        self.failing_puts.store(failing, Ordering::SeqCst);
    }

    /// Number of cached blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// True if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.blobs.get(key).map(|v| v.clone()))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), CacheError> {
        if self.failing_puts.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("injected put fault".to_string()));
        }
        self.blobs.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.blobs.remove(key);
        Ok(())
    }
}
