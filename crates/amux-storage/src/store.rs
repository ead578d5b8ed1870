//! Blob store capability.

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

/// Key/value blob storage consumed by the engine.
///
/// Implementations must make `put` atomic from a reader's perspective:
/// a concurrent or later `get` sees either the previous object or the
/// complete new one, never a partial write.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Fetch the object stored under `key`.
    ///
    /// Fails with [`StorageError::NotFound`] if absent.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// List keys starting with `prefix`. Ordering is backend specific.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Short backend name for logs and readiness output.
    fn backend_name(&self) -> &'static str;
}

/// Validate a blob key.
///
/// Keys are `/`-separated relative paths without empty, `.` or `..`
/// segments, so every backend can map them onto a namespace safely.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.ends_with('/') {
        return Err(StorageError::invalid_key(key));
    }
    let bad_segment = key
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == ".." || seg.contains('\\'));
    if bad_segment {
        return Err(StorageError::invalid_key(key));
    }
    Ok(())
}
