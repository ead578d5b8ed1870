//! Local filesystem blob store.
//!
//! Objects live under a root directory at `root/{key}`. Writes go to a
//! hidden staging file next to the destination and are renamed into place,
//! so readers see either the old object or the complete new one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::store::{validate_key, BlobStore};

const PARTIAL_SUFFIX: &str = ".partial";

/// Blob store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |p, seg| p.join(seg)))
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(segments.join("/"))
    }

    /// Write `data` to `dst` through a staging file in the same directory.
    ///
    /// The staging file is removed on every exit path, including a dropped
    /// future. Once the rename has been handed to the blocking pool it may
    /// still land after the caller is gone.
    async fn write_atomic(dst: &Path, data: &[u8]) -> StorageResult<()> {
        let parent = dst
            .parent()
            .ok_or_else(|| StorageError::invalid_key(dst.display().to_string()))?;
        fs::create_dir_all(parent).await?;

        let file_name = dst
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging = StagingFile::new(parent.join(format!(
            ".{}.{}{}",
            file_name,
            Uuid::new_v4(),
            PARTIAL_SUFFIX
        )));

        let result: std::io::Result<()> = async {
            let mut file = fs::File::create(staging.path()).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            drop(file);
            staging.persist(dst).await
        }
        .await;

        result.map_err(|e| StorageError::upload_failed(format!("{}: {}", dst.display(), e)))
    }

    fn is_staging_file(path: &Path) -> bool {
        path.file_name()
            .map(|n| n.to_string_lossy())
            .map(|n| n.starts_with('.') && n.ends_with(PARTIAL_SUFFIX))
            .unwrap_or(false)
    }
}

/// Hidden file a write goes through; deleted on drop unless persisted.
#[derive(Debug)]
struct StagingFile {
    path: PathBuf,
    persisted: bool,
}

impl StagingFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Rename into place.
    async fn persist(mut self, dst: &Path) -> std::io::Result<()> {
        fs::rename(&self.path, dst).await?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove staging file {}: {}", self.path.display(), e);
            }
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        debug!(key, content_type, bytes = data.len(), "Writing local blob");
        Self::write_atomic(&path, &data).await
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::not_found(key)),
            Err(e) => Err(StorageError::download_failed(format!("{}: {}", key, e))),
        }
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        // Walk from the deepest directory fully named by the prefix.
        let base_dir = match prefix.rfind('/') {
            Some(pos) => prefix[..pos]
                .split('/')
                .filter(|s| !s.is_empty())
                .fold(self.root.clone(), |p, seg| p.join(seg)),
            None => self.root.clone(),
        };

        let mut keys = Vec::new();
        let mut pending = vec![base_dir];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::ListFailed(format!("{}: {}", dir.display(), e))),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::ListFailed(e.to_string()))?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && !Self::is_staging_file(&path) {
                    if let Some(key) = self.key_for(&path) {
                        if key.starts_with(prefix) {
                            keys.push(key);
                        }
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        store.put("jobs/j1/artifact", b"hello".to_vec(), "video/mp4").await.unwrap();
        assert_eq!(store.get("jobs/j1/artifact").await.unwrap(), b"hello");

        store.put("jobs/j1/artifact", b"replaced".to_vec(), "video/mp4").await.unwrap();
        assert_eq!(store.get("jobs/j1/artifact").await.unwrap(), b"replaced");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let err = store.get("jobs/nope/artifact").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_by_prefix_skips_staging_files() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        store.put("jobs/j1/chunks/0000000001/a", vec![1], "audio/wav").await.unwrap();
        store.put("jobs/j1/chunks/0000000000/b", vec![0], "audio/wav").await.unwrap();
        store.put("jobs/j10/chunks/0000000000/c", vec![2], "audio/wav").await.unwrap();
        store.put("jobs/j1/artifact", vec![9], "video/mp4").await.unwrap();

        // A leftover staging file from an interrupted write.
        let stray = dir.path().join("jobs/j1/chunks/0000000001/.a.1234.partial");
        std::fs::write(&stray, b"torn").unwrap();

        let keys = store.list("jobs/j1/chunks/").await.unwrap();
        assert_eq!(
            keys,
            vec![
                "jobs/j1/chunks/0000000000/b".to_string(),
                "jobs/j1/chunks/0000000001/a".to_string(),
            ]
        );

        let all_j1 = store.list("jobs/j1").await.unwrap();
        assert_eq!(all_j1.len(), 4);

        assert!(store.list("missing/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unpersisted_staging_file_is_removed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".artifact.1.partial");

        {
            let staging = StagingFile::new(path.clone());
            std::fs::write(staging.path(), b"half").unwrap();
        }
        assert!(!path.exists());

        let staging = StagingFile::new(path.clone());
        std::fs::write(staging.path(), b"whole").unwrap();
        let dst = dir.path().join("artifact");
        staging.persist(&dst).await.unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"whole");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        // The destination is a directory, so the rename fails
        std::fs::create_dir_all(dir.path().join("jobs/j1/artifact/inner")).unwrap();
        assert!(store.put("jobs/j1/artifact", vec![1], "video/mp4").await.is_err());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("jobs/j1"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("artifact")]);
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).await.unwrap();

        let err = store.put("../outside", vec![1], "text/plain").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
