//! Storage backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{R2Client, R2Config};
use crate::error::{StorageError, StorageResult};
use crate::local::LocalBlobStore;
use crate::memory::MemoryBlobStore;
use crate::store::BlobStore;

/// Which blob store backend to use.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Local directory
    Local { root: PathBuf },
    /// Cloudflare R2 / S3-compatible bucket
    R2(R2Config),
    /// Process memory (non-durable)
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local {
                root: PathBuf::from("./data"),
            },
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    ///
    /// `STORAGE_BACKEND` selects `local` (default), `r2` or `memory`.
    pub fn from_env() -> StorageResult<Self> {
        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string());
        let backend = match backend.to_lowercase().as_str() {
            "local" => StorageBackend::Local {
                root: std::env::var("LOCAL_STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./data")),
            },
            "r2" => StorageBackend::R2(R2Config::from_env()?),
            "memory" => StorageBackend::Memory,
            other => {
                return Err(StorageError::config_error(format!(
                    "unknown STORAGE_BACKEND '{}'",
                    other
                )))
            }
        };
        Ok(Self { backend })
    }
}

/// Build the configured blob store.
pub async fn build_store(config: &StorageConfig) -> StorageResult<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match &config.backend {
        StorageBackend::Local { root } => {
            info!("Using local blob store at {}", root.display());
            Arc::new(LocalBlobStore::new(root).await?)
        }
        StorageBackend::R2(r2) => {
            info!("Using R2 blob store (bucket {})", r2.bucket_name);
            let client = R2Client::new(r2.clone());
            // Startup continues; readiness keeps reporting the failure
            if let Err(e) = client.check_connectivity().await {
                warn!("{}", e);
            }
            Arc::new(client)
        }
        StorageBackend::Memory => {
            info!("Using in-memory blob store");
            Arc::new(MemoryBlobStore::new())
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_memory_store() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
        };
        let store = build_store(&config).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_build_local_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Local {
                root: dir.path().join("blobs"),
            },
        };
        let store = build_store(&config).await.unwrap();
        assert_eq!(store.backend_name(), "local");
        assert!(dir.path().join("blobs").is_dir());
    }
}
