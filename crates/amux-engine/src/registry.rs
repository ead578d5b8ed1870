//! Chunk registry.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use amux_models::{validate_chunk_index, ChunkRef, Continuity, JobId};
use amux_storage::{chunk_key, BlobStore};

use crate::error::{EngineError, EngineResult};
use crate::metrics;
use crate::store::{JobEntry, JobStore};

/// Content type recorded when the producer does not send one.
pub const DEFAULT_CHUNK_CONTENT_TYPE: &str = "application/octet-stream";

/// Owns every job's chunk map.
///
/// The blob is written before the registry entry, so an entry always
/// points at a complete blob. A failed write leaves the registry untouched.
#[derive(Clone)]
pub struct ChunkRegistry {
    jobs: Arc<JobStore>,
    blobs: Arc<dyn BlobStore>,
}

impl ChunkRegistry {
    pub fn new(jobs: Arc<JobStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { jobs, blobs }
    }

    /// Store a chunk and upsert its registry entry.
    ///
    /// Creates the job in `Collecting` on first upload. A later upload to
    /// the same index replaces the earlier entry.
    pub async fn put_chunk(
        &self,
        job_id: &JobId,
        index: i64,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> EngineResult<ChunkRef> {
        let index = validate_chunk_index(index)?;
        if data.is_empty() {
            return Err(EngineError::invalid_argument("chunk body is empty"));
        }

        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CHUNK_CONTENT_TYPE)
            .to_string();
        let size_bytes = data.len() as u64;
        let upload_id = Uuid::new_v4().simple().to_string();
        let storage_key = chunk_key(job_id, index, &upload_id);

        self.blobs
            .put(&storage_key, data, &content_type)
            .await
            .map_err(|e| {
                EngineError::internal(format!(
                    "failed to store chunk {} of job {}: {}",
                    index, job_id, e
                ))
            })?;

        let chunk = ChunkRef {
            index,
            storage_key,
            size_bytes,
            content_type,
            uploaded_at: Utc::now(),
        };

        let inserted = self.jobs.insert_chunk(job_id, chunk.clone());
        if inserted.created {
            info!(job_id = %job_id, "Job created by first chunk upload");
            metrics::record_job_created();
        }
        if let Some(previous) = inserted.replaced {
            debug!(
                job_id = %job_id,
                index,
                replaced_key = %previous.storage_key,
                "Chunk index overwritten"
            );
        }
        inserted.job.state().touch();

        metrics::record_chunk_uploaded(size_bytes);
        debug!(job_id = %job_id, index, size_bytes, "Chunk registered");

        Ok(chunk)
    }

    /// All chunks of a job in ascending numeric index order.
    pub fn list_chunks(&self, job_id: &JobId) -> EngineResult<Vec<ChunkRef>> {
        let job = self.job(job_id)?;
        Ok(sorted_chunks(&job))
    }

    /// Continuity report for a job's current chunk set.
    pub fn continuity(&self, job_id: &JobId) -> EngineResult<Continuity> {
        let job = self.job(job_id)?;
        Ok(continuity_of(&job))
    }

    fn job(&self, job_id: &JobId) -> EngineResult<Arc<JobEntry>> {
        self.jobs
            .get(job_id)
            .ok_or_else(|| EngineError::not_found(format!("job {} has no chunks", job_id)))
    }
}

/// Snapshot of a job's chunks, sorted by index.
///
/// Ordering never depends on map iteration or blob key order.
pub(crate) fn sorted_chunks(job: &JobEntry) -> Vec<ChunkRef> {
    let mut chunks: Vec<ChunkRef> = job.chunks.iter().map(|e| e.value().clone()).collect();
    chunks.sort_by_key(|c| c.index);
    chunks
}

pub(crate) fn continuity_of(job: &JobEntry) -> Continuity {
    let indices: Vec<u64> = job.chunks.iter().map(|e| *e.key()).collect();
    Continuity::from_indices(&indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FailingBlobStore;
    use amux_storage::MemoryBlobStore;

    fn registry() -> (ChunkRegistry, Arc<MemoryBlobStore>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let registry = ChunkRegistry::new(Arc::new(JobStore::new()), blobs.clone());
        (registry, blobs)
    }

    fn job(id: &str) -> JobId {
        JobId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn test_list_sorts_numerically() {
        let (registry, _) = registry();
        let id = job("j1");

        for index in [2, 10, 1] {
            registry
                .put_chunk(&id, index, vec![index as u8], None)
                .await
                .unwrap();
        }

        let indices: Vec<u64> = registry
            .list_chunks(&id)
            .unwrap()
            .iter()
            .map(|c| c.index)
            .collect();
        assert_eq!(indices, vec![1, 2, 10]);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_entry() {
        let (registry, blobs) = registry();
        let id = job("j1");

        let first = registry.put_chunk(&id, 0, b"A".to_vec(), None).await.unwrap();
        let second = registry
            .put_chunk(&id, 0, b"AA".to_vec(), Some("audio/webm"))
            .await
            .unwrap();

        let chunks = registry.list_chunks(&id).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], second);
        assert_ne!(first.storage_key, second.storage_key);
        assert_eq!(chunks[0].content_type, "audio/webm");
        assert_eq!(blobs.get(&second.storage_key).await.unwrap(), b"AA");
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let (registry, blobs) = registry();
        let id = job("j1");

        let err = registry.put_chunk(&id, -1, b"A".to_vec(), None).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));

        let err = registry.put_chunk(&id, 0, Vec::new(), None).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));

        // Nothing was created
        assert!(blobs.is_empty());
        assert!(matches!(
            registry.list_chunks(&id),
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_store_leaves_no_entry() {
        let registry = ChunkRegistry::new(Arc::new(JobStore::new()), Arc::new(FailingBlobStore));
        let id = job("j1");

        let err = registry.put_chunk(&id, 0, b"A".to_vec(), None).await.unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));
        assert!(matches!(
            registry.list_chunks(&id),
            Err(EngineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_uploads_to_distinct_indices() {
        let (registry, _) = registry();
        let id = job("busy");

        let uploads = (0..64i64).map(|index| {
            let registry = registry.clone();
            let id = id.clone();
            tokio::spawn(async move {
                registry
                    .put_chunk(&id, index, vec![1; 16], None)
                    .await
                    .unwrap()
            })
        });
        for handle in futures::future::join_all(uploads).await {
            handle.unwrap();
        }

        let chunks = registry.list_chunks(&id).unwrap();
        assert_eq!(chunks.len(), 64);
        assert!(registry.continuity(&id).unwrap().is_continuous);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_to_same_index_keep_one_whole_write() {
        let (registry, blobs) = registry();
        let id = job("race");

        let a = registry.put_chunk(&id, 3, vec![b'a'; 1024], None);
        let b = registry.put_chunk(&id, 3, vec![b'b'; 2048], None);
        let (a, b) = tokio::join!(a, b);
        let (a, b) = (a.unwrap(), b.unwrap());

        let chunks = registry.list_chunks(&id).unwrap();
        assert_eq!(chunks.len(), 1);
        let winner = &chunks[0];
        assert!(winner == &a || winner == &b);

        let stored = blobs.get(&winner.storage_key).await.unwrap();
        assert_eq!(stored.len() as u64, winner.size_bytes);
        assert!(stored.iter().all(|byte| *byte == stored[0]));
    }

    #[tokio::test]
    async fn test_continuity_reports_gaps() {
        let (registry, _) = registry();
        let id = job("gappy");

        for index in [0, 2, 3, 7] {
            registry.put_chunk(&id, index, b"x".to_vec(), None).await.unwrap();
        }

        let report = registry.continuity(&id).unwrap();
        assert_eq!(report.chunk_count, 4);
        assert!(!report.is_continuous);
        assert_eq!(report.missing_indices, vec![1, 4, 5, 6]);
    }
}
