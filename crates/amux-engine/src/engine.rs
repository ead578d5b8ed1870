//! Assembly engine facade.

use std::sync::Arc;

use tracing::info;

use amux_media::Transcoder;
use amux_models::{
    ChunkRef, Continuity, FinalizeResult, JobId, JobSummary, RenderResult,
};
use amux_storage::BlobStore;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::lifecycle::LifecycleManager;
use crate::orchestrator::{RenderOptions, RenderOrchestrator};
use crate::registry::ChunkRegistry;
use crate::store::JobStore;

/// Entry point for transports.
///
/// Takes raw job ids and validates them, then delegates to the chunk
/// registry, lifecycle manager and render orchestrator, which all share one
/// job arena. Cheap to share behind an `Arc`.
pub struct AssemblyEngine {
    config: EngineConfig,
    jobs: Arc<JobStore>,
    registry: ChunkRegistry,
    lifecycle: LifecycleManager,
    orchestrator: RenderOrchestrator,
    blobs: Arc<dyn BlobStore>,
    transcoder: Arc<dyn Transcoder>,
}

impl AssemblyEngine {
    pub fn new(
        config: EngineConfig,
        blobs: Arc<dyn BlobStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let jobs = Arc::new(JobStore::new());
        let registry = ChunkRegistry::new(jobs.clone(), blobs.clone());
        let lifecycle = LifecycleManager::new(jobs.clone());
        let orchestrator = RenderOrchestrator::new(
            config.clone(),
            lifecycle.clone(),
            blobs.clone(),
            transcoder.clone(),
        );

        info!(
            storage = blobs.backend_name(),
            transcoder = transcoder.name(),
            work_dir = %config.work_dir.display(),
            render_timeout_secs = config.render_timeout.as_secs(),
            "Assembly engine initialized"
        );

        Self {
            config,
            jobs,
            registry,
            lifecycle,
            orchestrator,
            blobs,
            transcoder,
        }
    }

    /// Upload one chunk. Creates the job on first upload.
    pub async fn put_chunk(
        &self,
        job_id: &str,
        index: i64,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> EngineResult<ChunkRef> {
        let job_id = JobId::parse(job_id)?;
        self.registry
            .put_chunk(&job_id, index, data, content_type)
            .await
    }

    /// Chunks of a job, ascending by index.
    pub fn list_chunks(&self, job_id: &str) -> EngineResult<Vec<ChunkRef>> {
        self.registry.list_chunks(&JobId::parse(job_id)?)
    }

    pub fn continuity(&self, job_id: &str) -> EngineResult<Continuity> {
        self.registry.continuity(&JobId::parse(job_id)?)
    }

    pub fn finalize(&self, job_id: &str) -> EngineResult<FinalizeResult> {
        self.lifecycle.finalize(&JobId::parse(job_id)?)
    }

    pub fn get_status(&self, job_id: &str) -> EngineResult<JobSummary> {
        self.lifecycle.get_status(&JobId::parse(job_id)?)
    }

    /// Render a finalized job. Single-flight per job.
    pub async fn render(
        &self,
        job_id: &str,
        preset: &str,
        options: RenderOptions,
    ) -> EngineResult<RenderResult> {
        let job_id = JobId::parse(job_id)?;
        self.orchestrator.render(&job_id, preset, options).await
    }

    /// Whether `indices` form an unbroken ascending run once sorted.
    pub fn is_continuous(indices: &[u64]) -> bool {
        amux_models::is_continuous(indices)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn blob_store(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn transcoder(&self) -> &Arc<dyn Transcoder> {
        &self.transcoder
    }

    /// Number of jobs known to this process.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::testing::{FakeTranscoder, GatedTranscoder};
    use amux_models::{JobStatus, RenderStage};
    use amux_storage::MemoryBlobStore;
    use std::time::Duration;
    use tempfile::TempDir;

    fn engine(transcoder: Arc<dyn Transcoder>) -> (AssemblyEngine, TempDir) {
        let work_dir = TempDir::new().unwrap();
        let config = EngineConfig {
            work_dir: work_dir.path().to_path_buf(),
            ..Default::default()
        };
        let engine = AssemblyEngine::new(config, Arc::new(MemoryBlobStore::new()), transcoder);
        (engine, work_dir)
    }

    #[tokio::test]
    async fn test_end_to_end_static_image() {
        let (engine, _work) = engine(Arc::new(FakeTranscoder::new()));

        engine.put_chunk("j1", 0, b"A".to_vec(), None).await.unwrap();
        engine.put_chunk("j1", 1, b"B".to_vec(), None).await.unwrap();

        let finalized = engine.finalize("j1").unwrap();
        assert_eq!(finalized.chunk_count, 2);

        let result = engine
            .render("j1", "static-image", RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(result.artifact_key, "jobs/j1/artifact");
        assert!(result.duration_seconds > 0.0);

        let summary = engine.get_status("j1").unwrap();
        assert_eq!(summary.status, JobStatus::Rendered);
        assert_eq!(summary.artifact.unwrap().key, result.artifact_key);
        assert_eq!(
            engine.blob_store().get(&result.artifact_key).await.unwrap(),
            b"AB"
        );
    }

    #[tokio::test]
    async fn test_preconditions() {
        let (engine, _work) = engine(Arc::new(FakeTranscoder::new()));

        let err = engine
            .render("ghost", "static-image", RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
        assert!(matches!(engine.finalize("ghost"), Err(EngineError::NotFound(_))));
        assert_eq!(engine.job_count(), 0);

        engine.put_chunk("j2", 0, b"A".to_vec(), None).await.unwrap();
        let err = engine
            .render("j2", "static-image", RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));

        assert!(matches!(
            engine.put_chunk("bad/id", 0, b"A".to_vec(), None).await,
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_preset_keeps_status() {
        let (engine, _work) = engine(Arc::new(FakeTranscoder::new()));
        engine.put_chunk("j1", 0, b"A".to_vec(), None).await.unwrap();
        engine.finalize("j1").unwrap();

        let err = engine
            .render("j1", "xyz", RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
        assert_eq!(engine.get_status("j1").unwrap().status, JobStatus::Finalized);
    }

    #[tokio::test]
    async fn test_concurrent_renders_are_single_flight() {
        let transcoder = Arc::new(GatedTranscoder::new());
        let (engine, work) = engine(transcoder.clone());
        let engine = Arc::new(engine);

        engine.put_chunk("j1", 0, b"A".to_vec(), None).await.unwrap();
        engine.finalize("j1").unwrap();

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .render("j1", "audio-only", RenderOptions::default())
                    .await
            })
        };
        transcoder.wait_entered().await;

        let rejected = futures::future::join_all((0..8).map(|_| {
            let engine = engine.clone();
            async move {
                engine
                    .render("j1", "audio-only", RenderOptions::default())
                    .await
            }
        }))
        .await;
        for result in rejected {
            assert!(matches!(result, Err(EngineError::Conflict(_))));
        }
        // Only the winner's scratch area exists
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 1);

        transcoder.release();
        let result = first.await.unwrap().unwrap();
        assert_eq!(result.artifact_key, "jobs/j1/artifact");
        assert_eq!(transcoder.calls(), 1);
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
        assert_eq!(engine.get_status("j1").unwrap().status, JobStatus::Rendered);
    }

    #[tokio::test]
    async fn test_distinct_jobs_render_in_parallel() {
        let transcoder = Arc::new(GatedTranscoder::new());
        let (engine, _work) = engine(transcoder.clone());
        let engine = Arc::new(engine);

        for id in ["a", "b"] {
            engine.put_chunk(id, 0, b"A".to_vec(), None).await.unwrap();
            engine.finalize(id).unwrap();
        }

        let renders: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|id| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine.render(id, "waveform", RenderOptions::default()).await
                })
            })
            .collect();

        transcoder.wait_entered().await;
        transcoder.wait_entered().await;
        assert_eq!(transcoder.calls(), 2);

        transcoder.release();
        transcoder.release();
        for render in renders {
            render.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn test_timeout_then_retry() {
        let transcoder = Arc::new(GatedTranscoder::new());
        let (engine, _work) = engine(transcoder.clone());

        engine.put_chunk("j1", 0, b"A".to_vec(), None).await.unwrap();
        engine.finalize("j1").unwrap();

        let err = engine
            .render(
                "j1",
                "audio-only",
                RenderOptions::with_timeout(Duration::from_millis(20)),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::RenderFailed {
                stage: RenderStage::Transcode,
                ..
            }
        ));
        assert_eq!(engine.get_status("j1").unwrap().status, JobStatus::Finalized);

        transcoder.release();
        engine
            .render("j1", "audio-only", RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(engine.get_status("j1").unwrap().status, JobStatus::Rendered);
    }

    #[test]
    fn test_is_continuous() {
        assert!(AssemblyEngine::is_continuous(&[0, 1, 2]));
        assert!(!AssemblyEngine::is_continuous(&[0, 2, 3]));
        assert!(AssemblyEngine::is_continuous(&[5]));
        assert!(AssemblyEngine::is_continuous(&[]));
    }
}
