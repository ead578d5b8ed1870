//! Render orchestration.
//!
//! One attempt runs four stages against a chunk list pinned when the
//! render slot was claimed:
//!
//! 1. materialize every chunk blob into a fresh scratch area, in index order
//! 2. hand the ordered local files to the transcoder
//! 3. publish the output under the job's stable artifact key
//! 4. record the outcome on the job
//!
//! All stages share one deadline. Any failure, timeout or cancellation
//! returns the job to `Finalized` and removes the scratch area.

use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, Instrument};

use amux_models::{
    Artifact, ChunkRef, JobId, Preset, RenderErrorRecord, RenderResult, RenderStage,
};
use amux_media::{TranscodeRequest, Transcoder};
use amux_storage::{artifact_key, BlobStore};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::lifecycle::{LifecycleManager, RenderGuard};
use crate::logging::RenderLogger;
use crate::scratch::ScratchArea;

/// Upper bound on any render deadline.
pub const MAX_RENDER_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Per-call render options.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Deadline for the whole attempt, at most [`MAX_RENDER_TIMEOUT`].
    /// Falls back to the engine default.
    pub timeout: Option<Duration>,
}

impl RenderOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Failure of one stage of an attempt.
#[derive(Debug)]
struct StageFailure {
    stage: RenderStage,
    message: String,
}

impl StageFailure {
    fn new(stage: RenderStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Run one stage against the shared deadline.
async fn stage<T, F>(
    stage: RenderStage,
    deadline: Instant,
    budget: Duration,
    fut: F,
) -> Result<T, StageFailure>
where
    F: Future<Output = Result<T, String>>,
{
    match timeout_at(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(message)) => Err(StageFailure::new(stage, message)),
        Err(_) => Err(StageFailure::new(
            stage,
            format!("render timed out after {}s", budget.as_secs_f64()),
        )),
    }
}

/// Drives render attempts.
#[derive(Clone)]
pub struct RenderOrchestrator {
    config: EngineConfig,
    lifecycle: LifecycleManager,
    blobs: Arc<dyn BlobStore>,
    transcoder: Arc<dyn Transcoder>,
}

impl RenderOrchestrator {
    pub fn new(
        config: EngineConfig,
        lifecycle: LifecycleManager,
        blobs: Arc<dyn BlobStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            config,
            lifecycle,
            blobs,
            transcoder,
        }
    }

    /// Render a finalized job with `preset`.
    ///
    /// The preset is checked before the job is touched, so an unknown
    /// preset leaves the status unchanged.
    pub async fn render(
        &self,
        job_id: &JobId,
        preset: &str,
        options: RenderOptions,
    ) -> EngineResult<RenderResult> {
        let preset = Preset::from_str(preset)?;
        if let Some(timeout) = options.timeout {
            if timeout.is_zero() || timeout > MAX_RENDER_TIMEOUT {
                return Err(EngineError::invalid_argument(format!(
                    "render timeout must be positive and at most {}s, got {}s",
                    MAX_RENDER_TIMEOUT.as_secs(),
                    timeout.as_secs_f64()
                )));
            }
        }
        let guard = self.lifecycle.begin_render(job_id, preset)?;

        let logger = RenderLogger::new(job_id, preset);
        let span = logger.span();
        self.run(guard, logger, options).instrument(span).await
    }

    async fn run(
        &self,
        guard: RenderGuard,
        logger: RenderLogger,
        options: RenderOptions,
    ) -> EngineResult<RenderResult> {
        let job_id = guard.job_id().clone();
        let preset = guard.preset();
        let chunks = guard.chunks().to_vec();
        let budget = options
            .timeout
            .unwrap_or(self.config.render_timeout)
            .min(MAX_RENDER_TIMEOUT);
        // An unrepresentable deadline expires at once instead of panicking
        let start = Instant::now();
        let deadline = start.checked_add(budget).unwrap_or(start);

        logger.started(chunks.len(), budget);

        match self.attempt(&job_id, preset, &chunks, deadline, budget, &logger).await {
            Ok(artifact) => {
                let result = RenderResult {
                    job_id: job_id.to_string(),
                    artifact_key: artifact.key.clone(),
                    duration_seconds: artifact.duration_seconds,
                    preset,
                    size_bytes: artifact.size_bytes,
                    chunk_count: artifact.chunk_count,
                };
                guard.complete(artifact);
                logger.published(&result);
                Ok(result)
            }
            Err(failure) => {
                logger.failed(failure.stage, &failure.message);
                guard.fail(RenderErrorRecord::new(
                    failure.stage,
                    failure.message.clone(),
                    Some(preset),
                ));
                Err(EngineError::render_failed(
                    job_id.as_str(),
                    failure.stage,
                    failure.message,
                ))
            }
        }
    }

    async fn attempt(
        &self,
        job_id: &JobId,
        preset: Preset,
        chunks: &[ChunkRef],
        deadline: Instant,
        budget: Duration,
        logger: &RenderLogger,
    ) -> Result<Artifact, StageFailure> {
        if chunks.is_empty() {
            return Err(StageFailure::new(RenderStage::Materialize, "job has no chunks"));
        }

        let scratch = ScratchArea::create(&self.config.work_dir, job_id)
            .await
            .map_err(|e| {
                StageFailure::new(
                    RenderStage::Materialize,
                    format!("failed to create scratch area: {}", e),
                )
            })?;

        let result = self
            .stages(job_id, preset, chunks, &scratch, deadline, budget, logger)
            .await;
        scratch.close();
        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn stages(
        &self,
        job_id: &JobId,
        preset: Preset,
        chunks: &[ChunkRef],
        scratch: &ScratchArea,
        deadline: Instant,
        budget: Duration,
        logger: &RenderLogger,
    ) -> Result<Artifact, StageFailure> {
        let inputs = stage(
            RenderStage::Materialize,
            deadline,
            budget,
            self.materialize(chunks, scratch),
        )
        .await?;
        logger.stage_finished(
            RenderStage::Materialize,
            &format!("{} chunks", inputs.len()),
        );

        let output = stage(RenderStage::Transcode, deadline, budget, async {
            self.transcoder
                .transcode(TranscodeRequest {
                    inputs: &inputs,
                    preset,
                    work_dir: scratch.path(),
                })
                .await
                .map_err(|e| e.diagnostic())
        })
        .await?;

        if !(output.duration_seconds.is_finite() && output.duration_seconds > 0.0) {
            return Err(StageFailure::new(
                RenderStage::Transcode,
                format!(
                    "transcoder reported invalid duration {}",
                    output.duration_seconds
                ),
            ));
        }
        logger.stage_finished(
            RenderStage::Transcode,
            &format!(
                "{} produced {:.2}s",
                self.transcoder.name(),
                output.duration_seconds
            ),
        );

        let key = artifact_key(job_id);
        let size_bytes = stage(RenderStage::Publish, deadline, budget, async {
            let data = tokio::fs::read(&output.path)
                .await
                .map_err(|e| format!("failed to read transcoder output: {}", e))?;
            if data.is_empty() {
                return Err("transcoder produced an empty output".to_string());
            }
            let size = data.len() as u64;
            self.blobs
                .put(&key, data, preset.content_type())
                .await
                .map_err(|e| format!("failed to publish artifact: {}", e))?;
            Ok::<_, String>(size)
        })
        .await?;

        Ok(Artifact {
            key,
            content_type: preset.content_type().to_string(),
            size_bytes,
            duration_seconds: output.duration_seconds,
            preset,
            chunk_count: chunks.len(),
        })
    }

    /// Copy chunk blobs into the scratch area, preserving `chunks` order.
    async fn materialize(
        &self,
        chunks: &[ChunkRef],
        scratch: &ScratchArea,
    ) -> Result<Vec<PathBuf>, String> {
        // Downloads own their inputs so the render future stays `Send`
        let downloads: Vec<_> = chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| {
                fetch_chunk(
                    Arc::clone(&self.blobs),
                    chunk.clone(),
                    scratch.input_path(position),
                )
            })
            .collect();

        stream::iter(downloads)
            .buffered(self.config.materialize_concurrency.max(1))
            .try_collect()
            .await
    }
}

async fn fetch_chunk(
    blobs: Arc<dyn BlobStore>,
    chunk: ChunkRef,
    path: PathBuf,
) -> Result<PathBuf, String> {
    let data = blobs
        .get(&chunk.storage_key)
        .await
        .map_err(|e| format!("failed to fetch chunk {}: {}", chunk.index, e))?;
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| format!("failed to write chunk {}: {}", chunk.index, e))?;
    debug!(index = chunk.index, bytes = data.len(), path = %path.display(), "Chunk materialized");
    Ok(path)
}
