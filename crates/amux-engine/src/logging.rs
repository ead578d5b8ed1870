//! Structured logging for render attempts.
//!
//! Every line of one attempt is emitted inside a `render` span carrying the
//! job id and preset, so JSON output can be filtered per job. Stage lines
//! add a `stage` field.

use std::time::{Duration, Instant};

use tracing::{error, info, info_span, Span};

use amux_models::{JobId, Preset, RenderResult, RenderStage};

/// Logger bound to one render attempt.
#[derive(Debug, Clone)]
pub struct RenderLogger {
    job_id: String,
    preset: Preset,
    started: Instant,
    span: Span,
}

impl RenderLogger {
    pub fn new(job_id: &JobId, preset: Preset) -> Self {
        let span = info_span!("render", job_id = %job_id, preset = %preset);
        Self {
            job_id: job_id.to_string(),
            preset,
            started: Instant::now(),
            span,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// Span every event of the attempt should be recorded in.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn started(&self, chunk_count: usize, budget: Duration) {
        info!(
            chunk_count,
            timeout_secs = budget.as_secs_f64(),
            "Render started"
        );
    }

    /// A stage finished; `detail` is free text for humans.
    pub fn stage_finished(&self, stage: RenderStage, detail: &str) {
        info!(
            stage = %stage,
            elapsed_ms = self.elapsed_ms(),
            "Render stage finished: {}", detail
        );
    }

    pub fn failed(&self, stage: RenderStage, message: &str) {
        error!(
            job_id = %self.job_id,
            preset = %self.preset,
            stage = %stage,
            elapsed_ms = self.elapsed_ms(),
            "Render failed: {}", message
        );
    }

    pub fn published(&self, result: &RenderResult) {
        info!(
            artifact_key = %result.artifact_key,
            size_bytes = result.size_bytes,
            duration_seconds = result.duration_seconds,
            chunk_count = result.chunk_count,
            elapsed_ms = self.elapsed_ms(),
            "Render published"
        );
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
