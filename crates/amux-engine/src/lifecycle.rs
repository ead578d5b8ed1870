//! Job lifecycle manager.
//!
//! Owns every `status` transition. Render attempts hold a [`RenderGuard`]
//! for the whole time the job sits in `Rendering`; the guard is the only
//! way out of that state, so a job can never be left `Rendering` once its
//! attempt is gone.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use amux_models::{
    Artifact, ChunkRef, FinalizeResult, JobId, JobStatus, JobSummary, Preset, RenderErrorRecord,
    RenderStage,
};

use crate::error::{EngineError, EngineResult};
use crate::metrics;
use crate::registry::{continuity_of, sorted_chunks};
use crate::store::{JobEntry, JobState, JobStore};

/// Drives job state transitions.
#[derive(Clone)]
pub struct LifecycleManager {
    jobs: Arc<JobStore>,
}

impl LifecycleManager {
    pub fn new(jobs: Arc<JobStore>) -> Self {
        Self { jobs }
    }

    /// Seal a job's chunk set.
    ///
    /// `Collecting` moves to `Finalized`. Any later status is left alone and
    /// the current chunk count is returned, so repeated calls never fail.
    /// Continuity is reported, not checked.
    pub fn finalize(&self, job_id: &JobId) -> EngineResult<FinalizeResult> {
        let job = self.job(job_id)?;

        let status = {
            let mut state = job.state();
            if state.status == JobStatus::Collecting {
                transition(&mut state, JobStatus::Finalized)?;
                if state.finalized_at.is_none() {
                    state.finalized_at = Some(Utc::now());
                }
                metrics::record_job_finalized();
                info!(job_id = %job_id, "Job finalized");
            }
            state.status
        };

        let continuity = continuity_of(&job);
        if !continuity.is_continuous {
            warn!(
                job_id = %job_id,
                missing = continuity.missing_count,
                "Finalized job has gaps in its chunk indices"
            );
        }

        Ok(FinalizeResult {
            job_id: job_id.clone(),
            chunk_count: continuity.chunk_count,
            status,
            continuity,
        })
    }

    /// Current view of a job.
    pub fn get_status(&self, job_id: &JobId) -> EngineResult<JobSummary> {
        let job = self.job(job_id)?;
        let state = job.snapshot();

        Ok(JobSummary {
            job_id: job_id.clone(),
            status: state.status,
            continuity: continuity_of(&job),
            created_at: state.created_at,
            finalized_at: state.finalized_at,
            rendered_at: state.rendered_at,
            artifact: state.artifact,
            last_error: state.last_error,
            updated_at: state.updated_at,
        })
    }

    /// Claim the job's render slot.
    ///
    /// Succeeds only from `Finalized` or `Rendered`. A second caller while
    /// the job is `Rendering` is rejected immediately, never queued.
    pub fn begin_render(&self, job_id: &JobId, preset: Preset) -> EngineResult<RenderGuard> {
        let job = match self.job(job_id) {
            Ok(job) => job,
            Err(e) => {
                metrics::record_render_rejected("not_found");
                return Err(e);
            }
        };

        {
            let mut state = job.state();
            if state.status.can_start_render() {
                transition(&mut state, JobStatus::Rendering)?;
            } else {
                let (reason, detail) = match state.status {
                    JobStatus::Collecting => ("not_finalized", "is not finalized yet"),
                    JobStatus::Rendering => ("in_flight", "has a render already in progress"),
                    _ => ("failed", "is in a terminal failed state"),
                };
                metrics::record_render_rejected(reason);
                return Err(EngineError::conflict(format!("job {} {}", job_id, detail)));
            }
        }

        metrics::render_started();
        let chunks = sorted_chunks(&job);
        Ok(RenderGuard {
            job,
            preset,
            chunks,
            started: Instant::now(),
            settled: false,
        })
    }

    fn job(&self, job_id: &JobId) -> EngineResult<Arc<JobEntry>> {
        self.jobs
            .get(job_id)
            .ok_or_else(|| EngineError::not_found(format!("job {} not found", job_id)))
    }
}

fn transition(state: &mut JobState, next: JobStatus) -> EngineResult<()> {
    if !state.status.can_transition_to(next) {
        return Err(EngineError::internal(format!(
            "illegal status transition {} -> {}",
            state.status, next
        )));
    }
    state.status = next;
    state.touch();
    Ok(())
}

/// Exclusive claim on a job's `Rendering` state.
///
/// Settled exactly once: [`complete`](Self::complete) moves the job to
/// `Rendered`, [`fail`](Self::fail) returns it to `Finalized`. Dropping an
/// unsettled guard (cancelled future, panic) also returns it to
/// `Finalized`, recording a `cancelled` error.
#[derive(Debug)]
pub struct RenderGuard {
    job: Arc<JobEntry>,
    preset: Preset,
    chunks: Vec<ChunkRef>,
    started: Instant,
    settled: bool,
}

impl RenderGuard {
    pub fn job_id(&self) -> &JobId {
        self.job.id()
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// The chunk list this attempt renders, pinned when the slot was claimed.
    pub fn chunks(&self) -> &[ChunkRef] {
        &self.chunks
    }

    /// Record a published artifact and move to `Rendered`.
    pub fn complete(mut self, artifact: Artifact) {
        {
            let mut state = self.job.state();
            if state.status == JobStatus::Rendering {
                state.status = JobStatus::Rendered;
                let now = Utc::now();
                if state.rendered_at.map_or(true, |prev| now > prev) {
                    state.rendered_at = Some(now);
                }
                state.artifact = Some(artifact);
                state.last_error = None;
                state.touch();
            }
        }
        self.settle("success");
    }

    /// Record a failed attempt and return to `Finalized`.
    ///
    /// A previously published artifact stays visible.
    pub fn fail(mut self, record: RenderErrorRecord) {
        self.revert(record);
        self.settle("failure");
    }

    fn revert(&self, record: RenderErrorRecord) {
        let mut state = self.job.state();
        if state.status == JobStatus::Rendering {
            state.status = JobStatus::Finalized;
            state.last_error = Some(record);
            state.touch();
        }
    }

    fn settle(&mut self, outcome: &str) {
        self.settled = true;
        metrics::record_render(
            outcome,
            self.preset.as_str(),
            self.started.elapsed().as_secs_f64(),
        );
    }
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        if !self.settled {
            warn!(
                job_id = %self.job.id(),
                preset = %self.preset,
                "Render attempt dropped before completion, returning job to finalized"
            );
            self.revert(RenderErrorRecord::new(
                RenderStage::Cancelled,
                "render attempt was cancelled",
                Some(self.preset),
            ));
            self.settle("cancelled");
        }
        metrics::render_finished();
    }
}
