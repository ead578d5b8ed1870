//! Engine metrics.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const CHUNKS_UPLOADED_TOTAL: &str = "amux_chunks_uploaded_total";
    pub const CHUNK_BYTES_TOTAL: &str = "amux_chunk_bytes_total";
    pub const JOBS_CREATED_TOTAL: &str = "amux_jobs_created_total";
    pub const JOBS_FINALIZED_TOTAL: &str = "amux_jobs_finalized_total";
    pub const RENDERS_TOTAL: &str = "amux_renders_total";
    pub const RENDERS_REJECTED_TOTAL: &str = "amux_renders_rejected_total";
    pub const RENDERS_IN_FLIGHT: &str = "amux_renders_in_flight";
    pub const RENDER_DURATION_SECONDS: &str = "amux_render_duration_seconds";
}

/// Record a registered chunk upload.
pub fn record_chunk_uploaded(size_bytes: u64) {
    counter!(names::CHUNKS_UPLOADED_TOTAL).increment(1);
    counter!(names::CHUNK_BYTES_TOTAL).increment(size_bytes);
}

/// Record a job created by its first chunk.
pub fn record_job_created() {
    counter!(names::JOBS_CREATED_TOTAL).increment(1);
}

/// Record a Collecting -> Finalized transition.
pub fn record_job_finalized() {
    counter!(names::JOBS_FINALIZED_TOTAL).increment(1);
}

/// Record a finished render attempt.
pub fn record_render(outcome: &str, preset: &str, duration_secs: f64) {
    let labels = [
        ("outcome", outcome.to_string()),
        ("preset", preset.to_string()),
    ];
    counter!(names::RENDERS_TOTAL, &labels).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a render rejected before it started.
pub fn record_render_rejected(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::RENDERS_REJECTED_TOTAL, &labels).increment(1);
}

pub fn render_started() {
    gauge!(names::RENDERS_IN_FLIGHT).increment(1.0);
}

pub fn render_finished() {
    gauge!(names::RENDERS_IN_FLIGHT).decrement(1.0);
}
