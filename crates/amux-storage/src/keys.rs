//! Blob key layout.
//!
//! ```text
//! jobs/{job_id}/chunks/{index:010}/{upload_id}   one object per chunk upload
//! jobs/{job_id}/artifact                         latest rendered artifact
//! ```

use amux_models::JobId;

/// Prefix of every object belonging to a job.
pub fn job_prefix(job_id: &JobId) -> String {
    format!("jobs/{}/", job_id)
}

/// Prefix of every chunk object belonging to a job.
pub fn chunk_prefix(job_id: &JobId) -> String {
    format!("jobs/{}/chunks/", job_id)
}

/// Key for one chunk upload.
///
/// Each upload gets its own object so two writers racing on the same
/// index never share a key.
pub fn chunk_key(job_id: &JobId, index: u64, upload_id: &str) -> String {
    format!("jobs/{}/chunks/{:010}/{}", job_id, index, upload_id)
}

/// Key for a job's artifact. Stable across re-renders and presets.
pub fn artifact_key(job_id: &JobId) -> String {
    format!("jobs/{}/artifact", job_id)
}
