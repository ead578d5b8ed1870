//! Job lifecycle handlers.

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use amux_engine::RenderOptions;
use amux_models::{FinalizeResult, JobSummary, RenderResult};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Render request body.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    /// Preset name, e.g. `static-image`
    pub preset: String,
    /// Deadline for the whole render; server default when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// POST /jobs/:job_id/finalize
///
/// Idempotent. Gaps in the chunk indices are reported, not rejected.
pub async fn finalize_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<FinalizeResult>> {
    let result = state.engine.finalize(&job_id)?;
    info!(
        job_id = %job_id,
        chunk_count = result.chunk_count,
        continuous = result.continuity.is_continuous,
        "Finalize requested"
    );
    Ok(Json(result))
}

/// POST /jobs/:job_id/render
///
/// Returns:
/// - 200: Artifact published
/// - 400: Unsupported preset, out-of-range `timeout_secs`, or malformed body
/// - 404: Unknown job
/// - 409: Job not finalized, or a render is already running
/// - 502: Render failed; the job is finalized again and may be retried
pub async fn render_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> ApiResult<Json<RenderResult>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let options = RenderOptions {
        timeout: request
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
    };

    let result = state
        .engine
        .render(&job_id, &request.preset, options)
        .await?;
    Ok(Json(result))
}

/// GET /jobs/:job_id
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobSummary>> {
    Ok(Json(state.engine.get_status(&job_id)?))
}
