//! Chunk upload and listing handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use tracing::debug;

use amux_models::{ChunkRef, Continuity};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Chunk listing response.
#[derive(Debug, Serialize)]
pub struct ChunkListResponse {
    pub job_id: String,
    /// Chunks in ascending index order
    pub chunks: Vec<ChunkRef>,
    pub continuity: Continuity,
}

/// POST /chunks/:job_id/:index
///
/// Upload one chunk as the raw request body. The job is created on its
/// first chunk. Re-uploading an index replaces the earlier chunk.
///
/// Returns:
/// - 201: Chunk stored
/// - 400: Bad job id, negative or non-numeric index, empty body
/// - 413: Body exceeds the configured limit
pub async fn upload_chunk(
    State(state): State<AppState>,
    Path((job_id, index)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ChunkRef>)> {
    let index: i64 = index
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid chunk index: {}", index)))?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    debug!(job_id = %job_id, index, size = body.len(), "Chunk upload");

    let chunk = state
        .engine
        .put_chunk(&job_id, index, body.to_vec(), content_type)
        .await?;

    Ok((StatusCode::CREATED, Json(chunk)))
}

/// GET /jobs/:job_id/chunks
pub async fn list_chunks(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ChunkListResponse>> {
    let chunks = state.engine.list_chunks(&job_id)?;
    let continuity = Continuity::from_chunks(&chunks);

    Ok(Json(ChunkListResponse {
        job_id,
        chunks,
        continuity,
    }))
}
