//! Health check handlers.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Plain-text banner served at `/`.
pub const ROOT_BANNER: &str = "Render service is running";

/// Prefix listed by the readiness probe; expected to be empty.
const READINESS_PREFIX: &str = "_ready/";

/// GET /
pub async fn root() -> &'static str {
    ROOT_BANNER
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub storage: CheckStatus,
    pub transcoder: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn ok(backend: &str, latency_ms: u64) -> Self {
        Self {
            status: "ok".to_string(),
            backend: backend.to_string(),
            error: None,
            latency_ms: Some(latency_ms),
        }
    }

    fn error(backend: &str, msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            backend: backend.to_string(),
            error: Some(msg.into()),
            latency_ms: None,
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness check endpoint (readiness probe).
/// Checks the blob store answers a listing and the transcoder binaries exist.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let blobs = state.engine.blob_store();
    let storage_check = {
        let start = Instant::now();
        match blobs.list(READINESS_PREFIX).await {
            Ok(_) => CheckStatus::ok(blobs.backend_name(), start.elapsed().as_millis() as u64),
            Err(e) => CheckStatus::error(blobs.backend_name(), e.to_string()),
        }
    };

    let transcoder = state.engine.transcoder();
    let transcoder_check = {
        let start = Instant::now();
        match transcoder.check_available() {
            Ok(()) => CheckStatus::ok(transcoder.name(), start.elapsed().as_millis() as u64),
            Err(e) => CheckStatus::error(transcoder.name(), e.to_string()),
        }
    };

    let all_ok = storage_check.is_ok() && transcoder_check.is_ok();

    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            storage: storage_check,
            transcoder: transcoder_check,
        },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
