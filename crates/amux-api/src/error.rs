//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use amux_engine::EngineError;
use amux_models::RenderStage;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The transcoder or blob store failed during a render
    #[error("Render failed during {stage}: {message}")]
    RenderFailed { stage: RenderStage, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RenderFailed { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_argument",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::RenderFailed { .. } => "render_failed",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidArgument(msg) => Self::BadRequest(msg),
            EngineError::NotFound(msg) => Self::NotFound(msg),
            EngineError::Conflict(msg) => Self::Conflict(msg),
            EngineError::RenderFailed { stage, message, .. } => Self::RenderFailed { stage, message },
            EngineError::Internal(msg) => Self::Internal(msg),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<RenderStage>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let stage = match &self {
            ApiError::RenderFailed { stage, .. } => Some(*stage),
            _ => None,
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
            stage,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_mapping() {
        let cases = [
            (EngineError::invalid_argument("x"), StatusCode::BAD_REQUEST),
            (EngineError::not_found("x"), StatusCode::NOT_FOUND),
            (EngineError::conflict("x"), StatusCode::CONFLICT),
            (
                EngineError::render_failed("j1", RenderStage::Publish, "x"),
                StatusCode::BAD_GATEWAY,
            ),
            (EngineError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            let code = err.code();
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), status);
            assert_eq!(api.code(), code);
        }
    }
}
