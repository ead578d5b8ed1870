//! Render artifacts, outcomes and error records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Preset;

/// Stage of a render attempt, used to locate failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStage {
    /// Copying chunk blobs into the scratch area
    Materialize,
    /// Running the transcoder
    Transcode,
    /// Writing the artifact to the blob store
    Publish,
    /// The attempt was dropped before it finished
    Cancelled,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStage::Materialize => "materialize",
            RenderStage::Transcode => "transcode",
            RenderStage::Publish => "publish",
            RenderStage::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RenderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Published render output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Blob store key (stable per job)
    pub key: String,
    /// MIME type of the artifact
    pub content_type: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Media duration in seconds
    pub duration_seconds: f64,
    /// Preset used to produce it
    pub preset: Preset,
    /// Number of chunks concatenated
    pub chunk_count: usize,
}

/// Error from the most recent failed render attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderErrorRecord {
    pub stage: RenderStage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,
    pub occurred_at: DateTime<Utc>,
}

impl RenderErrorRecord {
    pub fn new(stage: RenderStage, message: impl Into<String>, preset: Option<Preset>) -> Self {
        Self {
            stage,
            message: message.into(),
            preset,
            occurred_at: Utc::now(),
        }
    }
}

/// Outcome of a successful render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub job_id: String,
    pub artifact_key: String,
    pub duration_seconds: f64,
    pub preset: Preset,
    pub size_bytes: u64,
    pub chunk_count: usize,
}
