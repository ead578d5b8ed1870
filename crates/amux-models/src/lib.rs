//! Shared data models for the amux render service.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, their lifecycle status and summaries
//! - Chunk references and continuity reporting
//! - Render presets, artifacts and error records
//! - Validation of caller-supplied identifiers

pub mod chunk;
pub mod job;
pub mod job_status;
pub mod preset;
pub mod render;
pub mod utils;

// Re-export common types
pub use chunk::{ChunkRef, Continuity};
pub use job::{FinalizeResult, JobId, JobSummary};
pub use job_status::JobStatus;
pub use preset::Preset;
pub use render::{Artifact, RenderErrorRecord, RenderResult, RenderStage};
pub use utils::{
    is_continuous, validate_chunk_index, validate_job_id, ValidationError,
    ValidationResult,
};
