//! Job assembly and render pipeline.
//!
//! This crate provides:
//! - The job arena with per-job synchronization ([`JobStore`])
//! - The chunk registry: per-index upserts, numeric ordering
//! - The job lifecycle manager: finalize, status, single-flight render slots
//! - The render orchestrator: materialize, transcode, publish, record
//! - Scoped scratch areas released on every exit path
//! - [`AssemblyEngine`], the facade tying them together

pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod registry;
pub mod scratch;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use engine::AssemblyEngine;
pub use error::{EngineError, EngineResult};
pub use lifecycle::{LifecycleManager, RenderGuard};
pub use logging::RenderLogger;
pub use orchestrator::{RenderOptions, RenderOrchestrator, MAX_RENDER_TIMEOUT};
pub use registry::ChunkRegistry;
pub use scratch::ScratchArea;
pub use store::JobStore;
