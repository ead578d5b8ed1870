//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory for per-attempt scratch areas
    pub work_dir: PathBuf,
    /// Default deadline for a whole render attempt
    pub render_timeout: Duration,
    /// Maximum chunk downloads in flight during materialization
    pub materialize_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("amux"),
            render_timeout: Duration::from_secs(900), // 15 minutes
            materialize_concurrency: 4,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("AMUX_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            render_timeout: std::env::var("AMUX_RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.render_timeout),
            materialize_concurrency: std::env::var("AMUX_MATERIALIZE_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.materialize_concurrency),
        }
    }
}
