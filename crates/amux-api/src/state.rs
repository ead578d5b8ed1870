//! Application state.

use std::sync::Arc;

use amux_engine::AssemblyEngine;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub engine: Arc<AssemblyEngine>,
}

impl AppState {
    pub fn new(config: ApiConfig, engine: Arc<AssemblyEngine>) -> Self {
        Self { config, engine }
    }
}
