//! Axum HTTP API server for the render service.
//!
//! This crate provides:
//! - Chunk upload, finalize, render and status endpoints over [`amux_engine`]
//! - Engine error to HTTP status mapping
//! - Request id, logging, CORS and body-limit middleware
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
