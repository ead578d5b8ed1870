//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{
    finalize_job, get_job, health, list_chunks, ready, render_job, root, upload_chunk,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Short requests share the configured timeout
    let job_routes = Router::new()
        .route("/chunks/:job_id/:index", post(upload_chunk))
        .route("/jobs/:job_id", get(get_job))
        .route("/jobs/:job_id/chunks", get(list_chunks))
        .route("/jobs/:job_id/finalize", post(finalize_job))
        .layer(TimeoutLayer::new(state.config.request_timeout));

    // Renders carry their own deadline
    let render_routes = Router::new().route("/jobs/:job_id/render", post(render_job));

    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(job_routes)
        .merge(render_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Chunk bodies are bounded by the configured limit, not axum's default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
