//! API route handlers for the fleet-status server.

pub mod demo;
pub mod health;
pub mod jobs;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET /api/health - Health check
/// - GET /api/jobs - List all tracked jobs
/// - POST /api/jobs - Create a tracking record
/// - GET /api/jobs/{jobId} - Current record for one job
/// - PUT /api/jobs/{jobId} - Merge-write from a producer
/// - DELETE /api/jobs/{jobId} - Drop a record
/// - GET /api/jobs/{jobId}/stream - SSE stream of record updates
/// - GET /api/status/get - Fabricated demo timeline status
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", jobs::router())
        .nest("/api", demo::router())
        .with_state(state)
}
