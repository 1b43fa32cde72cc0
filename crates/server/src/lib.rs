// crates/server/src/lib.rs
//! Fleet-status server library.
//!
//! This crate provides the Axum-based HTTP service that tracks the status
//! of long-running jobs (document extraction, bid analysis) and answers
//! the polling front-end. The job store is injected so tests and
//! alternative backings construct the app the same way the binary does.

pub mod error;
pub mod routes;
pub mod state;
pub mod store;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::api_routes;
pub use state::AppState;
pub use store::{JobStore, MemoryJobStore};

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, jobs, demo status)
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app(store: Arc<dyn JobStore>) -> Router {
    let state = AppState::new(store);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
