// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use crate::routes::demo::DemoTimeline;
use crate::store::JobStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Injected job store. In-memory by default; a shared-cache backing
    /// can be dropped in for multi-process deployments.
    pub store: Arc<dyn JobStore>,
    /// Per-id origin instants for the canned demo timeline.
    pub demo: DemoTimeline,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(store: Arc<dyn JobStore>) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            store,
            demo: DemoTimeline::new(),
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
