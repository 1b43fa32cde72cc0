// crates/server/src/routes/demo.rs
//! Canned status timeline for front-end demos.
//!
//! `GET /api/status/get` does not read real job state: it fabricates a
//! plausible extraction run from wall-clock time elapsed since the first
//! query for an id, completing after five minutes. The front-end demo
//! flow and its fixtures depend on the exact band boundaries and wording
//! below; real progress reporting goes through the job store instead.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use fleet_status_types::JobStatus;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::state::AppState;

/// Full span of the fabricated run: elapsed/span maps to percent done.
const DEMO_SPAN_MS: u128 = 300_000;

/// Fallback id when the query parameter is absent.
const DEFAULT_DEMO_JOB_ID: &str = "demo";

/// First-query instants per demo id, so progress is stable across polls.
pub struct DemoTimeline {
    started: RwLock<HashMap<String, Instant>>,
}

impl DemoTimeline {
    pub fn new() -> Self {
        Self {
            started: RwLock::new(HashMap::new()),
        }
    }

    /// Time since the first query for `job_id`, zero on the first call.
    fn elapsed(&self, job_id: &str) -> Duration {
        let now = Instant::now();
        let mut started = match self.started.write() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("RwLock poisoned reading demo timeline: {e}");
                return Duration::ZERO;
            }
        };
        let origin = started.entry(job_id.to_string()).or_insert(now);
        now.duration_since(*origin)
    }
}

impl Default for DemoTimeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Map elapsed time onto the fabricated progress bands.
fn timeline_at(elapsed: Duration) -> (JobStatus, &'static str, u8) {
    let pct = ((elapsed.as_millis() * 100) / DEMO_SPAN_MS).min(100) as u8;
    match pct {
        100 => (JobStatus::Completed, "Analysis complete", 100),
        60..=99 => (JobStatus::Processing, "Generating insights...", pct),
        25..=59 => (JobStatus::Analyzing, "AI analyzing bid data...", pct),
        _ => (JobStatus::Processing, "Processing fuel bids...", pct),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoStatusQuery {
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DemoStatusResponse {
    pub status: JobStatus,
    pub message: String,
    pub progress: u8,
    pub job_id: String,
}

/// GET /api/status/get — Fabricated status for the demo flow.
pub async fn demo_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DemoStatusQuery>,
) -> Json<DemoStatusResponse> {
    let job_id = query
        .job_id
        .unwrap_or_else(|| DEFAULT_DEMO_JOB_ID.to_string());
    let (status, message, progress) = timeline_at(state.demo.elapsed(&job_id));

    Json(DemoStatusResponse {
        status,
        message: message.to_string(),
        progress,
        job_id,
    })
}

/// Build the demo status router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/status/get", get(demo_status))
}
