// crates/server/src/routes/jobs.rs
//! API routes for job-status tracking.
//!
//! - GET    /jobs — List all tracked jobs
//! - POST   /jobs — Create a tracking record (id generated if absent)
//! - GET    /jobs/{jobId} — Current record for one job
//! - PUT    /jobs/{jobId} — Merge-write from a producer
//! - DELETE /jobs/{jobId} — Drop a record
//! - GET    /jobs/{jobId}/stream — SSE stream of record updates

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use fleet_status_types::{JobRecord, JobSnapshot, JobStatus, JobUpdate};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::generate_job_id;

/// Request body for POST /api/jobs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateJobRequest {
    /// Caller-supplied id; one is generated when absent or blank.
    pub job_id: Option<String>,
    pub message: Option<String>,
}

fn require_job_id(job_id: &str) -> Result<(), ApiError> {
    if job_id.trim().is_empty() {
        return Err(ApiError::MissingJobId);
    }
    Ok(())
}

/// GET /api/jobs — List all tracked jobs.
async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<JobSnapshot>> {
    Json(state.store.list().await)
}

/// POST /api/jobs — Create a tracking record.
///
/// A caller-supplied id that already exists returns the existing record
/// unchanged, so producers can call this idempotently before starting
/// work.
async fn create_job(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateJobRequest>>,
) -> Json<JobSnapshot> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let requested = body.job_id.filter(|id| !id.trim().is_empty());

    if let Some(job_id) = &requested {
        if let Some(record) = state.store.get(job_id).await {
            tracing::debug!(job_id = %job_id, "job already exists");
            return Json(JobSnapshot {
                job_id: job_id.clone(),
                record,
            });
        }
    }

    let job_id = requested.unwrap_or_else(generate_job_id);
    let record = state
        .store
        .put(
            &job_id,
            JobUpdate {
                status: Some(JobStatus::Queued),
                message: body.message,
                ..JobUpdate::default()
            },
        )
        .await;
    tracing::info!(job_id = %job_id, "created job");

    Json(JobSnapshot { job_id, record })
}

/// GET /api/jobs/{jobId} — Current record for one job.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    require_job_id(&job_id)?;
    match state.store.get(&job_id).await {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::JobNotFound(job_id)),
    }
}

/// PUT /api/jobs/{jobId} — Merge-write from a producer.
///
/// Creates the record on first write; `None` fields leave the stored
/// values untouched.
async fn update_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    Json(update): Json<JobUpdate>,
) -> ApiResult<Json<JobRecord>> {
    require_job_id(&job_id)?;
    let record = state.store.put(&job_id, update).await;
    tracing::debug!(job_id = %job_id, status = %record.status, "job updated");
    Ok(Json(record))
}

/// DELETE /api/jobs/{jobId} — Drop a record.
async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<StatusCode> {
    require_job_id(&job_id)?;
    if state.store.remove(&job_id).await {
        tracing::info!(job_id = %job_id, "deleted job");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::JobNotFound(job_id))
    }
}

/// GET /api/jobs/{jobId}/stream — SSE stream of record updates.
///
/// Emits the current record immediately, then one event per store write
/// for this id. The stream closes after a terminal status; an
/// already-terminal job yields exactly one event.
async fn stream_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>> {
    require_job_id(&job_id)?;

    // Subscribe before snapshotting so updates between the two are not lost.
    let mut rx = state.store.subscribe();
    let initial = state
        .store
        .get(&job_id)
        .await
        .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))?;

    let stream = async_stream::stream! {
        let terminal = initial.status.is_terminal();
        let json = serde_json::to_string(&initial).unwrap_or_default();
        yield Ok(Event::default().data(json));
        if terminal {
            return;
        }

        while let Ok(snapshot) = rx.recv().await {
            if snapshot.job_id != job_id {
                continue;
            }
            let terminal = snapshot.record.status.is_terminal();
            let json = serde_json::to_string(&snapshot.record).unwrap_or_default();
            yield Ok(Event::default().data(json));
            if terminal {
                break;
            }
        }
    };

    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("heartbeat")))
}

/// GET /api/jobs/ — Explicit rejection for a blank job id.
async fn blank_job_id() -> ApiError {
    ApiError::MissingJobId
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/", get(blank_job_id))
        .route(
            "/jobs/{job_id}",
            get(get_job).put(update_job).delete(delete_job),
        )
        .route("/jobs/{job_id}/stream", get(stream_job))
}
