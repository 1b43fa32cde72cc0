// crates/types/src/lib.rs
//! Shared wire types for the Fleet AI job-status service.
//!
//! These are the JSON shapes exchanged between the status server, the
//! polling client, and the TypeScript front-end (exported via ts-rs).

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle status of a tracked job.
///
/// `Completed` and `Error` are terminal; everything else means the job is
/// still expected to make progress. Absence of a record for an id is a
/// distinct "not found" state and is never reported as `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Queued,
    Processing,
    Analyzing,
    Completed,
    Error,
}

impl JobStatus {
    /// Whether the job has reached a final state.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Analyzing => "analyzing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last-known state of a long-running job.
///
/// The job id is the lookup key, carried separately (see [`JobSnapshot`]).
/// `timestamp` is stamped by the store on every write, as an ISO-8601
/// string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub status: JobStatus,
    pub message: String,
    /// Percentage in `[0,100]`; clamped on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Document produced or processed by the job, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub timestamp: String,
    /// Failure detail, set when a producer marks the job failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Partial write merged into a [`JobRecord`] by the store.
///
/// `None` fields are left untouched. `progress` is accepted as a raw
/// integer and clamped into `[0,100]` at merge time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A record together with its id, as returned by list endpoints and
/// streamed over SSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: String,
    #[serde(flatten)]
    pub record: JobRecord,
}
