// crates/server/src/store/mod.rs
//! Job store abstraction.
//!
//! The store holds the last-known state of each in-flight job and is the
//! single write path for whatever process performs the long-running work
//! (extraction workers in-process, or remote producers via the HTTP write
//! route). It is injected into [`crate::state::AppState`] as a trait object
//! so the in-memory backing can be swapped for a shared cache in
//! multi-process deployments without reshaping call sites.

pub mod memory;

use async_trait::async_trait;
use fleet_status_types::{JobRecord, JobSnapshot, JobStatus, JobUpdate};
use rand::Rng;
use tokio::sync::broadcast;

pub use memory::MemoryJobStore;

/// Key/value store of job records, keyed by opaque string id.
///
/// Writes are merges: `None` fields of the update leave the stored value
/// untouched, and a write to an unknown id creates the record. Last write
/// wins; there is no ordering guarantee across concurrent writers, which
/// is acceptable for a progress indicator and nothing else.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Point query. `None` means "no record for this id" — a state
    /// distinct from any [`JobStatus`] value.
    async fn get(&self, job_id: &str) -> Option<JobRecord>;

    /// Merge `update` into the record for `job_id`, creating it if absent,
    /// and stamp the record with the current time.
    async fn put(&self, job_id: &str, update: JobUpdate) -> JobRecord;

    /// Remove a record. Returns false if the id was unknown.
    async fn remove(&self, job_id: &str) -> bool;

    /// All current records, sorted by id.
    async fn list(&self) -> Vec<JobSnapshot>;

    /// Subscribe to record updates (for SSE fan-out). Every successful
    /// `put` publishes the post-merge snapshot.
    fn subscribe(&self) -> broadcast::Receiver<JobSnapshot>;

    /// Producer convenience: report progress with an optional message.
    async fn update_progress(
        &self,
        job_id: &str,
        progress: i64,
        message: Option<String>,
    ) -> JobRecord {
        let message =
            message.unwrap_or_else(|| format!("Processing... {}%", clamp_progress(progress)));
        self.put(
            job_id,
            JobUpdate {
                status: Some(JobStatus::Processing),
                message: Some(message),
                progress: Some(progress),
                ..JobUpdate::default()
            },
        )
        .await
    }

    /// Producer convenience: mark the job completed. Completion always
    /// carries progress 100.
    async fn complete(&self, job_id: &str, document_id: Option<String>) -> JobRecord {
        self.put(
            job_id,
            JobUpdate {
                status: Some(JobStatus::Completed),
                message: Some("Processing completed".to_string()),
                progress: Some(100),
                document_id,
                ..JobUpdate::default()
            },
        )
        .await
    }

    /// Producer convenience: mark the job failed, keeping the failure
    /// detail separate from the display message.
    async fn fail(&self, job_id: &str, error: String) -> JobRecord {
        self.put(
            job_id,
            JobUpdate {
                status: Some(JobStatus::Error),
                message: Some("Processing failed".to_string()),
                error: Some(error),
                ..JobUpdate::default()
            },
        )
        .await
    }
}

/// Clamp a raw progress input into the stored `[0,100]` range.
pub(crate) fn clamp_progress(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a job id of the form `job_<millis>_<suffix>`, matching the id
/// shape producers already log and the front-end displays.
pub fn generate_job_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..7)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("job_{millis}_{suffix}")
}
