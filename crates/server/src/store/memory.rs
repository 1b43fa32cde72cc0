// crates/server/src/store/memory.rs
//! In-memory job store backing.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fleet_status_types::{JobRecord, JobSnapshot, JobStatus, JobUpdate};
use tokio::sync::broadcast;

use super::{clamp_progress, JobStore};

/// How long completed/failed records stay queryable before the sweep
/// removes them.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(5 * 60);

struct Entry {
    record: JobRecord,
    terminal_at: Option<Instant>,
}

/// Process-scoped job store backed by a `HashMap` under a std `RwLock`.
///
/// Critical sections are short and never held across `.await`, so a std
/// lock is the right tool here. State does not survive a restart and does
/// not converge across processes; horizontal scaling needs a shared-cache
/// backing behind the same [`JobStore`] trait.
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, Entry>>,
    events_tx: broadcast::Sender<JobSnapshot>,
    retention: Duration,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Create a store with a custom terminal-record retention window.
    pub fn with_retention(retention: Duration) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            jobs: RwLock::new(HashMap::new()),
            events_tx,
            retention,
        }
    }

    /// Remove terminal records older than the retention window. Returns
    /// the number of records removed. Called periodically from the
    /// server's sweep task.
    pub fn purge_expired(&self) -> usize {
        let mut jobs = match self.jobs.write() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("RwLock poisoned purging jobs map: {e}");
                return 0;
            }
        };
        let before = jobs.len();
        let retention = self.retention;
        jobs.retain(|_, entry| {
            !entry
                .terminal_at
                .is_some_and(|at| at.elapsed() >= retention)
        });
        before - jobs.len()
    }

    fn fresh_record() -> JobRecord {
        JobRecord {
            status: JobStatus::Queued,
            message: "Job created".to_string(),
            progress: None,
            document_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            error: None,
        }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, job_id: &str) -> Option<JobRecord> {
        match self.jobs.read() {
            Ok(jobs) => jobs.get(job_id).map(|entry| entry.record.clone()),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                None
            }
        }
    }

    async fn put(&self, job_id: &str, update: JobUpdate) -> JobRecord {
        let record = {
            let mut jobs = match self.jobs.write() {
                Ok(guard) => guard,
                Err(e) => {
                    tracing::error!("RwLock poisoned writing jobs map: {e}");
                    return Self::fresh_record();
                }
            };
            let entry = jobs.entry(job_id.to_string()).or_insert_with(|| Entry {
                record: Self::fresh_record(),
                terminal_at: None,
            });

            if let Some(status) = update.status {
                entry.record.status = status;
            }
            if let Some(message) = update.message {
                entry.record.message = message;
            }
            if let Some(raw) = update.progress {
                entry.record.progress = Some(clamp_progress(raw));
            }
            if let Some(document_id) = update.document_id {
                entry.record.document_id = Some(document_id);
            }
            if let Some(error) = update.error {
                entry.record.error = Some(error);
            }
            entry.record.timestamp = chrono::Utc::now().to_rfc3339();
            entry.terminal_at = entry
                .record
                .status
                .is_terminal()
                .then(Instant::now);

            entry.record.clone()
        };

        // No subscribers is fine.
        let _ = self.events_tx.send(JobSnapshot {
            job_id: job_id.to_string(),
            record: record.clone(),
        });

        record
    }

    async fn remove(&self, job_id: &str) -> bool {
        match self.jobs.write() {
            Ok(mut jobs) => jobs.remove(job_id).is_some(),
            Err(e) => {
                tracing::error!("RwLock poisoned removing from jobs map: {e}");
                false
            }
        }
    }

    async fn list(&self) -> Vec<JobSnapshot> {
        let mut snapshots: Vec<JobSnapshot> = match self.jobs.read() {
            Ok(jobs) => jobs
                .iter()
                .map(|(job_id, entry)| JobSnapshot {
                    job_id: job_id.clone(),
                    record: entry.record.clone(),
                })
                .collect(),
            Err(e) => {
                tracing::error!("RwLock poisoned listing jobs: {e}");
                Vec::new()
            }
        };
        snapshots.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        snapshots
    }

    fn subscribe(&self) -> broadcast::Receiver<JobSnapshot> {
        self.events_tx.subscribe()
    }
}
