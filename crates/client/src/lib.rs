// crates/client/src/lib.rs
//! Polling client for the fleet-status service.
//!
//! The browser front-end polls `GET /api/jobs/{jobId}` on a fixed
//! interval; this crate gives native consumers (CLI tooling, embedded
//! dashboards, tests) the same contract: activate with a job id, read the
//! latest observation from a watch channel, drop the handle to stop.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fleet_status_client::{HttpStatusSource, JobPoller, PollerConfig, StatusSource};
//!
//! # async fn example() {
//! let source: Arc<dyn StatusSource> =
//!     Arc::new(HttpStatusSource::new("http://localhost:47810"));
//! let poller = JobPoller::spawn(source, "job-123", PollerConfig::default());
//!
//! let mut rx = poller.subscribe();
//! while rx.changed().await.is_ok() {
//!     if let Some(job) = &rx.borrow().job {
//!         println!("{}: {}", job.status, job.message);
//!     }
//! }
//! # }
//! ```

pub mod poller;
pub mod source;

pub use poller::{
    JobPoller, PolledStatus, PollerConfig, DEFAULT_DEGRADED_AFTER, DEFAULT_POLL_INTERVAL,
};
pub use source::{HttpStatusSource, SourceError, StatusSource};
