// crates/client/src/source.rs
//! Where polled status comes from.
//!
//! The poller talks to a [`StatusSource`] rather than reqwest directly so
//! tests can script responses and so embedded consumers can poll an
//! in-process store through the same machinery.

use async_trait::async_trait;
use fleet_status_types::JobRecord;
use thiserror::Error;

/// Errors a single status fetch can produce.
///
/// The poller folds these into its degraded-connection tracking; they are
/// never surfaced per poll.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
}

/// A queryable source of job status.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, job_id: &str) -> Result<JobRecord, SourceError>;
}

/// HTTP status source backed by the fleet-status server's
/// `GET /api/jobs/{jobId}` endpoint.
pub struct HttpStatusSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStatusSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a preconfigured client (timeouts, proxies, TLS settings).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self, job_id: &str) -> Result<JobRecord, SourceError> {
        let url = format!("{}/api/jobs/{}", self.base_url, job_id);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        Ok(response.json::<JobRecord>().await?)
    }
}
