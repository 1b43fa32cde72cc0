// crates/client/src/poller.rs
//! Fixed-interval job status poller.
//!
//! Mirrors the front-end's status indicator contract: one immediate query
//! on activation, then one per interval; each successful result fully
//! replaces the published state; a failed poll keeps the previous state
//! visible and the cadence unchanged. Consecutive failures flip a
//! `connection_degraded` flag instead of staying silent forever.

use std::sync::Arc;
use std::time::Duration;

use fleet_status_types::JobRecord;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::source::StatusSource;

/// Default polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(8000);

/// Consecutive failures before the connection is reported degraded.
pub const DEFAULT_DEGRADED_AFTER: u32 = 3;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub degraded_after: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            degraded_after: DEFAULT_DEGRADED_AFTER,
        }
    }
}

/// Latest observation published by a poller.
#[derive(Debug, Clone, Default)]
pub struct PolledStatus {
    /// Last successfully fetched record; `None` until the first success.
    pub job: Option<JobRecord>,
    /// When the client observed `job` (client clock, not the server's).
    pub observed_at: Option<String>,
    /// True once `degraded_after` consecutive polls have failed. The
    /// last-known `job` stays published alongside it.
    pub connection_degraded: bool,
}

/// Handle to a running poller.
///
/// Dropping the handle (or calling [`stop`](Self::stop)) deactivates the
/// poller: the timer stops and an in-flight response is discarded rather
/// than published. Changing the id or interval is expressed by dropping
/// the handle and spawning a new poller.
pub struct JobPoller {
    rx: watch::Receiver<PolledStatus>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl JobPoller {
    /// Activate a poller for `job_id`.
    ///
    /// A blank id yields an inert poller: no task is spawned and no
    /// network activity ever happens, matching the front-end behavior of
    /// rendering idle until a job id exists.
    pub fn spawn(
        source: Arc<dyn StatusSource>,
        job_id: impl Into<String>,
        config: PollerConfig,
    ) -> Self {
        let job_id = job_id.into();
        let (tx, rx) = watch::channel(PolledStatus::default());
        let cancel = CancellationToken::new();

        if job_id.trim().is_empty() {
            return Self {
                rx,
                cancel,
                task: None,
            };
        }

        let token = cancel.clone();
        let task = tokio::spawn(poll_loop(source, job_id, config, tx, token));

        Self {
            rx,
            cancel,
            task: Some(task),
        }
    }

    /// The most recently published observation.
    pub fn latest(&self) -> PolledStatus {
        self.rx.borrow().clone()
    }

    /// A watch receiver for consumers that want change notifications.
    pub fn subscribe(&self) -> watch::Receiver<PolledStatus> {
        self.rx.clone()
    }

    /// Whether the polling task is still running.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Deactivate without consuming the handle. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Deactivate and wait for the polling task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop(
    source: Arc<dyn StatusSource>,
    job_id: String,
    config: PollerConfig,
    tx: watch::Sender<PolledStatus>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures: u32 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // Cancellation wins over an in-flight response: a result that
        // arrives after deactivation is discarded, not published.
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = source.fetch(&job_id) => result,
        };

        match result {
            Ok(record) => {
                failures = 0;
                tx.send_replace(PolledStatus {
                    job: Some(record),
                    observed_at: Some(chrono::Utc::now().to_rfc3339()),
                    connection_degraded: false,
                });
            }
            Err(e) => {
                failures += 1;
                tracing::debug!(job_id = %job_id, attempt = failures, error = %e, "status poll failed");
                if failures >= config.degraded_after {
                    tx.send_modify(|status| status.connection_degraded = true);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use fleet_status_types::JobStatus;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::source::SourceError;

    /// Scripted source: counts calls, optionally delays, and fails every
    /// fetch whose index falls in `[fail_first, fail_from)`.
    struct ScriptedSource {
        calls: AtomicU32,
        delay: Duration,
        fail_first: u32,
        fail_from: u32,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                delay: Duration::ZERO,
                fail_first: 0,
                fail_from: u32::MAX,
            }
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new()
            }
        }

        /// Fail the first `fail_first` fetches, then succeed.
        fn failing_first(fail_first: u32) -> Self {
            Self {
                fail_first,
                ..Self::new()
            }
        }

        /// Succeed until fetch `fail_from`, then fail forever.
        fn failing_from(fail_from: u32) -> Self {
            Self {
                fail_from,
                ..Self::new()
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(poll: u32) -> JobRecord {
            JobRecord {
                status: JobStatus::Processing,
                message: format!("poll {poll}"),
                progress: Some(poll.min(100) as u8),
                document_id: None,
                timestamp: "2026-08-06T12:00:00+00:00".to_string(),
                error: None,
            }
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(&self, _job_id: &str) -> Result<JobRecord, SourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay > Duration::ZERO {
                tokio::time::sleep(self.delay).await;
            }
            if n < self.fail_first || n >= self.fail_from {
                return Err(SourceError::Status(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ));
            }
            Ok(Self::record(n))
        }
    }

    fn spawn(source: &Arc<ScriptedSource>, job_id: &str) -> JobPoller {
        JobPoller::spawn(
            source.clone() as Arc<dyn StatusSource>,
            job_id,
            PollerConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn blank_id_is_a_no_op() {
        let source = Arc::new(ScriptedSource::new());
        let poller = spawn(&source, "   ");

        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(source.calls(), 0);
        assert!(!poller.is_active());
        assert!(poller.latest().job.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_the_interval() {
        let source = Arc::new(ScriptedSource::new());
        let poller = spawn(&source, "job-123");

        // The activation query fires at t=0.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls(), 1);

        // One more per 8000 ms tick, no extras in between.
        tokio::time::sleep(Duration::from_millis(7_000)).await;
        assert_eq!(source.calls(), 1);
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(source.calls(), 2);
        tokio::time::sleep(Duration::from_millis(8_000)).await;
        assert_eq!(source.calls(), 3);

        drop(poller);
    }

    #[tokio::test(start_paused = true)]
    async fn success_fully_replaces_published_state() {
        let source = Arc::new(ScriptedSource::new());
        let poller = spawn(&source, "job-123");

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(poller.latest().job.unwrap().message, "poll 0");

        tokio::time::sleep(Duration::from_millis(8_000)).await;
        let latest = poller.latest();
        assert_eq!(latest.job.unwrap().message, "poll 1");
        assert!(latest.observed_at.is_some());
        assert!(!latest.connection_degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn deactivation_discards_in_flight_response() {
        let source = Arc::new(ScriptedSource::with_delay(Duration::from_millis(100)));
        let poller = spawn(&source, "job-123");

        // First poll resolves at t=100 and is published.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(poller.latest().job.as_ref().unwrap().message, "poll 0");

        // The t=8000 poll is in flight at t=8050 when we deactivate.
        tokio::time::sleep(Duration::from_millis(7_900)).await;
        assert_eq!(source.calls(), 2);
        poller.stop();

        // Its response would have resolved at t=8100; it must not land.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(poller.latest().job.as_ref().unwrap().message, "poll 0");
        assert!(!poller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_polling() {
        let source = Arc::new(ScriptedSource::new());
        let poller = spawn(&source, "job-123");

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(poller);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_after_consecutive_failures() {
        let source = Arc::new(ScriptedSource::failing_first(3));
        let poller = spawn(&source, "job-123");

        // Two failures: previous (empty) state stays, not yet degraded.
        tokio::time::sleep(Duration::from_millis(8_010)).await;
        let latest = poller.latest();
        assert!(latest.job.is_none());
        assert!(!latest.connection_degraded);

        // Third consecutive failure flips the flag.
        tokio::time::sleep(Duration::from_millis(8_000)).await;
        assert!(poller.latest().connection_degraded);

        // Next success clears it and publishes a record.
        tokio::time::sleep(Duration::from_millis(8_000)).await;
        let latest = poller.latest();
        assert!(!latest.connection_degraded);
        assert_eq!(latest.job.unwrap().message, "poll 3");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_last_known_record_published() {
        // Succeed once, then fail forever.
        let source = Arc::new(ScriptedSource::failing_from(1));
        let poller = spawn(&source, "job-123");

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(poller.latest().job.as_ref().unwrap().message, "poll 0");

        // Failures leave the last-known record visible; cadence unchanged.
        tokio::time::sleep(Duration::from_millis(24_000)).await;
        let latest = poller.latest();
        assert_eq!(latest.job.unwrap().message, "poll 0");
        assert!(latest.connection_degraded);
        assert_eq!(source.calls(), 4);

        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn subscribe_sees_updates() {
        let source = Arc::new(ScriptedSource::new());
        let poller = spawn(&source, "job-123");
        let mut rx = poller.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().job.as_ref().unwrap().message, "poll 0");
    }
}
