//! Progress poller for a single running import.
//!
//! [`ProgressPoller::start`] spawns one task per import. The task asks the
//! backend for a progress snapshot on a fixed interval and publishes every
//! result on an event channel. When a snapshot reports a terminal stage the
//! timer is stopped, and after a short grace period (so the final state
//! stays visible) the import-log list is fetched once more.
//!
//! ```text
//! Idle --start--> Polling --COMPLETED|FAILED--> Terminal --grace--> refresh
//!                    \__ cancel() / drop __________/__________> Cancelled
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use triage_client::config::{parse_var, ConfigError};
use triage_client::{ApiClient, ClientError};
use triage_core::import::{ImportLog, ImportProgress, ImportStage};
use triage_core::page::Page;
use triage_core::types::DbId;

/// Delay between progress requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long the terminal state stays on screen before the log refresh.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Page size used for the post-import log refresh.
pub const LOG_REFRESH_PAGE_SIZE: u32 = 20;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub grace_period: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl PollerConfig {
    /// Load timings from the process environment.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `TRIAGE_POLL_INTERVAL_MS` | `2000`  |
    /// | `TRIAGE_POLL_GRACE_MS`    | `2000`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let interval = match lookup("TRIAGE_POLL_INTERVAL_MS") {
            Some(raw) => Duration::from_millis(parse_var("TRIAGE_POLL_INTERVAL_MS", &raw)?),
            None => defaults.interval,
        };
        let grace_period = match lookup("TRIAGE_POLL_GRACE_MS") {
            Some(raw) => Duration::from_millis(parse_var("TRIAGE_POLL_GRACE_MS", &raw)?),
            None => defaults.grace_period,
        };

        // A zero period would make `tokio::time::interval` panic.
        if interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "TRIAGE_POLL_INTERVAL_MS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            interval,
            grace_period,
        })
    }
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// The two backend calls the poller needs.
#[async_trait]
pub trait ImportBackend: Send + Sync {
    async fn import_progress(&self, import_id: DbId) -> Result<ImportProgress, ClientError>;

    async fn import_logs(&self, page: u32, size: u32) -> Result<Page<ImportLog>, ClientError>;
}

#[async_trait]
impl ImportBackend for ApiClient {
    async fn import_progress(&self, import_id: DbId) -> Result<ImportProgress, ClientError> {
        ApiClient::import_progress(self, import_id).await
    }

    async fn import_logs(&self, page: u32, size: u32) -> Result<Page<ImportLog>, ClientError> {
        ApiClient::import_logs(self, page, size).await
    }
}

// ---------------------------------------------------------------------------
// Events and outcome
// ---------------------------------------------------------------------------

/// Everything a consumer of the poller can observe, in publication order.
#[derive(Debug)]
pub enum PollEvent {
    /// A fresh snapshot; replaces the previous one.
    Progress(ImportProgress),
    /// The progress request failed. Polling continues.
    FetchFailed(ClientError),
    /// The job reached `COMPLETED` or `FAILED`. No further ticks follow.
    Terminal(ImportStage),
    /// The grace period elapsed and the progress display can be dismissed.
    ProgressClosed,
    LogsRefreshed(Page<ImportLog>),
    LogsRefreshFailed(ClientError),
}

/// How a poll session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    Cancelled,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Owner's view of a running poll session.
///
/// Dropping the handle cancels the session.
pub struct PollHandle {
    import_id: DbId,
    cancel: CancellationToken,
    events: mpsc::UnboundedReceiver<PollEvent>,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn import_id(&self) -> DbId {
        self.import_id
    }

    /// Stop polling. Safe to call any number of times, including after the
    /// session has ended on its own.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Clone of the cancellation token, e.g. to wire up a signal handler.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next published event, or `None` once the session has ended and all
    /// events have been drained.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    /// Wait for the session to end.
    pub async fn finished(mut self) -> PollOutcome {
        match self.task.take() {
            Some(task) => match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(import_id = self.import_id, error = %e, "Poller task panicked");
                    PollOutcome::Cancelled
                }
            },
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

/// Polls one import job until it ends.
pub struct ProgressPoller {
    backend: Arc<dyn ImportBackend>,
    import_id: DbId,
    config: PollerConfig,
    events: mpsc::UnboundedSender<PollEvent>,
}

impl ProgressPoller {
    /// Spawn the poll loop for `import_id` and return its handle.
    ///
    /// The first request is issued one interval after this call.
    pub fn start(
        backend: Arc<dyn ImportBackend>,
        import_id: DbId,
        config: PollerConfig,
    ) -> PollHandle {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let poller = Self {
            backend,
            import_id,
            config,
            events: tx,
        };
        let task = tokio::spawn(poller.run(cancel.clone()));

        PollHandle {
            import_id,
            cancel,
            events: rx,
            task: Some(task),
        }
    }

    async fn run(self, cancel: CancellationToken) -> PollOutcome {
        tracing::info!(
            import_id = self.import_id,
            interval_ms = self.config.interval.as_millis() as u64,
            "Import progress polling started",
        );

        let stage = match self.poll_until_terminal(&cancel).await {
            Some(stage) => stage,
            None => {
                tracing::info!(import_id = self.import_id, "Import progress polling cancelled");
                return PollOutcome::Cancelled;
            }
        };

        let outcome = if stage == ImportStage::Failed {
            PollOutcome::Failed
        } else {
            PollOutcome::Completed
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(
                    import_id = self.import_id,
                    "Cancelled during grace period, skipping log refresh",
                );
                return PollOutcome::Cancelled;
            }
            _ = tokio::time::sleep(self.config.grace_period) => {}
        }

        self.publish(PollEvent::ProgressClosed);

        match self.backend.import_logs(0, LOG_REFRESH_PAGE_SIZE).await {
            Ok(page) => {
                tracing::debug!(import_id = self.import_id, logs = page.content.len(), "Import logs refreshed");
                self.publish(PollEvent::LogsRefreshed(page));
            }
            Err(e) => {
                tracing::warn!(import_id = self.import_id, error = %e, "Failed to refresh import logs");
                self.publish(PollEvent::LogsRefreshFailed(e));
            }
        }

        outcome
    }

    /// Tick until a terminal stage is seen. Returns `None` on cancellation.
    async fn poll_until_terminal(&self, cancel: &CancellationToken) -> Option<ImportStage> {
        // The timer has its own token so that stopping it on a terminal
        // stage leaves the session token (and the grace wait) untouched.
        let timer = cancel.child_token();
        let mut ticker = tokio::time::interval_at(
            Instant::now() + self.config.interval,
            self.config.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.cancelled() => return None,
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = timer.cancelled() => return None,
                fetched = self.backend.import_progress(self.import_id) => fetched,
            };

            match fetched {
                Ok(progress) => {
                    let stage = progress.current_stage;
                    let terminal = progress.is_terminal();
                    tracing::debug!(
                        import_id = self.import_id,
                        stage = ?stage,
                        progress = progress.current_progress,
                        "Import progress",
                    );
                    self.publish(PollEvent::Progress(progress));

                    if terminal {
                        timer.cancel();
                        tracing::info!(import_id = self.import_id, stage = ?stage, "Import reached terminal stage");
                        self.publish(PollEvent::Terminal(stage));
                        return Some(stage);
                    }
                }
                Err(e) => {
                    tracing::warn!(import_id = self.import_id, error = %e, "Failed to fetch import progress");
                    self.publish(PollEvent::FetchFailed(e));
                }
            }
        }
    }

    fn publish(&self, event: PollEvent) {
        // The receiver lives in the handle; if it is gone the session is
        // being cancelled anyway.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_timings_are_two_seconds() {
        let config = PollerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.grace_period, Duration::from_secs(2));
    }

    #[test]
    fn timings_can_be_overridden_in_millis() {
        let config = PollerConfig::from_lookup(lookup(&[
            ("TRIAGE_POLL_INTERVAL_MS", "500"),
            ("TRIAGE_POLL_GRACE_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.grace_period, Duration::ZERO);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = PollerConfig::from_lookup(lookup(&[("TRIAGE_POLL_INTERVAL_MS", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "TRIAGE_POLL_INTERVAL_MS",
                ..
            }
        ));
    }
}
