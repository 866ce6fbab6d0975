//! Single-flight background scan job.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::{stream, FutureExt, Stream};
use log::{error, info, warn};
use tokio::runtime::Handle;

use super::log_buffer::{format_line, format_system_line, LogBuffer};
use super::status::{elapsed_seconds, Counters, JobStatus, StatusSnapshot};
use crate::config::{AppConfig, ConfigSnapshot, ScanConfig};
use crate::error::JobError;
use crate::scan::{
    run_scan, CancelFlag, ProgressEvent, ProgressReporter, ScanSettings, ServiceConnector,
};
use crate::store::{run_blocking, HistoryEntry, HistoryLedger, RunStats};

#[derive(Debug, Default)]
struct JobState {
    status: JobStatus,
    counters: Counters,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    active_config: Option<ConfigSnapshot>,
    cancel: CancelFlag,
}

/// Owns the one scan that may run at a time, its counters and its log.
///
/// Construct one per process and share it behind an `Arc`.
pub struct JobController {
    state: Mutex<JobState>,
    logs: LogBuffer,
    connector: Arc<dyn ServiceConnector>,
    settings: ScanSettings,
    history: Option<Arc<HistoryLedger>>,
    status_log_tail: usize,
    poll_interval: Duration,
}

impl JobController {
    pub fn new(config: &AppConfig, connector: Arc<dyn ServiceConnector>) -> Self {
        Self {
            state: Mutex::new(JobState::default()),
            logs: LogBuffer::new(config.log_capacity),
            connector,
            settings: ScanSettings::from_app_config(config),
            history: None,
            status_log_tail: config.status_log_tail,
            poll_interval: Duration::from_millis(config.stream_poll_interval_ms),
        }
    }

    /// Records a summary of every finished run in `ledger`.
    pub fn with_history(mut self, ledger: Arc<HistoryLedger>) -> Self {
        self.history = Some(ledger);
        self
    }

    /// Starts a scan in the background on the current Tokio runtime.
    ///
    /// Fails with [`JobError::AlreadyRunning`] and changes nothing when a
    /// scan is in progress, or with [`JobError::NoRuntime`] outside a runtime.
    /// Otherwise counters, logs and the cancellation flag are reset before
    /// the new run begins.
    pub fn start_job(self: &Arc<Self>, config: ScanConfig) -> Result<(), JobError> {
        let runtime = Handle::try_current().map_err(|_| JobError::NoRuntime)?;
        let cancel = {
            let mut state = self.lock_state();
            if state.status == JobStatus::Running {
                return Err(JobError::AlreadyRunning);
            }

            *state = JobState {
                status: JobStatus::Running,
                start_time: Some(Utc::now()),
                active_config: Some(config.snapshot()),
                ..JobState::default()
            };
            self.logs.clear();
            self.logs.push(format_system_line("Job started."));
            state.cancel.clone()
        };

        info!("Scan job started for root {}", config.root_id());
        let controller = Arc::clone(self);
        runtime.spawn(async move { controller.run(config, cancel).await });
        Ok(())
    }

    /// Asks the running scan to stop at its next checkpoint.
    pub fn stop_job(&self) -> Result<(), JobError> {
        let state = self.lock_state();
        if state.status != JobStatus::Running {
            return Err(JobError::NotRunning);
        }
        state.cancel.cancel();
        self.logs.push(format_system_line("Stopping job..."));
        info!("Stop requested for running scan job");
        Ok(())
    }

    /// Returns to `Idle` with empty counters and logs. Refused while running.
    pub fn reset(&self) -> Result<(), JobError> {
        let mut state = self.lock_state();
        if state.status == JobStatus::Running {
            return Err(JobError::ResetWhileRunning);
        }
        *state = JobState::default();
        self.logs.clear();
        Ok(())
    }

    pub fn status(&self) -> StatusSnapshot {
        let state = self.lock_state();
        StatusSnapshot {
            status: state.status,
            counters: state.counters,
            elapsed_seconds: elapsed_seconds(state.start_time, state.end_time, Utc::now()),
            start_time: state.start_time,
            end_time: state.end_time,
            current_logs: self.logs.tail(self.status_log_tail),
            config: state.active_config.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_state().status == JobStatus::Running
    }

    /// Endless stream of log lines for one subscriber.
    ///
    /// Starts with every line still buffered, then polls for lines appended
    /// since the last one delivered. It never ends on its own, so a
    /// subscriber also sees the lines written when a run finishes.
    pub fn log_stream(self: &Arc<Self>) -> impl Stream<Item = String> + Send + 'static {
        let interval = self.poll_interval;
        let initial = (Arc::clone(self), 0u64, VecDeque::<String>::new());

        stream::unfold(initial, move |(controller, mut cursor, mut pending)| async move {
            loop {
                if let Some(line) = pending.pop_front() {
                    return Some((line, (controller, cursor, pending)));
                }

                let fresh = controller.logs.since(cursor);
                if let Some(last) = fresh.last() {
                    cursor = last.seq;
                    pending.extend(fresh.into_iter().map(|l| l.text));
                    continue;
                }

                tokio::time::sleep(interval).await;
            }
        })
    }

    async fn run(self: Arc<Self>, config: ScanConfig, cancel: CancelFlag) {
        let reporter = JobReporter { controller: &self };
        let outcome = AssertUnwindSafe(run_scan(
            &config,
            &self.settings,
            self.connector.as_ref(),
            &reporter,
            &cancel,
        ))
        .catch_unwind()
        .await;

        let (status, message) = if cancel.is_cancelled() {
            (JobStatus::Stopped, "Job stopped by user.".to_string())
        } else {
            match outcome {
                Ok(Ok(())) => (JobStatus::Completed, "Job completed successfully.".to_string()),
                Ok(Err(e)) => (JobStatus::Error, format!("Job failed: {}", e)),
                Err(_) => (
                    JobStatus::Error,
                    "Job failed: scan task panicked".to_string(),
                ),
            }
        };

        let entry = {
            let mut state = self.lock_state();
            let end_time = Utc::now();
            state.status = status;
            state.end_time = Some(end_time);
            self.logs.push(format_system_line(&message));

            HistoryEntry::new(
                config.snapshot(),
                RunStats {
                    counters: state.counters,
                    elapsed_seconds: elapsed_seconds(state.start_time, Some(end_time), end_time),
                },
                status,
                &self.settings.output_file,
            )
        };
        info!("Scan job finished with status {}: {}", status, message);

        if let Some(ledger) = &self.history {
            let ledger = Arc::clone(ledger);
            if let Err(e) = run_blocking(move || ledger.add_entry(entry)).await {
                error!("Failed to save scan history: {}", e);
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, JobState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("Job state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Feeds traversal events into the controller's log buffer and counters.
struct JobReporter<'a> {
    controller: &'a JobController,
}

impl ProgressReporter for JobReporter<'_> {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Log { level, message } => {
                log::log!(level.as_log_level(), "{}", message);
                self.controller.logs.push(format_line(level, &message));
            }
            ProgressEvent::Document(outcome) => {
                self.controller.lock_state().counters.record(outcome);
            }
        }
    }
}
