use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ConfigSnapshot;
use crate::scan::DocumentOutcome;

/// Lifecycle state of the scan job.
///
/// `Idle -> Running -> {Completed | Error | Stopped}`, and back to `Idle`
/// only through a reset. Starting again from a terminal state is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
    Stopped,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Idle => "IDLE",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Error => "ERROR",
            JobStatus::Stopped => "STOPPED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run document tallies. `total_scanned` is always the sum of the other three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub processed: u64,
    pub skipped: u64,
    pub errors: u64,
    pub total_scanned: u64,
}

impl Counters {
    pub fn record(&mut self, outcome: DocumentOutcome) {
        match outcome {
            DocumentOutcome::Processed => self.processed += 1,
            DocumentOutcome::Skipped => self.skipped += 1,
            DocumentOutcome::Failed => self.errors += 1,
        }
        self.total_scanned = self.processed + self.skipped + self.errors;
    }
}

/// Point-in-time view of the job returned by the status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    #[serde(flatten)]
    pub counters: Counters,
    pub elapsed_seconds: u64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub current_logs: Vec<String>,
    pub config: Option<ConfigSnapshot>,
}

/// Seconds between `start` and `end`, or between `start` and `now` while
/// the run is still going. Zero when the job never started.
pub fn elapsed_seconds(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u64 {
    match start {
        Some(start) => (end.unwrap_or(now) - start).num_seconds().max(0) as u64,
        None => 0,
    }
}
