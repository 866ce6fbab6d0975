//! Isolated environment for scan and job tests.
//!
//! Every harness owns a temp directory holding the record store, the
//! history file and the staging area, so tests never share state.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use bookscan::config::{AppConfig, ScanConfig};
use bookscan::error::ScanError;
use bookscan::job::{Counters, JobController, StatusSnapshot};
use bookscan::scan::{
    run_scan, CancelFlag, LogLevel, ProgressEvent, ProgressReporter, ScanSettings,
    ServiceConnector,
};
use bookscan::store::{HistoryLedger, Record, RecordStore};

use super::fakes::{FakeConnector, FakeDrive, FakeRenderer, FakeUploader};

/// Collects everything the traversal reports.
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<(LogLevel, String)>>,
    counters: Mutex<Counters>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, m)| m).collect()
    }

    pub fn has_line(&self, level: LogLevel, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    pub fn counters(&self) -> Counters {
        *self.counters.lock().unwrap()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Log { level, message } => {
                self.lines.lock().unwrap().push((level, message));
            }
            ProgressEvent::Document(outcome) => {
                self.counters.lock().unwrap().record(outcome);
            }
        }
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub app_config: AppConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let app_config = AppConfig {
            output_file: base.join("books.json"),
            history_file: base.join("scan_history.json"),
            staging_dir: base.join("staging"),
            stream_poll_interval_ms: 10,
            ..AppConfig::default()
        };

        Self {
            temp_dir,
            app_config,
        }
    }

    pub fn base_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn output_file(&self) -> &Path {
        &self.app_config.output_file
    }

    pub fn staging_dir(&self) -> &Path {
        &self.app_config.staging_dir
    }

    pub fn settings(&self) -> ScanSettings {
        ScanSettings::from_app_config(&self.app_config)
    }

    pub fn store(&self) -> RecordStore {
        RecordStore::new(self.output_file())
    }

    pub fn records(&self) -> Vec<Record> {
        self.store().read_all().expect("Failed to read records")
    }

    /// Files left behind in the staging directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.staging_dir()) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn history(&self) -> Arc<HistoryLedger> {
        Arc::new(HistoryLedger::open(
            &self.app_config.history_file,
            self.app_config.history_limit,
        ))
    }

    pub fn controller(
        &self,
        connector: Arc<dyn ServiceConnector>,
        history: Arc<HistoryLedger>,
    ) -> Arc<JobController> {
        Arc::new(JobController::new(&self.app_config, connector).with_history(history))
    }

    /// Runs one scan directly against the fakes.
    pub async fn scan(
        &self,
        drive: Arc<FakeDrive>,
        uploader: Arc<FakeUploader>,
        config: &ScanConfig,
    ) -> (Result<(), ScanError>, RecordingReporter) {
        let connector = FakeConnector::new(drive, uploader, Arc::new(FakeRenderer::new()));
        self.scan_with(&connector, config, &CancelFlag::new()).await
    }

    pub async fn scan_with(
        &self,
        connector: &dyn ServiceConnector,
        config: &ScanConfig,
        cancel: &CancelFlag,
    ) -> (Result<(), ScanError>, RecordingReporter) {
        let reporter = RecordingReporter::default();
        let result = run_scan(config, &self.settings(), connector, &reporter, cancel).await;
        (result, reporter)
    }
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn wait_until<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("Timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Waits for the controller to leave `Running` and returns the final status.
pub async fn wait_for_finish(controller: &JobController) -> StatusSnapshot {
    wait_until("job to finish", || !controller.is_running()).await;
    controller.status()
}
