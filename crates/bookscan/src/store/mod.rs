//! Durable output of the scanner: the record store and the run history.

pub mod history;
pub mod records;

pub use history::{HistoryEntry, HistoryLedger, RunStats};
pub use records::{Record, RecordStore, ResumeSet};

use crate::error::StoreError;

/// Runs blocking file work off the async worker threads.
pub async fn run_blocking<T, F>(work: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}
