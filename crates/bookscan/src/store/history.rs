//! Run history ledger.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::ConfigSnapshot;
use crate::error::StoreError;
use crate::job::status::{Counters, JobStatus};

/// Final numbers of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    #[serde(flatten)]
    pub counters: Counters,
    pub elapsed_seconds: u64,
}

/// Summary of one finished run. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub config: ConfigSnapshot,
    pub stats: RunStats,
    pub status: JobStatus,
    pub output_file: String,
    pub folder_name: String,
}

impl HistoryEntry {
    pub fn new(
        config: ConfigSnapshot,
        stats: RunStats,
        status: JobStatus,
        output_file: &Path,
    ) -> Self {
        let folder_name = config.drive_root_id.clone();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            config,
            stats,
            status,
            output_file: output_file.display().to_string(),
            folder_name,
        }
    }
}

/// Newest-first list of run summaries, persisted as a JSON array.
pub struct HistoryLedger {
    path: PathBuf,
    limit: usize,
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryLedger {
    /// Opens the ledger, loading any existing entries. Unreadable content
    /// starts an empty history.
    pub fn open<P: AsRef<Path>>(path: P, limit: usize) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut entries = load_entries(&path);
        entries.truncate(limit);
        Self {
            path,
            limit,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Adds an entry at the front, drops the oldest past the limit and saves.
    pub fn add_entry(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let snapshot = {
            let mut entries = self.write_entries();
            entries.insert(0, entry);
            entries.truncate(self.limit);
            entries.clone()
        };
        self.save(&snapshot)
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.read_entries().clone()
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    /// Writes to a sibling temp file and renames it over the ledger.
    fn save(&self, entries: &[HistoryEntry]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        std::fs::write(&tmp_path, json).map_err(|e| StoreError::WriteFile {
            path: tmp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::WriteFile {
            path: self.path.clone(),
            source: e,
        })
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, Vec<HistoryEntry>> {
        match self.entries.read() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("History lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Vec<HistoryEntry>> {
        match self.entries.write() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("History lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn load_entries(path: &Path) -> Vec<HistoryEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!("Error loading history from {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    if content.trim().is_empty() {
        return Vec::new();
    }

    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!("Error loading history from {}: {}", path.display(), e);
        Vec::new()
    })
}
