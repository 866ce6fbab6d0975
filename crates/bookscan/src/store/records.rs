//! Append-only JSON array of processed documents.
//!
//! The output file doubles as the resume checkpoint: every `drive_file_id` it
//! contains is considered done and is skipped by later runs.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Bytes read per step while scanning backwards for the closing bracket.
const TAIL_CHUNK: u64 = 4096;

/// One processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub drive_file_id: String,
    pub academic_year_id: String,
    pub term_id: String,
    pub subject_id: String,
    pub book_type_id: String,
    pub release_year: String,
    pub page_count: u32,
    pub file_size_mb: u64,
    pub image_url: String,
}

/// Ids of documents already present in the record store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeSet {
    ids: HashSet<String>,
}

impl ResumeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Marks an id as done. Ids are never removed during a run.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for ResumeSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the ids of every stored record.
    ///
    /// A missing or blank file yields an empty set. Content that is not a JSON
    /// array of objects is reported as an error so callers can surface it.
    pub fn read_ids(&self) -> Result<ResumeSet, StoreError> {
        let Some(content) = self.read_content()? else {
            return Ok(ResumeSet::new());
        };

        let items: Vec<serde_json::Value> = serde_json::from_str(&content)?;
        Ok(items
            .iter()
            .filter_map(|item| item.get("drive_file_id"))
            .filter_map(|id| id.as_str())
            .map(str::to_string)
            .collect())
    }

    /// Renames an unreadable store to `<name>.corrupt-<timestamp>` so the
    /// next append starts a fresh array. Returns the new location.
    pub fn quarantine(&self) -> Result<PathBuf, StoreError> {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(
            ".corrupt-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f")
        ));
        let target = self.path.with_file_name(name);

        std::fs::rename(&self.path, &target).map_err(|e| StoreError::Quarantine {
            path: self.path.clone(),
            source: e,
        })?;
        warn!(
            "Moved unreadable {} to {}",
            self.path.display(),
            target.display()
        );
        Ok(target)
    }

    /// Parses every record in the store.
    pub fn read_all(&self) -> Result<Vec<Record>, StoreError> {
        match self.read_content()? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(Vec::new()),
        }
    }

    /// Appends one record, leaving the file a valid JSON array afterwards.
    ///
    /// Only the tail of the file is rewritten: the closing `]` is located by
    /// skipping trailing whitespace, and `,\n<record>\n]` is written over it.
    pub fn append(&self, record: &Record) -> Result<(), StoreError> {
        let _span = tracing::debug_span!("store.append", id = %record.drive_file_id).entered();
        let json = serde_json::to_string_pretty(record)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;

        let len = file.metadata().map_err(|e| self.read_error(e))?.len();
        let closing = last_significant_byte(&mut file, len).map_err(|e| self.read_error(e))?;

        let (offset, tail) = match closing {
            None => (0, format!("[\n{}\n]", json)),
            Some((pos, b']')) => {
                let previous =
                    last_significant_byte(&mut file, pos).map_err(|e| self.read_error(e))?;
                match previous {
                    Some((_, b'[')) => (pos, format!("\n{}\n]", json)),
                    Some(_) => (pos, format!(",\n{}\n]", json)),
                    None => return Err(StoreError::NotAnArray(self.path.clone())),
                }
            }
            Some(_) => return Err(StoreError::NotAnArray(self.path.clone())),
        };

        file.seek(SeekFrom::Start(offset))
            .map_err(|e| self.write_error(e))?;
        file.write_all(tail.as_bytes())
            .map_err(|e| self.write_error(e))?;
        file.set_len(offset + tail.len() as u64)
            .map_err(|e| self.write_error(e))?;
        file.sync_data().map_err(|e| self.write_error(e))?;

        debug!("Appended {} to {}", record.drive_file_id, self.path.display());
        Ok(())
    }

    fn read_content(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.read_error(e)),
        }
    }

    fn read_error(&self, source: std::io::Error) -> StoreError {
        StoreError::ReadFile {
            path: self.path.clone(),
            source,
        }
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::WriteFile {
            path: self.path.clone(),
            source,
        }
    }
}

/// Finds the last non-whitespace byte strictly before `end`.
fn last_significant_byte(file: &mut File, end: u64) -> std::io::Result<Option<(u64, u8)>> {
    let mut chunk_end = end;
    let mut buf = vec![0u8; TAIL_CHUNK as usize];

    while chunk_end > 0 {
        let chunk_start = chunk_end.saturating_sub(TAIL_CHUNK);
        let chunk_len = (chunk_end - chunk_start) as usize;

        file.seek(SeekFrom::Start(chunk_start))?;
        file.read_exact(&mut buf[..chunk_len])?;

        if let Some(idx) = buf[..chunk_len]
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
        {
            return Ok(Some((chunk_start + idx as u64, buf[idx])));
        }
        chunk_end = chunk_start;
    }

    Ok(None)
}
