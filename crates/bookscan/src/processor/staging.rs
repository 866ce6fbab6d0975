use std::path::{Path, PathBuf};

use log::debug;

/// Path of a per-document staging file: `<dir>/temp_<id>.<extension>`.
///
/// Characters outside `[A-Za-z0-9_-]` are replaced so that a hostile id
/// can never leave the staging directory.
pub fn staging_path(dir: &Path, document_id: &str, extension: &str) -> PathBuf {
    let safe: String = document_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("temp_{}.{}", safe, extension))
}

/// A staging file that is removed when the guard goes out of scope,
/// whatever happened to the document in between.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}
