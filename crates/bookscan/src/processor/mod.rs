//! Per-document metadata extraction and thumbnail publishing.

pub mod pdf;
pub mod staging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ProcessError;
use crate::scan::{LogLevel, ProgressReporter};
use crate::upload::ImageUploader;

pub use pdf::{count_pages, representative_page, PageRenderer, PdftoppmRenderer};
pub use staging::{staging_path, StagedFile};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// What the processor extracts from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub page_count: u32,
    pub file_size_mb: u64,
    pub image_url: String,
}

/// Size in whole mebibytes, rounding halves to the nearest even number.
pub fn size_in_mb(bytes: u64) -> u64 {
    (bytes as f64 / BYTES_PER_MB).round_ties_even() as u64
}

pub struct DocumentProcessor {
    renderer: Arc<dyn PageRenderer>,
    uploader: Arc<dyn ImageUploader>,
    staging_dir: PathBuf,
    thumbnail_folder: String,
}

impl DocumentProcessor {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        uploader: Arc<dyn ImageUploader>,
        staging_dir: impl Into<PathBuf>,
        thumbnail_folder: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            uploader,
            staging_dir: staging_dir.into(),
            thumbnail_folder: thumbnail_folder.into(),
        }
    }

    /// Extracts page count and size from a downloaded PDF, renders its
    /// representative page and uploads it under `document_id`.
    ///
    /// The rendered image is always removed before returning.
    pub async fn process(
        &self,
        pdf_path: &Path,
        document_id: &str,
        display_name: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<DocumentMetadata, ProcessError> {
        let bytes = match tokio::fs::metadata(pdf_path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProcessError::MissingDocument(pdf_path.to_path_buf()));
            }
            Err(e) => {
                return Err(ProcessError::ReadDocument {
                    path: pdf_path.to_path_buf(),
                    source: e,
                })
            }
        };

        let owned = pdf_path.to_path_buf();
        let page_count = tokio::task::spawn_blocking(move || count_pages(&owned))
            .await
            .map_err(|e| ProcessError::PdfProcessing(format!("page count task failed: {}", e)))??;

        let thumbnail = StagedFile::new(staging_path(&self.staging_dir, document_id, "png"));
        self.renderer
            .render_page(pdf_path, representative_page(page_count), thumbnail.path())
            .await?;

        reporter.log(
            LogLevel::Info,
            &format!("Uploading thumbnail for {}...", display_name),
        );
        let image_url = self
            .uploader
            .upload(thumbnail.path(), document_id, &self.thumbnail_folder)
            .await?;

        Ok(DocumentMetadata {
            page_count,
            file_size_mb: size_in_mb(bytes),
            image_url,
        })
    }
}
