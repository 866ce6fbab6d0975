use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ProcessError;

/// Counts the pages of the PDF at `path`.
pub fn count_pages(path: &Path) -> Result<u32, ProcessError> {
    let _span = tracing::info_span!("processor.pdf").entered();

    if !path.exists() {
        return Err(ProcessError::MissingDocument(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
        path: path.to_path_buf(),
        source: e,
    })?;
    let doc = lopdf::Document::load_mem(&bytes)
        .map_err(|e| ProcessError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

    let pages = doc.get_pages().len() as u32;
    if pages == 0 {
        return Err(ProcessError::PdfProcessing(
            "document has no pages".to_string(),
        ));
    }
    Ok(pages)
}

/// Zero-based index of the page used as a thumbnail: the second page when
/// there is one, otherwise the first.
pub fn representative_page(page_count: u32) -> u32 {
    if page_count >= 2 {
        1
    } else {
        0
    }
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Renders the zero-based `page_index` of `pdf_path` as a PNG at `output_path`.
    async fn render_page(
        &self,
        pdf_path: &Path,
        page_index: u32,
        output_path: &Path,
    ) -> Result<(), ProcessError>;
}

/// Renders pages with `pdftoppm` from poppler-utils.
pub struct PdftoppmRenderer {
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }
}

#[async_trait]
impl PageRenderer for PdftoppmRenderer {
    async fn render_page(
        &self,
        pdf_path: &Path,
        page_index: u32,
        output_path: &Path,
    ) -> Result<(), ProcessError> {
        // pdftoppm appends ".png" to the prefix itself
        let prefix: PathBuf = output_path.with_extension("");
        let page = (page_index + 1).to_string();

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-singlefile")
            .args(["-r", &self.dpi.to_string()])
            .args(["-f", &page, "-l", &page])
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| {
                ProcessError::Render(format!(
                    "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ProcessError::Render(format!(
                "pdftoppm failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        if !output_path.exists() {
            return Err(ProcessError::Render(
                "Failed to find rendered page image".to_string(),
            ));
        }
        Ok(())
    }
}
