//! Resumable walk of the five-level hierarchy.

use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;
use tracing::Instrument;

use super::cancel::CancelFlag;
use super::level::{HierarchyLabels, Role};
use super::progress::{DocumentOutcome, LogLevel, ProgressReporter};
use super::services::ServiceConnector;
use crate::config::{AppConfig, FlatLabels, ScanConfig};
use crate::drive::{DriveItem, MimeFilter, StorageClient};
use crate::error::{DriveError, ProcessError, ScanError};
use crate::processor::{staging_path, DocumentProcessor, StagedFile};
use crate::store::{run_blocking, RecordStore, ResumeSet};

/// Where a run writes its output and intermediate files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    pub output_file: PathBuf,
    pub staging_dir: PathBuf,
    pub thumbnail_folder: String,
}

impl ScanSettings {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            output_file: config.output_file.clone(),
            staging_dir: config.staging_dir.clone(),
            thumbnail_folder: config.thumbnail_folder.clone(),
        }
    }
}

/// Runs one scan to completion or cancellation.
///
/// Only collaborator setup can fail the run. Listing, document and
/// persistence failures are reported and the walk carries on.
pub async fn run_scan(
    config: &ScanConfig,
    settings: &ScanSettings,
    connector: &dyn ServiceConnector,
    reporter: &dyn ProgressReporter,
    cancel: &CancelFlag,
) -> Result<(), ScanError> {
    reporter.log(LogLevel::Info, "Starting scan job...");

    let services = match connector.connect(config).await {
        Ok(services) => services,
        Err(e) => {
            reporter.log(LogLevel::Critical, &e.to_string());
            return Err(e);
        }
    };
    reporter.log(LogLevel::Success, "Google Drive Authenticated.");

    if let Err(e) = tokio::fs::create_dir_all(&settings.staging_dir).await {
        reporter.log(
            LogLevel::Warn,
            &format!(
                "Could not create staging directory {}: {}",
                settings.staging_dir.display(),
                e
            ),
        );
    }

    let store = RecordStore::new(&settings.output_file);
    let reader = store.clone();
    let resume = match run_blocking(move || reader.read_ids()).await {
        Ok(ids) => ids,
        Err(e) => {
            reporter.log(
                LogLevel::Warn,
                &format!("Could not read previous results ({}). Starting fresh.", e),
            );
            set_aside_unreadable(&store, reporter).await;
            ResumeSet::new()
        }
    };
    reporter.log(
        LogLevel::Info,
        &format!("Loaded {} previously processed files.", resume.len()),
    );

    let root_id = config.root_id();
    reporter.log(LogLevel::Info, &format!("Scanning from root ID: {}", root_id));

    let mut walker = Walker {
        storage: services.storage.as_ref(),
        processor: DocumentProcessor::new(
            services.renderer.clone(),
            services.uploader.clone(),
            &settings.staging_dir,
            settings.thumbnail_folder.as_str(),
        ),
        store,
        resume,
        reporter,
        cancel,
        flat_labels: &config.flat_labels,
        staging_dir: &settings.staging_dir,
    };
    walker
        .walk(root_id, Role::AcademicYear, HierarchyLabels::new())
        .await;

    reporter.log(LogLevel::Success, "Scan job finished.");
    Ok(())
}

/// Moves an unreadable store out of the way so this run writes a new one.
async fn set_aside_unreadable(store: &RecordStore, reporter: &dyn ProgressReporter) {
    let store = store.clone();
    match run_blocking(move || store.quarantine()).await {
        Ok(moved) => reporter.log(
            LogLevel::Warn,
            &format!("Previous results kept at {}.", moved.display()),
        ),
        Err(e) => reporter.log(
            LogLevel::Warn,
            &format!("Could not move previous results aside: {}", e),
        ),
    }
}

/// Children of one parent, merged across pages. `error` is set when a page
/// failed; `items` then holds what was listed before the failure.
struct Listing {
    items: Vec<DriveItem>,
    error: Option<DriveError>,
}

enum DocumentFailure {
    Download(DriveError),
    Process(ProcessError),
}

struct Walker<'a> {
    storage: &'a dyn StorageClient,
    processor: DocumentProcessor,
    store: RecordStore,
    resume: ResumeSet,
    reporter: &'a dyn ProgressReporter,
    cancel: &'a CancelFlag,
    flat_labels: &'a FlatLabels,
    staging_dir: &'a Path,
}

impl Walker<'_> {
    fn walk<'b>(
        &'b mut self,
        parent_id: &'b str,
        role: Role,
        labels: HierarchyLabels,
    ) -> BoxFuture<'b, ()> {
        let span = tracing::info_span!("scan.level", depth = role.depth(), parent = parent_id);
        Box::pin(
            async move {
                if self.cancel.is_cancelled() {
                    return;
                }

                let listing = self.list_all(parent_id, role.listing_filter()).await;
                if let Some(e) = &listing.error {
                    self.reporter.log(
                        LogLevel::Error,
                        &format!("Level {} error: {}", role.depth(), e),
                    );
                }

                let mut items = listing.items;
                if role == Role::AcademicYear
                    && items.is_empty()
                    && listing.error.is_none()
                    && !self.cancel.is_cancelled()
                {
                    self.walk_flat(parent_id).await;
                    return;
                }
                items.sort_by(|a, b| a.name.cmp(&b.name));

                let Some(next) = role.next() else {
                    for document in &items {
                        if self.cancel.is_cancelled() {
                            return;
                        }
                        self.process_document(document, &labels).await;
                    }
                    return;
                };

                for folder in &items {
                    if self.cancel.is_cancelled() {
                        return;
                    }
                    self.reporter.log(
                        LogLevel::Info,
                        &format!("Entering {}: {}", role.label(), folder.name),
                    );
                    let child_labels = labels.with(role, &folder.name);
                    self.walk(&folder.id, next, child_labels).await;
                }
            }
            .instrument(span),
        )
    }

    /// Documents directly under a root that has no sub-folders.
    async fn walk_flat(&mut self, root_id: &str) {
        self.reporter.log(
            LogLevel::Info,
            "No folders found matching the structure. Checking for PDF files...",
        );

        let listing = self.list_all(root_id, MimeFilter::Pdf).await;
        if let Some(e) = &listing.error {
            self.reporter.log(
                LogLevel::Error,
                &format!("Flat folder check failed: {}", e),
            );
        }

        let mut documents = listing.items;
        if documents.is_empty() {
            if listing.error.is_none() && !self.cancel.is_cancelled() {
                self.reporter
                    .log(LogLevel::Critical, "ABSOLUTELY NO ITEMS FOUND in this folder.");
                self.reporter
                    .log(LogLevel::Critical, "1. Confirm the Folder ID is correct.");
                self.reporter.log(
                    LogLevel::Critical,
                    "2. Confirm you shared it with the Service Account Email.",
                );
            }
            return;
        }
        documents.sort_by(|a, b| a.name.cmp(&b.name));

        self.reporter.log(
            LogLevel::Success,
            &format!(
                "FLAT FOLDER MODE: Found {} PDF files. Processing...",
                documents.len()
            ),
        );

        let labels = HierarchyLabels::flat(self.flat_labels);
        for document in &documents {
            if self.cancel.is_cancelled() {
                return;
            }
            self.process_document(document, &labels).await;
        }

        self.reporter
            .log(LogLevel::Success, "Flat folder processing complete.");
    }

    async fn list_all(&self, parent_id: &str, filter: MimeFilter) -> Listing {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            match self
                .storage
                .list(parent_id, filter, page_token.as_deref())
                .await
            {
                Ok(page) => {
                    items.extend(page.files);
                    match page.next_page_token {
                        Some(token) if !token.is_empty() => page_token = Some(token),
                        _ => break,
                    }
                }
                Err(e) => {
                    return Listing {
                        items,
                        error: Some(e),
                    }
                }
            }
        }

        Listing { items, error: None }
    }

    async fn process_document(&mut self, document: &DriveItem, labels: &HierarchyLabels) {
        if self.resume.contains(&document.id) {
            self.reporter.outcome(DocumentOutcome::Skipped);
            return;
        }

        let span = tracing::info_span!("scan.document", id = %document.id);
        let outcome = self
            .fetch_and_process(document, labels)
            .instrument(span)
            .await;
        self.reporter.outcome(outcome);
    }

    async fn fetch_and_process(
        &mut self,
        document: &DriveItem,
        labels: &HierarchyLabels,
    ) -> DocumentOutcome {
        let name = document.name.as_str();
        self.reporter
            .log(LogLevel::Info, &format!("Processing: {}", name));

        let result = {
            let local = StagedFile::new(staging_path(self.staging_dir, &document.id, "pdf"));
            match self.storage.download(&document.id, local.path()).await {
                Ok(_) => self
                    .processor
                    .process(local.path(), &document.id, name, self.reporter)
                    .await
                    .map_err(DocumentFailure::Process),
                Err(e) => Err(DocumentFailure::Download(e)),
            }
        };

        let metadata = match result {
            Ok(metadata) => metadata,
            Err(DocumentFailure::Process(e)) => {
                self.reporter.log(
                    LogLevel::Error,
                    &format!("Error processing PDF {}: {}", name, e),
                );
                self.reporter.log(
                    LogLevel::Error,
                    &format!("Failed metadata extraction: {}", name),
                );
                return DocumentOutcome::Failed;
            }
            Err(DocumentFailure::Download(e)) => {
                self.reporter
                    .log(LogLevel::Error, &format!("Error on file {}: {}", name, e));
                return DocumentOutcome::Failed;
            }
        };

        let record = labels.to_record(name, &document.id, metadata);
        let store = self.store.clone();
        if let Err(e) = run_blocking(move || store.append(&record)).await {
            self.reporter.log(
                LogLevel::Error,
                &format!("Failed to record {}: {}", name, e),
            );
            return DocumentOutcome::Failed;
        }

        self.resume.insert(document.id.clone());
        self.reporter
            .log(LogLevel::Success, &format!("Finished: {}", name));
        DocumentOutcome::Processed
    }
}
