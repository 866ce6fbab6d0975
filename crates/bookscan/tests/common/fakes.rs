//! In-memory stand-ins for the external collaborators.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use bookscan::config::ScanConfig;
use bookscan::drive::{DriveItem, ListPage, MimeFilter, StorageClient};
use bookscan::error::{DriveError, ProcessError, ScanError, UploadError};
use bookscan::processor::PageRenderer;
use bookscan::scan::{ScanServices, ServiceConnector};
use bookscan::upload::ImageUploader;

/// A listing call as seen by the fake drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    pub parent_id: String,
    pub filter: MimeFilter,
    pub page_token: Option<String>,
}

/// Folder tree held in memory. Children are returned in insertion order,
/// `page_size` at a time, with the offset as the page token.
pub struct FakeDrive {
    folders: HashMap<String, Vec<DriveItem>>,
    documents: HashMap<String, Vec<DriveItem>>,
    contents: HashMap<String, Vec<u8>>,
    page_size: usize,
    failing_lists: HashSet<(String, Option<String>)>,
    failing_downloads: HashSet<String>,
    gate: Option<Arc<Semaphore>>,
    list_calls: Mutex<Vec<ListCall>>,
    downloads: Mutex<Vec<String>>,
    downloads_started: AtomicUsize,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self {
            folders: HashMap::new(),
            documents: HashMap::new(),
            contents: HashMap::new(),
            page_size: 50,
            failing_lists: HashSet::new(),
            failing_downloads: HashSet::new(),
            gate: None,
            list_calls: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
            downloads_started: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn add_folder(&mut self, parent_id: &str, id: &str, name: &str) {
        self.folders
            .entry(parent_id.to_string())
            .or_default()
            .push(DriveItem::new(id, name));
    }

    /// Creates the chain of folders `names` under `root_id` (reusing any
    /// that already exist) and returns the id of the deepest one.
    pub fn add_path(&mut self, root_id: &str, names: &[&str]) -> String {
        let mut parent = root_id.to_string();
        for name in names {
            let id = format!("{}/{}", parent, name);
            let exists = self
                .folders
                .get(&parent)
                .is_some_and(|children| children.iter().any(|c| c.id == id));
            if !exists {
                self.add_folder(&parent, &id, name);
            }
            parent = id;
        }
        parent
    }

    pub fn add_document(&mut self, parent_id: &str, id: &str, name: &str, bytes: Vec<u8>) {
        self.documents
            .entry(parent_id.to_string())
            .or_default()
            .push(DriveItem::new(id, name));
        self.contents.insert(id.to_string(), bytes);
    }

    /// Makes listing `parent_id` fail when asked for the page at `page_token`.
    pub fn fail_listing(&mut self, parent_id: &str, page_token: Option<&str>) {
        self.failing_lists
            .insert((parent_id.to_string(), page_token.map(str::to_string)));
    }

    pub fn fail_download(&mut self, id: &str) {
        self.failing_downloads.insert(id.to_string());
    }

    /// Every download waits for a permit from the returned semaphore.
    pub fn gate_downloads(&mut self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        gate
    }

    pub fn list_calls(&self) -> Vec<ListCall> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn downloads_started(&self) -> usize {
        self.downloads_started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageClient for FakeDrive {
    async fn list(
        &self,
        parent_id: &str,
        filter: MimeFilter,
        page_token: Option<&str>,
    ) -> Result<ListPage, DriveError> {
        self.list_calls.lock().unwrap().push(ListCall {
            parent_id: parent_id.to_string(),
            filter,
            page_token: page_token.map(str::to_string),
        });

        let key = (parent_id.to_string(), page_token.map(str::to_string));
        if self.failing_lists.contains(&key) {
            return Err(DriveError::Api {
                status: 503,
                body: format!("listing {} unavailable", parent_id),
            });
        }

        let source = match filter {
            MimeFilter::Folder => &self.folders,
            MimeFilter::Pdf => &self.documents,
        };
        let children = source.get(parent_id).cloned().unwrap_or_default();

        let start: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let end = (start + self.page_size).min(children.len());
        let files = children.get(start..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_page_token = (end < children.len()).then(|| end.to_string());

        Ok(ListPage {
            files,
            next_page_token,
        })
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, DriveError> {
        self.downloads_started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.downloads.lock().unwrap().push(file_id.to_string());

        if self.failing_downloads.contains(file_id) {
            return Err(DriveError::Api {
                status: 500,
                body: "download failed".to_string(),
            });
        }
        let bytes = self.contents.get(file_id).cloned().unwrap_or_default();
        std::fs::write(dest, &bytes).map_err(|e| DriveError::WriteFile {
            path: dest.to_path_buf(),
            source: e,
        })?;
        Ok(bytes.len() as u64)
    }
}

/// An upload as seen by the fake uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub image_path: PathBuf,
    pub public_id: String,
    pub folder: String,
}

#[derive(Default)]
pub struct FakeUploader {
    failing_ids: HashSet<String>,
    uploads: Mutex<Vec<Upload>>,
}

impl FakeUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            failing_ids: ids.iter().map(|id| id.to_string()).collect(),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageUploader for FakeUploader {
    async fn upload(
        &self,
        image_path: &Path,
        public_id: &str,
        folder: &str,
    ) -> Result<String, UploadError> {
        assert!(image_path.exists(), "thumbnail must exist while uploading");
        self.uploads.lock().unwrap().push(Upload {
            image_path: image_path.to_path_buf(),
            public_id: public_id.to_string(),
            folder: folder.to_string(),
        });

        if self.failing_ids.contains(public_id) {
            return Err(UploadError::Rejected {
                status: 400,
                body: "Invalid image file".to_string(),
            });
        }
        Ok(format!(
            "https://res.example.com/image/upload/{}/{}.png",
            folder, public_id
        ))
    }
}

/// Writes a placeholder PNG instead of rendering.
#[derive(Default)]
pub struct FakeRenderer {
    renders: Mutex<Vec<(PathBuf, u32)>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renders(&self) -> Vec<(PathBuf, u32)> {
        self.renders.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn render_page(
        &self,
        pdf_path: &Path,
        page_index: u32,
        output_path: &Path,
    ) -> Result<(), ProcessError> {
        self.renders
            .lock()
            .unwrap()
            .push((pdf_path.to_path_buf(), page_index));
        std::fs::write(output_path, b"\x89PNG\r\n\x1a\n")
            .map_err(|e| ProcessError::Render(e.to_string()))
    }
}

enum ConnectMode {
    Ready(ScanServices),
    AuthFailure,
    UploaderFailure,
}

pub struct FakeConnector {
    mode: ConnectMode,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new(
        drive: Arc<FakeDrive>,
        uploader: Arc<FakeUploader>,
        renderer: Arc<FakeRenderer>,
    ) -> Self {
        Self {
            mode: ConnectMode::Ready(ScanServices {
                storage: drive,
                uploader,
                renderer,
            }),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn failing_auth() -> Self {
        Self {
            mode: ConnectMode::AuthFailure,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn failing_uploader() -> Self {
        Self {
            mode: ConnectMode::UploaderFailure,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceConnector for FakeConnector {
    async fn connect(&self, _config: &ScanConfig) -> Result<ScanServices, ScanError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            ConnectMode::Ready(services) => Ok(services.clone()),
            ConnectMode::AuthFailure => Err(ScanError::Authentication(
                DriveError::AuthenticationFailed("invalid_grant".to_string()),
            )),
            ConnectMode::UploaderFailure => Err(ScanError::UploaderSetup(
                UploadError::MissingCredential("api_secret"),
            )),
        }
    }
}
