use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookscanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Drive error: {0}")]
    Drive(#[from] DriveError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Invalid JSON in Service Account Key: {0}")]
    InvalidServiceAccount(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Drive API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to write download '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Uploader is not configured: missing {0}")]
    MissingCredential(&'static str),

    #[error("Failed to read image '{path}': {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Upload response did not contain a secure_url")]
    MissingUrl,
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Document not found: {0}")]
    MissingDocument(PathBuf),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to render page: {0}")]
    Render(String),

    #[error("Thumbnail upload failed: {0}")]
    Upload(#[from] UploadError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("'{0}' does not end with a JSON array")]
    NotAnArray(PathBuf),

    #[error("Failed to move '{path}' aside: {source}")]
    Quarantine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store task failed: {0}")]
    Task(String),
}

/// Failures that abort a whole run. Everything else is logged and counted.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Google Drive Auth Error: {0}")]
    Authentication(#[from] DriveError),

    #[error("Cloudinary Setup Error: {0}")]
    UploaderSetup(#[from] UploadError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JobError {
    #[error("Job is already running")]
    AlreadyRunning,

    #[error("No job running")]
    NotRunning,

    #[error("No async runtime available to run the job")]
    NoRuntime,

    #[error("Cannot reset while a job is running")]
    ResetWhileRunning,
}

pub type Result<T> = std::result::Result<T, BookscanError>;
