use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::secrets::{resolve_secret, SecretError, SecretSource};

/// Placeholder used for hierarchy labels when documents sit directly under the root.
pub const DIRECT_LABEL: &str = "Direct";

/// Drive alias for "My Drive" of the authenticated account.
pub const DEFAULT_ROOT_ALIAS: &str = "root";

pub const SERVICE_ACCOUNT_ENV: &str = "GOOGLE_SERVICE_ACCOUNT_JSON";
pub const CLOUD_NAME_ENV: &str = "CLOUDINARY_CLOUD_NAME";
pub const API_KEY_ENV: &str = "CLOUDINARY_API_KEY";
pub const API_SECRET_ENV: &str = "CLOUDINARY_API_SECRET";

/// Process-level configuration for the scanner service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
    #[serde(default = "std::env::temp_dir")]
    pub staging_dir: PathBuf,
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    #[serde(default = "default_status_log_tail")]
    pub status_log_tail: usize,
    #[serde(default = "default_stream_poll_interval_ms")]
    pub stream_poll_interval_ms: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_thumbnail_folder")]
    pub thumbnail_folder: String,
    #[serde(default = "default_thumbnail_dpi")]
    pub thumbnail_dpi: u32,
    #[serde(default)]
    pub credentials: CredentialSources,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_output_file() -> PathBuf {
    PathBuf::from("books.json")
}

fn default_history_file() -> PathBuf {
    PathBuf::from("scan_history.json")
}

fn default_log_capacity() -> usize {
    1000
}

fn default_status_log_tail() -> usize {
    50
}

fn default_stream_poll_interval_ms() -> u64 {
    500
}

fn default_history_limit() -> usize {
    100
}

fn default_page_size() -> u32 {
    50
}

fn default_thumbnail_folder() -> String {
    "thumbnails".to_string()
}

fn default_thumbnail_dpi() -> u32 {
    72
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            output_file: default_output_file(),
            history_file: default_history_file(),
            staging_dir: std::env::temp_dir(),
            log_capacity: default_log_capacity(),
            status_log_tail: default_status_log_tail(),
            stream_poll_interval_ms: default_stream_poll_interval_ms(),
            history_limit: default_history_limit(),
            page_size: default_page_size(),
            thumbnail_folder: default_thumbnail_folder(),
            thumbnail_dpi: default_thumbnail_dpi(),
            credentials: CredentialSources::default(),
        }
    }
}

/// Fallback locations for credentials omitted from a start request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialSources {
    /// Path to a service-account key file.
    #[serde(default)]
    pub service_account_file: Option<String>,
    /// Path to a file holding the Cloudinary API secret.
    #[serde(default)]
    pub cloudinary_secret_file: Option<String>,
}

/// Body of a start request, as sent by the control surface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub service_account_json: Option<String>,
    #[serde(default)]
    pub cloudinary_cloud_name: Option<String>,
    #[serde(default)]
    pub cloudinary_api_key: Option<String>,
    #[serde(default)]
    pub cloudinary_api_secret: Option<String>,
    #[serde(default)]
    pub drive_root_id: Option<String>,
    #[serde(default)]
    pub academic_year_id: Option<String>,
    #[serde(default)]
    pub term_id: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub release_year: Option<String>,
}

pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
}

/// Hierarchy labels applied to every record produced in flat-folder mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatLabels {
    pub academic_year_id: String,
    pub term_id: String,
    pub subject_id: String,
    pub release_year: String,
}

impl Default for FlatLabels {
    fn default() -> Self {
        Self {
            academic_year_id: DIRECT_LABEL.to_string(),
            term_id: DIRECT_LABEL.to_string(),
            subject_id: DIRECT_LABEL.to_string(),
            release_year: DIRECT_LABEL.to_string(),
        }
    }
}

/// Configuration driving a single scan run.
pub struct ScanConfig {
    pub service_account_json: SecretString,
    pub cloudinary: CloudinaryCredentials,
    pub drive_root_id: Option<String>,
    pub flat_labels: FlatLabels,
}

/// Credential-free view of a [`ScanConfig`], safe for status and history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub drive_root_id: String,
    pub cloudinary_cloud_name: String,
    #[serde(flatten)]
    pub flat_labels: FlatLabels,
}

fn label_or_direct(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DIRECT_LABEL.to_string())
}

impl ScanConfig {
    /// Builds a run configuration from a start request, filling missing
    /// credentials from the configured files and the well-known env vars.
    pub fn from_request(
        request: StartRequest,
        sources: &CredentialSources,
    ) -> Result<Self, SecretError> {
        let service_account_json = resolve_secret(SecretSource {
            name: "service_account_json",
            direct: request.service_account_json.as_deref(),
            file_path: sources.service_account_file.as_deref(),
            env_var: Some(SERVICE_ACCOUNT_ENV),
        })?;
        let api_secret = resolve_secret(SecretSource {
            name: "cloudinary_api_secret",
            direct: request.cloudinary_api_secret.as_deref(),
            file_path: sources.cloudinary_secret_file.as_deref(),
            env_var: Some(API_SECRET_ENV),
        })?;

        let cloud_name = plain_or_env(request.cloudinary_cloud_name, CLOUD_NAME_ENV);
        let api_key = plain_or_env(request.cloudinary_api_key, API_KEY_ENV);

        Ok(Self {
            service_account_json,
            cloudinary: CloudinaryCredentials {
                cloud_name,
                api_key,
                api_secret,
            },
            drive_root_id: request
                .drive_root_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            flat_labels: FlatLabels {
                academic_year_id: label_or_direct(request.academic_year_id),
                term_id: label_or_direct(request.term_id),
                subject_id: label_or_direct(request.subject_id),
                release_year: label_or_direct(request.release_year),
            },
        })
    }

    /// The folder id the traversal starts from.
    pub fn root_id(&self) -> &str {
        self.drive_root_id.as_deref().unwrap_or(DEFAULT_ROOT_ALIAS)
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            drive_root_id: self.root_id().to_string(),
            cloudinary_cloud_name: self.cloudinary.cloud_name.clone(),
            flat_labels: self.flat_labels.clone(),
        }
    }
}

impl std::fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanConfig")
            .field("root_id", &self.root_id())
            .field("cloud_name", &self.cloudinary.cloud_name)
            .field("flat_labels", &self.flat_labels)
            .finish_non_exhaustive()
    }
}

fn plain_or_env(value: Option<String>, env_var: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| std::env::var(env_var).ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}
