pub mod config;
pub mod drive;
pub mod error;
pub mod job;
pub mod processor;
pub mod scan;
pub mod secrets;
pub mod store;
pub mod upload;

pub use config::{load_config, load_config_from_env, AppConfig, ScanConfig, StartRequest};
pub use error::{
    BookscanError, ConfigError, DriveError, JobError, ProcessError, Result, ScanError, StoreError,
    UploadError,
};
pub use job::{JobController, JobStatus, StatusSnapshot};
pub use scan::{run_scan, CancelFlag, LiveConnector, ScanServices, ScanSettings, ServiceConnector};
pub use secrets::{resolve_secret, SecretError};
pub use store::{HistoryEntry, HistoryLedger, Record, RecordStore};
