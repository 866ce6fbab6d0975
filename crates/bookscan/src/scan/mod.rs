//! Traversal engine and the pieces it is wired from.

pub mod cancel;
pub mod engine;
pub mod level;
pub mod progress;
pub mod services;

pub use cancel::CancelFlag;
pub use engine::{run_scan, ScanSettings};
pub use level::{HierarchyLabels, Role, FOLDER_DEPTH};
pub use progress::{DocumentOutcome, LogLevel, NoopProgress, ProgressEvent, ProgressReporter};
pub use services::{LiveConnector, ScanServices, ServiceConnector};
