//! Job lifecycle: state machine, log buffer and status views.

pub mod controller;
pub mod log_buffer;
pub mod status;

pub use controller::JobController;
pub use log_buffer::{format_line, format_system_line, LogBuffer, LogLine};
pub use status::{Counters, JobStatus, StatusSnapshot};
