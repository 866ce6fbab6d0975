//! Shared test utilities for bookscan integration tests.
//!
//! This module provides:
//! - In-memory fakes for the drive, uploader, renderer and service connector
//! - `TestHarness` for isolated runs against temp directories
//! - Builders for PDFs, run configurations and folder trees

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::*;
