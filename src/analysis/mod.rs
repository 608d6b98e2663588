//! Analyzers that turn a repository snapshot into metrics
//!
//! - [`quality`] - static metrics over file contents (parallel per file)
//! - [`activity`] - commit frequency, contributors and trend
//! - [`debt`] - technical debt ratio and critical files
//!
//! `quality` and `activity` are independent and run concurrently; `debt`
//! consumes both.

pub mod activity;
pub mod complexity;
pub mod coverage;
pub mod debt;
pub mod quality;

pub use quality::{FileMetrics, QualityReport};

use thiserror::Error;

/// Per-file failure. Recovered: the file is listed in the report
/// diagnostics and left out of every aggregate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("binary content")]
    Binary,

    #[error("not valid UTF-8 (byte {valid_up_to})")]
    InvalidEncoding { valid_up_to: usize },
}
