use std::path::PathBuf;
use thiserror::Error;

use crate::integrity::IntegrityReport;

/// The main error type for labelcurate operations.
///
/// Only whole-dataset structural problems and invalid parameters surface as
/// errors. Per-file failures are tallied inside operation reports instead.
#[derive(Debug, Error)]
pub enum CurateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset root not found: {path}")]
    DatasetRootNotFound { path: PathBuf },

    #[error("No recognised split (train, valid, test) under {path}")]
    NoSplitsFound { path: PathBuf },

    #[error("Invalid split layout at {path}: {message}")]
    SplitLayoutInvalid { path: PathBuf, message: String },

    #[error("Unknown split name '{0}' (expected train, valid/val/validation, or test)")]
    UnknownSplit(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid class map: {message}")]
    InvalidClassMap { message: String },

    #[error("Invalid prune parameters: {message}")]
    InvalidPruneParams { message: String },

    #[error("Invalid background image pool at {path}: {message}")]
    BackgroundPoolInvalid { path: PathBuf, message: String },

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[from] serde_json::Error),

    #[error("Operation finished with {failures} file failure(s)")]
    OperationIncomplete { failures: usize },

    #[error("Integrity check found {violation_count} violation(s)")]
    IntegrityCheckFailed {
        violation_count: usize,
        report: IntegrityReport,
    },
}

/// A failure isolated to a single file during a batch operation.
///
/// Batch operations record these and keep going.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}
