//! Error types for report generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors raised while building, rendering or persisting reports.
///
/// The aggregator never lets these escape its event handlers; they surface
/// only from the lower-level helpers and the CLI.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid event on line {line}: {reason}")]
    InvalidEvent { line: usize, reason: String },

    #[error("Unknown reporter kind '{0}' (expected 'steps' or 'specs')")]
    UnknownReporterKind(String),
}
