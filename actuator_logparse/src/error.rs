//! Error types for log parsing and export.
//!
//! Malformed log lines are not errors; they are skipped during extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading a log or rendering its rows.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The log file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was opened
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization failed.
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}
