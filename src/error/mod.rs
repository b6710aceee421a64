//! Error handling for unemployment record loading and querying.
//!
//! Typed failures are raised as [`UnemploymentError`] and carried through the
//! crate-wide [`Result`], which is an `anyhow::Result` so that file-level
//! context can be attached at the boundary where it is known.

pub mod util;

use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for unemployment record operations
#[derive(Debug, thiserror::Error)]
pub enum UnemploymentError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error decoding Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error in an Arrow compute kernel or batch construction
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error parsing JSON input or encoding a report
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error converting between record batches and records
    #[error("Record conversion error: {0}")]
    SerdeArrow(#[from] serde_arrow::Error),

    /// A row that violates the record invariants
    #[error("Invalid record at row {index}: {reason}")]
    InvalidRecord {
        /// Zero-based row position in the source
        index: usize,
        /// First invariant the row violates
        reason: String,
    },

    /// A filter expression that cannot be evaluated
    #[error("Filter error: {0}")]
    Filter(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required input path does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
}

impl UnemploymentError {
    /// Create a filter error
    pub fn filter_error(message: impl Into<String>) -> Self {
        Self::Filter(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid record error for the given row
    pub fn invalid_record(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }
}

/// Result type for crate operations
pub type Result<T> = anyhow::Result<T>;
