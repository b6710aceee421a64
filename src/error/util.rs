//! Utility functions for error handling
//!
//! File-system helpers that fail with a typed error and enough context to
//! tell which input was being read and why.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::Context;

use crate::error::{Result, UnemploymentError};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.is_file() {
        return Err(UnemploymentError::NotFound(path.to_path_buf()))
            .with_context(|| format!("Expected a file for: {purpose}"));
    }

    fs::File::open(path)
        .map_err(UnemploymentError::from)
        .with_context(|| match_io_context(path, purpose))
}

/// Check that a directory exists and is readable
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(UnemploymentError::NotFound(path.to_path_buf()))
            .with_context(|| format!("Expected a directory for: {purpose}"));
    }

    fs::read_dir(path)
        .map(|_| ())
        .map_err(UnemploymentError::from)
        .with_context(|| format!("Failed to access directory {} for: {purpose}", path.display()))
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    if !path.is_file() {
        return Err(UnemploymentError::NotFound(path.to_path_buf()))
            .with_context(|| format!("Expected a file for: {purpose}"));
    }

    fs::read_to_string(path)
        .map_err(|e| {
            let context = if e.kind() == io::ErrorKind::InvalidData {
                format!(
                    "File {} contains invalid UTF-8 data - cannot read as text",
                    path.display()
                )
            } else {
                match_io_context(path, purpose)
            };
            anyhow::Error::new(UnemploymentError::from(e)).context(context)
        })
}

fn match_io_context(path: &Path, purpose: &str) -> String {
    format!("Failed to open {} for: {purpose}", path.display())
}
