//! Bulk loading of unemployment records
//!
//! Records are read once from Parquet files, directories of Parquet files,
//! or JSON exports, validated, and handed to the query layer as an
//! immutable [`RecordCollection`]. Rows that violate the record invariants
//! are skipped (the default) or rejected here, never inside queries.

pub mod convert;
pub mod json;
pub mod parquet;

use std::path::Path;

use crate::collections::RecordCollection;
use crate::config::LoaderConfig;
use crate::error::{Result, UnemploymentError};
use crate::filter::Expr;

pub use self::convert::{LoadOutcome, LoadSummary, conform_batch, records_from_batch, validate_rows};
pub use self::json::{load_json, records_from_json_str};
pub use self::parquet::{
    batches_to_records, find_parquet_files, load_parquet, load_parquet_dir, read_parquet,
};

/// Supported input layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// A directory of Parquet files
    ParquetDir,
    /// A single Parquet file
    Parquet,
    /// A JSON array or JSON-lines export
    Json,
}

impl SourceFormat {
    /// Detect the format of a path from its type and extension
    pub fn detect(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(Self::ParquetDir);
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => Ok(Self::Parquet),
            Some(ext)
                if ["json", "jsonl", "ndjson"]
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known)) =>
            {
                Ok(Self::Json)
            }
            _ => Err(UnemploymentError::config_error(format!(
                "Cannot determine record format of {}",
                path.display()
            ))
            .into()),
        }
    }
}

/// Load records from any supported source
pub fn load_records(
    path: &Path,
    filter: Option<&Expr>,
    config: &LoaderConfig,
) -> Result<LoadOutcome> {
    config.validate()?;
    match SourceFormat::detect(path)? {
        SourceFormat::ParquetDir => load_parquet_dir(path, filter, config),
        SourceFormat::Parquet => load_parquet(path, filter, config),
        SourceFormat::Json => load_json(path, filter, config),
    }
}

/// Load records from any supported source into a collection
pub fn load_collection(path: &Path, config: &LoaderConfig) -> Result<RecordCollection> {
    let outcome = load_records(path, None, config)?;
    Ok(RecordCollection::new(outcome.records))
}
