//! Parquet file operations
//!
//! Reads unemployment records from single Parquet files or from directories
//! of them. Files of a directory are read in parallel with rayon.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use arrow::record_batch::RecordBatch;
use arrow_schema::Schema;
use indicatif::ProgressBar;
use itertools::Itertools;
use parquet::arrow::{ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder};
use parquet::schema::types::SchemaDescriptor;
use rayon::prelude::*;

use super::convert::{LoadOutcome, conform_batch, records_from_conformed};
use crate::config::LoaderConfig;
use crate::error::util::{safe_open_file, validate_directory};
use crate::error::{Result, UnemploymentError};
use crate::filter::{BatchFilter, Expr, ExpressionFilter, Field};
use crate::utils::logging::{
    create_main_progress_bar, finish_progress_bar, log_load_summary, log_operation_complete,
    log_operation_start, log_warning,
};

/// Projection onto the record columns present in a file
///
/// Returns `None` when the file has none of them, in which case every column
/// is read and the rows are later rejected as incomplete.
#[must_use]
pub fn create_projection(
    file_schema: &Schema,
    parquet_schema: &SchemaDescriptor,
) -> Option<ProjectionMask> {
    let indices = Field::ALL
        .iter()
        .filter_map(|field| file_schema.index_of(field.column_name()).ok())
        .sorted()
        .collect_vec();

    if indices.is_empty() {
        None
    } else {
        Some(ProjectionMask::roots(parquet_schema, indices))
    }
}

/// Read a Parquet file into Arrow record batches
///
/// Only the record columns are read; the batches keep the file's column types.
pub fn read_parquet(path: &Path, config: &LoaderConfig) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading parquet file", path);

    let file = safe_open_file(path, "reading parquet file")?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(UnemploymentError::from)
        .with_context(|| format!("Failed to read parquet file: {}", path.display()))?;

    let projection = create_projection(builder.schema(), builder.parquet_schema());
    if projection.is_none() {
        log_warning("No record columns found in parquet file, reading all columns", Some(path));
    }

    let mut builder = builder.with_batch_size(config.effective_batch_size());
    if let Some(mask) = projection {
        builder = builder.with_projection(mask);
    }

    let reader = builder
        .build()
        .map_err(UnemploymentError::from)
        .with_context(|| format!("Failed to build parquet reader for {}", path.display()))?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(UnemploymentError::from)
        .with_context(|| format!("Failed to read record batch from {}", path.display()))?;

    log_operation_complete("read", path, batches.len(), Some(start.elapsed()));
    Ok(batches)
}

/// Turn raw batches into validated records, optionally keeping only rows
/// that match a filter
///
/// With a filter, only the matching rows are validated; row positions in
/// errors count the rows that reached validation. `rows_read` counts every
/// row of the batches.
pub fn batches_to_records(
    batches: &[RecordBatch],
    filter: Option<&Expr>,
    config: &LoaderConfig,
) -> Result<LoadOutcome> {
    let filter = filter.cloned().map(ExpressionFilter::new);
    let mut outcome = LoadOutcome::default();
    let mut validated = 0;

    for batch in batches {
        let mut conformed = conform_batch(batch)?;
        if let Some(filter) = &filter {
            conformed = filter.filter(&conformed)?;
        }
        let mut batch_outcome = records_from_conformed(&conformed, validated, config)?;
        validated += conformed.num_rows();
        batch_outcome.summary.rows_read = batch.num_rows();
        outcome.merge(batch_outcome);
    }

    Ok(outcome)
}

/// Read and validate the records of one Parquet file
pub fn load_parquet(
    path: &Path,
    filter: Option<&Expr>,
    config: &LoaderConfig,
) -> Result<LoadOutcome> {
    let batches = read_parquet(path, config)?;
    let outcome = batches_to_records(&batches, filter, config)
        .with_context(|| format!("Invalid records in {}", path.display()))?;

    log_load_summary(&outcome.summary, path);
    Ok(outcome)
}

/// Find all Parquet files in a directory, sorted by path
pub fn find_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    log_operation_start("Searching for parquet files in", dir);
    validate_directory(dir, "finding parquet files")?;

    let parquet_files = std::fs::read_dir(dir)
        .map_err(UnemploymentError::from)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()).map_err(UnemploymentError::from))
        .filter_ok(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "parquet"))
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .sorted()
        .collect_vec();

    if parquet_files.is_empty() {
        log_warning("No Parquet files found in directory", Some(dir));
    } else {
        log_operation_complete("found", dir, parquet_files.len(), None);
    }

    Ok(parquet_files)
}

/// Load every Parquet file in a directory
///
/// Records keep file order (sorted by path) and row order within each file.
pub fn load_parquet_dir(
    dir: &Path,
    filter: Option<&Expr>,
    config: &LoaderConfig,
) -> Result<LoadOutcome> {
    let start = Instant::now();
    let files = find_parquet_files(dir)?;
    if files.is_empty() {
        return Ok(LoadOutcome::default());
    }

    let pb = if config.show_progress {
        create_main_progress_bar(files.len() as u64, Some("Loading parquet files"))
    } else {
        ProgressBar::hidden()
    };

    let load_one = |path: &PathBuf| {
        let outcome = load_parquet(path, filter, config);
        pb.inc(1);
        outcome
    };

    let results: Vec<Result<LoadOutcome>> = if config.parallel && files.len() > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build()
            .context("Failed to build loader thread pool")?;
        pool.install(|| files.par_iter().map(load_one).collect())
    } else {
        files.iter().map(load_one).collect()
    };

    let mut combined = LoadOutcome::default();
    for result in results {
        match result {
            Ok(outcome) => combined.merge(outcome),
            Err(e) => {
                pb.abandon_with_message("Failed to load parquet files");
                return Err(e);
            }
        }
    }

    finish_progress_bar(&pb, Some("Loaded parquet files"));
    log::info!(
        "Loaded {} records ({} skipped) from {} Parquet files in {:?}",
        combined.summary.loaded,
        combined.summary.skipped,
        files.len(),
        start.elapsed()
    );

    Ok(combined)
}
