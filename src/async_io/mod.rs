//! Async Parquet reading
//!
//! Streams Parquet files through the parquet crate's async reader on tokio,
//! then validates the rows exactly like the synchronous loader.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use futures::future::try_join_all;
use parquet::arrow::async_reader::ParquetRecordBatchStreamBuilder;
use tokio::fs::File;

use crate::config::LoaderConfig;
use crate::error::{Result, UnemploymentError};
use crate::filter::Expr;
use crate::loader::parquet::create_projection;
use crate::loader::{LoadOutcome, batches_to_records, find_parquet_files};
use crate::utils::logging::{log_load_summary, log_operation_complete, log_operation_start};

/// Open a Parquet file for async reading
pub async fn open_parquet_file_async(path: &Path) -> Result<File> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(UnemploymentError::NotFound(path.to_path_buf()).into());
    }
    let file = File::open(path)
        .await
        .map_err(UnemploymentError::from)
        .with_context(|| format!("Failed to open file {}", path.display()))?;
    Ok(file)
}

/// Read a Parquet file asynchronously into Arrow record batches
pub async fn read_parquet_async(path: &Path, config: &LoaderConfig) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading parquet file asynchronously", path);

    let file = open_parquet_file_async(path).await?;

    let mut builder = ParquetRecordBatchStreamBuilder::new(file)
        .await
        .map_err(UnemploymentError::from)
        .with_context(|| format!("Failed to create parquet reader for {}", path.display()))?;

    if let Some(mask) = create_projection(builder.schema(), builder.parquet_schema()) {
        builder = builder.with_projection(mask);
    }

    let stream = builder
        .with_batch_size(config.effective_batch_size())
        .build()
        .map_err(UnemploymentError::from)
        .with_context(|| format!("Failed to build parquet stream for {}", path.display()))?;

    let batches = stream
        .try_collect::<Vec<_>>()
        .await
        .map_err(UnemploymentError::from)
        .with_context(|| format!("Failed to read record batches from {}", path.display()))?;

    log_operation_complete("read", path, batches.len(), Some(start.elapsed()));
    Ok(batches)
}

/// Read and validate the records of one Parquet file asynchronously
pub async fn load_parquet_async(
    path: &Path,
    filter: Option<&Expr>,
    config: &LoaderConfig,
) -> Result<LoadOutcome> {
    let batches = read_parquet_async(path, config).await?;
    let outcome = batches_to_records(&batches, filter, config)
        .with_context(|| format!("Invalid records in {}", path.display()))?;
    log_load_summary(&outcome.summary, path);
    Ok(outcome)
}

/// Load every Parquet file in a directory concurrently
///
/// Records keep file order (sorted by path) and row order within each file.
pub async fn load_parquet_dir_async(
    dir: &Path,
    filter: Option<&Expr>,
    config: &LoaderConfig,
) -> Result<LoadOutcome> {
    let files = find_parquet_files(dir)?;
    let outcomes = try_join_all(
        files
            .iter()
            .map(|path| load_parquet_async(path, filter, config)),
    )
    .await?;

    let mut combined = LoadOutcome::default();
    for outcome in outcomes {
        combined.merge(outcome);
    }
    log::info!(
        "Loaded {} records ({} skipped) from {} Parquet files",
        combined.summary.loaded,
        combined.summary.skipped,
        files.len()
    );
    Ok(combined)
}
