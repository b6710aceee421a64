//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use unemployment_queries::{RecordCollection, Result, UnemploymentRecord};

use arrow::record_batch::RecordBatch;

pub const STATES: [&str; 6] = ["Alabama", "California", "Iowa", "New York", "Ohio", "Texas"];

/// The three-record example used throughout the documentation
#[must_use]
pub fn example_records() -> Vec<UnemploymentRecord> {
    vec![
        UnemploymentRecord::new("CountyA", "NY", 2014, 4.0).unwrap(),
        UnemploymentRecord::new("CountyB", "NY", 2015, 6.0).unwrap(),
        UnemploymentRecord::new("CountyC", "CA", 2015, 9.0).unwrap(),
    ]
}

/// Seeded random records with rates rounded to one decimal, so that
/// threshold boundaries and ties occur
#[must_use]
pub fn random_records(seed: u64, count: usize) -> Vec<UnemploymentRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let state = STATES[rng.random_range(0..STATES.len())];
            let year = rng.random_range(2008..2020);
            let rate = (rng.random_range(0.0..16.0_f64) * 10.0).round() / 10.0;
            UnemploymentRecord::new(format!("County {i}"), state, year, rate).unwrap()
        })
        .collect()
}

#[must_use]
pub fn random_collection(seed: u64, count: usize) -> RecordCollection {
    RecordCollection::new(random_records(seed, count))
}

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Scratch directory removed on drop
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "unemployment-queries-{name}-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Write record batches to a Parquet file
pub fn write_batches(path: &Path, batches: &[RecordBatch]) -> Result<()> {
    let schema = batches
        .first()
        .map(RecordBatch::schema)
        .ok_or_else(|| anyhow::anyhow!("No batches to write"))?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;
    Ok(())
}

/// Write records to a Parquet file with the record schema
pub fn write_parquet(path: &Path, records: &[UnemploymentRecord]) -> Result<()> {
    let batch = UnemploymentRecord::to_record_batch(records)?;
    write_batches(path, &[batch])
}

/// Write records as JSON lines
pub fn write_json_lines(path: &Path, records: &[UnemploymentRecord]) -> Result<()> {
    let lines = records
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    std::fs::write(path, lines.join("\n"))?;
    Ok(())
}
