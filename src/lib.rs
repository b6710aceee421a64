//! Analytical queries over county unemployment records.
//!
//! Records (`County`, `State`, `Year`, `Rate`) are bulk-loaded once from
//! Parquet or JSON exports into an immutable [`RecordCollection`], and the
//! [`QuerySet`] answers eleven fixed questions over it: distinct counts,
//! threshold filters, averages, groupings and sorts.

pub mod aggregate;
pub mod async_io;
pub mod collections;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod models;
pub mod query;
pub mod utils;

// Re-export the most common types for easier use
pub use collections::RecordCollection;
pub use config::{Config, LoaderConfig, QueryConfig};
pub use error::{Result, UnemploymentError};
pub use models::{RawRecord, UnemploymentRecord};
pub use query::{
    CountyRate, QueryKind, QueryOutput, QueryReport, QuerySet, StateRate, StateTotal,
    StateYearAverage,
};

// Filtering capabilities
pub use filter::{Expr, Field, LiteralValue};

// Loading
pub use async_io::{load_parquet_async, load_parquet_dir_async, read_parquet_async};
pub use loader::{LoadOutcome, LoadSummary, load_collection, load_records};
