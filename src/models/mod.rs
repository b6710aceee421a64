//! Domain models for unemployment data

pub mod record;

pub use record::{RawRecord, RecordViolation, UnemploymentRecord};
