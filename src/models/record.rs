//! Unemployment record entity
//!
//! One observation of the unemployment rate of a county in a given year.
//! Records are validated once when they are loaded and are immutable
//! afterwards.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, FieldRef, Schema};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UnemploymentError};

/// Column holding the county name
pub const COUNTY_COLUMN: &str = "County";
/// Column holding the state name
pub const STATE_COLUMN: &str = "State";
/// Column holding the calendar year
pub const YEAR_COLUMN: &str = "Year";
/// Column holding the unemployment rate in percent
pub const RATE_COLUMN: &str = "Rate";

/// Smallest accepted calendar year
pub const MIN_YEAR: i64 = 1000;
/// Largest accepted calendar year
pub const MAX_YEAR: i64 = 9999;

/// A validated unemployment observation for a county, state and year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnemploymentRecord {
    /// County name
    #[serde(rename = "County")]
    pub county: String,
    /// State name
    #[serde(rename = "State")]
    pub state: String,
    /// Four-digit calendar year
    #[serde(rename = "Year")]
    pub year: i64,
    /// Unemployment rate in percent, never negative
    #[serde(rename = "Rate")]
    pub rate: f64,
}

impl UnemploymentRecord {
    /// Create a record, checking the field invariants
    ///
    /// A rate of `-0.0` is stored as `0.0`.
    pub fn new(
        county: impl Into<String>,
        state: impl Into<String>,
        year: i64,
        rate: f64,
    ) -> std::result::Result<Self, RecordViolation> {
        let record = Self {
            county: county.into(),
            state: state.into(),
            year,
            rate: if rate == 0.0 { 0.0 } else { rate },
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the record invariants
    pub fn validate(&self) -> std::result::Result<(), RecordViolation> {
        if self.county.trim().is_empty() {
            return Err(RecordViolation::EmptyField(COUNTY_COLUMN));
        }
        if self.state.trim().is_empty() {
            return Err(RecordViolation::EmptyField(STATE_COLUMN));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.year) {
            return Err(RecordViolation::YearOutOfRange(self.year));
        }
        if !self.rate.is_finite() {
            return Err(RecordViolation::NonFiniteRate);
        }
        if self.rate < 0.0 {
            return Err(RecordViolation::NegativeRate(self.rate));
        }
        Ok(())
    }

    /// Arrow schema used for record batches of unemployment records
    #[must_use]
    pub fn schema() -> Schema {
        Schema::new(Self::fields())
    }

    /// Arrow fields of the record schema, in column order
    #[must_use]
    pub fn fields() -> Vec<FieldRef> {
        vec![
            Arc::new(Field::new(COUNTY_COLUMN, DataType::Utf8, false)),
            Arc::new(Field::new(STATE_COLUMN, DataType::Utf8, false)),
            Arc::new(Field::new(YEAR_COLUMN, DataType::Int64, false)),
            Arc::new(Field::new(RATE_COLUMN, DataType::Float64, false)),
        ]
    }

    /// Convert records to a `RecordBatch` with the record schema
    pub fn to_record_batch(records: &[Self]) -> Result<RecordBatch> {
        let batch = serde_arrow::to_record_batch(&Self::fields(), &records)
            .map_err(UnemploymentError::from)?;
        Ok(batch)
    }
}

/// Why a row cannot become an [`UnemploymentRecord`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordViolation {
    /// A required field is absent or null
    #[error("missing field {0}")]
    MissingField(&'static str),
    /// A text field is empty
    #[error("empty field {0}")]
    EmptyField(&'static str),
    /// The year is not a four-digit calendar year
    #[error("year {0} out of range")]
    YearOutOfRange(i64),
    /// The rate is NaN or infinite
    #[error("non-finite rate")]
    NonFiniteRate,
    /// The rate is below zero
    #[error("negative rate {0}")]
    NegativeRate(f64),
}

/// An unvalidated row as read from a data source
///
/// Every field is optional so that incomplete rows can be read and then
/// rejected individually instead of failing the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "County", default)]
    pub county: Option<String>,
    #[serde(rename = "State", default)]
    pub state: Option<String>,
    #[serde(rename = "Year", default)]
    pub year: Option<i64>,
    #[serde(rename = "Rate", default)]
    pub rate: Option<f64>,
}

impl TryFrom<RawRecord> for UnemploymentRecord {
    type Error = RecordViolation;

    fn try_from(raw: RawRecord) -> std::result::Result<Self, Self::Error> {
        let county = raw.county.ok_or(RecordViolation::MissingField(COUNTY_COLUMN))?;
        let state = raw.state.ok_or(RecordViolation::MissingField(STATE_COLUMN))?;
        let year = raw.year.ok_or(RecordViolation::MissingField(YEAR_COLUMN))?;
        let rate = raw.rate.ok_or(RecordViolation::MissingField(RATE_COLUMN))?;
        Self::new(county, state, year, rate)
    }
}

impl From<&UnemploymentRecord> for RawRecord {
    fn from(record: &UnemploymentRecord) -> Self {
        Self {
            county: Some(record.county.clone()),
            state: Some(record.state.clone()),
            year: Some(record.year),
            rate: Some(record.rate),
        }
    }
}
