//! Conversion of record batches and raw rows into validated records

use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, Int64Array, new_null_array};
use arrow::compute::cast;
use arrow::datatypes::Float64Type;
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Schema};

use crate::config::LoaderConfig;
use crate::error::{Result, UnemploymentError};
use crate::filter::Field;
use crate::models::{RawRecord, UnemploymentRecord};

/// Records accepted from a source together with load statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub records: Vec<UnemploymentRecord>,
    pub summary: LoadSummary,
}

/// Row counts of a load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Rows read from the source, including rows dropped by a load filter
    pub rows_read: usize,
    /// Rows that became records
    pub loaded: usize,
    /// Malformed rows that were skipped
    pub skipped: usize,
}

impl LoadOutcome {
    /// Append another outcome, keeping record order
    pub fn merge(&mut self, other: Self) {
        self.records.extend(other.records);
        self.summary.rows_read += other.summary.rows_read;
        self.summary.loaded += other.summary.loaded;
        self.summary.skipped += other.summary.skipped;
    }
}

fn target_type(field: Field) -> DataType {
    match field {
        Field::County | Field::State => DataType::Utf8,
        Field::Year => DataType::Int64,
        Field::Rate => DataType::Float64,
    }
}

/// Cast a year column to `Int64` through `Float64`
///
/// Values that are fractional, non-finite or unparsable become null rather
/// than being truncated.
#[allow(clippy::cast_possible_truncation)]
fn cast_year(column: &ArrayRef) -> Result<ArrayRef> {
    let as_float = cast(column, &DataType::Float64).map_err(UnemploymentError::from)?;
    let years: Int64Array = as_float
        .as_primitive::<Float64Type>()
        .iter()
        .map(|value| {
            value
                .filter(|year| year.is_finite() && year.fract() == 0.0)
                .filter(|year| year.abs() <= i64::MAX as f64)
                .map(|year| year as i64)
        })
        .collect();
    Ok(Arc::new(years))
}

/// Project and cast a batch to the record columns
///
/// Missing columns become all-null, other column types are cast to the record
/// types, and values that cannot be cast become null. Years are never
/// truncated: a fractional year becomes null. Extra columns are dropped.
pub fn conform_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    let rows = batch.num_rows();
    let mut fields = Vec::with_capacity(Field::ALL.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(Field::ALL.len());

    for field in Field::ALL {
        let data_type = target_type(field);
        let column = match batch.column_by_name(field.column_name()) {
            Some(column) if column.data_type() == &data_type => column.clone(),
            Some(column) if field == Field::Year => cast_year(column)?,
            Some(column) => cast(column, &data_type).map_err(UnemploymentError::from)?,
            None => new_null_array(&data_type, rows),
        };
        fields.push(arrow_schema::Field::new(field.column_name(), data_type, true));
        columns.push(column);
    }

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .map_err(UnemploymentError::from)?;
    Ok(batch)
}

/// Validate raw rows, skipping or rejecting malformed ones
///
/// `first_index` is the source position of the first row and is used in
/// error messages.
pub fn validate_rows(
    rows: Vec<RawRecord>,
    first_index: usize,
    config: &LoaderConfig,
) -> Result<LoadOutcome> {
    let mut outcome = LoadOutcome {
        records: Vec::with_capacity(rows.len()),
        summary: LoadSummary {
            rows_read: rows.len(),
            ..LoadSummary::default()
        },
    };

    for (offset, raw) in rows.into_iter().enumerate() {
        match UnemploymentRecord::try_from(raw) {
            Ok(record) => outcome.records.push(record),
            Err(violation) if config.skip_malformed => {
                log::debug!("Skipping row {}: {violation}", first_index + offset);
                outcome.summary.skipped += 1;
            }
            Err(violation) => {
                return Err(
                    UnemploymentError::invalid_record(first_index + offset, violation.to_string())
                        .into(),
                );
            }
        }
    }

    outcome.summary.loaded = outcome.records.len();
    Ok(outcome)
}

/// Convert a batch of any compatible schema into validated records
pub fn records_from_batch(
    batch: &RecordBatch,
    first_index: usize,
    config: &LoaderConfig,
) -> Result<LoadOutcome> {
    let conformed = conform_batch(batch)?;
    records_from_conformed(&conformed, first_index, config)
}

pub(crate) fn records_from_conformed(
    conformed: &RecordBatch,
    first_index: usize,
    config: &LoaderConfig,
) -> Result<LoadOutcome> {
    let rows: Vec<RawRecord> =
        serde_arrow::from_record_batch(conformed).map_err(UnemploymentError::from)?;
    validate_rows(rows, first_index, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int32Array, StringArray};

    fn loose_batch() -> RecordBatch {
        let schema = Schema::new(vec![
            arrow_schema::Field::new("_id", DataType::Utf8, false),
            arrow_schema::Field::new("County", DataType::Utf8, true),
            arrow_schema::Field::new("State", DataType::Utf8, true),
            arrow_schema::Field::new("Year", DataType::Int32, true),
            arrow_schema::Field::new("Rate", DataType::Utf8, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["a", "b", "c"])),
                Arc::new(StringArray::from(vec![Some("A"), Some("B"), None])),
                Arc::new(StringArray::from(vec!["NY", "NY", "CA"])),
                Arc::new(Int32Array::from(vec![2014, 2015, 2015])),
                Arc::new(StringArray::from(vec!["4.5", "n/a", "9"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_conform_casts_and_drops_extra_columns() {
        let conformed = conform_batch(&loose_batch()).unwrap();
        assert_eq!(conformed.num_columns(), 4);
        assert_eq!(conformed.schema().field(2).data_type(), &DataType::Int64);
        let rates = conformed
            .column(3)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(rates.value(0), 4.5);
        assert!(rates.is_null(1));
    }

    #[test]
    fn test_fractional_years_become_null() {
        let schema = Schema::new(vec![
            arrow_schema::Field::new("County", DataType::Utf8, true),
            arrow_schema::Field::new("State", DataType::Utf8, true),
            arrow_schema::Field::new("Year", DataType::Utf8, true),
            arrow_schema::Field::new("Rate", DataType::Float64, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["A", "B", "C", "D"])),
                Arc::new(StringArray::from(vec!["NY", "NY", "CA", "CA"])),
                Arc::new(StringArray::from(vec!["2015.0", "2015.7", "2016", "NaN"])),
                Arc::new(Float64Array::from(vec![4.0, 5.0, 6.0, 7.0])),
            ],
        )
        .unwrap();

        let conformed = conform_batch(&batch).unwrap();
        let years = conformed
            .column(2)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(years.value(0), 2015);
        assert!(years.is_null(1));
        assert_eq!(years.value(2), 2016);
        assert!(years.is_null(3));

        let outcome = records_from_batch(&batch, 0, &LoaderConfig::default()).unwrap();
        assert_eq!(outcome.summary.loaded, 2);
        assert_eq!(outcome.summary.skipped, 2);
    }

    #[test]
    fn test_missing_column_becomes_null() {
        let batch = loose_batch().project(&[1, 2, 3]).unwrap();
        let outcome = records_from_batch(&batch, 0, &LoaderConfig::default()).unwrap();
        assert_eq!(outcome.summary.rows_read, 3);
        assert_eq!(outcome.summary.loaded, 0);
        assert_eq!(outcome.summary.skipped, 3);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let outcome = records_from_batch(&loose_batch(), 0, &LoaderConfig::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].county, "A");
        assert_eq!(outcome.summary.skipped, 2);
    }

    #[test]
    fn test_strict_mode_reports_row() {
        let config = LoaderConfig {
            skip_malformed: false,
            ..LoaderConfig::default()
        };
        let err = records_from_batch(&loose_batch(), 10, &config).unwrap_err();
        match err.downcast_ref::<UnemploymentError>() {
            Some(UnemploymentError::InvalidRecord { index, reason }) => {
                assert_eq!(*index, 11);
                assert!(reason.contains("Rate"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
