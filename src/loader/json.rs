//! JSON record sources
//!
//! Accepts the output of a MongoDB collection export: either one JSON array
//! of documents or one document per line. The `_id` key and any other
//! unknown keys are ignored. Numeric fields may be plain numbers, numeric
//! strings, or extended-JSON wrappers such as `{"$numberDouble": "5.3"}`.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use serde_json::Value;

use super::convert::{LoadOutcome, validate_rows};
use crate::config::LoaderConfig;
use crate::error::util::safe_read_to_string;
use crate::error::{Result, UnemploymentError};
use crate::filter::{Expr, Field};
use crate::models::RawRecord;
use crate::utils::logging::{
    create_spinner, finish_progress_bar, log_load_summary, log_operation_complete,
    log_operation_start,
};

const NUMBER_WRAPPERS: [&str; 4] = ["$numberDouble", "$numberInt", "$numberLong", "$numberDecimal"];

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Object(map) => NUMBER_WRAPPERS
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(numeric),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer(value: &Value) -> Option<i64> {
    if let Some(int) = value.as_i64() {
        return Some(int);
    }
    numeric(value)
        .filter(|number| number.is_finite() && number.fract() == 0.0)
        .map(|number| number as i64)
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Read the record fields of one JSON document
#[must_use]
pub fn raw_from_json(document: &Value) -> RawRecord {
    let field = |field: Field| document.get(field.column_name());
    RawRecord {
        county: field(Field::County).and_then(text),
        state: field(Field::State).and_then(text),
        year: field(Field::Year).and_then(integer),
        rate: field(Field::Rate).and_then(numeric),
    }
}

fn parse_documents(content: &str, config: &LoaderConfig) -> Result<Vec<RawRecord>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        let documents: Vec<Value> =
            serde_json::from_str(trimmed).map_err(UnemploymentError::from)?;
        return Ok(documents.iter().map(raw_from_json).collect());
    }

    let mut rows = Vec::new();
    for (line_number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(document) => rows.push(raw_from_json(&document)),
            // An unparsable line becomes an empty row, so it is skipped or
            // rejected like any other malformed record.
            Err(e) if config.skip_malformed => {
                log::debug!("Unparsable JSON on line {}: {e}", line_number + 1);
                rows.push(RawRecord::default());
            }
            Err(e) => {
                return Err(UnemploymentError::from(e))
                    .with_context(|| format!("Invalid JSON on line {}", line_number + 1));
            }
        }
    }
    Ok(rows)
}

/// Parse records from JSON text, optionally keeping only rows matching a filter
pub fn records_from_json_str(
    content: &str,
    filter: Option<&Expr>,
    config: &LoaderConfig,
) -> Result<LoadOutcome> {
    let rows = parse_documents(content, config)?;
    let mut outcome = validate_rows(rows, 0, config)?;
    if let Some(expr) = filter {
        outcome.records.retain(|record| expr.matches(record));
        outcome.summary.loaded = outcome.records.len();
    }
    Ok(outcome)
}

/// Read and validate the records of a JSON export file
pub fn load_json(path: &Path, filter: Option<&Expr>, config: &LoaderConfig) -> Result<LoadOutcome> {
    let start = Instant::now();
    log_operation_start("Reading JSON records from", path);

    let spinner = config
        .show_progress
        .then(|| create_spinner(Some("Parsing JSON records")));

    let content = safe_read_to_string(path, "reading JSON records")?;
    let outcome = records_from_json_str(&content, filter, config)
        .with_context(|| format!("Invalid records in {}", path.display()))?;

    if let Some(spinner) = &spinner {
        finish_progress_bar(spinner, Some("Parsed JSON records"));
    }
    log_load_summary(&outcome.summary, path);
    log_operation_complete("loaded", path, outcome.summary.loaded, Some(start.elapsed()));
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_json_numbers() {
        let document: Value = serde_json::from_str(
            r#"{"_id": {"$oid": "5f1"}, "County": "Autauga County", "State": "Alabama",
                "Year": {"$numberInt": "2015"}, "Rate": {"$numberDouble": "5.3"}}"#,
        )
        .unwrap();
        let raw = raw_from_json(&document);
        assert_eq!(raw.year, Some(2015));
        assert_eq!(raw.rate, Some(5.3));
        assert_eq!(raw.county.as_deref(), Some("Autauga County"));
    }

    #[test]
    fn test_numeric_strings_and_fractional_years() {
        let document = serde_json::json!({"County": "A", "State": "B", "Year": "2015", "Rate": "4"});
        assert_eq!(raw_from_json(&document).year, Some(2015));
        assert_eq!(raw_from_json(&document).rate, Some(4.0));

        let fractional = serde_json::json!({"Year": 2015.5});
        assert_eq!(raw_from_json(&fractional).year, None);
    }

    #[test]
    fn test_json_lines_with_bad_line() {
        let content = "{\"County\":\"A\",\"State\":\"NY\",\"Year\":2014,\"Rate\":4.0}\n\
                       not json\n\
                       \n\
                       {\"County\":\"B\",\"State\":\"NY\",\"Year\":2015,\"Rate\":\"abc\"}\n";
        let outcome = records_from_json_str(content, None, &LoaderConfig::default()).unwrap();
        assert_eq!(outcome.summary.rows_read, 3);
        assert_eq!(outcome.summary.loaded, 1);
        assert_eq!(outcome.summary.skipped, 2);
    }

    #[test]
    fn test_json_array_with_filter() {
        let content = r#"[
            {"County": "A", "State": "NY", "Year": 2014, "Rate": 4.0},
            {"County": "B", "State": "CA", "Year": 2015, "Rate": 9.0}
        ]"#;
        let filter = Expr::eq(Field::State, "CA");
        let outcome =
            records_from_json_str(content, Some(&filter), &LoaderConfig::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].county, "B");
        assert_eq!(outcome.summary.rows_read, 2);
    }

    #[test]
    fn test_strict_mode_rejects_bad_line() {
        let config = LoaderConfig {
            skip_malformed: false,
            ..LoaderConfig::default()
        };
        let err = records_from_json_str("{oops}\n", None, &config).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
