//! Expression evaluation against Arrow record batches
//!
//! Used to pre-filter data at load time. Numeric columns are compared as
//! `Float64` and text columns as `Utf8`, matching the per-record semantics of
//! [`Expr::matches`]. A null never satisfies a comparison.

use std::collections::HashSet;

use anyhow::Context;
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, StringArray};
use arrow::compute::kernels::cmp;
use arrow::compute::kernels::filter::prep_null_mask_filter;
use arrow::compute::{and, cast, not, or};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use super::expr::{Expr, Field, LiteralValue};
use crate::error::{Result, UnemploymentError};

/// Filter a record batch based on a boolean mask
///
/// # Errors
/// Returns an error if the mask length differs from the batch row count
pub fn filter_record_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    if batch.num_rows() != mask.len() {
        return Err(UnemploymentError::filter_error(format!(
            "Mask length ({}) doesn't match batch row count ({})",
            mask.len(),
            batch.num_rows()
        ))
        .into());
    }

    arrow::compute::filter_record_batch(batch, mask)
        .map_err(UnemploymentError::from)
        .with_context(|| "Failed to apply boolean filter to record batch")
}

/// Trait for objects that can filter record batches
pub trait BatchFilter: std::fmt::Debug + Send + Sync {
    /// Filter a record batch
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch>;

    /// Returns the set of column names required by this filter
    fn required_columns(&self) -> HashSet<String>;
}

/// A filter that evaluates an expression against a record batch
#[derive(Debug, Clone)]
pub struct ExpressionFilter {
    expr: Expr,
}

#[derive(Clone, Copy)]
enum Comparison {
    Eq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl ExpressionFilter {
    #[must_use]
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate the expression, returning a mask without nulls
    pub fn evaluate(&self, batch: &RecordBatch) -> Result<BooleanArray> {
        evaluate_expr(batch, &self.expr)
    }
}

impl BatchFilter for ExpressionFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mask = self.evaluate(batch)?;
        filter_record_batch(batch, &mask)
    }

    fn required_columns(&self) -> HashSet<String> {
        self.expr
            .required_fields()
            .into_iter()
            .map(|field| field.column_name().to_string())
            .collect()
    }
}

/// Evaluate an expression against a record batch
///
/// # Errors
/// Returns an error if a referenced column is missing or a kernel fails
pub fn evaluate_expr(batch: &RecordBatch, expr: &Expr) -> Result<BooleanArray> {
    let rows = batch.num_rows();
    match expr {
        Expr::AlwaysTrue => Ok(BooleanArray::from(vec![true; rows])),
        Expr::AlwaysFalse => Ok(BooleanArray::from(vec![false; rows])),
        Expr::Eq(field, literal) => compare(batch, *field, literal, Comparison::Eq),
        Expr::NotEq(field, literal) => {
            let eq = compare(batch, *field, literal, Comparison::Eq)?;
            Ok(not(&eq).map_err(UnemploymentError::from)?)
        }
        Expr::Gt(field, literal) => compare(batch, *field, literal, Comparison::Gt),
        Expr::GtEq(field, literal) => compare(batch, *field, literal, Comparison::GtEq),
        Expr::Lt(field, literal) => compare(batch, *field, literal, Comparison::Lt),
        Expr::LtEq(field, literal) => compare(batch, *field, literal, Comparison::LtEq),
        Expr::In(field, literals) => {
            let mut result = BooleanArray::from(vec![false; rows]);
            for literal in literals {
                let eq = compare(batch, *field, literal, Comparison::Eq)?;
                result = or(&result, &eq).map_err(UnemploymentError::from)?;
            }
            Ok(result)
        }
        Expr::Between(field, low, high) => {
            let lower = compare(batch, *field, low, Comparison::GtEq)?;
            let upper = compare(batch, *field, high, Comparison::LtEq)?;
            Ok(and(&lower, &upper).map_err(UnemploymentError::from)?)
        }
        Expr::And(exprs) => {
            let mut result = BooleanArray::from(vec![true; rows]);
            for expr in exprs {
                let mask = evaluate_expr(batch, expr)?;
                result = and(&result, &mask).map_err(UnemploymentError::from)?;
            }
            Ok(result)
        }
        Expr::Or(exprs) => {
            let mut result = BooleanArray::from(vec![false; rows]);
            for expr in exprs {
                let mask = evaluate_expr(batch, expr)?;
                result = or(&result, &mask).map_err(UnemploymentError::from)?;
            }
            Ok(result)
        }
        Expr::Not(expr) => {
            let mask = evaluate_expr(batch, expr)?;
            Ok(not(&mask).map_err(UnemploymentError::from)?)
        }
    }
}

fn column_for(batch: &RecordBatch, field: Field) -> Result<ArrayRef> {
    let name = field.column_name();
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| UnemploymentError::filter_error(format!("Column '{name}' not found")))?;

    let target = if field.is_numeric() {
        DataType::Float64
    } else {
        DataType::Utf8
    };

    if column.data_type() == &target {
        Ok(column.clone())
    } else {
        Ok(cast(column, &target)
            .map_err(UnemploymentError::from)
            .with_context(|| format!("Error processing column '{name}'"))?)
    }
}

fn compare(
    batch: &RecordBatch,
    field: Field,
    literal: &LiteralValue,
    comparison: Comparison,
) -> Result<BooleanArray> {
    let column = column_for(batch, field)?;

    let raw = match (field.is_numeric(), literal) {
        (true, literal) if literal.as_f64().is_some() => {
            let value = literal.as_f64().unwrap_or_default();
            apply(&column, &Float64Array::new_scalar(value), comparison)?
        }
        (false, LiteralValue::String(value)) => {
            apply(&column, &StringArray::new_scalar(value.as_str()), comparison)?
        }
        _ => BooleanArray::from(vec![false; batch.num_rows()]),
    };

    Ok(prep_null_mask_filter(&raw))
}

fn apply(
    column: &ArrayRef,
    scalar: &dyn arrow::array::Datum,
    comparison: Comparison,
) -> Result<BooleanArray> {
    let result = match comparison {
        Comparison::Eq => cmp::eq(column, scalar),
        Comparison::Gt => cmp::gt(column, scalar),
        Comparison::GtEq => cmp::gt_eq(column, scalar),
        Comparison::Lt => cmp::lt(column, scalar),
        Comparison::LtEq => cmp::lt_eq(column, scalar),
    };
    Ok(result.map_err(UnemploymentError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnemploymentRecord;

    fn sample_batch() -> RecordBatch {
        let records = vec![
            UnemploymentRecord::new("CountyA", "NY", 2014, 4.0).unwrap(),
            UnemploymentRecord::new("CountyB", "NY", 2015, 6.0).unwrap(),
            UnemploymentRecord::new("CountyC", "CA", 2015, 9.0).unwrap(),
        ];
        UnemploymentRecord::to_record_batch(&records).unwrap()
    }

    #[test]
    fn test_filter_by_rate() {
        let filter = ExpressionFilter::new(Expr::gt(Field::Rate, 5.0));
        let filtered = filter.filter(&sample_batch()).unwrap();
        assert_eq!(filtered.num_rows(), 2);
    }

    #[test]
    fn test_filter_by_year_and_state() {
        let expr = Expr::gt_eq(Field::Year, 2015).and(Expr::eq(Field::State, "NY"));
        let mask = evaluate_expr(&sample_batch(), &expr).unwrap();
        assert_eq!(mask, BooleanArray::from(vec![false, true, false]));
    }

    #[test]
    fn test_in_and_not() {
        let expr = Expr::is_in(Field::County, ["CountyA", "CountyC"]).not();
        let mask = evaluate_expr(&sample_batch(), &expr).unwrap();
        assert_eq!(mask, BooleanArray::from(vec![false, true, false]));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let batch = sample_batch();
        let projected = batch.project(&[0, 1]).unwrap();
        let err = evaluate_expr(&projected, &Expr::gt(Field::Rate, 1.0)).unwrap_err();
        assert!(err.to_string().contains("Rate"));
    }

    #[test]
    fn test_required_columns() {
        let filter = ExpressionFilter::new(Expr::between(Field::Rate, 5.0, 8.0));
        assert_eq!(
            filter.required_columns(),
            HashSet::from(["Rate".to_string()])
        );
    }
}
