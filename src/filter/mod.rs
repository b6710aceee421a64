//! Filtering of unemployment records
//!
//! Expressions are defined once in [`expr`] and evaluated either per record
//! or per Arrow record batch via [`batch`].

pub mod batch;
pub mod expr;

pub use batch::{BatchFilter, ExpressionFilter, evaluate_expr, filter_record_batch};
pub use expr::{Expr, Field, FieldValue, LiteralValue};
