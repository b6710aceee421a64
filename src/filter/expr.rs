//! Filter expressions over unemployment record fields
//!
//! An [`Expr`] describes a row predicate once and can be evaluated either
//! against a single [`UnemploymentRecord`] or, through
//! [`super::batch::ExpressionFilter`], against a whole Arrow record batch.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::UnemploymentError;
use crate::models::UnemploymentRecord;
use crate::models::record::{COUNTY_COLUMN, RATE_COLUMN, STATE_COLUMN, YEAR_COLUMN};

/// A field of an unemployment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    County,
    State,
    Year,
    Rate,
}

impl Field {
    /// All fields in column order
    pub const ALL: [Self; 4] = [Self::County, Self::State, Self::Year, Self::Rate];

    /// Column name of the field in every serialized form
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::County => COUNTY_COLUMN,
            Self::State => STATE_COLUMN,
            Self::Year => YEAR_COLUMN,
            Self::Rate => RATE_COLUMN,
        }
    }

    /// Whether the field holds a number
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Year | Self::Rate)
    }

    /// Read the field from a record
    #[must_use]
    pub fn value(self, record: &UnemploymentRecord) -> FieldValue<'_> {
        match self {
            Self::County => FieldValue::Text(&record.county),
            Self::State => FieldValue::Text(&record.state),
            #[allow(clippy::cast_precision_loss)]
            Self::Year => FieldValue::Number(record.year as f64),
            Self::Rate => FieldValue::Number(record.rate),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Field {
    type Err = UnemploymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.column_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnemploymentError::filter_error(format!("Unknown field '{s}'")))
    }
}

/// A borrowed field value of a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

/// Represents a literal value that can be used in filter expressions
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Integer value
    Int(i64),

    /// Floating point value
    Float(f64),

    /// String value
    String(String),
}

impl LiteralValue {
    /// Numeric view of the literal, `None` for strings
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::String(_) => None,
        }
    }

    /// Compare a field value with this literal
    ///
    /// Returns `None` when the two are of different kinds, so that a text
    /// literal never matches a numeric field and vice versa.
    fn compare(&self, value: FieldValue<'_>) -> Option<Ordering> {
        match (value, self) {
            (FieldValue::Text(text), Self::String(literal)) => Some(text.cmp(literal.as_str())),
            (FieldValue::Number(number), literal) => {
                literal.as_f64().and_then(|v| number.partial_cmp(&v))
            }
            (FieldValue::Text(_), _) => None,
        }
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Represents a filter expression over record fields
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Field equals a literal value
    Eq(Field, LiteralValue),

    /// Field not equals a literal value
    NotEq(Field, LiteralValue),

    /// Field is greater than a literal value
    Gt(Field, LiteralValue),

    /// Field is greater than or equal to a literal value
    GtEq(Field, LiteralValue),

    /// Field is less than a literal value
    Lt(Field, LiteralValue),

    /// Field is less than or equal to a literal value
    LtEq(Field, LiteralValue),

    /// Field is in a set of values
    In(Field, Vec<LiteralValue>),

    /// Field lies between two values, both ends inclusive
    Between(Field, LiteralValue, LiteralValue),

    /// Logical AND of expressions
    And(Vec<Expr>),

    /// Logical OR of expressions
    Or(Vec<Expr>),

    /// Logical NOT of an expression
    Not(Box<Expr>),

    /// Always evaluates to true
    AlwaysTrue,

    /// Always evaluates to false
    AlwaysFalse,
}

impl Expr {
    #[must_use]
    pub fn eq(field: Field, value: impl Into<LiteralValue>) -> Self {
        Self::Eq(field, value.into())
    }

    #[must_use]
    pub fn not_eq(field: Field, value: impl Into<LiteralValue>) -> Self {
        Self::NotEq(field, value.into())
    }

    #[must_use]
    pub fn gt(field: Field, value: impl Into<LiteralValue>) -> Self {
        Self::Gt(field, value.into())
    }

    #[must_use]
    pub fn gt_eq(field: Field, value: impl Into<LiteralValue>) -> Self {
        Self::GtEq(field, value.into())
    }

    #[must_use]
    pub fn lt(field: Field, value: impl Into<LiteralValue>) -> Self {
        Self::Lt(field, value.into())
    }

    #[must_use]
    pub fn lt_eq(field: Field, value: impl Into<LiteralValue>) -> Self {
        Self::LtEq(field, value.into())
    }

    #[must_use]
    pub fn between(
        field: Field,
        low: impl Into<LiteralValue>,
        high: impl Into<LiteralValue>,
    ) -> Self {
        Self::Between(field, low.into(), high.into())
    }

    #[must_use]
    pub fn is_in<V: Into<LiteralValue>>(field: Field, values: impl IntoIterator<Item = V>) -> Self {
        Self::In(field, values.into_iter().map(Into::into).collect())
    }

    /// Combine with another expression using AND, flattening nested ANDs
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), right) => {
                left.push(right);
                Self::And(left)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Combine with another expression using OR, flattening nested ORs
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), right) => {
                left.push(right);
                Self::Or(left)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }

    /// Negate the expression
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate the expression against a single record
    #[must_use]
    pub fn matches(&self, record: &UnemploymentRecord) -> bool {
        match self {
            Self::AlwaysTrue => true,
            Self::AlwaysFalse => false,
            Self::Eq(field, literal) => {
                literal.compare(field.value(record)) == Some(Ordering::Equal)
            }
            Self::NotEq(field, literal) => {
                literal.compare(field.value(record)) != Some(Ordering::Equal)
            }
            Self::Gt(field, literal) => {
                literal.compare(field.value(record)) == Some(Ordering::Greater)
            }
            Self::GtEq(field, literal) => matches!(
                literal.compare(field.value(record)),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt(field, literal) => {
                literal.compare(field.value(record)) == Some(Ordering::Less)
            }
            Self::LtEq(field, literal) => matches!(
                literal.compare(field.value(record)),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::In(field, literals) => {
                let value = field.value(record);
                literals
                    .iter()
                    .any(|literal| literal.compare(value) == Some(Ordering::Equal))
            }
            Self::Between(field, low, high) => {
                let value = field.value(record);
                matches!(
                    low.compare(value),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(high.compare(value), Some(Ordering::Less | Ordering::Equal))
            }
            Self::And(exprs) => exprs.iter().all(|expr| expr.matches(record)),
            Self::Or(exprs) => exprs.iter().any(|expr| expr.matches(record)),
            Self::Not(expr) => !expr.matches(record),
        }
    }

    /// Returns the set of all fields referenced by this expression
    #[must_use]
    pub fn required_fields(&self) -> HashSet<Field> {
        let mut fields = HashSet::new();
        self.collect_required_fields(&mut fields);
        fields
    }

    fn collect_required_fields(&self, fields: &mut HashSet<Field>) {
        match self {
            Self::Eq(field, _)
            | Self::NotEq(field, _)
            | Self::Gt(field, _)
            | Self::GtEq(field, _)
            | Self::Lt(field, _)
            | Self::LtEq(field, _)
            | Self::In(field, _)
            | Self::Between(field, _, _) => {
                fields.insert(*field);
            }
            Self::And(exprs) | Self::Or(exprs) => {
                for expr in exprs {
                    expr.collect_required_fields(fields);
                }
            }
            Self::Not(expr) => expr.collect_required_fields(fields),
            Self::AlwaysTrue | Self::AlwaysFalse => {}
        }
    }
}
