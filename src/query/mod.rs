//! The unemployment query set
//!
//! [`QuerySet`] answers the eleven analytical questions over a
//! [`RecordCollection`]. Every operation is a pure read of the collection:
//! they can run in any order, repeatedly, or concurrently from several
//! threads. Empty collections give zero counts, empty sequences and `None`
//! for the average and maximum.

pub mod catalog;
pub mod report;

use serde::{Deserialize, Serialize};

use crate::aggregate::{Accumulator, group_by, sort_by_value_desc};
use crate::collections::RecordCollection;
use crate::config::QueryConfig;
use crate::filter::{Expr, Field};
use crate::models::UnemploymentRecord;

pub use catalog::{QueryKind, QueryOutput};
pub use report::{QueryReport, QueryResult};

/// County, state and rate of a matching record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyRate {
    #[serde(rename = "County")]
    pub county: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Rate")]
    pub rate: f64,
}

impl From<&UnemploymentRecord> for CountyRate {
    fn from(record: &UnemploymentRecord) -> Self {
        Self {
            county: record.county.clone(),
            state: record.state.clone(),
            rate: record.rate,
        }
    }
}

/// State and rate of a single record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRate {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Rate")]
    pub rate: f64,
}

/// Mean rate of one `(State, Year)` group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateYearAverage {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Year")]
    pub year: i64,
    pub average_rate: f64,
}

/// Summed rate of one state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTotal {
    #[serde(rename = "State")]
    pub state: String,
    pub total_rate: f64,
}

/// Analytical queries over an unemployment record collection
#[derive(Debug, Clone)]
pub struct QuerySet {
    collection: RecordCollection,
    config: QueryConfig,
}

impl QuerySet {
    /// Query set with the default thresholds
    #[must_use]
    pub fn new(collection: RecordCollection) -> Self {
        Self::with_config(collection, QueryConfig::default())
    }

    #[must_use]
    pub fn with_config(collection: RecordCollection, config: QueryConfig) -> Self {
        Self { collection, config }
    }

    #[must_use]
    pub fn collection(&self) -> &RecordCollection {
        &self.collection
    }

    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Number of distinct years in the data
    #[must_use]
    pub fn distinct_year_count(&self) -> usize {
        self.collection.distinct_count(|r| r.year)
    }

    /// Number of distinct states in the data
    #[must_use]
    pub fn distinct_state_count(&self) -> usize {
        self.collection.distinct_count(|r| r.state.clone())
    }

    /// Number of records with `Rate < threshold`
    #[must_use]
    pub fn count_below_rate(&self, threshold: f64) -> usize {
        self.collection.count_where(&Expr::lt(Field::Rate, threshold))
    }

    /// Records with `Rate > threshold`, in collection order
    #[must_use]
    pub fn find_above_rate(&self, threshold: f64) -> Vec<CountyRate> {
        self.collection
            .project(&Expr::gt(Field::Rate, threshold), |r| CountyRate::from(r))
    }

    /// Mean rate over all records, `None` when there are none
    #[must_use]
    pub fn average_rate_overall(&self) -> Option<f64> {
        group_by(&self.collection, |_| (), Accumulator::Avg)
            .into_values()
            .next()
    }

    /// Records with `low <= Rate <= high`, in collection order
    #[must_use]
    pub fn find_rate_in_range(&self, low: f64, high: f64) -> Vec<CountyRate> {
        self.collection
            .project(&Expr::between(Field::Rate, low, high), |r| CountyRate::from(r))
    }

    /// State and rate of the record with the highest rate
    ///
    /// When several records share the maximum, the first one in collection
    /// order is returned.
    #[must_use]
    pub fn max_rate_record(&self) -> Option<StateRate> {
        self.collection
            .top_by_rate(1)
            .into_iter()
            .next()
            .map(|record| StateRate {
                state: record.state.clone(),
                rate: record.rate,
            })
    }

    /// Number of records with `Rate > threshold`
    #[must_use]
    pub fn count_above_rate(&self, threshold: f64) -> usize {
        self.collection.count_where(&Expr::gt(Field::Rate, threshold))
    }

    /// Number of records with `Rate <= threshold`
    #[must_use]
    pub fn count_at_most_rate(&self, threshold: f64) -> usize {
        self.collection
            .count_where(&Expr::lt_eq(Field::Rate, threshold))
    }

    /// Mean rate per `(State, Year)`, ascending by state then year
    #[must_use]
    pub fn average_rate_per_state_year(&self) -> Vec<StateYearAverage> {
        group_by(
            &self.collection,
            |r| (r.state.clone(), r.year),
            Accumulator::Avg,
        )
        .into_iter()
        .map(|((state, year), average_rate)| StateYearAverage {
            state,
            year,
            average_rate,
        })
        .collect()
    }

    /// Summed rate per state, highest total first
    #[must_use]
    pub fn total_rate_per_state(&self) -> Vec<StateTotal> {
        state_totals(self.collection.iter())
    }

    /// Summed rate per state over records from `year_floor` on, highest total first
    #[must_use]
    pub fn total_rate_per_state_since(&self, year_floor: i64) -> Vec<StateTotal> {
        state_totals(self.collection.filter(&Expr::gt_eq(Field::Year, year_floor)))
    }
}

fn state_totals<'a>(records: impl Iterator<Item = &'a UnemploymentRecord>) -> Vec<StateTotal> {
    let totals = group_by(records, |r| r.state.clone(), Accumulator::Sum);
    sort_by_value_desc(totals)
        .into_iter()
        .map(|(state, total_rate)| StateTotal { state, total_rate })
        .collect()
}
