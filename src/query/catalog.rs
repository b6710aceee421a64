//! Catalogue of the eleven queries
//!
//! [`QueryKind`] names each query with its number and the question it
//! answers; [`QuerySet::run`] evaluates one with the configured parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{CountyRate, QuerySet, StateRate, StateTotal, StateYearAverage};
use crate::error::UnemploymentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    DistinctYearCount,
    DistinctStateCount,
    CountBelowRate,
    FindAboveRate,
    AverageRateOverall,
    FindRateInRange,
    MaxRateRecord,
    CountAboveRate,
    AverageRatePerStateYear,
    TotalRatePerState,
    TotalRatePerStateSince,
}

impl QueryKind {
    /// All queries in their numbered order
    pub const ALL: [Self; 11] = [
        Self::DistinctYearCount,
        Self::DistinctStateCount,
        Self::CountBelowRate,
        Self::FindAboveRate,
        Self::AverageRateOverall,
        Self::FindRateInRange,
        Self::MaxRateRecord,
        Self::CountAboveRate,
        Self::AverageRatePerStateYear,
        Self::TotalRatePerState,
        Self::TotalRatePerStateSince,
    ];

    /// Query number, 1 through 11
    #[must_use]
    pub fn number(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .map_or(0, |index| index + 1)
    }

    /// Query by number, 1 through 11
    #[must_use]
    pub fn from_number(number: usize) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// The analytical question the query answers
    #[must_use]
    pub const fn question(self) -> &'static str {
        match self {
            Self::DistinctYearCount => "Over how many years was the unemployment data collected?",
            Self::DistinctStateCount => "How many states were reported on in this dataset?",
            Self::CountBelowRate => "How many records have an unemployment rate below the low threshold?",
            Self::FindAboveRate => "Which counties have an unemployment rate above the high threshold?",
            Self::AverageRateOverall => "What is the average unemployment rate across all records?",
            Self::FindRateInRange => "Which counties have an unemployment rate within the configured range?",
            Self::MaxRateRecord => "Which state has the highest unemployment rate?",
            Self::CountAboveRate => "How many counties have an unemployment rate above the count threshold?",
            Self::AverageRatePerStateYear => "What is the average unemployment rate per state by year?",
            Self::TotalRatePerState => "What is the total unemployment rate across all counties per state?",
            Self::TotalRatePerStateSince => "What is the total unemployment rate per state since the floor year?",
        }
    }

    /// Stable snake_case name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DistinctYearCount => "distinct_year_count",
            Self::DistinctStateCount => "distinct_state_count",
            Self::CountBelowRate => "count_below_rate",
            Self::FindAboveRate => "find_above_rate",
            Self::AverageRateOverall => "average_rate_overall",
            Self::FindRateInRange => "find_rate_in_range",
            Self::MaxRateRecord => "max_rate_record",
            Self::CountAboveRate => "count_above_rate",
            Self::AverageRatePerStateYear => "average_rate_per_state_year",
            Self::TotalRatePerState => "total_rate_per_state",
            Self::TotalRatePerStateSince => "total_rate_per_state_since",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QueryKind {
    type Err = UnemploymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(number) = s.parse::<usize>() {
            return Self::from_number(number).ok_or_else(|| {
                UnemploymentError::config_error(format!("Query number {number} out of range 1-11"))
            });
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnemploymentError::config_error(format!("Unknown query '{s}'")))
    }
}

/// Result of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum QueryOutput {
    Count(usize),
    Rows(Vec<CountyRate>),
    Average(Option<f64>),
    Max(Option<StateRate>),
    StateYearAverages(Vec<StateYearAverage>),
    StateTotals(Vec<StateTotal>),
}

impl QueryOutput {
    /// Number of values in the output; scalars count as one, absent values as zero
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Count(_) => 1,
            Self::Rows(rows) => rows.len(),
            Self::Average(value) => usize::from(value.is_some()),
            Self::Max(value) => usize::from(value.is_some()),
            Self::StateYearAverages(rows) => rows.len(),
            Self::StateTotals(rows) => rows.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QuerySet {
    /// Evaluate one query with the configured parameters
    #[must_use]
    pub fn run(&self, kind: QueryKind) -> QueryOutput {
        let config = self.config();
        match kind {
            QueryKind::DistinctYearCount => QueryOutput::Count(self.distinct_year_count()),
            QueryKind::DistinctStateCount => QueryOutput::Count(self.distinct_state_count()),
            QueryKind::CountBelowRate => {
                QueryOutput::Count(self.count_below_rate(config.below_rate_threshold))
            }
            QueryKind::FindAboveRate => {
                QueryOutput::Rows(self.find_above_rate(config.high_rate_threshold))
            }
            QueryKind::AverageRateOverall => QueryOutput::Average(self.average_rate_overall()),
            QueryKind::FindRateInRange => {
                QueryOutput::Rows(self.find_rate_in_range(config.range_low, config.range_high))
            }
            QueryKind::MaxRateRecord => QueryOutput::Max(self.max_rate_record()),
            QueryKind::CountAboveRate => {
                QueryOutput::Count(self.count_above_rate(config.count_above_threshold))
            }
            QueryKind::AverageRatePerStateYear => {
                QueryOutput::StateYearAverages(self.average_rate_per_state_year())
            }
            QueryKind::TotalRatePerState => QueryOutput::StateTotals(self.total_rate_per_state()),
            QueryKind::TotalRatePerStateSince => {
                QueryOutput::StateTotals(self.total_rate_per_state_since(config.since_year))
            }
        }
    }
}
