//! Query reports
//!
//! Runs every query of a [`QuerySet`] and collects the outputs together with
//! their questions, for JSON export or a plain-text summary.

use std::fmt::{self, Write as _};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{QueryKind, QueryOutput, QuerySet};
use crate::config::QueryConfig;
use crate::error::{Result, UnemploymentError};

/// Output of one query within a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub number: usize,
    pub query: QueryKind,
    pub question: String,
    pub output: QueryOutput,
}

impl QueryResult {
    fn evaluate(queries: &QuerySet, kind: QueryKind) -> Self {
        let start = Instant::now();
        let output = queries.run(kind);
        log::debug!(
            "Query {} ({kind}) produced {} values in {:?}",
            kind.number(),
            output.len(),
            start.elapsed()
        );
        Self {
            number: kind.number(),
            query: kind,
            question: kind.question().to_string(),
            output,
        }
    }
}

/// Outputs of all queries over one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReport {
    pub record_count: usize,
    pub config: QueryConfig,
    pub results: Vec<QueryResult>,
}

impl QueryReport {
    /// Run every query in order
    #[must_use]
    pub fn run(queries: &QuerySet) -> Self {
        Self::run_selected(queries, &QueryKind::ALL)
    }

    /// Run the given queries in order
    #[must_use]
    pub fn run_selected(queries: &QuerySet, kinds: &[QueryKind]) -> Self {
        let start = Instant::now();
        let results = kinds
            .iter()
            .map(|kind| QueryResult::evaluate(queries, *kind))
            .collect();
        Self::finish(queries, results, start)
    }

    /// Run every query concurrently; results keep the numbered order
    #[must_use]
    pub fn run_parallel(queries: &QuerySet) -> Self {
        let start = Instant::now();
        let results = QueryKind::ALL
            .par_iter()
            .map(|kind| QueryResult::evaluate(queries, *kind))
            .collect();
        Self::finish(queries, results, start)
    }

    fn finish(queries: &QuerySet, results: Vec<QueryResult>, start: Instant) -> Self {
        let report = Self {
            record_count: queries.collection().len(),
            config: queries.config().clone(),
            results,
        };
        log::info!(
            "Ran {} queries over {} records in {:?}",
            report.results.len(),
            report.record_count,
            start.elapsed()
        );
        report
    }

    /// Output of one query, if it was run
    #[must_use]
    pub fn get(&self, kind: QueryKind) -> Option<&QueryOutput> {
        self.results
            .iter()
            .find(|result| result.query == kind)
            .map(|result| &result.output)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(UnemploymentError::from)?)
    }

    /// Plain-text summary of the report
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

const MAX_LISTED_ROWS: usize = 10;

impl fmt::Display for QueryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Unemployment Query Report:")?;
        writeln!(f, "  Records: {}", self.record_count)?;

        for result in &self.results {
            let mut body = String::new();
            match &result.output {
                QueryOutput::Count(count) => write!(body, " {count}")?,
                QueryOutput::Average(Some(avg)) => write!(body, " {avg:.2}")?,
                QueryOutput::Average(None) | QueryOutput::Max(None) => body.push_str(" no result"),
                QueryOutput::Max(Some(max)) => write!(body, " {} ({:.1})", max.state, max.rate)?,
                QueryOutput::Rows(rows) => {
                    write!(body, " {} counties", rows.len())?;
                    for row in rows.iter().take(MAX_LISTED_ROWS) {
                        write!(body, "\n    {}, {}: {:.1}", row.county, row.state, row.rate)?;
                    }
                }
                QueryOutput::StateYearAverages(rows) => {
                    write!(body, " {} groups", rows.len())?;
                    for row in rows.iter().take(MAX_LISTED_ROWS) {
                        write!(body, "\n    {} {}: {:.2}", row.state, row.year, row.average_rate)?;
                    }
                }
                QueryOutput::StateTotals(rows) => {
                    write!(body, " {} states", rows.len())?;
                    for row in rows.iter().take(MAX_LISTED_ROWS) {
                        write!(body, "\n    {}: {:.1}", row.state, row.total_rate)?;
                    }
                }
            }
            if result.output.len() > MAX_LISTED_ROWS {
                body.push_str("\n    ...");
            }
            writeln!(f, "\n{}. {}\n  ->{body}", result.number, result.question)?;
        }
        Ok(())
    }
}
