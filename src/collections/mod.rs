//! Immutable collection of unemployment records
//!
//! [`RecordCollection`] is the in-memory stand-in for the queried document
//! collection. It offers the primitive operations the queries are built
//! from: filtering, projection, distinct values, sorting and limiting.
//! The records are shared behind an `Arc`, so clones are cheap and the
//! collection can be read from several threads at once.

use std::cmp::Ordering;
use std::hash::Hash;
use std::sync::Arc;

use itertools::Itertools;
use rustc_hash::FxHashSet;

use crate::filter::Expr;
use crate::models::UnemploymentRecord;

/// Read-only collection of validated unemployment records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection {
    records: Arc<[UnemploymentRecord]>,
}

impl RecordCollection {
    /// Create a collection from records, keeping their order
    #[must_use]
    pub fn new(records: Vec<UnemploymentRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Number of records in the collection
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in collection order
    #[must_use]
    pub fn records(&self) -> &[UnemploymentRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UnemploymentRecord> {
        self.records.iter()
    }

    /// Records matching an expression, in collection order
    pub fn filter<'a>(&'a self, expr: &'a Expr) -> impl Iterator<Item = &'a UnemploymentRecord> {
        self.records.iter().filter(move |record| expr.matches(record))
    }

    /// Number of records matching an expression
    #[must_use]
    pub fn count_where(&self, expr: &Expr) -> usize {
        self.filter(expr).count()
    }

    /// Map every record matching an expression to a projected row
    pub fn project<T, F>(&self, expr: &Expr, projection: F) -> Vec<T>
    where
        F: Fn(&UnemploymentRecord) -> T,
    {
        self.filter(expr).map(projection).collect()
    }

    /// Number of distinct keys across all records
    #[must_use]
    pub fn distinct_count<K, F>(&self, key_fn: F) -> usize
    where
        K: Eq + Hash,
        F: Fn(&UnemploymentRecord) -> K,
    {
        self.records.iter().map(key_fn).collect::<FxHashSet<K>>().len()
    }

    /// Distinct keys in order of first occurrence
    #[must_use]
    pub fn distinct_by<K, F>(&self, key_fn: F) -> Vec<K>
    where
        K: Eq + Hash + Clone,
        F: Fn(&UnemploymentRecord) -> K,
    {
        self.records.iter().map(key_fn).unique().collect()
    }

    /// Records sorted by rate, highest first
    ///
    /// The sort is stable: records with equal rates keep collection order.
    #[must_use]
    pub fn sorted_by_rate_desc(&self) -> Vec<&UnemploymentRecord> {
        self.records
            .iter()
            .sorted_by(|a, b| b.rate.partial_cmp(&a.rate).unwrap_or(Ordering::Equal))
            .collect()
    }

    /// The `limit` records with the highest rates
    #[must_use]
    pub fn top_by_rate(&self, limit: usize) -> Vec<&UnemploymentRecord> {
        let mut sorted = self.sorted_by_rate_desc();
        sorted.truncate(limit);
        sorted
    }

    /// New collection holding only the records matching an expression
    #[must_use]
    pub fn subset(&self, expr: &Expr) -> Self {
        Self::new(self.filter(expr).cloned().collect())
    }
}

impl From<Vec<UnemploymentRecord>> for RecordCollection {
    fn from(records: Vec<UnemploymentRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<UnemploymentRecord> for RecordCollection {
    fn from_iter<I: IntoIterator<Item = UnemploymentRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a UnemploymentRecord;
    type IntoIter = std::slice::Iter<'a, UnemploymentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Field;

    fn collection() -> RecordCollection {
        vec![
            UnemploymentRecord::new("A", "NY", 2014, 4.0).unwrap(),
            UnemploymentRecord::new("B", "NY", 2015, 9.0).unwrap(),
            UnemploymentRecord::new("C", "CA", 2015, 9.0).unwrap(),
            UnemploymentRecord::new("D", "TX", 2016, 1.5).unwrap(),
        ]
        .into()
    }

    #[test]
    fn test_count_and_project() {
        let c = collection();
        let expr = Expr::gt(Field::Rate, 2.0);
        assert_eq!(c.count_where(&expr), 3);
        let counties = c.project(&expr, |r| r.county.clone());
        assert_eq!(counties, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_distinct() {
        let c = collection();
        assert_eq!(c.distinct_count(|r| r.state.clone()), 3);
        assert_eq!(c.distinct_by(|r| r.year), vec![2014, 2015, 2016]);
    }

    #[test]
    fn test_top_by_rate_keeps_first_on_ties() {
        let c = collection();
        let top = c.top_by_rate(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].county, "B");
        assert_eq!(top[1].county, "C");
    }

    #[test]
    fn test_signed_zero_rates_tie() {
        let zero = |county: &str, rate: f64| UnemploymentRecord {
            county: county.into(),
            state: "NY".into(),
            year: 2015,
            rate,
        };
        let c = RecordCollection::new(vec![zero("First", -0.0), zero("Second", 0.0)]);
        assert_eq!(c.top_by_rate(1)[0].county, "First");
    }

    #[test]
    fn test_empty_collection() {
        let c = RecordCollection::default();
        assert!(c.is_empty());
        assert!(c.top_by_rate(1).is_empty());
        assert_eq!(c.distinct_count(|r| r.year), 0);
    }

    #[test]
    fn test_subset() {
        let c = collection();
        let ny = c.subset(&Expr::eq(Field::State, "NY"));
        assert_eq!(ny.len(), 2);
    }
}
