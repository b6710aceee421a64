//! Grouping and aggregation over unemployment records
//!
//! Records are partitioned by a key and the rates of each group are folded
//! with an [`Accumulator`]. Groups come back in key order.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::models::UnemploymentRecord;

/// How the rates of a group are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accumulator {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

/// Running state for one group
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateStats {
    pub count: usize,
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RateStats {
    /// Fold one rate into the statistics
    pub fn push(&mut self, rate: f64) {
        self.count += 1;
        self.sum += rate;
        self.min = Some(self.min.map_or(rate, |min| min.min(rate)));
        self.max = Some(self.max.map_or(rate, |max| max.max(rate)));
    }

    /// Arithmetic mean, `None` for an empty group
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Final value of the group under an accumulator
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, accumulator: Accumulator) -> Option<f64> {
        match accumulator {
            Accumulator::Sum => Some(self.sum),
            Accumulator::Avg => self.mean(),
            Accumulator::Count => Some(self.count as f64),
            Accumulator::Min => self.min,
            Accumulator::Max => self.max,
        }
    }
}

impl<'a> FromIterator<&'a UnemploymentRecord> for RateStats {
    fn from_iter<I: IntoIterator<Item = &'a UnemploymentRecord>>(iter: I) -> Self {
        let mut stats = Self::default();
        for record in iter {
            stats.push(record.rate);
        }
        stats
    }
}

/// Collect rate statistics per key
pub fn group_stats<'a, K, F, I>(records: I, key_fn: F) -> BTreeMap<K, RateStats>
where
    K: Ord,
    F: Fn(&UnemploymentRecord) -> K,
    I: IntoIterator<Item = &'a UnemploymentRecord>,
{
    let mut groups: BTreeMap<K, RateStats> = BTreeMap::new();
    for record in records {
        groups.entry(key_fn(record)).or_default().push(record.rate);
    }
    groups
}

/// Group records by key and reduce the rates of each group
///
/// Every group holds at least one record, so each accumulator yields a value.
pub fn group_by<'a, K, F, I>(records: I, key_fn: F, accumulator: Accumulator) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&UnemploymentRecord) -> K,
    I: IntoIterator<Item = &'a UnemploymentRecord>,
{
    group_stats(records, key_fn)
        .into_iter()
        .filter_map(|(key, stats)| stats.value(accumulator).map(|value| (key, value)))
        .collect()
}

/// Order `(key, value)` pairs by value, highest first
///
/// Equal values are ordered by key ascending.
pub fn sort_by_value_desc<K: Ord>(groups: impl IntoIterator<Item = (K, f64)>) -> Vec<(K, f64)> {
    groups
        .into_iter()
        .sorted_by(|(ka, va), (kb, vb)| vb.total_cmp(va).then_with(|| ka.cmp(kb)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<UnemploymentRecord> {
        vec![
            UnemploymentRecord::new("A", "NY", 2014, 4.0).unwrap(),
            UnemploymentRecord::new("B", "NY", 2015, 6.0).unwrap(),
            UnemploymentRecord::new("C", "CA", 2015, 9.0).unwrap(),
            UnemploymentRecord::new("D", "NY", 2015, 2.0).unwrap(),
        ]
    }

    #[test]
    fn test_group_sum_and_avg() {
        let records = records();
        let sums = group_by(&records, |r| r.state.clone(), Accumulator::Sum);
        assert_eq!(sums.get("NY"), Some(&12.0));
        assert_eq!(sums.get("CA"), Some(&9.0));

        let avgs = group_by(&records, |r| (r.state.clone(), r.year), Accumulator::Avg);
        assert_eq!(avgs.get(&("NY".to_string(), 2015)), Some(&4.0));
        assert_eq!(avgs.len(), 3);
    }

    #[test]
    fn test_count_min_max() {
        let records = records();
        let counts = group_by(&records, |r| r.year, Accumulator::Count);
        assert_eq!(counts.get(&2015), Some(&3.0));
        let mins = group_by(&records, |r| r.year, Accumulator::Min);
        assert_eq!(mins.get(&2015), Some(&2.0));
        let maxes = group_by(&records, |r| r.year, Accumulator::Max);
        assert_eq!(maxes.get(&2015), Some(&9.0));
    }

    #[test]
    fn test_sort_by_value_desc_breaks_ties_by_key() {
        let sorted = sort_by_value_desc(vec![("b", 1.0), ("a", 1.0), ("c", 3.0)]);
        assert_eq!(sorted, vec![("c", 3.0), ("a", 1.0), ("b", 1.0)]);
    }

    #[test]
    fn test_empty_stats() {
        let stats: RateStats = std::iter::empty::<&UnemploymentRecord>().collect();
        assert_eq!(stats.mean(), None);
        assert_eq!(stats.value(Accumulator::Sum), Some(0.0));
        assert_eq!(stats.value(Accumulator::Max), None);
    }
}
