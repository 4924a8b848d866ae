//! Year-indexed price series.

use crate::error::{ImpactError, Result};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// A univariate annual series: one price per calendar year, strictly
/// increasing by year, no missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSeries {
    years: Vec<i32>,
    values: Vec<f64>,
}

impl YearSeries {
    /// Create a series from parallel year/value vectors.
    ///
    /// Years must be strictly increasing and every value finite.
    pub fn new(years: Vec<i32>, values: Vec<f64>) -> Result<Self> {
        if years.len() != values.len() {
            return Err(ImpactError::DimensionMismatch {
                expected: years.len(),
                got: values.len(),
            });
        }
        for w in years.windows(2) {
            if w[1] <= w[0] {
                return Err(ImpactError::YearError(
                    "years must be strictly increasing".to_string(),
                ));
            }
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ImpactError::YearError(
                "values must be finite".to_string(),
            ));
        }
        Ok(Self { years, values })
    }

    /// Create an empty series.
    pub fn empty() -> Self {
        Self {
            years: vec![],
            values: vec![],
        }
    }

    /// Build a series from unordered (year, value) pairs.
    ///
    /// Duplicate years are collapsed to their arithmetic mean, non-finite
    /// values are dropped, and the result is sorted ascending by year. This
    /// is the group-by-year reduction applied to raw observations.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (i32, f64)>,
    {
        let mut grouped: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
        for (year, value) in pairs {
            if !value.is_finite() {
                continue;
            }
            let entry = grouped.entry(year).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }

        let mut years = Vec::with_capacity(grouped.len());
        let mut values = Vec::with_capacity(grouped.len());
        for (year, (sum, count)) in grouped {
            years.push(year);
            values.push(sum / count as f64);
        }
        Self { years, values }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Get years.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Get values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First year, if any.
    pub fn first_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    /// Last year, if any.
    pub fn last_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    /// Iterate over (year, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.years.iter().copied().zip(self.values.iter().copied())
    }

    /// Number of distinct values, by exact bit equality.
    pub fn distinct_value_count(&self) -> usize {
        let mut bits: Vec<u64> = self.values.iter().map(|v| v.to_bits()).collect();
        bits.sort_unstable();
        bits.dedup();
        bits.len()
    }

    /// Restrict the series to years within the given inclusive range.
    pub fn restrict(&self, range: RangeInclusive<i32>) -> YearSeries {
        let mut years = Vec::new();
        let mut values = Vec::new();
        for (year, value) in self.iter() {
            if range.contains(&year) {
                years.push(year);
                values.push(value);
            }
        }
        YearSeries { years, values }
    }

    /// Partition into a training window (years within `training`) and an
    /// evaluation window (years >= `evaluation_from`).
    ///
    /// Years outside both windows are dropped; gaps are simply absent
    /// points, never interpolated.
    pub fn partition(&self, training: RangeInclusive<i32>, evaluation_from: i32) -> Split {
        Split {
            training: self.restrict(training),
            evaluation: self.restrict(evaluation_from..=i32::MAX),
        }
    }
}

/// A series partitioned into training and evaluation windows.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Sub-series the trend model is fitted on.
    pub training: YearSeries,
    /// Sub-series actual prices are compared against.
    pub evaluation: YearSeries,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_series() -> YearSeries {
        YearSeries::new(
            vec![2010, 2012, 2015, 2019, 2020, 2022],
            vec![1.0, 1.2, 1.5, 1.9, 2.5, 3.1],
        )
        .unwrap()
    }

    #[test]
    fn series_constructs_and_exposes_data() {
        let s = sample_series();
        assert_eq!(s.len(), 6);
        assert!(!s.is_empty());
        assert_eq!(s.first_year(), Some(2010));
        assert_eq!(s.last_year(), Some(2022));
        assert_eq!(s.years(), &[2010, 2012, 2015, 2019, 2020, 2022]);
    }

    #[test]
    fn series_rejects_non_increasing_years() {
        let result = YearSeries::new(vec![2010, 2010], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ImpactError::YearError(_))));

        let result = YearSeries::new(vec![2012, 2011], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ImpactError::YearError(_))));
    }

    #[test]
    fn series_rejects_non_finite_values() {
        let result = YearSeries::new(vec![2010, 2011], vec![1.0, f64::NAN]);
        assert!(matches!(result, Err(ImpactError::YearError(_))));
    }

    #[test]
    fn series_rejects_length_mismatch() {
        let result = YearSeries::new(vec![2010, 2011], vec![1.0]);
        assert!(matches!(result, Err(ImpactError::DimensionMismatch { .. })));
    }

    #[test]
    fn from_pairs_groups_sorts_and_averages() {
        let s = YearSeries::from_pairs(vec![
            (2012, 2.0),
            (2010, 1.0),
            (2012, 4.0),
            (2011, f64::NAN),
            (2011, 1.5),
        ]);
        assert_eq!(s.years(), &[2010, 2011, 2012]);
        assert_relative_eq!(s.values()[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(s.values()[1], 1.5, epsilon = 1e-12);
        // Duplicate 2012 entries collapse to their mean.
        assert_relative_eq!(s.values()[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn from_pairs_empty_input() {
        let s = YearSeries::from_pairs(vec![]);
        assert!(s.is_empty());
    }

    #[test]
    fn distinct_value_count_collapses_equal_values() {
        let s = YearSeries::new(vec![2010, 2011, 2012], vec![1.5, 1.5, 1.5]).unwrap();
        assert_eq!(s.distinct_value_count(), 1);

        let s = YearSeries::new(vec![2010, 2011, 2012], vec![1.5, 2.5, 1.5]).unwrap();
        assert_eq!(s.distinct_value_count(), 2);
    }

    #[test]
    fn partition_windows_are_disjoint_subsequences() {
        let split = sample_series().partition(2010..=2019, 2020);

        assert_eq!(split.training.years(), &[2010, 2012, 2015, 2019]);
        assert_eq!(split.evaluation.years(), &[2020, 2022]);

        // No year appears in both windows.
        for year in split.training.years() {
            assert!(!split.evaluation.years().contains(year));
        }
    }

    #[test]
    fn partition_drops_years_outside_both_windows() {
        let s = YearSeries::new(vec![2005, 2012, 2021], vec![0.9, 1.2, 2.0]).unwrap();
        let split = s.partition(2010..=2019, 2020);
        assert_eq!(split.training.years(), &[2012]);
        assert_eq!(split.evaluation.years(), &[2021]);
    }

    #[test]
    fn partition_of_empty_series_is_empty() {
        let split = YearSeries::empty().partition(2010..=2019, 2020);
        assert!(split.training.is_empty());
        assert!(split.evaluation.is_empty());
    }
}
