//! Actual-vs-counterfactual comparison tables and the per-run result store.

use std::collections::BTreeMap;
use std::fmt;

/// One evaluation year compared against its counterfactual forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    /// Calendar year.
    pub year: i32,
    /// Observed price.
    pub actual: f64,
    /// Forecast price extrapolated from the pre-pandemic trend.
    pub predicted: f64,
    /// actual - predicted.
    pub difference: f64,
    /// 100 * difference / predicted; `None` when predicted is zero.
    pub pct_change: Option<f64>,
}

impl ComparisonRow {
    /// Build a row from an observed and a predicted price.
    pub fn new(year: i32, actual: f64, predicted: f64) -> Self {
        let difference = actual - predicted;
        let pct_change = if predicted == 0.0 {
            None
        } else {
            Some(100.0 * difference / predicted)
        };
        Self {
            year,
            actual,
            predicted,
            difference,
            pct_change,
        }
    }
}

/// Identifies one analyzed price series: a grocery item within a region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    /// Item name as it appears in the dataset.
    pub item: String,
    /// Region (area) name as it appears in the dataset.
    pub area: String,
}

impl PairKey {
    pub fn new(item: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            area: area.into(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.item, self.area)
    }
}

/// Append-only collection of comparison tables keyed by (item, region).
///
/// Keys are written at most once per run; a second insert for the same key
/// is rejected and leaves the first table in place.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    entries: BTreeMap<PairKey, Vec<ComparisonRow>>,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a comparison table for a key.
    ///
    /// Returns `false` (without overwriting) if the key is already present.
    pub fn insert(&mut self, key: PairKey, rows: Vec<ComparisonRow>) -> bool {
        match self.entries.entry(key) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(rows);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Look up the comparison table for a key.
    pub fn get(&self, key: &PairKey) -> Option<&[ComparisonRow]> {
        self.entries.get(key).map(|rows| rows.as_slice())
    }

    /// Check if a key is present.
    pub fn contains(&self, key: &PairKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over stored pairs in deterministic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &[ComparisonRow])> {
        self.entries.iter().map(|(k, rows)| (k, rows.as_slice()))
    }
}
