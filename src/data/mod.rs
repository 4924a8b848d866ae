//! Loading and querying the cleaned price dataset.
//!
//! The input is a tabular CSV with at least `item_name`, `area_name`,
//! `year`, and `value` columns. Rows whose year or value fail to parse are
//! dropped before analysis.

use crate::core::YearSeries;
use crate::error::{ImpactError, Result};
use serde::Deserialize;
use std::path::Path;

/// One price observation from the cleaned dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Grocery item name.
    pub item_name: String,
    /// Region (area) name.
    pub area_name: String,
    /// Calendar year of the observation.
    pub year: i32,
    /// Observed price.
    pub value: f64,
}

/// Raw CSV row before numeric validation. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    item_name: String,
    area_name: String,
    year: String,
    value: String,
}

impl RawRecord {
    /// Validate numeric fields, returning `None` for unparseable rows.
    fn parse(self) -> Option<Observation> {
        let year = parse_year(&self.year)?;
        let value: f64 = self.value.trim().parse().ok().filter(|v: &f64| v.is_finite())?;
        Some(Observation {
            item_name: self.item_name,
            area_name: self.area_name,
            year,
            value,
        })
    }
}

/// Parse an integer-like year field ("2015" or "2015.0").
fn parse_year(field: &str) -> Option<i32> {
    let field = field.trim();
    if let Ok(year) = field.parse::<i32>() {
        return Some(year);
    }
    let as_float: f64 = field.parse().ok()?;
    if as_float.is_finite() && as_float.fract() == 0.0 {
        Some(as_float as i32)
    } else {
        None
    }
}

/// In-memory collection of price observations.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    /// Create a dataset from observations.
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Load a dataset from a CSV file.
    ///
    /// Rows that fail to deserialize or whose year/value are unparseable
    /// are skipped; an unreadable file or missing header is an error.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref()).map_err(|e| {
            ImpactError::Io(format!("{}: {}", path.as_ref().display(), e))
        })?;

        let mut observations = Vec::new();
        for record in reader.deserialize::<RawRecord>() {
            let Ok(raw) = record else { continue };
            if let Some(obs) = raw.parse() {
                observations.push(obs);
            }
        }
        Ok(Self { observations })
    }

    /// All observations.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observations matching one item across a set of regions.
    pub fn item_observations<'a>(
        &'a self,
        item: &'a str,
        regions: &'a [String],
    ) -> impl Iterator<Item = &'a Observation> + 'a {
        self.observations
            .iter()
            .filter(move |obs| obs.item_name == item && regions.contains(&obs.area_name))
    }

    /// Extract the annual series for one (item, region) pair.
    ///
    /// Matching rows are grouped by year and reduced to the arithmetic mean,
    /// sorted ascending by year. Returns an empty series when nothing
    /// matches.
    pub fn extract_series(&self, item: &str, area: &str) -> YearSeries {
        YearSeries::from_pairs(
            self.observations
                .iter()
                .filter(|obs| obs.item_name == item && obs.area_name == area)
                .map(|obs| (obs.year, obs.value)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn obs(item: &str, area: &str, year: i32, value: f64) -> Observation {
        Observation {
            item_name: item.to_string(),
            area_name: area.to_string(),
            year,
            value,
        }
    }

    #[test]
    fn extract_series_filters_groups_and_sorts() {
        let dataset = Dataset::new(vec![
            obs("Bananas", "South", 2012, 0.60),
            obs("Bananas", "South", 2010, 0.55),
            obs("Bananas", "South", 2012, 0.70),
            obs("Bananas", "West", 2010, 0.80),
            obs("Milk", "South", 2010, 3.20),
        ]);

        let series = dataset.extract_series("Bananas", "South");
        assert_eq!(series.years(), &[2010, 2012]);
        assert_relative_eq!(series.values()[0], 0.55, epsilon = 1e-12);
        assert_relative_eq!(series.values()[1], 0.65, epsilon = 1e-12);
    }

    #[test]
    fn extract_series_no_match_is_empty() {
        let dataset = Dataset::new(vec![obs("Bananas", "South", 2010, 0.55)]);
        assert!(dataset.extract_series("Bananas", "Northeast").is_empty());
        assert!(dataset.extract_series("Milk", "South").is_empty());
    }

    #[test]
    fn item_observations_restricts_regions() {
        let dataset = Dataset::new(vec![
            obs("Bananas", "South", 2010, 0.55),
            obs("Bananas", "U.S. city average", 2010, 0.57),
            obs("Bananas", "West", 2011, 0.60),
        ]);
        let regions = vec!["South".to_string(), "West".to_string()];
        let matched: Vec<_> = dataset.item_observations("Bananas", &regions).collect();
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn parse_year_accepts_integral_forms() {
        assert_eq!(parse_year("2015"), Some(2015));
        assert_eq!(parse_year(" 2015 "), Some(2015));
        assert_eq!(parse_year("2015.0"), Some(2015));
        assert_eq!(parse_year("2015.5"), None);
        assert_eq!(parse_year("abc"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn from_csv_drops_unparseable_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "item_name,area_name,year,value").unwrap();
        writeln!(file, "Bananas,South,2010,0.55").unwrap();
        writeln!(file, "Bananas,South,not-a-year,0.60").unwrap();
        writeln!(file, "Bananas,South,2011,not-a-price").unwrap();
        writeln!(file, "Bananas,South,2012,0.62").unwrap();
        file.flush().unwrap();

        let dataset = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.observations()[0].year, 2010);
        assert_eq!(dataset.observations()[1].year, 2012);
    }

    #[test]
    fn from_csv_missing_file_is_an_error() {
        let result = Dataset::from_csv("does/not/exist.csv");
        assert!(matches!(result, Err(ImpactError::Io(_))));
    }
}
