//! Core data structures for the price-impact analysis.

mod comparison;
mod forecast;
mod series;

pub use comparison::{ComparisonRow, PairKey, ResultSet};
pub use forecast::Forecast;
pub use series::{Split, YearSeries};
