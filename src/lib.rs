//! # grocery-impact
//!
//! Exploratory analysis of U.S. grocery price series around the pandemic
//! boundary. For every configured (item, region) pair the crate fits a
//! low-order ARIMA model on pre-pandemic prices (2010-2019), extrapolates
//! the trend over the post-pandemic years, and compares the counterfactual
//! against actual observations. A cross-sectional OLS regression with
//! region controls provides an independent estimate of the post-2020 price
//! shift. Output is console diagnostics, per-pair charts, and an in-memory
//! result collection.

#![allow(clippy::needless_range_loop)]

pub mod analysis;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod plot;
pub mod regression;
pub mod utils;

pub use error::{ImpactError, Result};

pub mod prelude {
    pub use crate::analysis::{AnalysisConfig, RunReport, SkipReason};
    pub use crate::core::{ComparisonRow, Forecast, PairKey, ResultSet, YearSeries};
    pub use crate::data::Dataset;
    pub use crate::error::{ImpactError, Result};
    pub use crate::models::Forecaster;
}
