//! The per-(item, region) forecast-and-compare pipeline.
//!
//! For every configured item and region this module extracts the annual
//! price series, splits it into pre- and post-pandemic windows, fits a
//! low-order ARIMA model on the pre-pandemic window, and compares the
//! extrapolated counterfactual against post-pandemic actuals. Failures are
//! local to one pair: the run always completes and reports whatever subset
//! of pairs succeeded.

use crate::core::{ComparisonRow, Forecast, PairKey, ResultSet, Split, YearSeries};
use crate::data::Dataset;
use crate::error::{ImpactError, Result};
use crate::models::arima::{Arima, ArimaSpec};
use crate::models::Forecaster;
use crate::plot;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use tracing::{info, warn};

/// Configuration for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Grocery items to analyze.
    pub items: Vec<String>,
    /// Regions to analyze per item.
    pub regions: Vec<String>,
    /// First year of the training window (inclusive).
    pub train_start: i32,
    /// Last year of the training window (inclusive).
    pub train_end: i32,
    /// First year of the evaluation window; everything at or after it is
    /// post-pandemic.
    pub eval_start: i32,
    /// Minimum number of training points a pair needs.
    pub min_train_len: usize,
    /// Model order tried first.
    pub primary: ArimaSpec,
    /// Model order tried once if the primary order fails to fit.
    pub fallback: ArimaSpec,
    /// Directory charts are written to; `None` disables chart output.
    pub chart_dir: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            items: vec![],
            regions: vec![],
            train_start: 2010,
            train_end: 2019,
            eval_start: 2020,
            min_train_len: 2,
            primary: ArimaSpec::new(1, 1, 0),
            fallback: ArimaSpec::new(0, 1, 1),
            chart_dir: None,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(mut self, items: Vec<String>) -> Self {
        self.items = items;
        self
    }

    pub fn with_regions(mut self, regions: Vec<String>) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_training_window(mut self, start: i32, end: i32) -> Self {
        self.train_start = start;
        self.train_end = end;
        self
    }

    pub fn with_evaluation_from(mut self, year: i32) -> Self {
        self.eval_start = year;
        self
    }

    pub fn with_min_train_len(mut self, len: usize) -> Self {
        self.min_train_len = len;
        self
    }

    pub fn with_chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = Some(dir.into());
        self
    }

    /// The training window as an inclusive year range.
    pub fn training_range(&self) -> RangeInclusive<i32> {
        self.train_start..=self.train_end
    }
}

/// Why one (item, region) pair contributed nothing to the run.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// No observations match the item and region.
    NoData,
    /// Training window has too few points.
    InsufficientTraining { needed: usize, got: usize },
    /// Training window has no variation.
    ConstantTraining,
    /// Evaluation window is empty.
    NoEvaluation,
    /// Both model orders failed to fit.
    ModelFit(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no observations for this item and region"),
            SkipReason::InsufficientTraining { needed, got } => write!(
                f,
                "not enough pre-pandemic data: need at least {needed}, got {got}"
            ),
            SkipReason::ConstantTraining => {
                write!(f, "pre-pandemic series has no variation")
            }
            SkipReason::NoEvaluation => write!(f, "no post-pandemic data"),
            SkipReason::ModelFit(msg) => write!(f, "model fit failed: {msg}"),
        }
    }
}

/// Check whether a split is worth forecasting.
///
/// Rules are checked in order; the first failure wins and the pair
/// produces no partial output.
pub fn check_eligibility(
    split: &Split,
    min_train_len: usize,
) -> std::result::Result<(), SkipReason> {
    if split.training.len() < min_train_len {
        return Err(SkipReason::InsufficientTraining {
            needed: min_train_len,
            got: split.training.len(),
        });
    }
    if split.training.distinct_value_count() < 2 {
        return Err(SkipReason::ConstantTraining);
    }
    if split.evaluation.is_empty() {
        return Err(SkipReason::NoEvaluation);
    }
    Ok(())
}

/// Fit the primary model order on the training window and forecast
/// `horizon` steps; on failure retry once with the fallback order.
///
/// Returns the forecast and whether the fallback was used.
pub fn fit_counterfactual(
    training: &YearSeries,
    horizon: usize,
    primary: ArimaSpec,
    fallback: ArimaSpec,
) -> std::result::Result<(Forecast, bool), SkipReason> {
    match fit_one(training, horizon, primary) {
        Ok(forecast) => Ok((forecast, false)),
        Err(primary_err) => match fit_one(training, horizon, fallback) {
            Ok(forecast) => Ok((forecast, true)),
            Err(fallback_err) => Err(SkipReason::ModelFit(format!(
                "ARIMA{primary} failed ({primary_err}); ARIMA{fallback} failed ({fallback_err})"
            ))),
        },
    }
}

fn fit_one(training: &YearSeries, horizon: usize, spec: ArimaSpec) -> Result<Forecast> {
    let mut model = Arima::with_spec(spec);
    model.fit(training)?;
    model.predict(horizon)
}

/// Align a forecast to the evaluation window positionally and compute
/// per-year differences.
pub fn compare(evaluation: &YearSeries, forecast: &Forecast) -> Result<Vec<ComparisonRow>> {
    if forecast.horizon() != evaluation.len() {
        return Err(ImpactError::DimensionMismatch {
            expected: evaluation.len(),
            got: forecast.horizon(),
        });
    }
    Ok(evaluation
        .iter()
        .zip(forecast.point().iter())
        .map(|((year, actual), &predicted)| ComparisonRow::new(year, actual, predicted))
        .collect())
}

/// Everything computed for one successfully analyzed pair.
#[derive(Debug, Clone)]
pub struct PairAnalysis {
    pub key: PairKey,
    pub split: Split,
    pub rows: Vec<ComparisonRow>,
    pub used_fallback: bool,
}

/// Run the full forecast-and-compare procedure for one (item, region)
/// pair. Pure with respect to the dataset; no shared state.
pub fn analyze_pair(
    dataset: &Dataset,
    item: &str,
    area: &str,
    config: &AnalysisConfig,
) -> std::result::Result<PairAnalysis, SkipReason> {
    let series = dataset.extract_series(item, area);
    if series.is_empty() {
        return Err(SkipReason::NoData);
    }

    let split = series.partition(config.training_range(), config.eval_start);
    check_eligibility(&split, config.min_train_len)?;

    let horizon = split.evaluation.len();
    let (forecast, used_fallback) =
        fit_counterfactual(&split.training, horizon, config.primary, config.fallback)?;

    let rows = compare(&split.evaluation, &forecast)
        .map_err(|e| SkipReason::ModelFit(e.to_string()))?;

    Ok(PairAnalysis {
        key: PairKey::new(item, area),
        split,
        rows,
        used_fallback,
    })
}

/// Outcome of a full run over every configured (item, region) pair.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Comparison tables for every successfully analyzed pair.
    pub results: ResultSet,
    /// Pairs that contributed nothing, with the reason.
    pub skipped: Vec<(PairKey, SkipReason)>,
    /// Pairs where the fallback model order was used.
    pub fallback_pairs: usize,
    /// Charts successfully written.
    pub charts_written: usize,
    /// Chart writes that failed (non-fatal).
    pub chart_errors: usize,
}

/// Run the analysis over every configured (item, region) pair in order.
///
/// Per-pair failures are logged and skipped; chart write failures are
/// logged and do not invalidate the pair's comparison table.
pub fn run(dataset: &Dataset, config: &AnalysisConfig) -> RunReport {
    let mut report = RunReport::default();

    if let Some(dir) = &config.chart_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("could not create chart directory {}: {}", dir.display(), e);
        }
    }

    for item in &config.items {
        for area in &config.regions {
            let key = PairKey::new(item.clone(), area.clone());

            let analysis = match analyze_pair(dataset, item, area, config) {
                Ok(analysis) => analysis,
                Err(reason) => {
                    warn!("{key}: skipped: {reason}");
                    report.skipped.push((key, reason));
                    continue;
                }
            };

            if analysis.used_fallback {
                info!("{key}: primary order failed, fallback order used");
                report.fallback_pairs += 1;
            }
            info!(
                "{key}: {} training years, {} evaluation years compared",
                analysis.split.training.len(),
                analysis.split.evaluation.len()
            );

            if let Some(dir) = &config.chart_dir {
                let path = dir.join(plot::chart_file_name(item, area));
                let predicted: Vec<(i32, f64)> = analysis
                    .split
                    .evaluation
                    .years()
                    .iter()
                    .copied()
                    .zip(analysis.rows.iter().map(|r| r.predicted))
                    .collect();
                match plot::forecast_chart(
                    &path,
                    &format!("{item} - {area}"),
                    &analysis.split.training,
                    &analysis.split.evaluation,
                    &predicted,
                ) {
                    Ok(()) => {
                        info!("{key}: chart saved to {}", path.display());
                        report.charts_written += 1;
                    }
                    Err(e) => {
                        warn!("{key}: chart save failed: {e}");
                        report.chart_errors += 1;
                    }
                }
            }

            report.results.insert(analysis.key, analysis.rows);
        }
    }

    report
}
