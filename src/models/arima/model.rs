//! ARIMA (Autoregressive Integrated Moving Average) trend model.

use crate::core::{Forecast, YearSeries};
use crate::error::{ImpactError, Result};
use crate::models::arima::diff::{difference, integrate};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, quantile_normal};
use std::fmt;

/// ARIMA model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaSpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ArimaSpec {
    /// Create a new order specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Total number of parameters (AR + MA + intercept).
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }

    /// Minimum training length required to fit this order.
    ///
    /// The differenced series must be non-empty, and estimating an AR lag
    /// needs at least one full regression equation. A pure-MA order has no
    /// such requirement: on a minimal series it degenerates to an
    /// intercept-only drift model.
    pub fn min_observations(&self) -> usize {
        if self.p > 0 {
            self.d + self.p.max(self.q) + 1
        } else {
            self.d + 1
        }
    }
}

impl fmt::Display for ArimaSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA forecasting model.
///
/// ARIMA(p, d, q) combines an autoregressive component AR(p), differencing
/// I(d) for stationarity, and a moving-average component MA(q). Parameters
/// are estimated by minimizing the conditional sum of squares.
#[derive(Debug, Clone)]
pub struct Arima {
    spec: ArimaSpec,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Intercept (mean of differenced series).
    intercept: f64,
    /// Original training values (for integration).
    original: Option<Vec<f64>>,
    /// Differenced training values.
    differenced: Option<Vec<f64>>,
    /// Fitted values on the differenced scale.
    fitted_diff: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
}

impl Arima {
    /// Create a new ARIMA model with the given order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::with_spec(ArimaSpec::new(p, d, q))
    }

    /// Create a new ARIMA model from an order specification.
    pub fn with_spec(spec: ArimaSpec) -> Self {
        Self {
            spec,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            original: None,
            differenced: None,
            fitted_diff: None,
            residuals: None,
            residual_variance: None,
            aic: None,
        }
    }

    /// Get the model order.
    pub fn spec(&self) -> ArimaSpec {
        self.spec
    }

    /// Get AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Get MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Get the intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Get AIC, available once fitted with enough data.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Conditional sum of squares for a candidate parameter set.
    fn conditional_ss(
        diff_series: &[f64],
        p: usize,
        q: usize,
        ar: &[f64],
        ma: &[f64],
        intercept: f64,
    ) -> f64 {
        let n = diff_series.len();
        let start = p.max(q);

        if n <= start {
            return f64::MAX;
        }

        let mut residuals = vec![0.0; n];
        let mut css = 0.0;

        for t in start..n {
            let mut pred = intercept;
            for i in 0..p {
                pred += ar[i] * (diff_series[t - 1 - i] - intercept);
            }
            for i in 0..q {
                pred += ma[i] * residuals[t - 1 - i];
            }

            let error = diff_series[t] - pred;
            residuals[t] = error;
            css += error * error;
        }

        css
    }

    /// Estimate intercept and AR/MA coefficients from the differenced series.
    fn estimate_parameters(&mut self, diff_series: &[f64]) -> Result<()> {
        let p = self.spec.p;
        let q = self.spec.q;
        let diff_mean = mean(diff_series);

        // Too short to form a single conditional residual. Only reachable
        // for pure-MA orders (fit() rejects this case when p > 0): collapse
        // to the intercept-only drift model.
        if p + q == 0 || diff_series.len() <= p.max(q) {
            self.intercept = diff_mean;
            self.ar_coefficients = vec![0.0; p];
            self.ma_coefficients = vec![0.0; q];
            return Ok(());
        }

        let mut initial = vec![0.0; self.spec.num_params()];
        initial[0] = diff_mean;
        for coef in initial[1..].iter_mut() {
            *coef = 0.1;
        }

        // AR and MA coefficients are bounded for stationarity/invertibility.
        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(p + q));

        let config = NelderMeadConfig {
            max_iter: 1000,
            tolerance: 1e-8,
            ..Default::default()
        };

        let result = nelder_mead(
            |params| {
                let intercept = params[0];
                let ar = &params[1..1 + p];
                let ma = &params[1 + p..];
                Self::conditional_ss(diff_series, p, q, ar, ma, intercept)
            },
            &initial,
            Some(&bounds),
            config,
        );

        if !result.optimal_value.is_finite()
            || result.optimal_point.iter().any(|x| !x.is_finite())
        {
            return Err(ImpactError::ComputationError(format!(
                "ARIMA{} estimation did not converge",
                self.spec
            )));
        }

        self.intercept = result.optimal_point[0];
        self.ar_coefficients = result.optimal_point[1..1 + p].to_vec();
        self.ma_coefficients = result.optimal_point[1 + p..].to_vec();
        Ok(())
    }

    /// Calculate fitted values, residuals, and information criteria.
    fn calculate_fitted(&mut self, diff_series: &[f64]) {
        let n = diff_series.len();
        let p = self.spec.p;
        let q = self.spec.q;
        let start = p.max(q);

        let mut fitted = vec![f64::NAN; n];
        let mut residuals = vec![0.0; n];

        for t in start..n {
            let mut pred = self.intercept;
            for i in 0..p {
                pred += self.ar_coefficients[i] * (diff_series[t - 1 - i] - self.intercept);
            }
            for i in 0..q {
                pred += self.ma_coefficients[i] * residuals[t - 1 - i];
            }

            fitted[t] = pred;
            residuals[t] = diff_series[t] - pred;
        }

        if n > start {
            let valid = &residuals[start..];
            let variance = valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64;
            self.residual_variance = Some(variance);

            if variance > 0.0 {
                let n_eff = valid.len() as f64;
                let k = self.spec.num_params() as f64;
                let ll = -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());
                self.aic = Some(-2.0 * ll + 2.0 * k);
            }
        }

        self.fitted_diff = Some(fitted);
        self.residuals = Some(residuals);
    }
}

impl Forecaster for Arima {
    fn fit(&mut self, series: &YearSeries) -> Result<()> {
        let values = series.values();
        let min_len = self.spec.min_observations();

        if values.len() < min_len {
            return Err(ImpactError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        self.original = Some(values.to_vec());

        let diff_series = difference(values, self.spec.d);
        self.estimate_parameters(&diff_series)?;
        self.calculate_fitted(&diff_series);
        self.differenced = Some(diff_series);

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ImpactError::FitRequired)?;
        let diff_series = self.differenced.as_ref().ok_or(ImpactError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ImpactError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::default());
        }

        let p = self.spec.p;
        let q = self.spec.q;

        // Recurse forward on the differenced scale; future shocks are zero.
        let mut extended_diff = diff_series.clone();
        let mut extended_residuals = residuals.clone();

        for _ in 0..horizon {
            let t = extended_diff.len();
            let mut pred = self.intercept;

            for i in 0..p {
                if t > i {
                    pred += self.ar_coefficients[i] * (extended_diff[t - 1 - i] - self.intercept);
                }
            }
            for i in 0..q {
                if t > i {
                    pred += self.ma_coefficients[i] * extended_residuals[t - 1 - i];
                }
            }

            extended_diff.push(pred);
            extended_residuals.push(0.0);
        }

        let forecast_diff = &extended_diff[diff_series.len()..];
        let predictions = if self.spec.d > 0 {
            integrate(forecast_diff, original, self.spec.d)
        } else {
            forecast_diff.to_vec()
        };

        Ok(Forecast::from_values(predictions))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let forecast = self.predict(horizon)?;
        if horizon == 0 {
            return Ok(forecast);
        }

        let variance = self.residual_variance.unwrap_or(0.0);
        let z = quantile_normal((1.0 + level) / 2.0);
        let preds = forecast.point();

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);

        // Forecast variance grows linearly with horizon.
        for h in 1..=horizon {
            let se = (variance * h as f64).sqrt();
            lower.push(preds[h - 1] - z * se);
            upper.push(preds[h - 1] + z * se);
        }

        Ok(Forecast::from_values_with_intervals(
            preds.to_vec(),
            lower,
            upper,
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted_diff.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn annual_series(values: Vec<f64>) -> YearSeries {
        let years: Vec<i32> = (0..values.len() as i32).map(|i| 2000 + i).collect();
        YearSeries::new(years, values).unwrap()
    }

    #[test]
    fn fits_trend_order() {
        let values: Vec<f64> = (0..20)
            .map(|i| 1.5 + 0.12 * i as f64 + 0.02 * (i as f64 * 1.3).sin())
            .collect();
        let series = annual_series(values);

        let mut model = Arima::new(1, 1, 0);
        model.fit(&series).unwrap();

        assert_eq!(model.ar_coefficients().len(), 1);
        assert!(model.ma_coefficients().is_empty());

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
    }

    #[test]
    fn differenced_fit_continues_a_linear_trend() {
        let values: Vec<f64> = (0..12).map(|i| 2.0 + 0.25 * i as f64).collect();
        let series = annual_series(values.clone());

        let mut model = Arima::new(1, 1, 0);
        model.fit(&series).unwrap();

        let forecast = model.predict(3).unwrap();
        let preds = forecast.point();

        // A perfectly linear series keeps climbing at roughly its slope.
        let last = *values.last().unwrap();
        assert!(preds[0] > last);
        assert!(preds[2] > preds[0]);
        assert_relative_eq!(preds[0], last + 0.25, epsilon = 0.1);
    }

    #[test]
    fn shock_order_fits_short_series() {
        let series = annual_series(vec![3.0, 3.4]);

        let mut model = Arima::new(0, 1, 1);
        model.fit(&series).unwrap();

        // Degenerate drift model: each step adds the mean difference.
        let forecast = model.predict(2).unwrap();
        assert_relative_eq!(forecast.point()[0], 3.8, epsilon = 1e-9);
        assert_relative_eq!(forecast.point()[1], 4.2, epsilon = 1e-9);
    }

    #[test]
    fn trend_order_rejects_two_point_series() {
        let series = annual_series(vec![3.0, 3.4]);
        let mut model = Arima::new(1, 1, 0);
        assert!(matches!(
            model.fit(&series),
            Err(ImpactError::InsufficientData { needed: 3, got: 2 })
        ));
    }

    #[test]
    fn predict_requires_fit() {
        let model = Arima::new(1, 1, 0);
        assert!(matches!(model.predict(3), Err(ImpactError::FitRequired)));
    }

    #[test]
    fn zero_horizon_yields_empty_forecast() {
        let series = annual_series((0..10).map(|i| i as f64).collect());
        let mut model = Arima::new(1, 1, 0);
        model.fit(&series).unwrap();
        assert_eq!(model.predict(0).unwrap().horizon(), 0);
    }

    #[test]
    fn fit_is_deterministic() {
        let values: Vec<f64> = (0..15)
            .map(|i| 4.0 + 0.3 * i as f64 + 0.5 * (i as f64 * 0.7).sin())
            .collect();
        let series = annual_series(values);

        let mut a = Arima::new(1, 1, 0);
        let mut b = Arima::new(1, 1, 0);
        a.fit(&series).unwrap();
        b.fit(&series).unwrap();

        assert_eq!(a.predict(4).unwrap().point(), b.predict(4).unwrap().point());
    }

    #[test]
    fn intervals_bracket_point_forecast() {
        let values: Vec<f64> = (0..20)
            .map(|i| 5.0 + 0.4 * i as f64 + (i as f64 * 0.9).sin())
            .collect();
        let series = annual_series(values);

        let mut model = Arima::new(1, 1, 0);
        model.fit(&series).unwrap();

        let forecast = model.predict_with_intervals(4, 0.95).unwrap();
        assert!(forecast.has_intervals());
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        for (i, pred) in forecast.point().iter().enumerate() {
            assert!(lower[i] <= *pred);
            assert!(upper[i] >= *pred);
        }
    }

    #[test]
    fn spec_reports_minimum_observations() {
        assert_eq!(ArimaSpec::new(1, 1, 0).min_observations(), 3);
        assert_eq!(ArimaSpec::new(0, 1, 1).min_observations(), 2);
        assert_eq!(ArimaSpec::new(0, 0, 0).min_observations(), 1);
        assert_eq!(ArimaSpec::new(1, 1, 0).num_params(), 2);
    }

    #[test]
    fn spec_display() {
        assert_eq!(ArimaSpec::new(1, 1, 0).to_string(), "(1,1,0)");
    }

    #[test]
    fn model_name() {
        assert_eq!(Arima::new(1, 1, 0).name(), "ARIMA");
    }
}
