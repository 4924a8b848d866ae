//! Forecaster trait defining the common interface for trend models.

use crate::core::{Forecast, YearSeries};
use crate::error::Result;

/// Common interface for trend-extrapolation models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to a training series. Calendar gaps are ignored: the
    /// values are treated as a regularly spaced sequence indexed by
    /// position.
    fn fit(&mut self, series: &YearSeries) -> Result<()>;

    /// Produce point predictions for the next `horizon` steps beyond the
    /// end of the training series.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Produce predictions with confidence intervals.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        // Default implementation just returns point predictions
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
pub type BoxedForecaster = Box<dyn Forecaster>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::YearSeries;
    use crate::models::arima::Arima;

    fn trending_series(n: usize) -> YearSeries {
        let years: Vec<i32> = (0..n as i32).map(|i| 2000 + i).collect();
        let values: Vec<f64> = (0..n).map(|i| 10.0 + 0.8 * i as f64).collect();
        YearSeries::new(years, values).unwrap()
    }

    #[test]
    fn boxed_forecaster_fit_predict() {
        let mut model: BoxedForecaster = Box::new(Arima::new(1, 1, 0));
        assert!(!model.is_fitted());

        model.fit(&trending_series(15)).unwrap();
        assert!(model.is_fitted());

        let forecast = model.predict(4).unwrap();
        assert_eq!(forecast.horizon(), 4);
    }

    #[test]
    fn default_interval_implementation_falls_back_to_points() {
        struct Flat(Option<Vec<f64>>);
        impl Forecaster for Flat {
            fn fit(&mut self, series: &YearSeries) -> Result<()> {
                self.0 = Some(vec![0.0; series.len()]);
                Ok(())
            }
            fn predict(&self, horizon: usize) -> Result<Forecast> {
                Ok(Forecast::from_values(vec![1.0; horizon]))
            }
            fn fitted_values(&self) -> Option<&[f64]> {
                self.0.as_deref()
            }
            fn residuals(&self) -> Option<&[f64]> {
                None
            }
            fn name(&self) -> &str {
                "Flat"
            }
        }

        let mut model = Flat(None);
        model.fit(&trending_series(5)).unwrap();
        let forecast = model.predict_with_intervals(3, 0.95).unwrap();
        assert_eq!(forecast.horizon(), 3);
        assert!(!forecast.has_intervals());
    }
}
