//! Forecast result structure for holding predictions.

/// A univariate forecast: point predictions with optional prediction
/// intervals.
#[derive(Debug, Clone, Default)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(values: Vec<f64>, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if the forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Lower interval bounds, if present.
    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    /// Upper interval bounds, if present.
    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Check if prediction intervals are available.
    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_from_values() {
        let forecast = Forecast::from_values(vec![1.0, 2.0, 3.0]);
        assert_eq!(forecast.horizon(), 3);
        assert!(!forecast.is_empty());
        assert_eq!(forecast.point(), &[1.0, 2.0, 3.0]);
        assert!(!forecast.has_intervals());
        assert!(forecast.lower().is_none());
        assert!(forecast.upper().is_none());
    }

    #[test]
    fn forecast_with_intervals() {
        let forecast =
            Forecast::from_values_with_intervals(vec![2.0, 3.0], vec![1.0, 2.0], vec![3.0, 4.0]);
        assert!(forecast.has_intervals());
        assert_eq!(forecast.lower().unwrap(), &[1.0, 2.0]);
        assert_eq!(forecast.upper().unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn empty_forecast() {
        let forecast = Forecast::default();
        assert!(forecast.is_empty());
        assert_eq!(forecast.horizon(), 0);
    }
}
