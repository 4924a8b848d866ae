//! Differencing utilities for ARIMA models.

/// Apply `d` rounds of first differencing to a series.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return vec![];
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Integrate (reverse differencing) a forecast produced on the differenced
/// scale back to the original scale.
///
/// `original` supplies the initial values at each differencing level.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        // Last value of the original series differenced `level` times is the
        // anchor the cumulative sum continues from.
        let anchor = if level == 0 {
            original.last().copied().unwrap_or(0.0)
        } else {
            difference(original, level).last().copied().unwrap_or(0.0)
        };

        let mut cumsum = anchor;
        for value in result.iter_mut() {
            cumsum += *value;
            *value = cumsum;
        }
    }
    result
}
