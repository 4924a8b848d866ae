//! Cross-sectional pandemic-impact regression.
//!
//! Fits, per grocery item, an ordinary least squares model
//! `value ~ year + post + region + post:region` over all observations for
//! the configured regions, where `post` indicates years at or after the
//! pandemic boundary. The post coefficient plus its regional interaction
//! estimates the extra post-pandemic price shift in each region.

use crate::data::Dataset;
use crate::error::{ImpactError, Result};
use std::collections::HashMap;

/// OLS regression coefficients and intercept.
#[derive(Debug, Clone)]
pub struct OlsResult {
    /// Regression coefficients (one per regressor, in `regressor_names`
    /// order).
    pub coefficients: Vec<f64>,
    /// Intercept term.
    pub intercept: f64,
    /// Names of regressors in order.
    pub regressor_names: Vec<String>,
}

impl OlsResult {
    /// Look up a coefficient by regressor name.
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.regressor_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.coefficients[i])
    }

    /// Predict values from regressor columns.
    pub fn predict(&self, regressors: &HashMap<String, Vec<f64>>) -> Result<Vec<f64>> {
        let first_name = self.regressor_names.first().ok_or_else(|| {
            ImpactError::InvalidParameter("no regressors stored".into())
        })?;
        let n = regressors
            .get(first_name)
            .ok_or_else(|| {
                ImpactError::InvalidParameter(format!("missing regressor '{first_name}'"))
            })?
            .len();

        let mut predictions = vec![self.intercept; n];
        for (i, name) in self.regressor_names.iter().enumerate() {
            let values = regressors.get(name).ok_or_else(|| {
                ImpactError::InvalidParameter(format!("missing regressor '{name}'"))
            })?;
            if values.len() != n {
                return Err(ImpactError::DimensionMismatch {
                    expected: n,
                    got: values.len(),
                });
            }
            for (pred, x) in predictions.iter_mut().zip(values.iter()) {
                *pred += self.coefficients[i] * x;
            }
        }
        Ok(predictions)
    }

    /// Number of regressors.
    pub fn num_regressors(&self) -> usize {
        self.coefficients.len()
    }
}

/// Fit OLS regression: y = intercept + X @ coefficients.
///
/// Solves the normal equations with a Cholesky decomposition; a small
/// ridge term on the diagonal keeps near-collinear designs solvable.
pub fn ols_fit(y: &[f64], regressors: &HashMap<String, Vec<f64>>) -> Result<OlsResult> {
    let n = y.len();
    if n == 0 {
        return Err(ImpactError::InsufficientData { needed: 1, got: 0 });
    }

    if regressors.is_empty() {
        let intercept = y.iter().sum::<f64>() / n as f64;
        return Ok(OlsResult {
            coefficients: vec![],
            intercept,
            regressor_names: vec![],
        });
    }

    // Deterministic regressor order.
    let mut regressor_names: Vec<String> = regressors.keys().cloned().collect();
    regressor_names.sort();

    let k = regressor_names.len();
    for name in &regressor_names {
        let values = &regressors[name];
        if values.len() != n {
            return Err(ImpactError::DimensionMismatch {
                expected: n,
                got: values.len(),
            });
        }
    }

    // Normal equations X'X beta = X'y with an implicit leading column of
    // ones for the intercept.
    let num_params = k + 1;
    let mut xtx = vec![vec![0.0; num_params]; num_params];
    let mut xty = vec![0.0; num_params];

    let x_cols: Vec<&[f64]> = regressor_names
        .iter()
        .map(|name| regressors[name].as_slice())
        .collect();

    for obs in 0..n {
        let y_obs = y[obs];

        xtx[0][0] += 1.0;
        for j in 0..k {
            let xj = x_cols[j][obs];
            xtx[0][j + 1] += xj;
            xtx[j + 1][0] += xj;
        }
        for i in 0..k {
            let xi = x_cols[i][obs];
            for j in 0..k {
                xtx[i + 1][j + 1] += xi * x_cols[j][obs];
            }
        }

        xty[0] += y_obs;
        for i in 0..k {
            xty[i + 1] += x_cols[i][obs] * y_obs;
        }
    }

    for i in 0..num_params {
        xtx[i][i] += 1e-8;
    }

    let beta = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        ImpactError::ComputationError("regression design matrix is not positive definite".into())
    })?;

    Ok(OlsResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        regressor_names,
    })
}

/// Solve A x = b for symmetric positive definite A via Cholesky.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward then backward substitution.
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

/// A fitted per-item impact model with its design columns retained for
/// diagnostics.
#[derive(Debug, Clone)]
pub struct ImpactModel {
    /// Item the model was fitted for.
    pub item: String,
    /// Region absorbed into the intercept.
    pub reference_region: String,
    /// All modeled regions, reference first.
    pub regions: Vec<String>,
    /// The underlying OLS fit.
    pub ols: OlsResult,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

impl ImpactModel {
    /// In-sample fitted values.
    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    /// In-sample residuals (actual - fitted).
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Estimated post-pandemic price shift per region.
    ///
    /// The reference region's impact is the bare post coefficient; other
    /// regions add their interaction term.
    pub fn regional_impacts(&self) -> Vec<(String, f64)> {
        let base = self.ols.coefficient("post").unwrap_or(0.0);
        self.regions
            .iter()
            .map(|region| {
                let interaction = self
                    .ols
                    .coefficient(&interaction_name(region))
                    .unwrap_or(0.0);
                (region.clone(), base + interaction)
            })
            .collect()
    }
}

fn dummy_name(region: &str) -> String {
    format!("region:{region}")
}

fn interaction_name(region: &str) -> String {
    format!("post:region:{region}")
}

/// Fit the pandemic-impact regression for one item across regions.
///
/// `post_from` is the first post-pandemic year. The first region in
/// `regions` is the reference level.
pub fn fit_impact_model(
    dataset: &Dataset,
    item: &str,
    regions: &[String],
    post_from: i32,
) -> Result<ImpactModel> {
    if regions.is_empty() {
        return Err(ImpactError::InvalidParameter(
            "at least one region is required".into(),
        ));
    }

    let observations: Vec<_> = dataset.item_observations(item, regions).collect();
    if observations.is_empty() {
        return Err(ImpactError::EmptyData);
    }

    let n = observations.len();
    let reference = &regions[0];

    let mut y = Vec::with_capacity(n);
    let mut year_col = Vec::with_capacity(n);
    let mut post_col = Vec::with_capacity(n);
    let non_reference = &regions[1..];
    let mut dummy_cols = vec![Vec::with_capacity(n); non_reference.len()];
    let mut interaction_cols = vec![Vec::with_capacity(n); non_reference.len()];

    for obs in &observations {
        let post = if obs.year >= post_from { 1.0 } else { 0.0 };
        y.push(obs.value);
        year_col.push(obs.year as f64);
        post_col.push(post);
        for (i, region) in non_reference.iter().enumerate() {
            let is_region = if obs.area_name == *region { 1.0 } else { 0.0 };
            dummy_cols[i].push(is_region);
            interaction_cols[i].push(post * is_region);
        }
    }

    let mut regressors: HashMap<String, Vec<f64>> = HashMap::new();
    regressors.insert("year".to_string(), year_col);
    regressors.insert("post".to_string(), post_col);
    for ((region, dummy), interaction) in non_reference
        .iter()
        .zip(dummy_cols)
        .zip(interaction_cols)
    {
        regressors.insert(dummy_name(region), dummy);
        regressors.insert(interaction_name(region), interaction);
    }

    let num_params = regressors.len() + 1;
    if n <= num_params {
        return Err(ImpactError::InsufficientData {
            needed: num_params + 1,
            got: n,
        });
    }

    let ols = ols_fit(&y, &regressors)?;
    let fitted = ols.predict(&regressors)?;
    let residuals = y
        .iter()
        .zip(fitted.iter())
        .map(|(yi, fi)| yi - fi)
        .collect();

    Ok(ImpactModel {
        item: item.to_string(),
        reference_region: reference.clone(),
        regions: regions.to_vec(),
        ols,
        fitted,
        residuals,
    })
}
