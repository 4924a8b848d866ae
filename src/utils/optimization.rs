//! Derivative-free optimization for parameter estimation.

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step size.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Minimize `objective` with the Nelder-Mead simplex method.
///
/// `bounds`, when given, clamps every candidate point per dimension.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    // Simplex of n+1 vertices: the initial point plus one perturbation per
    // dimension.
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clamp_point(initial.to_vec(), bounds));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        simplex.push(clamp_point(vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if values[worst] - values[best] < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid_excluding(&simplex, worst);
        if simplex
            .iter()
            .all(|v| distance(v, &centroid) < config.tolerance)
        {
            // Simplex has collapsed.
            converged = true;
            break;
        }

        // Reflection, expansion, and contraction are all affine steps from
        // the centroid toward (or away from) a reference point.
        let reflected = clamp_point(
            affine_step(&centroid, &simplex[worst], -config.alpha),
            bounds,
        );
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst] && reflected_value >= values[best] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        if reflected_value < values[best] {
            let expanded = clamp_point(affine_step(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        let (toward, limit) = if reflected_value < values[worst] {
            (reflected.clone(), reflected_value)
        } else {
            (simplex[worst].clone(), values[worst])
        };
        let contracted = clamp_point(affine_step(&centroid, &toward, config.rho), bounds);
        let contracted_value = objective(&contracted);
        if contracted_value <= limit {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink everything toward the best vertex.
        let anchor = simplex[best].clone();
        for (i, vertex) in simplex.iter_mut().enumerate() {
            if i == best {
                continue;
            }
            for (x, a) in vertex.iter_mut().zip(anchor.iter()) {
                *x = a + config.sigma * (*x - a);
            }
            *vertex = clamp_point(std::mem::take(vertex), bounds);
            values[i] = objective(vertex.as_slice());
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    }
}

/// Centroid of all simplex vertices except the excluded one.
fn centroid_excluding(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];
    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude {
            for (c, x) in centroid.iter_mut().zip(vertex.iter()) {
                *c += x;
            }
        }
    }
    for c in &mut centroid {
        *c /= count;
    }
    centroid
}

/// centroid + coeff * (point - centroid); negative coeff reflects through
/// the centroid.
fn affine_step(centroid: &[f64], point: &[f64], coeff: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point.iter())
        .map(|(c, p)| c + coeff * (p - c))
        .collect()
}

fn clamp_point(mut point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, (lo, hi)) in point.iter_mut().zip(bounds.iter()) {
            *x = x.clamp(*lo, *hi);
        }
    }
    point
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
