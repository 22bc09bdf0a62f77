//! Box-constrained Nelder-Mead minimisation for smoothing parameters.

use std::cmp::Ordering;

/// Outcome of a minimisation run.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Nelder-Mead settings.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Stop once the spread of objective values across the simplex falls below this.
    pub tolerance: f64,
    /// Size of the initial simplex along each axis.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-9,
            initial_step: 0.1,
        }
    }
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimise `objective` inside the box `bounds`, starting from `initial`.
///
/// Every candidate point is clamped into the box before evaluation, so the
/// objective is never called outside it.
///
/// # Example
/// ```
/// use forecast_explorer::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let min = nelder_mead(
///     |x| (x[0] - 0.3).powi(2) + (x[1] - 0.7).powi(2),
///     &[0.5, 0.5],
///     &[(0.0, 1.0), (0.0, 1.0)],
///     &NelderMeadConfig::default(),
/// );
/// assert!((min.point[0] - 0.3).abs() < 1e-3);
/// assert!((min.point[1] - 0.7).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: &[(f64, f64)],
    config: &NelderMeadConfig,
) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let dims = initial.len();
    let clamp = |p: Vec<f64>| -> Vec<f64> {
        p.into_iter()
            .enumerate()
            .map(|(i, x)| match bounds.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect()
    };
    let eval = |p: &[f64]| {
        let v = objective(p);
        if v.is_finite() {
            v
        } else {
            f64::MAX
        }
    };

    if dims == 0 {
        return Minimum {
            point: vec![],
            value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    // Vertices paired with their objective values; kept sorted best-first.
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dims + 1);
    let start = clamp(initial.to_vec());
    simplex.push((start.clone(), eval(&start)));
    for axis in 0..dims {
        let mut vertex = start.clone();
        vertex[axis] += config.initial_step;
        // Step back instead when the upper bound swallows the step.
        if let Some(&(lo, hi)) = bounds.get(axis) {
            if vertex[axis] > hi {
                vertex[axis] = (start[axis] - config.initial_step).max(lo);
            }
        }
        let vertex = clamp(vertex);
        let value = eval(&vertex);
        simplex.push((vertex, value));
    }

    let by_value = |a: &(Vec<f64>, f64), b: &(Vec<f64>, f64)| {
        a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)
    };

    let mut iterations = 0;
    let mut converged = false;
    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(by_value);

        let best = simplex[0].1;
        let worst = simplex[dims].1;
        if (worst - best).abs() <= config.tolerance * (1.0 + best.abs()) {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..dims)
            .map(|j| simplex[..dims].iter().map(|(p, _)| p[j]).sum::<f64>() / dims as f64)
            .collect();
        let toward = |from: &[f64], coef: f64| -> Vec<f64> {
            clamp(
                centroid
                    .iter()
                    .zip(from)
                    .map(|(c, x)| c + coef * (x - c))
                    .collect(),
            )
        };

        let reflected = toward(&simplex[dims].0, -REFLECT);
        let reflected_value = eval(&reflected);

        if reflected_value < best {
            let expanded = toward(&reflected, EXPAND);
            let expanded_value = eval(&expanded);
            simplex[dims] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < simplex[dims - 1].1 {
            simplex[dims] = (reflected, reflected_value);
            continue;
        }

        let (contracted, contracted_value) = if reflected_value < worst {
            let p = toward(&reflected, CONTRACT);
            let v = eval(&p);
            (p, v)
        } else {
            let p = toward(&simplex[dims].0, CONTRACT);
            let v = eval(&p);
            (p, v)
        };
        if contracted_value < worst.min(reflected_value) {
            simplex[dims] = (contracted, contracted_value);
            continue;
        }

        let anchor = simplex[0].0.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(&vertex.0)
                .map(|(a, x)| a + SHRINK * (x - a))
                .collect();
            let shrunk = clamp(shrunk);
            let value = eval(&shrunk);
            *vertex = (shrunk, value);
        }
    }

    simplex.sort_by(by_value);
    let (point, value) = simplex.swap_remove(0);
    Minimum {
        point,
        value,
        iterations,
        converged,
    }
}
