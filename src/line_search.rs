//! Clamped quadratic line search (spec component C), used inside boxQP.

use nalgebra::{DMatrix, DVector};

use crate::config::BoxQpConfig;
use crate::linalg::{clamp, quad_cost};

/// Outcome of a clamped quadratic line search.
#[derive(Debug, Clone)]
pub struct LineSearchResult {
    /// The accepted point, or the last candidate tried if `failed`.
    pub x_opt: DVector<f64>,
    /// `q(x_opt)`.
    pub v_opt: f64,
    /// Number of backtracking steps taken.
    pub n_steps: usize,
    /// `true` if no accepting step size was found.
    pub failed: bool,
}

/// Finds a step `alpha` along `search_dir` such that
/// `x' = clamp(x0 + alpha * search_dir, lower, upper)` satisfies the Armijo
/// sufficient-decrease condition for `q(x) = 1/2 x^T Q x + c^T x`.
pub fn quadclamp_line_search(
    x0: &DVector<f64>,
    search_dir: &DVector<f64>,
    q: &DMatrix<f64>,
    c: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
    cfg: &BoxQpConfig,
) -> LineSearchResult {
    let value0 = quad_cost(q, c, x0);
    let grad0 = q * x0 + c;
    let slope0 = grad0.dot(search_dir);

    if slope0 >= 0.0 {
        return LineSearchResult {
            x_opt: x0.clone(),
            v_opt: value0,
            n_steps: 0,
            failed: true,
        };
    }

    let mut alpha = 1.0;
    let mut n_steps = 0;

    loop {
        let candidate = clamp(&(x0 + search_dir * alpha), lower, upper);
        let value = quad_cost(q, c, &candidate);

        if value0 - value >= -cfg.armijo * alpha * slope0 {
            return LineSearchResult {
                x_opt: candidate,
                v_opt: value,
                n_steps,
                failed: false,
            };
        }

        alpha *= cfg.step_dec;
        n_steps += 1;

        if alpha < cfg.min_step {
            return LineSearchResult {
                x_opt: candidate,
                v_opt: value,
                n_steps,
                failed: true,
            };
        }
    }
}
