//! Box-constrained QP projected-Newton solver (spec component D).
//!
//! Solves `min 1/2 x^T Q x + c^T x` subject to `lower <= x <= upper`, used by
//! the backward pass to compute each timestep's feedforward control
//! correction under the control bounds.

use nalgebra::{DMatrix, DVector};

use crate::config::BoxQpConfig;
use crate::line_search::quadclamp_line_search;
use crate::linalg::{clamp, quad_cost, regularized_cholesky, scatter_by_mask, subvec_by_mask, submat_by_masks};

/// Result codes from `solve_box_qp`.
///
/// Codes 4-6 are successful terminations; the caller uses the returned
/// `x_opt` and `r_free` directly. Codes 1-3 mean the backward pass must
/// increase its Levenberg-Marquardt damping and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxQpStatus {
    /// Free-subspace Hessian was not positive-definite (Cholesky failed).
    HessianNotPositiveDefinite = 1,
    /// No descent direction found, or the iteration budget was exhausted.
    NoDescentDirection = 2,
    /// The clamped line search failed.
    LineSearchFailed = 3,
    /// Converged: relative improvement below `min_rel_improve`.
    ConvergedRelativeImprovement = 4,
    /// Converged: free-gradient norm below `min_grad`.
    ConvergedGradientNorm = 5,
    /// Converged: every coordinate is clamped at a bound.
    ConvergedAllClamped = 6,
}

impl BoxQpStatus {
    /// `true` for the three successful-termination codes (4-6).
    pub fn is_converged(self) -> bool {
        matches!(
            self,
            BoxQpStatus::ConvergedRelativeImprovement
                | BoxQpStatus::ConvergedGradientNorm
                | BoxQpStatus::ConvergedAllClamped
        )
    }
}

/// Outcome of `solve_box_qp`.
pub struct BoxQpResult {
    /// The optimal (or best found) point.
    pub x_opt: DVector<f64>,
    /// `true` at index `i` iff coordinate `i` is free (unclamped) at `x_opt`.
    pub v_free: Vec<bool>,
    /// Upper-triangular Cholesky factor of `Q` restricted to the free
    /// subspace, from the last successful factorization.
    pub r_free: DMatrix<f64>,
    /// Termination status.
    pub status: BoxQpStatus,
    /// Number of projected-Newton iterations performed.
    pub iterations: usize,
}

/// Solves `min 1/2 x^T Q x + c^T x` subject to `lower <= x <= upper`.
///
/// `Q` need not be positive-definite globally, only on the free subspace
/// encountered at termination.
pub fn solve_box_qp(
    q: &DMatrix<f64>,
    c: &DVector<f64>,
    x0: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
    cfg: &BoxQpConfig,
) -> BoxQpResult {
    let d = x0.len();
    let mut x = clamp(x0, lower, upper);
    let mut value = quad_cost(q, c, &x);
    let mut old_value = value;

    let mut free = vec![true; d];
    let mut r_free = DMatrix::<f64>::zeros(0, 0);
    let mut status = BoxQpStatus::NoDescentDirection;
    let mut iterations = 0;
    // Set the moment any branch below decides the outer loop is done, so the
    // post-loop fallback only fires on genuine iteration-budget exhaustion,
    // never by mistaking which branch produced the final iteration's `break`.
    let mut terminated = false;

    for iter in 0..cfg.max_iter {
        iterations = iter + 1;

        if iter > 0 {
            let rel_improve = (old_value - value) / old_value.abs();
            if rel_improve < cfg.min_rel_improve {
                status = BoxQpStatus::ConvergedRelativeImprovement;
                terminated = true;
                break;
            }
        }
        old_value = value;

        let grad = q * &x + c;

        free = (0..d)
            .map(|i| !((x[i] == lower[i] && grad[i] > 0.0) || (x[i] == upper[i] && grad[i] < 0.0)))
            .collect();

        if free.iter().all(|&f| !f) {
            status = BoxQpStatus::ConvergedAllClamped;
            terminated = true;
            break;
        }

        let grad_free = subvec_by_mask(&grad, &free);
        if grad_free.norm() < cfg.min_grad {
            status = BoxQpStatus::ConvergedGradientNorm;
            terminated = true;
            break;
        }

        let q_ff = submat_by_masks(q, &free, &free);
        let r = match regularized_cholesky(&q_ff, 0.0) {
            Some(r) => r,
            None => {
                status = BoxQpStatus::HessianNotPositiveDefinite;
                terminated = true;
                break;
            }
        };
        r_free = r.clone();

        // Newton step restricted to the free subspace: -Q_ff^{-1} grad_free,
        // solved via the two triangular solves implied by r^T r = Q_ff.
        let z = r.tr_solve_upper_triangular(&grad_free).expect("r is upper-triangular, nonsingular");
        let step_free = -r.solve_upper_triangular(&z).expect("r is upper-triangular, nonsingular");
        let search_dir = scatter_by_mask(&step_free, &free);

        let slope = grad.dot(&search_dir);
        if slope >= -cfg.min_grad {
            status = BoxQpStatus::NoDescentDirection;
            terminated = true;
            break;
        }

        let ls = quadclamp_line_search(&x, &search_dir, q, c, lower, upper, cfg);
        if ls.failed {
            status = BoxQpStatus::LineSearchFailed;
            terminated = true;
            break;
        }

        x = ls.x_opt;
        value = ls.v_opt;
    }

    if !terminated {
        status = BoxQpStatus::NoDescentDirection;
    }

    BoxQpResult {
        x_opt: x,
        v_free: free,
        r_free,
        status,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unconstrained_optimum_matches_minus_q_inv_c() {
        let q = DMatrix::identity(2, 2) * 2.0;
        let c = DVector::zeros(2);
        let x0 = DVector::from_vec(vec![2.0, 2.0]);
        let lower = DVector::from_vec(vec![-10.0, -10.0]);
        let upper = DVector::from_vec(vec![10.0, 10.0]);

        let res = solve_box_qp(&q, &c, &x0, &lower, &upper, &BoxQpConfig::default());

        assert!(res.status.is_converged());
        assert_relative_eq!(res.x_opt, DVector::from_vec(vec![0.0, 0.0]), epsilon = 1e-6);
    }

    #[test]
    fn active_bound_reports_all_clamped() {
        let q = DMatrix::identity(2, 2) * 2.0;
        let c = DVector::zeros(2);
        let x0 = DVector::from_vec(vec![2.0, 2.0]);
        let lower = DVector::from_vec(vec![1.5, 1.5]);
        let upper = DVector::from_vec(vec![10.0, 10.0]);

        let res = solve_box_qp(&q, &c, &x0, &lower, &upper, &BoxQpConfig::default());

        assert_eq!(res.status, BoxQpStatus::ConvergedAllClamped);
        assert_relative_eq!(res.x_opt, DVector::from_vec(vec![1.5, 1.5]), epsilon = 1e-6);
        assert_eq!(res.v_free, vec![false, false]);
        let expected_r = DMatrix::identity(2, 2) * std::f64::consts::SQRT_2;
        assert_relative_eq!(res.r_free, expected_r, epsilon = 1e-3);
    }

    #[test]
    fn interior_optimum_reports_small_gradient() {
        let q = DMatrix::identity(2, 2) * 3.001;
        let c = DVector::from_vec(vec![0.201, 0.201]);
        let x0 = DVector::zeros(2);
        let lower = DVector::from_vec(vec![-0.6, -0.6]);
        let upper = DVector::from_vec(vec![0.4, 0.4]);

        let res = solve_box_qp(&q, &c, &x0, &lower, &upper, &BoxQpConfig::default());

        assert_eq!(res.status, BoxQpStatus::ConvergedGradientNorm);
        assert_relative_eq!(
            res.x_opt,
            DVector::from_vec(vec![-0.0669777, -0.0669777]),
            epsilon = 1e-6
        );
        assert_eq!(res.v_free, vec![true, true]);
        let expected_r = DMatrix::identity(2, 2) * 1.73234;
        assert_relative_eq!(res.r_free, expected_r, epsilon = 1e-3);
    }

    #[test]
    fn non_positive_definite_status_survives_on_the_final_iteration() {
        let mut cfg = BoxQpConfig::default();
        cfg.max_iter = 1;
        let q = DMatrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, -1.0]);
        let c = DVector::from_vec(vec![1.0, 1.0]);
        let x0 = DVector::zeros(2);
        let lower = DVector::from_vec(vec![-10.0, -10.0]);
        let upper = DVector::from_vec(vec![10.0, 10.0]);

        let res = solve_box_qp(&q, &c, &x0, &lower, &upper, &cfg);

        assert_eq!(res.status, BoxQpStatus::HessianNotPositiveDefinite);
    }

    #[test]
    fn mixed_active_set_clamps_only_bound_hitting_coordinate() {
        let mut q = DMatrix::identity(3, 3);
        q[(1, 1)] = 5.0;
        let c = DVector::zeros(3);
        let x0 = DVector::from_vec(vec![0.5, 0.5, 1.0]);
        let lower = DVector::from_vec(vec![0.2, -1.0, -1.0]);
        let upper = DVector::from_vec(vec![1.0, 1.0, 1.0]);

        let res = solve_box_qp(&q, &c, &x0, &lower, &upper, &BoxQpConfig::default());

        assert!(res.status.is_converged());
        for i in 0..3 {
            assert!(res.x_opt[i] >= lower[i] - 1e-9 && res.x_opt[i] <= upper[i] + 1e-9);
        }
    }

    #[test]
    fn active_set_consistency_holds_at_termination() {
        let q = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 2.0]);
        let c = DVector::from_vec(vec![1.0, -3.0]);
        let x0 = DVector::from_vec(vec![0.1, 0.1]);
        let lower = DVector::from_vec(vec![-1.0, -1.0]);
        let upper = DVector::from_vec(vec![0.5, 0.5]);

        let res = solve_box_qp(&q, &c, &x0, &lower, &upper, &BoxQpConfig::default());
        let grad = &q * &res.x_opt + &c;

        for i in 0..2 {
            if !res.v_free[i] {
                let at_lower = (res.x_opt[i] - lower[i]).abs() < 1e-6;
                let at_upper = (res.x_opt[i] - upper[i]).abs() < 1e-6;
                assert!(at_lower || at_upper);
                if at_lower {
                    assert!(grad[i] >= -1e-6);
                } else {
                    assert!(grad[i] <= 1e-6);
                }
            }
        }
    }
}
