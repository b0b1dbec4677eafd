//! Rollout with feedforward/feedback control law and clamping (part of spec
//! component G).

use nalgebra::{DMatrix, DVector};

use crate::linalg::clamp;
use crate::model::TrajectoryModel;

/// Feedback term applied on top of the nominal control sequence during a
/// forward pass: `u'[t] = u[t] + alpha * k[t] + K[t] * (x[t] - x_nom[t])`.
pub struct Feedback<'a> {
    /// Feedforward correction, one per timestep.
    pub k: &'a [DVector<f64>],
    /// Feedback gain, one per timestep.
    pub big_k: &'a [DMatrix<f64>],
    /// Nominal trajectory the feedback gains were computed around.
    pub x_nom: &'a [DVector<f64>],
    /// Backtracking step size.
    pub alpha: f64,
}

/// Rolls the dynamics forward from `x0` under `us` (optionally perturbed by
/// `feedback`), clamping every applied control to `[u_lower, u_upper]`.
///
/// Returns `(xs, us_applied, cost)` where `xs` has length `T + 1` and
/// `us_applied` has length `T`.
pub fn forward_pass<M: TrajectoryModel>(
    model: &M,
    x0: &DVector<f64>,
    us: &[DVector<f64>],
    feedback: Option<&Feedback>,
) -> (Vec<DVector<f64>>, Vec<DVector<f64>>, f64) {
    let t_len = us.len();
    let u_lower = model.u_lower();
    let u_upper = model.u_upper();

    let mut xs = Vec::with_capacity(t_len + 1);
    let mut us_applied = Vec::with_capacity(t_len);
    xs.push(x0.clone());
    let mut cost = 0.0;

    for t in 0..t_len {
        let mut u_t = us[t].clone();
        if let Some(fb) = feedback {
            u_t += fb.k[t].scale(fb.alpha) + &fb.big_k[t] * (&xs[t] - &fb.x_nom[t]);
        }
        let u_t = clamp(&u_t, &u_lower, &u_upper);

        cost += model.cost(&xs[t], &u_t);
        let x_next = model.dynamics(&xs[t], &u_t);

        us_applied.push(u_t);
        xs.push(x_next);
    }

    cost += model.terminal_cost(&xs[t_len]);
    (xs, us_applied, cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Integrator1d;

    impl TrajectoryModel for Integrator1d {
        fn dynamics(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
            DVector::from_vec(vec![x[0] + u[0]])
        }
        fn cost(&self, x: &DVector<f64>, u: &DVector<f64>) -> f64 {
            x[0] * x[0] + u[0] * u[0]
        }
        fn x_dims(&self) -> usize {
            1
        }
        fn u_dims(&self) -> usize {
            1
        }
        fn u_lower(&self) -> DVector<f64> {
            DVector::from_vec(vec![-0.5])
        }
        fn u_upper(&self) -> DVector<f64> {
            DVector::from_vec(vec![0.5])
        }
    }

    #[test]
    fn rollout_matches_dynamics_and_clamps_controls() {
        let model = Integrator1d;
        let x0 = DVector::from_vec(vec![1.0]);
        let us = vec![DVector::from_vec(vec![2.0]), DVector::from_vec(vec![0.1])];

        let (xs, us_applied, _cost) = forward_pass(&model, &x0, &us, None);

        assert_eq!(xs.len(), 3);
        assert_eq!(us_applied[0][0], 0.5);
        assert_eq!(xs[1][0], 1.5);
        assert_eq!(xs[2][0], 1.6);
    }
}
