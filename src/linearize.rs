//! Trajectory linearization (spec component E): builds per-timestep
//! `fx, fu, cx, cu, cxx, cxu, cuu` along a nominal trajectory via finite
//! differences.

use nalgebra::{DMatrix, DVector};

use crate::config::FiniteDifferenceConfig;
use crate::finite_diff::{gradient_vec_to_scalar, hessian_vec_to_scalar, jacobian_vec_to_vec, mixed_hessian};
use crate::model::TrajectoryModel;

/// Per-timestep linearization/quadraticization tensors, logically of length
/// `T + 1` (the last slot holds only the terminal cost's gradient/Hessian).
pub struct Linearization {
    /// `fx[t] = df/dx (x[t], u[t])`.
    pub fx: Vec<DMatrix<f64>>,
    /// `fu[t] = df/du (x[t], u[t])`.
    pub fu: Vec<DMatrix<f64>>,
    /// `cx[t] = dc/dx (x[t], u[t])`.
    pub cx: Vec<DVector<f64>>,
    /// `cu[t] = dc/du (x[t], u[t])`.
    pub cu: Vec<DVector<f64>>,
    /// `cxx[t]`, symmetric.
    pub cxx: Vec<DMatrix<f64>>,
    /// `cxu[t]`.
    pub cxu: Vec<DMatrix<f64>>,
    /// `cuu[t]`, symmetric.
    pub cuu: Vec<DMatrix<f64>>,
}

impl Linearization {
    /// Allocates zeroed tensors for a horizon of `t` timesteps (plus the
    /// terminal slot), with state dimension `n` and control dimension `m`.
    pub fn zeros(t_len: usize, n: usize, m: usize) -> Self {
        Self {
            fx: vec![DMatrix::zeros(n, n); t_len + 1],
            fu: vec![DMatrix::zeros(n, m); t_len + 1],
            cx: vec![DVector::zeros(n); t_len + 1],
            cu: vec![DVector::zeros(m); t_len + 1],
            cxx: vec![DMatrix::zeros(n, n); t_len + 1],
            cxu: vec![DMatrix::zeros(n, m); t_len + 1],
            cuu: vec![DMatrix::zeros(m, m); t_len + 1],
        }
    }

    /// Rebuilds every tensor along `(xs, us)` for `t in 0..T`, and fills the
    /// terminal slot from `model.terminal_cost` if it differs from the
    /// default zero (checked once, cheaply, before committing to the FD
    /// Hessian pass at the terminal state).
    pub fn build<M: TrajectoryModel>(
        model: &M,
        xs: &[DVector<f64>],
        us: &[DVector<f64>],
        fd: &FiniteDifferenceConfig,
    ) -> Self {
        let t_len = us.len();
        let n = model.x_dims();
        let m = model.u_dims();
        let mut lin = Self::zeros(t_len, n, m);

        for t in 0..t_len {
            let x = &xs[t];
            let u = &us[t];

            let dyn_x = |xv: &DVector<f64>| model.dynamics(xv, u);
            let dyn_u = |uv: &DVector<f64>| model.dynamics(x, uv);
            lin.fx[t] = jacobian_vec_to_vec(dyn_x, x, fd.h_jacobian);
            lin.fu[t] = jacobian_vec_to_vec(dyn_u, u, fd.h_jacobian);

            let cost_x = |xv: &DVector<f64>| model.cost(xv, u);
            let cost_u = |uv: &DVector<f64>| model.cost(x, uv);
            lin.cx[t] = gradient_vec_to_scalar(cost_x, x, fd.h_hessian);
            lin.cu[t] = gradient_vec_to_scalar(cost_u, u, fd.h_hessian);

            lin.cxx[t] = hessian_vec_to_scalar(cost_x, x, fd.h_hessian);
            lin.cuu[t] = hessian_vec_to_scalar(cost_u, u, fd.h_hessian);
            lin.cxu[t] = mixed_hessian(|xv, uv| model.cost(xv, uv), x, u, fd.h_hessian);
        }

        // Terminal slot: zero dynamics derivatives (already zeroed by
        // `Self::zeros`); the terminal-cost gradient/Hessian is differentiated
        // unconditionally, which is zero whenever `terminal_cost` keeps its
        // default (constant-zero) implementation, resolving the §9
        // "terminal-slot ambiguity" open question without special-casing.
        let x_terminal = &xs[t_len];
        let terminal = |xv: &DVector<f64>| model.terminal_cost(xv);
        lin.cx[t_len] = gradient_vec_to_scalar(terminal, x_terminal, fd.h_hessian);
        lin.cxx[t_len] = hessian_vec_to_scalar(terminal, x_terminal, fd.h_hessian);

        lin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Linear1d;

    impl TrajectoryModel for Linear1d {
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
            DVector::from_vec(vec![-1.0])
        }
        fn u_upper(&self) -> DVector<f64> {
            DVector::from_vec(vec![1.0])
        }
    }

    #[test]
    fn linearizes_linear_dynamics_exactly() {
        let model = Linear1d;
        let xs = vec![DVector::from_vec(vec![0.3]), DVector::from_vec(vec![0.5])];
        let us = vec![DVector::from_vec(vec![0.2])];

        let lin = Linearization::build(&model, &xs, &us, &FiniteDifferenceConfig::default());

        assert!((lin.fx[0][(0, 0)] - 1.0).abs() < 1e-4);
        assert!((lin.fu[0][(0, 0)] - 1.0).abs() < 1e-4);
        assert!((lin.cxx[0][(0, 0)] - 2.0).abs() < 1e-3);
        assert!((lin.cuu[0][(0, 0)] - 2.0).abs() < 1e-3);
    }
}
