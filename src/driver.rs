//! The outer iLQR driver (spec component G): linearize, backward pass,
//! backtracking forward pass, Levenberg-Marquardt damping adjustment.

use nalgebra::DVector;

use crate::backward_pass::backward_pass;
use crate::config::{BoxQpConfig, FiniteDifferenceConfig, IlqrConfig};
use crate::error::{IlqrError, IlqrResult};
use crate::forward_pass::{forward_pass, Feedback};
use crate::linearize::Linearization;
use crate::model::TrajectoryModel;

/// Why `generate_trajectory` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The accepted cost change dropped below `tol_fun`.
    ToleranceReached,
    /// The outer iteration budget was exhausted without a tolerance hit.
    MaxIterations,
    /// `lambda` exceeded `lambda_max` without an accepted forward pass.
    RegularizationExhausted,
}

/// Final trajectory, cost, feedback gains, and termination status returned
/// by a completed `generate_trajectory` call.
pub struct TrajectoryResult {
    /// States `x[0..=T]`.
    pub xs: Vec<DVector<f64>>,
    /// Controls `u[0..T)`.
    pub us: Vec<DVector<f64>>,
    /// Total cost of the returned trajectory.
    pub cost: f64,
    /// Per-timestep feedback gains from the last accepted backward pass,
    /// enabling downstream closed-loop use.
    pub big_k: Vec<nalgebra::DMatrix<f64>>,
    /// Why the outer loop stopped.
    pub termination: TerminationReason,
    /// Number of outer iterations run.
    pub iterations: usize,
}

/// Owns one trajectory-optimization problem: the model, its configuration,
/// and the trajectory/regularization state that persists across outer
/// iterations.
pub struct IlqrDriver<M: TrajectoryModel> {
    model: M,
    config: IlqrConfig,
    box_config: BoxQpConfig,
    fd_config: FiniteDifferenceConfig,

    x0: DVector<f64>,
    xs: Vec<DVector<f64>>,
    us: Vec<DVector<f64>>,
    cost_s: f64,

    lambda: f64,
    dlambda: f64,
    prev_k: Vec<DVector<f64>>,
    prev_big_k: Vec<nalgebra::DMatrix<f64>>,
}

impl<M: TrajectoryModel> IlqrDriver<M> {
    /// Validates dimensions and runs an initial (feedback-free) rollout from
    /// `x0` under `u0`, allocating the per-horizon buffers the hot loop reuses.
    pub fn init_traj(
        model: M,
        config: IlqrConfig,
        box_config: BoxQpConfig,
        fd_config: FiniteDifferenceConfig,
        x0: DVector<f64>,
        u0: Vec<DVector<f64>>,
    ) -> IlqrResult<Self> {
        let n = model.x_dims();
        let m = model.u_dims();

        if x0.len() != n {
            return Err(IlqrError::DimensionMismatch { expected: n, got: x0.len() });
        }
        for u in &u0 {
            if u.len() != m {
                return Err(IlqrError::DimensionMismatch { expected: m, got: u.len() });
            }
        }
        let u_lower = model.u_lower();
        let u_upper = model.u_upper();
        if u_lower.len() != m {
            return Err(IlqrError::DimensionMismatch { expected: m, got: u_lower.len() });
        }
        if u_upper.len() != m {
            return Err(IlqrError::DimensionMismatch { expected: m, got: u_upper.len() });
        }

        let t_len = u0.len();
        let (xs, us, cost_s) = forward_pass(&model, &x0, &u0, None);

        Ok(Self {
            model,
            config,
            box_config,
            fd_config,
            x0,
            xs,
            us,
            cost_s,
            lambda: 0.0,
            dlambda: 1.0,
            prev_k: vec![DVector::zeros(m); t_len],
            prev_big_k: vec![nalgebra::DMatrix::zeros(m, n); t_len],
        })
    }

    /// The current nominal cost (the last accepted rollout's total cost).
    pub fn cost(&self) -> f64 {
        self.cost_s
    }

    /// Runs the outer iLQR loop to completion, per the spec's §4.G driver
    /// algorithm: linearize, backward pass (retrying with increased `lambda`
    /// on divergence), backtracking forward pass, accept/reject.
    pub fn generate_trajectory(&mut self) -> TrajectoryResult {
        let mut flg_change = true;
        let mut iterations = 0;
        let n = self.model.x_dims();
        let m = self.model.u_dims();
        let mut lin = Linearization::zeros(self.us.len(), n, m);

        'outer: for iter in 0..self.config.max_iter {
            iterations = iter + 1;

            if flg_change {
                lin = Linearization::build(&self.model, &self.xs, &self.us, &self.fd_config);
                flg_change = false;
            }

            let backward = loop {
                match backward_pass(&self.model, &lin, &self.us, self.lambda, &self.prev_k, &self.box_config) {
                    Ok(out) => break Some(out),
                    Err(IlqrError::BackwardPassDiverged { .. }) => {
                        self.dlambda = (self.dlambda * self.config.lambda_factor).max(self.config.lambda_factor);
                        self.lambda = (self.lambda * self.dlambda).max(self.config.lambda_min);
                        if self.lambda > self.config.lambda_max {
                            break None;
                        }
                    }
                    Err(_) => break None,
                }
            };

            let backward = match backward {
                Some(b) => b,
                None => break 'outer,
            };

            self.prev_k = backward.k.clone();
            self.prev_big_k = backward.big_k.clone();

            let mut accepted = false;
            let mut new_cost = self.cost_s;
            let mut dcost = 0.0;

            for &alpha in &self.config.alpha_schedule {
                let feedback = Feedback {
                    k: &backward.k,
                    big_k: &backward.big_k,
                    x_nom: &self.xs,
                    alpha,
                };
                let (xs_new, us_new, cost_candidate) = forward_pass(&self.model, &self.x0, &self.us, Some(&feedback));

                dcost = self.cost_s - cost_candidate;
                let expected = -alpha * (backward.dv[0] + alpha * backward.dv[1]);
                let z = if expected > 0.0 { dcost / expected } else { dcost.signum() };

                if z > self.config.z_min {
                    self.xs = xs_new;
                    self.us = us_new;
                    new_cost = cost_candidate;
                    accepted = true;
                    break;
                }
            }

            if accepted {
                self.dlambda = (self.dlambda / self.config.lambda_factor).min(1.0 / self.config.lambda_factor);
                self.lambda = if self.lambda > self.config.lambda_min {
                    self.lambda * self.dlambda
                } else {
                    0.0
                };
                self.cost_s = new_cost;
                flg_change = true;

                if dcost < self.config.tol_fun {
                    return self.finish(iterations, TerminationReason::ToleranceReached);
                }
            } else {
                self.dlambda = (self.dlambda * self.config.lambda_factor).max(self.config.lambda_factor);
                self.lambda = (self.lambda * self.dlambda).max(self.config.lambda_min);
                if self.lambda > self.config.lambda_max {
                    break 'outer;
                }
            }
        }

        let reason = if self.lambda > self.config.lambda_max {
            TerminationReason::RegularizationExhausted
        } else {
            TerminationReason::MaxIterations
        };
        self.finish(iterations, reason)
    }

    fn finish(&self, iterations: usize, termination: TerminationReason) -> TrajectoryResult {
        TrajectoryResult {
            xs: self.xs.clone(),
            us: self.us.clone(),
            cost: self.cost_s,
            big_k: self.prev_big_k.clone(),
            termination,
            iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Integrator1d {
        target: f64,
    }

    impl TrajectoryModel for Integrator1d {
        fn dynamics(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
            DVector::from_vec(vec![x[0] + u[0]])
        }
        fn cost(&self, x: &DVector<f64>, u: &DVector<f64>) -> f64 {
            0.5 * (x[0] - self.target).powi(2) + 0.01 * u[0] * u[0]
        }
        fn terminal_cost(&self, x: &DVector<f64>) -> f64 {
            5.0 * (x[0] - self.target).powi(2)
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
    fn driver_reduces_cost_towards_target() {
        let model = Integrator1d { target: 1.0 };
        let x0 = DVector::from_vec(vec![0.0]);
        let u0 = vec![DVector::from_vec(vec![0.0]); 10];

        let mut driver = IlqrDriver::init_traj(
            model,
            IlqrConfig::default().with_max_iter(20),
            BoxQpConfig::default(),
            FiniteDifferenceConfig::default(),
            x0,
            u0,
        )
        .expect("dimensions line up");

        let initial_cost = driver.cost();
        let result = driver.generate_trajectory();

        assert!(result.cost <= initial_cost);
        assert_eq!(result.big_k.len(), 10);
        assert!((result.xs.last().unwrap()[0] - 1.0).abs() < 0.5);
    }

    #[test]
    fn init_traj_rejects_mismatched_bounds() {
        struct BadBounds;
        impl TrajectoryModel for BadBounds {
            fn dynamics(&self, x: &DVector<f64>, _u: &DVector<f64>) -> DVector<f64> {
                x.clone()
            }
            fn cost(&self, _x: &DVector<f64>, _u: &DVector<f64>) -> f64 {
                0.0
            }
            fn x_dims(&self) -> usize {
                1
            }
            fn u_dims(&self) -> usize {
                2
            }
            fn u_lower(&self) -> DVector<f64> {
                DVector::from_vec(vec![-1.0])
            }
            fn u_upper(&self) -> DVector<f64> {
                DVector::from_vec(vec![1.0, 1.0])
            }
        }

        let result = IlqrDriver::init_traj(
            BadBounds,
            IlqrConfig::default(),
            BoxQpConfig::default(),
            FiniteDifferenceConfig::default(),
            DVector::from_vec(vec![0.0]),
            vec![DVector::from_vec(vec![0.0, 0.0]); 3],
        );

        assert_eq!(result.err(), Some(IlqrError::DimensionMismatch { expected: 2, got: 1 }));
    }
}
