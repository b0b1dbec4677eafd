//! A 1-D double integrator: state `x = [position, velocity]`, control
//! `u = [acceleration]`. Quadratic running and terminal cost driving the
//! state towards a fixed target, with a bounded acceleration channel —
//! the concrete model the original project's `double_integrator.h`
//! exercised `ilqr_core` against.

use nalgebra::DVector;

use ilqr_core::TrajectoryModel;

pub struct DoubleIntegrator {
    pub dt: f64,
    pub target: DVector<f64>,
    pub u_max: f64,
    pub q_running: f64,
    pub r_running: f64,
    pub q_terminal: f64,
}

impl DoubleIntegrator {
    pub fn new(dt: f64, target_position: f64) -> Self {
        Self {
            dt,
            target: DVector::from_vec(vec![target_position, 0.0]),
            u_max: 1.0,
            q_running: 1.0,
            r_running: 0.01,
            q_terminal: 50.0,
        }
    }
}

impl TrajectoryModel for DoubleIntegrator {
    fn dynamics(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        let position = x[0] + x[1] * self.dt;
        let velocity = x[1] + u[0] * self.dt;
        DVector::from_vec(vec![position, velocity])
    }

    fn cost(&self, x: &DVector<f64>, u: &DVector<f64>) -> f64 {
        let err = x - &self.target;
        self.q_running * err.dot(&err) + self.r_running * u[0] * u[0]
    }

    fn terminal_cost(&self, x: &DVector<f64>) -> f64 {
        let err = x - &self.target;
        self.q_terminal * err.dot(&err)
    }

    fn x_dims(&self) -> usize {
        2
    }

    fn u_dims(&self) -> usize {
        1
    }

    fn u_lower(&self) -> DVector<f64> {
        DVector::from_vec(vec![-self.u_max])
    }

    fn u_upper(&self) -> DVector<f64> {
        DVector::from_vec(vec![self.u_max])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrates_position_from_velocity() {
        let model = DoubleIntegrator::new(0.1, 1.0);
        let x = DVector::from_vec(vec![0.0, 2.0]);
        let u = DVector::from_vec(vec![0.0]);
        let x_next = model.dynamics(&x, &u);
        assert!((x_next[0] - 0.2).abs() < 1e-12);
        assert!((x_next[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn terminal_cost_vanishes_at_target() {
        let model = DoubleIntegrator::new(0.1, 1.0);
        assert_eq!(model.terminal_cost(&model.target.clone()), 0.0);
    }

    #[test]
    fn driver_steers_double_integrator_near_target() {
        use ilqr_core::{BoxQpConfig, FiniteDifferenceConfig, IlqrConfig, IlqrDriver, TerminationReason};

        let model = DoubleIntegrator::new(0.1, 1.0);
        let horizon = 40;
        let x0 = DVector::from_vec(vec![0.0, 0.0]);
        let u0 = vec![DVector::from_vec(vec![0.0]); horizon];

        let mut driver = IlqrDriver::init_traj(
            model,
            IlqrConfig::default(),
            BoxQpConfig::default(),
            FiniteDifferenceConfig::default(),
            x0,
            u0,
        )
        .expect("double integrator dimensions are internally consistent");

        let result = driver.generate_trajectory();

        assert_eq!(result.termination, TerminationReason::ToleranceReached);
        let final_position = result.xs.last().unwrap()[0];
        assert!((final_position - 1.0).abs() < 0.1);
    }
}
