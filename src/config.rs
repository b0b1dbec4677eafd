//! Owned tuning configuration, replacing the source's process-wide constants.
//!
//! Each driver/solver instance owns its own configuration value, so
//! independent instances (see the crate's concurrency notes) may be tuned
//! differently without touching global state.

/// Tuning knobs for the outer iLQR driver.
#[derive(Debug, Clone, PartialEq)]
pub struct IlqrConfig {
    /// Outer loop iteration cap.
    pub max_iter: usize,
    /// Terminate when the accepted cost change drops below this value.
    pub tol_fun: f64,
    /// Gradient-norm termination threshold. Stored for forward compatibility;
    /// the driver does not currently terminate on it (see DESIGN.md).
    pub tol_grad: f64,
    /// Lower bound on the Levenberg-Marquardt damping `lambda`.
    pub lambda_min: f64,
    /// Upper bound on `lambda`; the driver gives up once exceeded.
    pub lambda_max: f64,
    /// Multiplicative step applied to `lambda`'s own step size `dlambda`.
    pub lambda_factor: f64,
    /// Backtracking step-size schedule tried in order during the forward pass.
    pub alpha_schedule: Vec<f64>,
    /// Minimum acceptance ratio `z` for a forward-pass step to be accepted.
    pub z_min: f64,
}

impl Default for IlqrConfig {
    fn default() -> Self {
        let alpha_schedule = (0..=10).map(|i| 10f64.powf(-(i as f64) / 2.0)).collect();
        Self {
            max_iter: 100,
            tol_fun: 1e-7,
            tol_grad: 1e-4,
            lambda_min: 1e-6,
            lambda_max: 1e10,
            lambda_factor: 1.6,
            alpha_schedule,
            z_min: 0.0,
        }
    }
}

impl IlqrConfig {
    /// Overrides the outer loop iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Overrides the cost-change termination tolerance.
    pub fn with_tol_fun(mut self, tol_fun: f64) -> Self {
        self.tol_fun = tol_fun;
        self
    }

    /// Overrides the gradient-norm termination tolerance.
    pub fn with_tol_grad(mut self, tol_grad: f64) -> Self {
        self.tol_grad = tol_grad;
        self
    }

    /// Overrides the `(lambda_min, lambda_max)` damping bounds.
    pub fn with_lambda_bounds(mut self, lambda_min: f64, lambda_max: f64) -> Self {
        self.lambda_min = lambda_min;
        self.lambda_max = lambda_max;
        self
    }

    /// Overrides the damping step multiplier.
    pub fn with_lambda_factor(mut self, lambda_factor: f64) -> Self {
        self.lambda_factor = lambda_factor;
        self
    }

    /// Overrides the backtracking step-size schedule.
    pub fn with_alpha_schedule(mut self, alpha_schedule: Vec<f64>) -> Self {
        self.alpha_schedule = alpha_schedule;
        self
    }
}

/// Tuning knobs for the boxQP projected-Newton solver, fixed in the source but
/// overridable here per solver instance.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxQpConfig {
    /// Maximum number of projected-Newton iterations.
    pub max_iter: usize,
    /// Minimum free-gradient norm before declaring convergence (code 5).
    pub min_grad: f64,
    /// Minimum relative objective improvement before declaring convergence (code 4).
    pub min_rel_improve: f64,
    /// Backtracking step-size decay factor used by the clamped line search.
    pub step_dec: f64,
    /// Smallest step size the clamped line search will try before failing.
    pub min_step: f64,
    /// Armijo sufficient-decrease coefficient.
    pub armijo: f64,
}

impl Default for BoxQpConfig {
    fn default() -> Self {
        Self {
            max_iter: 100,
            min_grad: 1e-8,
            min_rel_improve: 1e-8,
            step_dec: 0.6,
            min_step: 1e-22,
            armijo: 0.1,
        }
    }
}

/// Step sizes for the finite-difference estimator.
///
/// The source uses `order = 4` (step ~1e-4) for dynamics Jacobians but a
/// fixed `1e-6` 4-point stencil for cost Hessians; whether that asymmetry is
/// intentional is left an open question by the spec, so both steps are kept
/// independently configurable rather than unified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteDifferenceConfig {
    /// Step used by the 4th-order central stencil for dynamics Jacobians.
    pub h_jacobian: f64,
    /// Step used by the 4-point central stencil for cost gradients/Hessians.
    pub h_hessian: f64,
}

impl Default for FiniteDifferenceConfig {
    fn default() -> Self {
        Self {
            h_jacobian: 1e-4,
            h_hessian: 1e-6,
        }
    }
}
