//! The dynamics/cost capability set external collaborators implement.
//!
//! The core driver is generic over `TrajectoryModel` and never matches on a
//! concrete model type, per the "callable injection" design note: a small
//! trait abstraction rather than an inheritance hierarchy.

use nalgebra::DVector;

/// Discrete-time dynamics and running/terminal cost for one trajectory
/// optimization problem, plus the static per-channel control bounds.
///
/// Implementations must be continuously differentiable to second order along
/// any trajectory the driver visits; the core never inspects this property,
/// it only relies on it to make the finite-difference linearization
/// meaningful.
pub trait TrajectoryModel {
    /// Discrete-time next state `f(x, u)`.
    fn dynamics(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64>;

    /// Running cost `c(x, u)`.
    fn cost(&self, x: &DVector<f64>, u: &DVector<f64>) -> f64;

    /// Terminal cost `c_terminal(x)`. Defaults to zero.
    fn terminal_cost(&self, _x: &DVector<f64>) -> f64 {
        0.0
    }

    /// State dimension `n`.
    fn x_dims(&self) -> usize;

    /// Control dimension `m`.
    fn u_dims(&self) -> usize;

    /// Per-channel lower bound on `u`, length `m`.
    fn u_lower(&self) -> DVector<f64>;

    /// Per-channel upper bound on `u`, length `m`.
    fn u_upper(&self) -> DVector<f64>;
}
