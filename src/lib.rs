//! Regularized iterative LQR (iLQR) trajectory optimization over
//! box-constrained controls.
//!
//! A nominal control sequence is refined by repeatedly linearizing the
//! dynamics and cost about the current trajectory, solving a box-constrained
//! LQ subproblem backward in time via [`box_qp`], and rolling the resulting
//! feedforward/feedback policy forward with Levenberg-Marquardt-damped trust
//! region control. [`driver::IlqrDriver`] is the entry point.

pub mod backward_pass;
pub mod box_qp;
pub mod config;
pub mod driver;
pub mod error;
pub mod finite_diff;
pub mod line_search;
pub mod linalg;
pub mod linearize;
pub mod model;
pub mod forward_pass;

pub use config::{BoxQpConfig, FiniteDifferenceConfig, IlqrConfig};
pub use driver::{IlqrDriver, TerminationReason, TrajectoryResult};
pub use error::{IlqrError, IlqrResult};
pub use model::TrajectoryModel;
