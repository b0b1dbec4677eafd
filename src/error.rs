//! Structured error surface for the iLQR core.
//!
//! Mirrors this corpus's usual shape for a numerical crate: one flat,
//! `thiserror`-derived enum rather than an exception hierarchy.

use thiserror::Error;

/// Errors produced at the public boundary of the iLQR driver and boxQP solver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IlqrError {
    /// boxQP result code 1: the free-subspace Hessian failed Cholesky factorization.
    #[error("free-subspace Hessian is not positive-definite")]
    HessianNotPositiveDefinite,

    /// boxQP result code 2: no descent direction, or iteration budget exhausted.
    #[error("no descent direction found within the iteration budget")]
    NoDescentDirection,

    /// boxQP result code 3: the clamped line search could not find an accepting step.
    #[error("line search failed to find an accepting step size")]
    LineSearchFailed,

    /// The backward pass diverged at `timestep` even after boxQP retried within
    /// the current regularization level.
    #[error("backward pass diverged at timestep {timestep}")]
    BackwardPassDiverged {
        /// Index (1-based per the Riccati sweep direction) of the failing timestep.
        timestep: usize,
    },

    /// The driver's Levenberg-Marquardt damping exceeded `lambda_max` without an
    /// accepted forward pass.
    #[error("regularization exhausted: lambda ({lambda}) exceeded lambda_max")]
    RegularizationExhausted {
        /// The damping value at the moment of exhaustion.
        lambda: f64,
    },

    /// A caller-supplied vector/matrix did not match the driver's fixed dimensions.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length/dimension.
        expected: usize,
        /// Actual length/dimension supplied.
        got: usize,
    },
}

/// Shorthand result type used throughout the crate's public API.
pub type IlqrResult<T> = std::result::Result<T, IlqrError>;
