//! Riccati backward pass with Levenberg-Marquardt damping and control bounds
//! (spec component F).

use nalgebra::{DMatrix, DVector};

use crate::box_qp::{solve_box_qp, BoxQpStatus};
use crate::config::BoxQpConfig;
use crate::error::{IlqrError, IlqrResult};
use crate::linalg::{clamp, scatter_rows_by_mask, submat_by_masks};
use crate::linearize::Linearization;
use crate::model::TrajectoryModel;

/// Feedforward (`k`) and feedback (`K`) control policy correction, plus the
/// accumulated expected first/second-order cost reduction `dv`, produced by
/// one backward sweep.
pub struct BackwardPassOutput {
    /// `k[t]`, feedforward correction, length `m`, one per timestep.
    pub k: Vec<DVector<f64>>,
    /// `K[t]`, feedback gain, `m x n`, one per timestep.
    pub big_k: Vec<DMatrix<f64>>,
    /// `(dV0, dV1)`: first- and second-order expected cost reduction.
    pub dv: [f64; 2],
}

/// Runs the backward Riccati sweep from `t = T-1` down to `0`.
///
/// `prev_k` warm-starts each timestep's boxQP solve with the previous
/// iteration's feedforward term (clamped into the current control bounds).
/// Returns `IlqrError::BackwardPassDiverged { timestep: t + 1 }` — the
/// failing timestep per the spec's convention — if boxQP reports a
/// non-positive-definite free-subspace Hessian, no descent direction, or a
/// failed line search at any `t`; the driver responds by increasing `lambda`
/// and retrying the whole sweep.
pub fn backward_pass<M: TrajectoryModel>(
    model: &M,
    lin: &Linearization,
    us: &[DVector<f64>],
    lambda: f64,
    prev_k: &[DVector<f64>],
    box_cfg: &BoxQpConfig,
) -> IlqrResult<BackwardPassOutput> {
    let t_len = us.len();
    let n = model.x_dims();
    let m = model.u_dims();
    let all_state_cols = vec![true; n];

    let mut vx = lin.cx[t_len].clone();
    let mut vxx = lin.cxx[t_len].clone();
    let mut dv = [0.0, 0.0];

    let mut k = vec![DVector::zeros(m); t_len];
    let mut big_k = vec![DMatrix::zeros(m, n); t_len];

    let u_lower = model.u_lower();
    let u_upper = model.u_upper();

    for t in (0..t_len).rev() {
        let fx = &lin.fx[t];
        let fu = &lin.fu[t];
        let cx = &lin.cx[t];
        let cu = &lin.cu[t];
        let cxx = &lin.cxx[t];
        let cxu = &lin.cxu[t];
        let cuu = &lin.cuu[t];

        let qx = cx + fx.transpose() * &vx;
        let qu = cu + fu.transpose() * &vx;
        let qxx = cxx + fx.transpose() * &vxx * fx;
        let qxu = cxu + fx.transpose() * &vxx * fu;
        let quu = cuu + fu.transpose() * &vxx * fu;

        let quu_reg = &quu + DMatrix::<f64>::identity(m, m) * lambda;

        let lower = &u_lower - &us[t];
        let upper = &u_upper - &us[t];
        let warm_start = clamp(&prev_k[t], &lower, &upper);

        let qp = solve_box_qp(&quu_reg, &qu, &warm_start, &lower, &upper, box_cfg);
        if matches!(
            qp.status,
            BoxQpStatus::HessianNotPositiveDefinite | BoxQpStatus::NoDescentDirection | BoxQpStatus::LineSearchFailed
        ) {
            return Err(IlqrError::BackwardPassDiverged { timestep: t + 1 });
        }

        let k_t = qp.x_opt;

        // `Qxu` is stored `n x m` (state rows, control columns); the free/clamped
        // mask from boxQP indexes the `m` control coordinates, so the feedback
        // rows are selected from `Qxu^T` (`m x n`), matching `K`'s shape.
        let qxu_t = qxu.transpose();
        let qxu_free_rows = submat_by_masks(&qxu_t, &qp.v_free, &all_state_cols);
        let big_k_t = if qxu_free_rows.nrows() > 0 {
            let z = qp
                .r_free
                .tr_solve_upper_triangular(&qxu_free_rows)
                .expect("r_free is upper-triangular, nonsingular on the free subspace");
            let free_rows = -qp
                .r_free
                .solve_upper_triangular(&z)
                .expect("r_free is upper-triangular, nonsingular on the free subspace");
            scatter_rows_by_mask(&free_rows, &qp.v_free)
        } else {
            DMatrix::zeros(m, n)
        };

        vx = &qx + big_k_t.transpose() * &quu * &k_t + big_k_t.transpose() * &qu + &qxu * &k_t;
        let mut vxx_next =
            &qxx + big_k_t.transpose() * &quu * &big_k_t + big_k_t.transpose() * qxu.transpose() + &qxu * &big_k_t;
        vxx_next = (&vxx_next + vxx_next.transpose()) * 0.5;
        vxx = vxx_next;

        dv[0] += k_t.dot(&qu);
        dv[1] += 0.5 * k_t.dot(&(&quu * &k_t));

        k[t] = k_t;
        big_k[t] = big_k_t;
    }

    Ok(BackwardPassOutput { k, big_k, dv })
}
