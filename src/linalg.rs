//! Dense linear-algebra primitives built on `nalgebra`.
//!
//! Everything here operates on `DMatrix<f64>` / `DVector<f64>`; the crate
//! does not define its own matrix type.

use nalgebra::{Cholesky, DMatrix, DVector};

/// Componentwise `min(upper, max(lower, x))`.
pub fn clamp(x: &DVector<f64>, lower: &DVector<f64>, upper: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        x.len(),
        x.iter()
            .zip(lower.iter())
            .zip(upper.iter())
            .map(|((&xi, &lo), &hi)| xi.max(lo).min(hi)),
    )
}

/// `q(x) = 1/2 x^T Q x + c^T x`.
pub fn quad_cost(q: &DMatrix<f64>, c: &DVector<f64>, x: &DVector<f64>) -> f64 {
    0.5 * (x.transpose() * q * x)[(0, 0)] + c.dot(x)
}

/// Sub-vector of entries where `mask[i]` is `true`, order preserved.
pub fn subvec_by_mask(v: &DVector<f64>, mask: &[bool]) -> DVector<f64> {
    DVector::from_iterator(
        mask.iter().filter(|&&m| m).count(),
        v.iter().zip(mask.iter()).filter(|(_, &m)| m).map(|(&x, _)| x),
    )
}

/// Sub-matrix of the rows/columns selected by `row_mask`/`col_mask`, order preserved.
pub fn submat_by_masks(m: &DMatrix<f64>, row_mask: &[bool], col_mask: &[bool]) -> DMatrix<f64> {
    let rows: Vec<usize> = row_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect();
    let cols: Vec<usize> = col_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect();
    DMatrix::from_fn(rows.len(), cols.len(), |r, c| m[(rows[r], cols[c])])
}

/// Scatters `sub` (the entries where `mask[i]` is `true`) back into a
/// full-length vector, leaving masked-out entries at zero.
pub fn scatter_by_mask(sub: &DVector<f64>, mask: &[bool]) -> DVector<f64> {
    let mut out = DVector::zeros(mask.len());
    let mut k = 0;
    for (i, &keep) in mask.iter().enumerate() {
        if keep {
            out[i] = sub[k];
            k += 1;
        }
    }
    out
}

/// Scatters the rows of `sub` (the rows selected by `mask`) back into a
/// `mask.len() x sub.ncols()` matrix, leaving masked-out rows at zero.
pub fn scatter_rows_by_mask(sub: &DMatrix<f64>, mask: &[bool]) -> DMatrix<f64> {
    let mut out = DMatrix::zeros(mask.len(), sub.ncols());
    let mut k = 0;
    for (i, &keep) in mask.iter().enumerate() {
        if keep {
            out.set_row(i, &sub.row(k));
            k += 1;
        }
    }
    out
}

/// Regularized Cholesky factorization of `a + lambda * I`.
///
/// Returns the upper-triangular factor `r` with `r^T * r = a + lambda * I`
/// on success, or `None` if the attempted factorization hits a non-positive
/// diagonal pivot (i.e. `a + lambda * I` is not positive-definite).
pub fn regularized_cholesky(a: &DMatrix<f64>, lambda: f64) -> Option<DMatrix<f64>> {
    let n = a.nrows();
    let regularized = a + DMatrix::<f64>::identity(n, n) * lambda;
    Cholesky::new(regularized).map(|chol| chol.l().transpose())
}

/// Solves `r^T * r * y = rhs` given the upper-triangular Cholesky factor `r`,
/// via one forward and one backward triangular solve.
pub fn cholesky_solve_from_r(r: &DMatrix<f64>, rhs: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let z = r.tr_solve_upper_triangular(rhs)?;
    r.solve_upper_triangular(&z)
}
