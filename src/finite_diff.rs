//! Finite-difference estimators for linearizing dynamics and quadraticizing cost.
//!
//! No error conditions are raised here: an ill-conditioned stencil simply
//! produces a noisy derivative, which the outer iLQR loop tolerates via its
//! Levenberg-Marquardt regularization.

use nalgebra::{DMatrix, DVector};

/// Jacobian of `f: R^n -> R^k` at `x` via a 4th-order central stencil.
///
/// `h` should satisfy `h ~ eps^(1/5)` of machine epsilon; the driver's
/// default `FiniteDifferenceConfig` uses `h ~ 1e-4`.
pub fn jacobian_vec_to_vec(f: impl Fn(&DVector<f64>) -> DVector<f64>, x: &DVector<f64>, h: f64) -> DMatrix<f64> {
    let n = x.len();
    let f0 = f(x);
    let k = f0.len();
    let mut jac = DMatrix::zeros(k, n);

    for i in 0..n {
        let mut x_p1 = x.clone();
        let mut x_p2 = x.clone();
        let mut x_m1 = x.clone();
        let mut x_m2 = x.clone();
        x_p1[i] += h;
        x_p2[i] += 2.0 * h;
        x_m1[i] -= h;
        x_m2[i] -= 2.0 * h;

        let df = (-f(&x_p2) + 8.0 * f(&x_p1) - 8.0 * f(&x_m1) + f(&x_m2)) / (12.0 * h);
        jac.set_column(i, &df);
    }

    jac
}

/// Gradient of `g: R^n -> R` at `x` via central differences.
pub fn gradient_vec_to_scalar(g: impl Fn(&DVector<f64>) -> f64, x: &DVector<f64>, h: f64) -> DVector<f64> {
    let n = x.len();
    let mut grad = DVector::zeros(n);
    for i in 0..n {
        let mut x_p = x.clone();
        let mut x_m = x.clone();
        x_p[i] += h;
        x_m[i] -= h;
        grad[i] = (g(&x_p) - g(&x_m)) / (2.0 * h);
    }
    grad
}

/// Hessian of `c: R^n -> R` at `x` via the 4-point central stencil
/// `[c(++) - c(+-) - c(-+) + c(--)] / (4h^2)`, mirrored onto the lower
/// triangle so the result is exactly symmetric.
pub fn hessian_vec_to_scalar(c: impl Fn(&DVector<f64>) -> f64, x: &DVector<f64>, h: f64) -> DMatrix<f64> {
    let n = x.len();
    let mut hess = DMatrix::zeros(n, n);

    for i in 0..n {
        for j in i..n {
            let mut pp = x.clone();
            let mut pm = x.clone();
            let mut mp = x.clone();
            let mut mm = x.clone();
            pp[i] += h;
            pm[i] += h;
            mp[i] -= h;
            mm[i] -= h;
            pp[j] += h;
            mp[j] += h;
            pm[j] -= h;
            mm[j] -= h;

            let value = (c(&pp) - c(&mp) - c(&pm) + c(&mm)) / (4.0 * h * h);
            hess[(i, j)] = value;
            hess[(j, i)] = value;
        }
    }

    hess
}

/// Mixed second derivative `d^2 c / dx_i du_j` of `c: (R^n, R^m) -> R` via the
/// same 4-point central stencil, perturbing `x` and `u` independently. Not
/// symmetric by construction (it is an off-diagonal `n x m` block, not a
/// square matrix).
pub fn mixed_hessian(
    c: impl Fn(&DVector<f64>, &DVector<f64>) -> f64,
    x: &DVector<f64>,
    u: &DVector<f64>,
    h: f64,
) -> DMatrix<f64> {
    let n = x.len();
    let m = u.len();
    let mut hess = DMatrix::zeros(n, m);

    for i in 0..n {
        for j in 0..m {
            let mut px = x.clone();
            let mut mx = x.clone();
            let mut pu = u.clone();
            let mut mu = u.clone();
            px[i] += h;
            mx[i] -= h;
            pu[j] += h;
            mu[j] -= h;

            hess[(i, j)] = (c(&px, &pu) - c(&mx, &pu) - c(&px, &mu) + c(&mx, &mu)) / (4.0 * h * h);
        }
    }

    hess
}
