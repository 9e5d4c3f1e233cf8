// crates/driftfvm-algebra/src/solve.rs

//! Linear kernels behind the nonlinear driver: dense LU for the DIRECT
//! category and restarted GMRES with Jacobi preconditioning for the
//! ITERATIVE one. Anything fancier is an external collaborator; these two
//! kernels are enough to drive every device in the test suite.

use anyhow::{bail, Result};
use nalgebra::DVector;
use tracing::debug;

use crate::matrix::SysMatrix;
use crate::spec::{
    linear_solver_category, LinearSolverCategory, LinearSolverType, PreconditionerType,
};

/// Linear-solve configuration.
#[derive(Clone, Copy, Debug)]
pub struct LinearSpec {
    /// Requested kernel; only the ITERATIVE/DIRECT category is honoured.
    pub solver: LinearSolverType,
    /// Requested preconditioner; the iterative path applies Jacobi unless
    /// `Identity` is chosen.
    pub pc: PreconditionerType,
    /// Relative residual tolerance for the iterative path.
    pub rtol: f64,
    /// Iteration cap for the iterative path.
    pub max_iter: usize,
}

impl Default for LinearSpec {
    fn default() -> Self {
        Self {
            solver: LinearSolverType::Lu,
            pc: PreconditionerType::Jacobi,
            rtol: 1.0e-12,
            max_iter: 2000,
        }
    }
}

/// Solve `A·x = b`.
///
/// # Errors
/// Fails on dimension mismatch, a singular factorisation, or an iterative
/// solve that does not reach `rtol` within `max_iter` restart cycles.
pub fn solve_linear(a: &SysMatrix, b: &[f64], spec: &LinearSpec) -> Result<Vec<f64>> {
    if a.n() != b.len() {
        bail!("linear solve: matrix is {}x{} but rhs has {} entries", a.n(), a.n(), b.len());
    }
    match linear_solver_category(spec.solver) {
        LinearSolverCategory::Direct => solve_dense_lu(a, b),
        LinearSolverCategory::Iterative => gmres(a, b, spec),
    }
}

fn solve_dense_lu(a: &SysMatrix, b: &[f64]) -> Result<Vec<f64>> {
    let lu = a.to_dense().lu();
    let rhs = DVector::from_row_slice(b);
    match lu.solve(&rhs) {
        Some(x) => Ok(x.iter().copied().collect()),
        None => bail!("LU factorisation failed: matrix is singular"),
    }
}

const RESTART: usize = 30;

/// Restarted GMRES(m) with (optional) Jacobi preconditioning.
fn gmres(a: &SysMatrix, b: &[f64], spec: &LinearSpec) -> Result<Vec<f64>> {
    let n = a.n();
    let inv_diag: Vec<f64> = if spec.pc == PreconditionerType::Identity {
        vec![1.0; n]
    } else {
        a.diagonal()
            .iter()
            .map(|&d| if d.abs() > 0.0 { 1.0 / d } else { 1.0 })
            .collect()
    };
    let precond = |v: &[f64]| -> Vec<f64> {
        v.iter().zip(&inv_diag).map(|(x, d)| x * d).collect()
    };

    let b_norm = b.iter().map(|v| v * v).sum::<f64>().sqrt();
    if b_norm == 0.0 {
        return Ok(vec![0.0; n]);
    }
    let tol = spec.rtol * b_norm;

    let mut x = vec![0.0; n];
    let mut total_iters = 0usize;

    while total_iters < spec.max_iter {
        // r = M^{-1}(b - A x)
        let ax = a.mat_vec(&x);
        let r_raw: Vec<f64> = b.iter().zip(&ax).map(|(bi, ai)| bi - ai).collect();
        let raw_norm = r_raw.iter().map(|v| v * v).sum::<f64>().sqrt();
        if raw_norm <= tol {
            debug!(iters = total_iters, residual = raw_norm, "gmres converged");
            return Ok(x);
        }
        let r = precond(&r_raw);
        let beta = r.iter().map(|v| v * v).sum::<f64>().sqrt();

        // Arnoldi with Givens rotations.
        let mut basis: Vec<Vec<f64>> = vec![r.iter().map(|v| v / beta).collect()];
        let mut h = vec![vec![0.0f64; RESTART]; RESTART + 1];
        let mut cs = [0.0f64; RESTART];
        let mut sn = [0.0f64; RESTART];
        let mut g = vec![0.0f64; RESTART + 1];
        g[0] = beta;

        let mut k_used = 0;
        for k in 0..RESTART {
            total_iters += 1;
            let mut w = precond(&a.mat_vec(&basis[k]));
            for (j, vj) in basis.iter().enumerate() {
                let hjk: f64 = w.iter().zip(vj).map(|(a, b)| a * b).sum();
                h[j][k] = hjk;
                for (wi, vji) in w.iter_mut().zip(vj) {
                    *wi -= hjk * vji;
                }
            }
            let wnorm = w.iter().map(|v| v * v).sum::<f64>().sqrt();
            h[k + 1][k] = wnorm;

            // Apply accumulated rotations to the new column.
            for j in 0..k {
                let t = cs[j] * h[j][k] + sn[j] * h[j + 1][k];
                h[j + 1][k] = -sn[j] * h[j][k] + cs[j] * h[j + 1][k];
                h[j][k] = t;
            }
            let denom = (h[k][k] * h[k][k] + h[k + 1][k] * h[k + 1][k]).sqrt();
            if denom == 0.0 {
                k_used = k;
                break;
            }
            cs[k] = h[k][k] / denom;
            sn[k] = h[k + 1][k] / denom;
            h[k][k] = denom;
            h[k + 1][k] = 0.0;
            g[k + 1] = -sn[k] * g[k];
            g[k] *= cs[k];
            k_used = k + 1;

            if wnorm > 0.0 {
                basis.push(w.iter().map(|v| v / wnorm).collect());
            }
            if g[k + 1].abs() <= tol || wnorm == 0.0 || total_iters >= spec.max_iter {
                break;
            }
        }

        // Back-substitute the small triangular system.
        let m = k_used;
        let mut y = vec![0.0f64; m];
        for i in (0..m).rev() {
            let mut s = g[i];
            for j in (i + 1)..m {
                s -= h[i][j] * y[j];
            }
            y[i] = s / h[i][i];
        }
        for (j, yj) in y.iter().enumerate() {
            for (xi, vji) in x.iter_mut().zip(&basis[j]) {
                *xi += yj * vji;
            }
        }
    }

    // Final residual check after exhausting the budget.
    let ax = a.mat_vec(&x);
    let res = b
        .iter()
        .zip(&ax)
        .map(|(bi, ai)| (bi - ai) * (bi - ai))
        .sum::<f64>()
        .sqrt();
    if res <= tol * 10.0 {
        return Ok(x);
    }
    bail!(
        "gmres failed to converge: residual {res:.3e} after {} iterations (target {tol:.3e})",
        spec.max_iter
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::AssemblyMode;

    fn laplace_1d(n: usize) -> (SysMatrix, Vec<f64>) {
        let mut m = SysMatrix::new(n);
        for i in 0..n {
            m.set_value(i, i, 2.0, AssemblyMode::Add).unwrap();
            if i > 0 {
                m.set_value(i, i - 1, -1.0, AssemblyMode::Add).unwrap();
            }
            if i + 1 < n {
                m.set_value(i, i + 1, -1.0, AssemblyMode::Add).unwrap();
            }
        }
        m.final_assembly();
        let b = vec![1.0; n];
        (m, b)
    }

    #[test]
    fn lu_and_gmres_agree_on_spd_system() {
        let (m, b) = laplace_1d(40);
        let direct = solve_linear(&m, &b, &LinearSpec::default()).unwrap();
        let spec = LinearSpec {
            solver: LinearSolverType::Gmres,
            ..LinearSpec::default()
        };
        let iterative = solve_linear(&m, &b, &spec).unwrap();
        for (a, c) in direct.iter().zip(&iterative) {
            assert!((a - c).abs() < 1e-8, "{a} vs {c}");
        }
    }

    #[test]
    fn direct_solve_reproduces_known_solution() {
        let mut m = SysMatrix::new(2);
        m.set_values(0, &[0, 1], &[3.0, 1.0], AssemblyMode::Insert)
            .unwrap();
        m.set_values(1, &[0, 1], &[1.0, 2.0], AssemblyMode::Insert)
            .unwrap();
        m.final_assembly();
        let x = solve_linear(&m, &[9.0, 8.0], &LinearSpec::default()).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn singular_matrix_is_reported() {
        let mut m = SysMatrix::new(2);
        m.set_value(0, 0, 1.0, AssemblyMode::Insert).unwrap();
        m.final_assembly();
        assert!(solve_linear(&m, &[1.0, 1.0], &LinearSpec::default()).is_err());
    }
}
