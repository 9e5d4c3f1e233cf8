// crates/driftfvm-solver/src/newton.rs

//! Newton driver over the assembled system: basic damped Newton with an
//! optional backtracking line search, plus the DC-sweep and transient-step
//! conveniences built on it.

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use driftfvm_algebra::spec::NonLinearSolverType;
use driftfvm_algebra::{solve_linear, SysMatrix, SysVector};
use driftfvm_device::{Communicator, System};

use crate::bc::BcScratch;
use crate::driver::{assemble_function, assemble_jacobian, fill_initial_guess};
use crate::params::SolveParams;

/// Max-norm of the update restricted to potential-like unknowns (nodal ψ
/// and the boundary scalars). Carrier-density entries are orders of
/// magnitude larger in absolute terms and must not drive the damping.
fn potential_step_norm(sys: &System, dx: &[f64]) -> f64 {
    let mut m = 0.0f64;
    for region in &sys.regions {
        for fvm in 0..sys.graphs[region.id].n_nodes() {
            m = m.max(dx[sys.offset(region.id, fvm)].abs());
        }
    }
    for off in sys.dofs.bc_offset.iter().flatten() {
        m = m.max(dx[*off].abs());
    }
    m
}

/// Outcome of one nonlinear solve.
#[derive(Clone, Copy, Debug)]
pub struct NewtonReport {
    /// Newton iterations taken.
    pub iterations: usize,
    /// Final residual max-norm.
    pub residual: f64,
    /// Whether a convergence criterion was met.
    pub converged: bool,
}

/// Solve the steady-state system from the given iterate (in place).
///
/// # Errors
/// Fails on a NaN residual, a linear-solve failure, or exhaustion of the
/// iteration budget.
pub fn newton_solve(
    sys: &mut System,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &mut Vec<f64>,
) -> Result<NewtonReport> {
    let n = sys.n_dofs();
    let mut f = SysVector::new(n);
    let mut jac = SysMatrix::new(n);
    let mut scratch: Vec<BcScratch> = Vec::new();

    let mut rnorm0 = f64::NAN;
    for iter in 0..params.max_iters {
        assemble_function(sys, comm, params, x, &mut f, &mut scratch)?;
        let rnorm = f.norm_inf();
        if rnorm.is_nan() {
            bail!("residual is NaN at Newton iteration {iter}");
        }
        if iter == 0 {
            rnorm0 = rnorm;
        }
        debug!(iter, rnorm, "newton iteration");
        if rnorm <= params.abs_tol || rnorm <= params.rel_tol * rnorm0 {
            return Ok(NewtonReport {
                iterations: iter,
                residual: rnorm,
                converged: true,
            });
        }

        assemble_jacobian(sys, comm, params, x, &mut jac, &mut scratch)?;
        let dx = solve_linear(&jac, f.as_slice(), &params.linear)
            .with_context(|| format!("linear solve at Newton iteration {iter}"))?;

        // Clamp the largest potential update to keep the exponentials in
        // range, then backtrack on the residual norm if requested.
        let dpsi_max = potential_step_norm(sys, &dx);
        let mut damping: f64 = 1.0;
        if params.potential_damping > 0.0 && dpsi_max > params.potential_damping {
            damping = params.potential_damping / dpsi_max;
        }

        let mut accepted = false;
        let mut trial = x.clone();
        for _ in 0..8 {
            for ((t, xi), di) in trial.iter_mut().zip(x.iter()).zip(&dx) {
                *t = xi - damping * di;
            }
            if params.nonlinear == NonLinearSolverType::Newton {
                accepted = true;
                break;
            }
            assemble_function(sys, comm, params, &trial, &mut f, &mut scratch)?;
            let trial_norm = f.norm_inf();
            if trial_norm.is_finite() && trial_norm < rnorm {
                accepted = true;
                break;
            }
            damping *= 0.5;
        }
        if !accepted {
            // Fall back to the damped full step; Newton may still recover.
            for ((t, xi), di) in trial.iter_mut().zip(x.iter()).zip(&dx) {
                *t = xi - damping * di;
            }
        }
        *x = trial;

        let step = dpsi_max * damping;
        if step <= params.step_tol {
            assemble_function(sys, comm, params, x, &mut f, &mut scratch)?;
            return Ok(NewtonReport {
                iterations: iter + 1,
                residual: f.norm_inf(),
                converged: true,
            });
        }
    }

    bail!(
        "Newton failed to converge within {} iterations (residual {:.3e})",
        params.max_iters,
        f.norm_inf()
    )
}

/// Solve the steady state from the equilibrium initial guess, committing
/// the converged solution (node state and circuit history) into `sys`.
pub fn solve_steady_state(
    sys: &mut System,
    comm: &dyn Communicator,
    params: &SolveParams,
) -> Result<(Vec<f64>, NewtonReport)> {
    let (mut x, _scale) = fill_initial_guess(sys, comm)?;
    let report = newton_solve(sys, comm, params, &mut x)?;
    commit(sys, params, &x);
    info!(
        iterations = report.iterations,
        residual = report.residual,
        "steady state converged"
    );
    Ok((x, report))
}

/// Commit an accepted solution: node state and circuit histories.
pub fn commit(sys: &mut System, params: &SolveParams, x: &[f64]) {
    sys.commit_solution(x);
    for b in &mut sys.boundaries {
        if let Some(ckt) = b.ext_circuit.as_mut() {
            ckt.update(params.dt);
        }
    }
}

/// Step the applied voltage of `electrode` through `voltages`, re-solving
/// from the previous solution each time. Returns `(V, I)` pairs with the
/// terminal current read from the converged circuit state.
pub fn dc_sweep(
    sys: &mut System,
    comm: &dyn Communicator,
    params: &SolveParams,
    electrode: usize,
    voltages: &[f64],
) -> Result<Vec<(f64, f64)>> {
    let (mut x, _scale) = fill_initial_guess(sys, comm)?;
    let mut out = Vec::with_capacity(voltages.len());
    for &v in voltages {
        if sys.boundaries[electrode].ext_circuit.is_none() {
            bail!(
                "electrode '{}' has no circuit",
                sys.boundaries[electrode].label
            );
        }
        if let Some(ckt) = sys.boundaries[electrode].ext_circuit.as_mut() {
            ckt.v_app = v;
        }
        let report = newton_solve(sys, comm, params, &mut x)
            .with_context(|| format!("bias step V = {v}"))?;
        commit(sys, params, &x);
        let i = sys.boundaries[electrode]
            .ext_circuit
            .as_ref()
            .map_or(0.0, |c| c.current);
        debug!(v, i, iterations = report.iterations, "sweep point");
        out.push((v, i));
    }
    Ok(out)
}

/// One transient step of size `params.dt` from the committed state.
pub fn transient_step(
    sys: &mut System,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &mut Vec<f64>,
) -> Result<NewtonReport> {
    if params.dt <= 0.0 {
        bail!("transient step requires a positive dt");
    }
    let report = newton_solve(sys, comm, params, x)?;
    commit(sys, params, x);
    Ok(report)
}
