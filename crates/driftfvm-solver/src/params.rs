// crates/driftfvm-solver/src/params.rs

//! Solve-wide parameters threaded through every assembler and hook.

use driftfvm_algebra::spec::{NonLinearSolverType, PreconditionerType};
use driftfvm_algebra::LinearSpec;

/// Time-stepping scheme for the displacement-current derivative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TsType {
    /// First-order backward difference.
    Bdf1,
    /// Second-order backward difference over the last two steps.
    Bdf2,
}

/// Parameters of one solve (steady point, sweep step or transient step).
#[derive(Clone, Copy, Debug)]
pub struct SolveParams {
    /// Transient terms active.
    pub time_dependent: bool,
    /// Time-stepping scheme.
    pub ts_type: TsType,
    /// After a restart BDF2 falls back to first order for one step.
    pub bdf2_restart: bool,
    /// Current step size [s]; `<= 0` in steady state.
    pub dt: f64,
    /// Previous step size [s] (BDF2).
    pub dt_last: f64,
    /// Nonlinear strategy.
    pub nonlinear: NonLinearSolverType,
    /// Linear kernel configuration.
    pub linear: LinearSpec,
    /// Newton iteration cap.
    pub max_iters: usize,
    /// Absolute residual tolerance (max-norm).
    pub abs_tol: f64,
    /// Residual reduction tolerance relative to the first iterate.
    pub rel_tol: f64,
    /// Step tolerance (max-norm of the Newton update).
    pub step_tol: f64,
    /// Clamp on the potential update per Newton step [V].
    pub potential_damping: f64,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            time_dependent: false,
            ts_type: TsType::Bdf1,
            bdf2_restart: true,
            dt: 0.0,
            dt_last: 0.0,
            nonlinear: NonLinearSolverType::LineSearch,
            linear: LinearSpec {
                pc: PreconditionerType::Jacobi,
                ..LinearSpec::default()
            },
            max_iters: 50,
            abs_tol: 1.0e-20,
            rel_tol: 1.0e-9,
            step_tol: 1.0e-10,
            potential_damping: 1.0,
        }
    }
}

impl SolveParams {
    /// The discrete time-derivative factor for `dE/dt`-style terms:
    /// evaluates `d(v)/dt` from the current value and the node history.
    ///
    /// BDF2 uses the ratio `r = dt_last/(dt_last + dt)`; a fresh restart
    /// (no second history point) falls back to first order.
    #[must_use]
    pub fn ddt(&self, v: f64, v_last: f64, v_last_last: f64) -> f64 {
        if self.ts_type == TsType::Bdf2 && !self.bdf2_restart {
            let r = self.dt_last / (self.dt_last + self.dt);
            ((2.0 - r) / (1.0 - r) * v - 1.0 / (r * (1.0 - r)) * v_last
                + (1.0 - r) / r * v_last_last)
                / (self.dt_last + self.dt)
        } else {
            (v - v_last) / self.dt
        }
    }

    /// Derivative of [`SolveParams::ddt`] with respect to the current value.
    #[must_use]
    pub fn ddt_factor(&self) -> f64 {
        if self.ts_type == TsType::Bdf2 && !self.bdf2_restart {
            let r = self.dt_last / (self.dt_last + self.dt);
            (2.0 - r) / (1.0 - r) / (self.dt_last + self.dt)
        } else {
            1.0 / self.dt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bdf1_derivative_is_backward_difference() {
        let p = SolveParams {
            time_dependent: true,
            dt: 0.5,
            ..SolveParams::default()
        };
        assert!((p.ddt(3.0, 2.0, 0.0) - 2.0).abs() < 1e-14);
        assert!((p.ddt_factor() - 2.0).abs() < 1e-14);
    }

    #[test]
    fn bdf2_is_exact_for_linear_histories() {
        // v(t) = a + b t sampled at t-dt_last-dt, t-dt, t.
        let (dt, dt_last, b) = (0.3, 0.2, 4.0);
        let p = SolveParams {
            time_dependent: true,
            ts_type: TsType::Bdf2,
            bdf2_restart: false,
            dt,
            dt_last,
            ..SolveParams::default()
        };
        let v = 1.0 + b * (dt_last + dt);
        let v1 = 1.0 + b * dt_last;
        let v0 = 1.0;
        assert!((p.ddt(v, v1, v0) - b).abs() < 1e-12);
    }

    #[test]
    fn bdf2_restart_falls_back_to_first_order() {
        let p = SolveParams {
            time_dependent: true,
            ts_type: TsType::Bdf2,
            bdf2_restart: true,
            dt: 0.5,
            dt_last: 0.0,
            ..SolveParams::default()
        };
        assert!((p.ddt(3.0, 2.0, 7.0) - 2.0).abs() < 1e-14);
    }
}
