// crates/driftfvm-algebra/src/spec.rs

//! Name↔enum tables for the nonlinear driver, the linear kernels and the
//! preconditioners, plus the ITERATIVE/DIRECT category split. The tables
//! are materialised as `match` lookups rather than lazily-built maps.

/// Nonlinear solver family driven over the assembled system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonLinearSolverType {
    /// Basic damped Newton.
    Newton,
    /// Newton with cubic line search.
    LineSearch,
    /// Trust-region Newton.
    TrustRegion,
}

/// Linear solver selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum LinearSolverType {
    Cg,
    Cgn,
    Cgs,
    Cr,
    Qmr,
    Tcqmr,
    Tfqmr,
    Bicg,
    Bicgstab,
    Bcgsl,
    Minres,
    Gmres,
    Dgmres,
    Fgmres,
    Lsqr,
    Jacobi,
    SorForward,
    SorBackward,
    Ssor,
    Richardson,
    Chebyshev,
    Lu,
    Umfpack,
    SuperLu,
    Pastix,
    Mumps,
    SuperLuDist,
    Gss,
}

/// Preconditioner selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PreconditionerType {
    Identity,
    Jacobi,
    BlockJacobi,
    Sor,
    Ssor,
    Asm,
    AsmIlu0,
    AsmIlu1,
    AsmIlu2,
    AsmIlu3,
    AsmLu,
    Amg,
    Eisenstat,
    Icc,
    Ilu,
    Ilut,
    Lu,
    Parms,
}

/// Broad solver category; direct solvers skip the Krylov machinery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinearSolverCategory {
    /// Krylov/relaxation methods.
    Iterative,
    /// Factorisation-based methods.
    Direct,
}

/// Parse a nonlinear solver name. `basic` is an accepted alias of `newton`.
#[must_use]
pub fn nonlinear_solver_type(name: &str) -> Option<NonLinearSolverType> {
    match name.to_ascii_lowercase().as_str() {
        "newton" | "basic" => Some(NonLinearSolverType::Newton),
        "linesearch" => Some(NonLinearSolverType::LineSearch),
        "trustregion" => Some(NonLinearSolverType::TrustRegion),
        _ => None,
    }
}

/// Parse a linear solver name.
///
/// `bcgs` resolves to the stabilised `bcgsl` variant, matching long-standing
/// behaviour of the selection table this mirrors.
#[must_use]
pub fn linear_solver_type(name: &str) -> Option<LinearSolverType> {
    use LinearSolverType::*;
    Some(match name.to_ascii_lowercase().as_str() {
        "cg" => Cg,
        "cgn" => Cgn,
        "cgs" => Cgs,
        "cr" => Cr,
        "qmr" => Qmr,
        "tcqmr" => Tcqmr,
        "tfqmr" => Tfqmr,
        "bicg" => Bicg,
        "bcgs" => Bcgsl, // BCGSL is more stable
        "bicgstable" => Bicgstab,
        "bcgsl" => Bcgsl,
        "minres" => Minres,
        "gmres" => Gmres,
        "dgmres" => Dgmres,
        "fgmres" => Fgmres,
        "lsqr" => Lsqr,
        "jacobian" => Jacobi,
        "sor_forward" => SorForward,
        "sor_backward" => SorBackward,
        "ssor" => Ssor,
        "richardson" => Richardson,
        "chebyshev" => Chebyshev,
        "lu" => Lu,
        "umfpack" => Umfpack,
        "superlu" => SuperLu,
        "pastix" => Pastix,
        "mumps" => Mumps,
        "superlu_dist" => SuperLuDist,
        "gss" => Gss,
        _ => return None,
    })
}

/// Parse a preconditioner name.
#[must_use]
pub fn preconditioner_type(name: &str) -> Option<PreconditionerType> {
    use PreconditionerType::*;
    Some(match name.to_ascii_lowercase().as_str() {
        "identity" => Identity,
        "jacobian" => Jacobi,
        "bjacobian" => BlockJacobi,
        "sor" => Sor,
        "ssor" => Ssor,
        "asm" => Asm,
        "asmilu0" => AsmIlu0,
        "asmilu1" => AsmIlu1,
        "asmilu2" => AsmIlu2,
        "asmilu3" => AsmIlu3,
        "asmlu" => AsmLu,
        "amg" => Amg,
        "eisenstat" => Eisenstat,
        "icc" => Icc,
        "ilu" => Ilu,
        "ilut" => Ilut,
        "lu" => Lu,
        "parms" => Parms,
        _ => return None,
    })
}

/// Category of a linear solver. `chebyshev` is grouped with the direct
/// solvers, matching the selection table this mirrors.
#[must_use]
pub fn linear_solver_category(ls: LinearSolverType) -> LinearSolverCategory {
    use LinearSolverType::*;
    match ls {
        Cg | Cgn | Cgs | Cr | Qmr | Tcqmr | Tfqmr | Bicg | Bicgstab | Bcgsl | Minres | Gmres
        | Dgmres | Fgmres | Lsqr | Jacobi | SorForward | SorBackward | Ssor | Richardson => {
            LinearSolverCategory::Iterative
        }
        Chebyshev | Lu | Umfpack | SuperLu | Pastix | Mumps | SuperLuDist | Gss => {
            LinearSolverCategory::Direct
        }
    }
}

/// All recognised linear solver names, in table order.
pub const LINEAR_SOLVER_NAMES: &[&str] = &[
    "cg",
    "cgn",
    "cgs",
    "cr",
    "qmr",
    "tcqmr",
    "tfqmr",
    "bicg",
    "bcgs",
    "bicgstable",
    "bcgsl",
    "minres",
    "gmres",
    "dgmres",
    "fgmres",
    "lsqr",
    "jacobian",
    "sor_forward",
    "sor_backward",
    "ssor",
    "richardson",
    "chebyshev",
    "lu",
    "umfpack",
    "superlu",
    "pastix",
    "mumps",
    "superlu_dist",
    "gss",
];

/// All recognised preconditioner names, in table order.
pub const PRECONDITIONER_NAMES: &[&str] = &[
    "identity",
    "jacobian",
    "bjacobian",
    "sor",
    "ssor",
    "asm",
    "asmilu0",
    "asmilu1",
    "asmilu2",
    "asmilu3",
    "asmlu",
    "amg",
    "eisenstat",
    "icc",
    "ilu",
    "ilut",
    "lu",
    "parms",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_parses() {
        for name in LINEAR_SOLVER_NAMES {
            assert!(linear_solver_type(name).is_some(), "{name}");
        }
        for name in PRECONDITIONER_NAMES {
            assert!(preconditioner_type(name).is_some(), "{name}");
        }
        for name in ["newton", "basic", "linesearch", "trustregion"] {
            assert!(nonlinear_solver_type(name).is_some(), "{name}");
        }
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(
            nonlinear_solver_type("basic"),
            Some(NonLinearSolverType::Newton)
        );
        assert_eq!(linear_solver_type("bcgs"), Some(LinearSolverType::Bcgsl));
        assert_eq!(linear_solver_type("BCGSL"), Some(LinearSolverType::Bcgsl));
        assert!(linear_solver_type("petsc").is_none());
    }

    #[test]
    fn category_partition_is_exhaustive() {
        use LinearSolverCategory::{Direct, Iterative};
        let direct = [
            LinearSolverType::Chebyshev,
            LinearSolverType::Lu,
            LinearSolverType::Umfpack,
            LinearSolverType::SuperLu,
            LinearSolverType::Pastix,
            LinearSolverType::Mumps,
            LinearSolverType::SuperLuDist,
            LinearSolverType::Gss,
        ];
        for name in LINEAR_SOLVER_NAMES {
            let ls = linear_solver_type(name).unwrap();
            let expect = if direct.contains(&ls) { Direct } else { Iterative };
            assert_eq!(linear_solver_category(ls), expect, "{name}");
        }
    }
}
