// crates/driftfvm-algebra/tests/row_protocol.rs

//! Property tests for the assembly protocol: row redirection preserves
//! the weighted total, and the iterative kernel agrees with the direct
//! one on diagonally dominant systems.

use proptest::prelude::*;

use driftfvm_algebra::spec::{LinearSolverType, PreconditionerType};
use driftfvm_algebra::{solve_linear, AssemblyMode, LinearSpec, SysMatrix, SysVector};

proptest! {
    #[test]
    fn vector_redirection_preserves_the_weighted_sum(
        values in proptest::collection::vec(-1.0e3..1.0e3f64, 4..20),
        alpha in 0.1..2.0f64,
    ) {
        let n = values.len();
        let mut v = SysVector::new(n);
        let idx: Vec<usize> = (0..n).collect();
        v.set_values(&idx, &values, AssemblyMode::Insert).unwrap();
        v.assembly_end();

        // Spill row 0 onto every other row with equal weight.
        let src = vec![0usize; n - 1];
        let dst: Vec<usize> = (1..n).collect();
        let alphas = vec![alpha / (n - 1) as f64; n - 1];
        v.add_row_to_row(&src, &dst, &alphas).unwrap();
        v.zero_rows(&[0]);

        let before: f64 = values.iter().skip(1).sum::<f64>() + alpha * values[0];
        let after: f64 = v.as_slice().iter().sum();
        prop_assert!((before - after).abs() < 1.0e-9 * before.abs().max(1.0));
    }

    #[test]
    fn gmres_agrees_with_lu_on_dominant_tridiagonals(
        diag in proptest::collection::vec(3.0..10.0f64, 5..30),
        rhs_seed in -5.0..5.0f64,
    ) {
        let n = diag.len();
        let mut m = SysMatrix::new(n);
        for (i, &d) in diag.iter().enumerate() {
            m.set_value(i, i, d, AssemblyMode::Add).unwrap();
            if i > 0 {
                m.set_value(i, i - 1, -1.0, AssemblyMode::Add).unwrap();
            }
            if i + 1 < n {
                m.set_value(i, i + 1, -1.0, AssemblyMode::Add).unwrap();
            }
        }
        m.final_assembly();
        let b: Vec<f64> = (0..n).map(|i| rhs_seed + i as f64).collect();

        let direct = solve_linear(&m, &b, &LinearSpec::default()).unwrap();
        let spec = LinearSpec {
            solver: LinearSolverType::Gmres,
            pc: PreconditionerType::Jacobi,
            ..LinearSpec::default()
        };
        let iterative = solve_linear(&m, &b, &spec).unwrap();
        for (a, c) in direct.iter().zip(&iterative) {
            prop_assert!((a - c).abs() < 1.0e-7 * a.abs().max(1.0));
        }
    }
}
