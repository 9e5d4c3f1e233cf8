// crates/driftfvm-solver/tests/jacobian_fd.rs

//! AD consistency: every column of the assembled Jacobian matches a
//! central finite difference of the assembled residual on a small diode
//! with Ohmic contacts.

use driftfvm_algebra::{SysMatrix, SysVector};
use driftfvm_device::{BcType, ExtCircuit, ModelLevel, SerialComm, System};
use driftfvm_material::by_name;
use driftfvm_math::units::UM;
use driftfvm_mesh::builders::line_mesh;
use driftfvm_solver::bc::BcScratch;
use driftfvm_solver::{assemble_function, assemble_jacobian, SolveParams};

fn small_diode() -> System {
    let mesh = line_mesh(7, 1.0 * UM, 1.0e-8, |_| 0).unwrap();
    let si = by_name("si").unwrap();
    let mut sys = System::new(mesh, &[si], ModelLevel::Ddm1).unwrap();
    let mid = 0.5 * UM;
    sys.set_doping(|p| {
        if p.x < mid {
            (1.0e17, 0.0)
        } else {
            (0.0, 1.0e17)
        }
    });
    sys.add_boundary("left", BcType::OhmicContact, Some(ExtCircuit::voltage(0.1)))
        .unwrap();
    sys.add_boundary("right", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
        .unwrap();
    sys.finalize();
    sys
}

fn residual(sys: &mut System, params: &SolveParams, x: &[f64]) -> Vec<f64> {
    let comm = SerialComm;
    let mut f = SysVector::new(sys.n_dofs());
    let mut scratch: Vec<BcScratch> = Vec::new();
    assemble_function(sys, &comm, params, x, &mut f, &mut scratch).unwrap();
    f.as_slice().to_vec()
}

#[test]
fn jacobian_columns_match_central_differences() {
    let mut sys = small_diode();
    let comm = SerialComm;
    let params = SolveParams::default();

    // Start from the equilibrium guess, nudged off the solution so no
    // term sits at a stationary point.
    let mut x = sys.initial_guess();
    let n = x.len();
    for (i, xi) in x.iter_mut().enumerate() {
        if xi.abs() > 1.0 {
            *xi *= 1.0 + 0.01 * ((i % 5) as f64 - 2.0) / 10.0;
        } else {
            *xi += 0.003 * ((i % 7) as f64 - 3.0);
        }
    }

    let mut jac = SysMatrix::new(n);
    let mut scratch: Vec<BcScratch> = Vec::new();
    assemble_jacobian(&sys, &comm, &params, &x, &mut jac, &mut scratch).unwrap();

    for col in 0..n {
        let eps = 1.0e-7 * x[col].abs().max(1.0e-3);
        let mut xp = x.clone();
        xp[col] += eps;
        let fp = residual(&mut sys, &params, &xp);
        let mut xm = x.clone();
        xm[col] -= eps;
        let fm = residual(&mut sys, &params, &xm);

        // Column scale for the relative comparison.
        let mut scale = 0.0f64;
        for row in 0..n {
            let ad = jac.get_values(row, &[col])[0];
            scale = scale.max(ad.abs());
        }
        let tol = 1.0e-5 * scale.max(1.0e-300);

        for row in 0..n {
            let ad = jac.get_values(row, &[col])[0];
            let fd = (fp[row] - fm[row]) / (2.0 * eps);
            assert!(
                (ad - fd).abs() <= tol + 1.0e-6 * fd.abs(),
                "J[{row},{col}] = {ad:e} but FD gives {fd:e} (eps {eps:e})"
            );
        }
    }
}
