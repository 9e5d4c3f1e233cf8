// crates/driftfvm-solver/tests/solderpad.rs

//! Solder pads on a resistive-metal block: the steady terminal current
//! reproduces the sheet formula σ·A·ΔV/L, and the electrode trace
//! neutralises the electrode row after reading the current derivatives.

use driftfvm_algebra::{AssemblyMode, SysMatrix};
use driftfvm_device::{BcType, ExtCircuit, ModelLevel, SerialComm, System};
use driftfvm_material::by_name;
use driftfvm_math::units::UM;
use driftfvm_mesh::builders::cube_mesh;
use driftfvm_solver::bc::BcScratch;
use driftfvm_solver::newton::solve_steady_state;
use driftfvm_solver::{assemble_jacobian, electrode_trace, SolveParams};

const WIDTH: f64 = 10.0 * UM;
const THICKNESS: f64 = 1.0 * UM;
const BIAS: f64 = 1.0;

fn pad_block() -> System {
    let mesh = cube_mesh(4, 4, 3, WIDTH, WIDTH, THICKNESS, |_| 0).unwrap();
    let al = by_name("al").unwrap();
    let mut sys = System::new(mesh, &[al], ModelLevel::Ddm1).unwrap();
    sys.add_boundary("zmax", BcType::SolderPad, Some(ExtCircuit::voltage(BIAS)))
        .unwrap();
    sys.add_boundary("zmin", BcType::SolderPad, Some(ExtCircuit::voltage(0.0)))
        .unwrap();
    sys.finalize();
    sys
}

#[test]
fn terminal_current_matches_the_sheet_formula() {
    let mut sys = pad_block();
    let comm = SerialComm;
    let params = SolveParams::default();
    let (_x, report) = solve_steady_state(&mut sys, &comm, &params).unwrap();
    assert!(report.converged);

    let sigma = by_name("al").unwrap().conductance;
    let expect = sigma * WIDTH * WIDTH / THICKNESS * BIAS;
    let i = sys.boundaries[0]
        .ext_circuit
        .as_ref()
        .map_or(0.0, |c| c.current)
        .abs();
    assert!(
        (i - expect).abs() < 5.0e-3 * expect,
        "pad current {i:.6e} A vs σAΔV/L = {expect:.6e} A"
    );

    // The two pads carry equal and opposite currents.
    let i_other = sys.boundaries[1]
        .ext_circuit
        .as_ref()
        .map_or(0.0, |c| c.current);
    assert!((i_other.abs() - i).abs() < 5.0e-3 * expect);
}

#[test]
fn electrode_trace_reads_current_derivatives_and_neutralises_the_row() {
    let mut sys = pad_block();
    let comm = SerialComm;
    let params = SolveParams::default();
    let (x, _) = solve_steady_state(&mut sys, &comm, &params).unwrap();

    let mut jac = SysMatrix::new(sys.n_dofs());
    let mut scratch: Vec<BcScratch> = Vec::new();
    assemble_jacobian(&sys, &comm, &params, &x, &mut jac, &mut scratch).unwrap();

    let (pd_i, pd_f) = electrode_trace(&sys, 0, &comm, &mut jac).unwrap();

    // dI/dψ is nonzero at the pad vertices, and dF/dV_e marks their rows.
    let bd = &sys.boundaries[0].nodes[0];
    let (region, fvm) = bd.rnodes[0];
    let row = sys.offset(region, fvm);
    assert!(pd_i.get(row).abs() > 0.0);
    assert_eq!(pd_f.get(row), 1.0);

    // The electrode row is replaced by the identity row.
    let bc_row = sys.dofs.bc_offset[0].unwrap();
    let entries: Vec<(usize, f64)> = jac.row_entries(bc_row).collect();
    assert_eq!(entries, vec![(bc_row, 1.0)]);

    // The trace step may write into the neutralised matrix afterwards.
    jac.set_value(bc_row, bc_row, 0.0, AssemblyMode::Add).unwrap();
}
