// crates/driftfvm-solver/tests/interconnect.rs

//! Interconnect hub coupling: a uniformly doped bar with one grounded
//! contact and one contact hanging off a resistive hub settles so the
//! floating contact sits at `V_app - I·R`.

use driftfvm_device::{BcType, ExtCircuit, ModelLevel, SerialComm, System};
use driftfvm_material::by_name;
use driftfvm_math::units::{Q, UM};
use driftfvm_mesh::builders::line_mesh;
use driftfvm_solver::newton::solve_steady_state;
use driftfvm_solver::SolveParams;

const ND: f64 = 1.0e18;
const AREA: f64 = 1.0e-8; // cm^2
const LENGTH_UM: f64 = 2.0;
const R_HUB: f64 = 1.0e3;
const V_APP: f64 = 1.0;

#[test]
fn floating_contact_settles_at_vapp_minus_ir() {
    let length = LENGTH_UM * UM;
    let mesh = line_mesh(21, length, AREA, |_| 0).unwrap();
    let si = by_name("si").unwrap();
    let mut sys = System::new(mesh, &[si], ModelLevel::Ddm1).unwrap();
    sys.set_doping(|_| (0.0, ND));

    let ground = sys
        .add_boundary("left", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
        .unwrap();
    let floating = sys
        .add_boundary("right", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
        .unwrap();
    let hub = sys.add_virtual_boundary(
        "bus",
        BcType::InterConnect,
        Some(ExtCircuit::voltage(V_APP).with_rlc(R_HUB, 0.0, 0.0)),
    );
    sys.connect_to_hub(hub, floating);
    sys.finalize();

    let comm = SerialComm;
    let params = SolveParams::default();
    let (x, report) = solve_steady_state(&mut sys, &comm, &params).unwrap();
    assert!(report.converged);

    let v_float = x[sys.dofs.bc_offset[floating].unwrap()];
    let v_hub = x[sys.dofs.bc_offset[hub].unwrap()];
    let i = sys.boundaries[floating]
        .ext_circuit
        .as_ref()
        .map_or(0.0, |c| c.current);

    // The electrode with zero series impedance rides the hub potential,
    // and the hub equation fixes V_hub = V_app - I·R.
    assert!((v_float - v_hub).abs() < 1.0e-9, "V_e {v_float} vs hub {v_hub}");
    assert!(
        (v_hub - (V_APP - R_HUB * i)).abs() < 1.0e-6,
        "hub {v_hub} vs V_app - I*R = {}",
        V_APP - R_HUB * i
    );

    // Sanity on the magnitude: hub resistance in series with the bar.
    let mu: f64 = si.mu_n(ND, sys.t_external);
    let r_bar = length / (Q * ND * mu * AREA);
    let i_expect = V_APP / (R_HUB + r_bar);
    assert!(
        (i - i_expect).abs() < 0.3 * i_expect,
        "current {i:e} vs series estimate {i_expect:e} (bar {r_bar:.1} ohm)"
    );

    // The grounded contact carries the same current in the loop.
    let i_gnd = sys.boundaries[ground]
        .ext_circuit
        .as_ref()
        .map_or(0.0, |c| c.current);
    assert!(
        (i + i_gnd).abs() < 0.05 * i.abs().max(1.0e-12),
        "loop current mismatch: {i:e} vs {i_gnd:e}"
    );
}
