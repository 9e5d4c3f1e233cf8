// crates/driftfvm-solver/tests/simple_gate.rs

//! MOS capacitor behaviour of the lumped-oxide simple gate on p-type
//! silicon: flatband near the workfunction difference, monotone band
//! bending through depletion, inversion saturating near 2φ_F.

use driftfvm_device::{BcType, ExtCircuit, ModelLevel, SerialComm, System};
use driftfvm_material::by_name;
use driftfvm_math::units::{thermal_voltage, NM, UM};
use driftfvm_mesh::builders::line_mesh;
use driftfvm_solver::newton::{newton_solve, solve_steady_state};
use driftfvm_solver::SolveParams;

const NA: f64 = 1.0e17;

fn mos_cap() -> System {
    let mesh = line_mesh(81, 1.0 * UM, 1.0e-8, |_| 0).unwrap();
    let si = by_name("si").unwrap();
    let mut sys = System::new(mesh, &[si], ModelLevel::Poisson).unwrap();
    sys.set_doping(|_| (NA, 0.0));

    let gate = sys
        .add_boundary(
            "left",
            BcType::SimpleGateContact,
            Some(ExtCircuit::voltage(0.0)),
        )
        .unwrap();
    sys.boundaries[gate].params.workfunction = 4.1;
    sys.boundaries[gate].params.thickness = 2.0 * NM;
    sys.boundaries[gate].params.eps = 3.9;
    sys.boundaries[gate].params.qf = 0.0;

    sys.add_boundary("right", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
        .unwrap();
    sys.finalize();
    sys
}

/// Bulk (neutral) potential of the p-doped substrate.
fn bulk_potential(sys: &System) -> f64 {
    let si = by_name("si").unwrap();
    let t = sys.t_external;
    let vt = thermal_voltage(t);
    let nie: f64 = si.nie(t);
    let eg: f64 = si.eg(t);
    let nc: f64 = si.nc(t);
    let nv: f64 = si.nv(t);
    vt * ((-NA) / (2.0 * nie)).asinh() - eg / 2.0 - vt / 2.0 * (nc / nv).ln() - si.affinity
}

#[test]
fn band_bending_tracks_the_gate_through_flatband_and_inversion() {
    let mut sys = mos_cap();
    let comm = SerialComm;
    let params = SolveParams::default();
    let psi_bulk = bulk_potential(&sys);
    let v_fb = 4.1 + psi_bulk;
    // Workfunction difference for this stack sits near -0.9 V.
    assert!((-1.05..=-0.75).contains(&v_fb), "flatband estimate {v_fb:.3}");

    let (mut x, _) = solve_steady_state(&mut sys, &comm, &params).unwrap();

    let mut bendings = Vec::new();
    let mut vg = -2.0;
    while vg <= 2.01 {
        if let Some(ckt) = sys.boundaries[0].ext_circuit.as_mut() {
            ckt.v_app = vg;
        }
        let report = newton_solve(&mut sys, &comm, &params, &mut x).unwrap();
        assert!(report.converged, "Vg = {vg}");
        let psi_s = x[sys.offset(0, 0)];
        bendings.push((vg, psi_s - psi_bulk));
        vg += 0.25;
    }

    // Monotone response.
    for pair in bendings.windows(2) {
        assert!(
            pair[1].1 > pair[0].1 - 1.0e-9,
            "band bending not monotone: {pair:?}"
        );
    }

    // Near flatband the surface is neutral.
    let near_fb = bendings
        .iter()
        .min_by(|a, b| {
            (a.0 - v_fb).abs().partial_cmp(&(b.0 - v_fb).abs()).unwrap()
        })
        .unwrap();
    assert!(
        near_fb.1.abs() < 0.1,
        "bending {:.3} V at Vg = {:.2} (flatband {v_fb:.2})",
        near_fb.1,
        near_fb.0
    );

    // Strong inversion saturates a little above 2φ_F.
    let vt = thermal_voltage(sys.t_external);
    let nie: f64 = by_name("si").unwrap().nie(sys.t_external);
    let two_phi_f = 2.0 * vt * (NA / nie).ln();
    let (_, max_bend) = bendings.last().unwrap();
    assert!(
        *max_bend > 0.8 * two_phi_f && *max_bend < two_phi_f + 0.35,
        "inversion bending {max_bend:.3} vs 2φF = {two_phi_f:.3}"
    );

    // Accumulation side bends the other way, weakly.
    let (_, min_bend) = bendings.first().unwrap();
    assert!(*min_bend < 0.0 && *min_bend > -0.6);
}
