// crates/driftfvm-solver/tests/diode.rs

//! 1D abrupt p-n diode end-to-end: equilibrium junction potential and
//! negligible terminal current, then a forward sweep with log-linear I(V)
//! and near-unity ideality.

use driftfvm_device::{BcType, ExtCircuit, ModelLevel, SerialComm, System};
use driftfvm_material::by_name;
use driftfvm_math::units::{thermal_voltage, UM};
use driftfvm_mesh::builders::line_mesh;
use driftfvm_solver::newton::{dc_sweep, solve_steady_state};
use driftfvm_solver::SolveParams;

const NA: f64 = 1.0e18;
const ND: f64 = 1.0e18;

fn diode(nodes: usize) -> System {
    let length = 1.0 * UM;
    let mesh = line_mesh(nodes, length, 1.0e-8, |_| 0).unwrap();
    let si = by_name("si").unwrap();
    let mut sys = System::new(mesh, &[si], ModelLevel::Ddm1).unwrap();
    let mid = length / 2.0;
    sys.set_doping(|p| if p.x < mid { (NA, 0.0) } else { (0.0, ND) });
    // Anode on the p side, cathode grounded.
    sys.add_boundary("left", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
        .unwrap();
    sys.add_boundary("right", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
        .unwrap();
    sys.finalize();
    sys
}

#[test]
fn equilibrium_matches_the_contact_potential_and_carries_no_current() {
    let mut sys = diode(101);
    let comm = SerialComm;
    let params = SolveParams::default();

    let (x, report) = solve_steady_state(&mut sys, &comm, &params).unwrap();
    assert!(report.converged);

    // Junction potential against the Ohmic-boundary closed form.
    let si = by_name("si").unwrap();
    let t = sys.t_external;
    let vt = thermal_voltage(t);
    let nie: f64 = si.nie(t);
    let vbi = vt * ((ND / (2.0 * nie)).asinh() + (NA / (2.0 * nie)).asinh());

    let n_nodes = sys.graphs[0].n_nodes();
    let junction = x[sys.offset(0, n_nodes - 1)] - x[sys.offset(0, 0)];
    assert!(
        (junction - vbi).abs() < 5.0e-3,
        "junction potential {junction:.4} V vs analytic {vbi:.4} V"
    );
    assert!(junction > 0.6 && junction < 1.2);

    for b in &sys.boundaries {
        let i = b.ext_circuit.as_ref().map_or(0.0, |c| c.current);
        assert!(i.abs() < 1.0e-12, "equilibrium current {i:e} at '{}'", b.label);
    }
}

#[test]
fn fermi_statistics_reproduce_the_boltzmann_junction_at_moderate_doping() {
    let comm = SerialComm;
    let params = SolveParams::default();

    let mut boltz = diode(41);
    let (xb, _) = solve_steady_state(&mut boltz, &comm, &params).unwrap();
    let n_nodes = boltz.graphs[0].n_nodes();
    let vbi_b = xb[boltz.offset(0, n_nodes - 1)] - xb[boltz.offset(0, 0)];

    let mut fermi = diode(41);
    fermi.fermi = true;
    let (xf, report) = solve_steady_state(&mut fermi, &comm, &params).unwrap();
    assert!(report.converged);
    let vbi_f = xf[fermi.offset(0, n_nodes - 1)] - xf[fermi.offset(0, 0)];

    // At 1e18 the bands are mildly degenerate: the Fermi contact shifts
    // the junction potential by tens of millivolts at most.
    assert!(
        (vbi_f - vbi_b).abs() < 0.08,
        "Boltzmann {vbi_b:.4} V vs Fermi {vbi_f:.4} V"
    );
}

#[test]
fn transient_bias_step_draws_displacement_current() {
    use driftfvm_solver::newton::transient_step;
    use driftfvm_solver::TsType;

    let mut sys = diode(41);
    let comm = SerialComm;
    let dc = SolveParams::default();
    let (mut x, _) = solve_steady_state(&mut sys, &comm, &dc).unwrap();

    // Step the anode to 0.1 V reverse and advance one BDF1 step: the
    // junction capacitance must carry charge.
    if let Some(ckt) = sys.boundaries[0].ext_circuit.as_mut() {
        ckt.v_app = -0.1;
    }
    let tr = SolveParams {
        time_dependent: true,
        ts_type: TsType::Bdf1,
        dt: 1.0e-9,
        ..SolveParams::default()
    };
    let report = transient_step(&mut sys, &comm, &tr, &mut x).unwrap();
    assert!(report.converged);

    let i = sys.boundaries[0]
        .ext_circuit
        .as_ref()
        .map_or(0.0, |c| c.current);
    assert!(i.abs() > 1.0e-12, "no displacement current: {i:e}");

    // A second step from the settled state draws far less.
    let report = transient_step(&mut sys, &comm, &tr, &mut x).unwrap();
    assert!(report.converged);
    let i2 = sys.boundaries[0]
        .ext_circuit
        .as_ref()
        .map_or(0.0, |c| c.current);
    assert!(i2.abs() < i.abs(), "transient did not settle: {i2:e} vs {i:e}");
}

#[test]
fn forward_sweep_is_log_linear_with_near_unity_ideality() {
    let mut sys = diode(101);
    let comm = SerialComm;
    let params = SolveParams::default();

    let voltages: Vec<f64> = (0..=10).map(|k| 0.05 * k as f64).collect();
    let iv = dc_sweep(&mut sys, &comm, &params, 0, &voltages).unwrap();

    // Strictly increasing current above the noise floor.
    let mut last = 0.0;
    for &(v, i) in iv.iter().skip(2) {
        assert!(i > last, "current not monotone at V={v}: {i:e} after {last:e}");
        last = i;
    }

    // Ideality from the log slope between 0.30 V and 0.50 V, where
    // diffusion dominates over depletion-layer recombination.
    let vt = thermal_voltage(sys.t_external);
    let pick = |v: f64| {
        iv.iter()
            .find(|(vi, _)| (vi - v).abs() < 1.0e-9)
            .map(|&(_, i)| i)
            .unwrap()
    };
    let (i1, i2) = (pick(0.30), pick(0.50));
    assert!(i1 > 0.0 && i2 > i1);
    let ideality = (0.50 - 0.30) / (vt * (i2 / i1).ln());
    assert!(
        (0.9..=1.25).contains(&ideality),
        "ideality factor {ideality:.3}"
    );
}
