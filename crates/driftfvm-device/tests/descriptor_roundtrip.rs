// crates/driftfvm-device/tests/descriptor_roundtrip.rs

//! For every boundary-condition kind, the emitted one-line descriptor
//! parses back to the same kind with the same parameter values.

use driftfvm_device::descriptor::{emit, parse};
use driftfvm_device::{BcType, ExtCircuit, ModelLevel, System};
use driftfvm_material::by_name;
use driftfvm_math::units::HEAT_TRANSFER_UNIT;
use driftfvm_mesh::builders::line_mesh;

use driftfvm_device::bc::ALL_BC_TYPES;

fn host_system() -> System {
    let mesh = line_mesh(5, 1.0e-4, 1.0e-8, |_| 0).unwrap();
    System::new(mesh, &[by_name("si").unwrap()], ModelLevel::Ddm1).unwrap()
}

#[test]
fn every_kind_round_trips() {
    for &bc_type in ALL_BC_TYPES {
        if bc_type == BcType::InvalidBcType {
            continue;
        }
        let mut sys = host_system();
        let circuit = bc_type
            .is_electrode()
            .then(|| ExtCircuit::voltage(0.75).with_rlc(1.0e3, 2.0e-12, 3.0e-9));
        let id = if matches!(bc_type, BcType::InterConnect | BcType::ChargeIntegral) {
            sys.add_virtual_boundary("hub", bc_type, Some(ExtCircuit::voltage(1.0)))
        } else {
            sys.add_boundary("left", bc_type, circuit).unwrap()
        };
        let line = emit(&sys, id);
        let parsed = parse(&line).unwrap_or_else(|e| panic!("{}: {e}\n  line: {line}", bc_type.name()));
        assert_eq!(parsed.bc_type, Some(bc_type), "line: {line}");
        assert_eq!(parsed.id, sys.boundaries[id].label);
    }
}

#[test]
fn ohmic_descriptor_preserves_circuit_and_thermal_values() {
    let mut sys = host_system();
    let id = sys
        .add_boundary(
            "left",
            BcType::OhmicContact,
            Some(ExtCircuit::voltage(0.6).with_rlc(50.0, 1.0e-12, 2.0e-9)),
        )
        .unwrap();
    sys.boundaries[id].params.heat_transfer = 2.5e3 * HEAT_TRANSFER_UNIT;

    let parsed = parse(&emit(&sys, id)).unwrap();
    assert!((parsed.reals["res"] - 50.0).abs() < 1e-9);
    assert!((parsed.reals["cap"] - 1.0e-12).abs() < 1e-21);
    assert!((parsed.reals["ind"] - 2.0e-9).abs() < 1e-18);
    assert!((parsed.reals["potential"] - 0.6).abs() < 1e-9);
    assert!((parsed.reals["ext.temp"] - 300.0).abs() < 1e-9);
    assert!((parsed.reals["heat.transfer"] - 2.5e3).abs() < 1e-6);
}

#[test]
fn interconnect_descriptor_lists_connected_electrodes() {
    let mut sys = host_system();
    let a = sys
        .add_boundary("left", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
        .unwrap();
    let b = sys
        .add_boundary("right", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
        .unwrap();
    let hub = sys.add_virtual_boundary("bus", BcType::InterConnect, Some(ExtCircuit::voltage(1.0)));
    sys.connect_to_hub(hub, a);
    sys.connect_to_hub(hub, b);

    let parsed = parse(&emit(&sys, hub)).unwrap();
    let connected: Vec<&str> = parsed
        .strings
        .iter()
        .filter(|(k, _)| k == "connectto")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(connected, vec!["left", "right"]);
    assert!(!parsed.bools["float"]);
}
