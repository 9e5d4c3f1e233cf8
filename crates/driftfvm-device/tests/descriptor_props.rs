// crates/driftfvm-device/tests/descriptor_props.rs

//! Property test: circuit parameters survive the descriptor emit/parse
//! round trip within float-formatting tolerance, for random R/L/C values
//! over many orders of magnitude.

use proptest::prelude::*;

use driftfvm_device::descriptor::{emit, parse};
use driftfvm_device::{BcType, ExtCircuit, ModelLevel, System};
use driftfvm_material::by_name;
use driftfvm_mesh::builders::line_mesh;

fn host_system(circuit: ExtCircuit) -> (System, usize) {
    let mesh = line_mesh(5, 1.0e-4, 1.0e-8, |_| 0).unwrap();
    let mut sys = System::new(mesh, &[by_name("si").unwrap()], ModelLevel::Ddm1).unwrap();
    let id = sys
        .add_boundary("left", BcType::OhmicContact, Some(circuit))
        .unwrap();
    (sys, id)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn circuit_values_round_trip(
        r_exp in -1.0..6.0f64,
        c_exp in -15.0..-9.0f64,
        l_exp in -12.0..-6.0f64,
        v in -3.0..3.0f64,
    ) {
        let (r, c, l) = (10.0f64.powf(r_exp), 10.0f64.powf(c_exp), 10.0f64.powf(l_exp));
        let (sys, id) = host_system(ExtCircuit::voltage(v).with_rlc(r, c, l));
        let parsed = parse(&emit(&sys, id)).unwrap();
        prop_assert_eq!(parsed.bc_type, Some(BcType::OhmicContact));
        prop_assert!((parsed.reals["res"] - r).abs() < 1.0e-5 * r);
        prop_assert!((parsed.reals["cap"] - c).abs() < 1.0e-5 * c);
        prop_assert!((parsed.reals["ind"] - l).abs() < 1.0e-5 * l);
        prop_assert!((parsed.reals["potential"] - v).abs() < 1.0e-5 * v.abs().max(1.0e-6));
    }
}
