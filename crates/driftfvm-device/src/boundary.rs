// crates/driftfvm-device/src/boundary.rs

//! Boundary objects: a labelled node set, the ordered incident regions,
//! the per-kind parameter bag and an optional external circuit.

use serde::{Deserialize, Serialize};

use crate::bc::BcType;
use crate::circuit::ExtCircuit;
use driftfvm_math::units::{HEAT_TRANSFER_UNIT, CM, PER_CM2};

/// Per-boundary parameter bag. Fields a kind does not use stay at their
/// defaults and are not emitted in its descriptor.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BcParams {
    /// External temperature [K].
    pub ext_temp: f64,
    /// Heat-transfer coefficient [J/(s·cm²·K)].
    pub heat_transfer: f64,
    /// Metal workfunction [V].
    pub workfunction: f64,
    /// Fixed interface charge density [cm⁻²] (or total charge [C] for
    /// charge-integral boundaries).
    pub qf: f64,
    /// Oxide thickness for simple gates [cm].
    pub thickness: f64,
    /// Relative oxide permittivity for simple gates.
    pub eps: f64,
    /// Full carrier reflection at the boundary.
    pub reflection: bool,
    /// Electron surface recombination velocity [cm/s].
    pub elec_recomb_velocity: f64,
    /// Hole surface recombination velocity [cm/s].
    pub hole_recomb_velocity: f64,
}

impl BcParams {
    /// Kind-specific defaults at external temperature `t_ext`.
    #[must_use]
    pub fn defaults(bc_type: BcType, t_ext: f64) -> Self {
        let mut p = Self {
            ext_temp: t_ext,
            heat_transfer: 0.0,
            workfunction: 0.0,
            qf: 0.0,
            thickness: 1.0e-9 * CM,
            eps: 3.9,
            reflection: false,
            elec_recomb_velocity: f64::INFINITY,
            hole_recomb_velocity: f64::INFINITY,
        };
        match bc_type {
            BcType::OhmicContact
            | BcType::SchottkyContact
            | BcType::GateContact
            | BcType::SolderPad => {
                p.heat_transfer = 1.0e3 * HEAT_TRANSFER_UNIT;
                p.reflection = bc_type == BcType::OhmicContact || bc_type == BcType::SchottkyContact;
            }
            BcType::SimpleGateContact => {
                p.heat_transfer = 1.0e3 * HEAT_TRANSFER_UNIT;
                p.qf = 1.0e10 * PER_CM2;
            }
            BcType::IfInsulatorSemiconductor => {
                p.qf = 1.0e10 * PER_CM2;
            }
            _ => {}
        }
        p
    }
}

/// One boundary vertex with its per-region FVM nodes, ordered so the
/// semiconductor node (when present) comes first.
#[derive(Clone, Debug)]
pub struct BdNode {
    /// Global mesh node index.
    pub node: usize,
    /// `(region id, FVM index)` pairs, boundary-rank ordered.
    pub rnodes: Vec<(usize, usize)>,
}

/// A labelled boundary: kind, node set, parameter bag, circuit.
#[derive(Clone, Debug)]
pub struct Boundary {
    /// Boundary label from the mesh.
    pub label: String,
    /// Classified or user-assigned kind.
    pub bc_type: BcType,
    /// Parameter bag.
    pub params: BcParams,
    /// External circuit (electrode kinds and interconnect hubs).
    pub ext_circuit: Option<ExtCircuit>,
    /// Boundary vertices, ordered by global node index.
    pub nodes: Vec<BdNode>,
    /// Incident regions `(primary, secondary)`; exterior boundaries leave
    /// the second slot empty.
    pub regions: (Option<usize>, Option<usize>),
    /// Boundary ids of electrodes attached to this hub (interconnect and
    /// charge-integral boundaries).
    pub inter_connect: Vec<usize>,
    /// Hub boundary id, for electrodes tied to an interconnect hub.
    pub hub: Option<usize>,
}

impl Boundary {
    /// Whether this boundary contributes an extra scalar unknown.
    #[must_use]
    pub fn has_extra_unknown(&self) -> bool {
        matches!(self.bc_type, BcType::InterConnect | BcType::ChargeIntegral)
            || (self.bc_type.is_electrode() && self.ext_circuit.is_some())
    }

    /// Whether this electrode hangs off an interconnect hub.
    #[must_use]
    pub fn is_inter_connect_bc(&self) -> bool {
        self.hub.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_kind() {
        let ohmic = BcParams::defaults(BcType::OhmicContact, 300.0);
        assert!((ohmic.heat_transfer - 1.0e3).abs() < 1e-9);
        assert!(ohmic.reflection);

        let neumann = BcParams::defaults(BcType::NeumannBoundary, 300.0);
        assert_eq!(neumann.heat_transfer, 0.0);
        assert!(!neumann.reflection);

        let is_if = BcParams::defaults(BcType::IfInsulatorSemiconductor, 300.0);
        assert!((is_if.qf - 1.0e10).abs() < 1.0);
    }

    #[test]
    fn extra_unknown_rule() {
        let mut b = Boundary {
            label: "anode".into(),
            bc_type: BcType::OhmicContact,
            params: BcParams::defaults(BcType::OhmicContact, 300.0),
            ext_circuit: Some(ExtCircuit::voltage(0.0)),
            nodes: Vec::new(),
            regions: (None, None),
            inter_connect: Vec::new(),
            hub: None,
        };
        assert!(b.has_extra_unknown());
        b.ext_circuit = None;
        assert!(!b.has_extra_unknown());
        b.bc_type = BcType::InterConnect;
        assert!(b.has_extra_unknown());
    }
}
