// crates/driftfvm-device/src/bc.rs

//! Boundary-condition taxonomy: the full kind enumeration, name↔enum
//! maps, and the interface classifier consulted at mesh setup.

use anyhow::{bail, Result};
use driftfvm_material::{
    is_conductor, is_insulator, is_pml, is_resistance, is_semiconductor, is_vacuum,
};

/// Every boundary-condition kind the assembler understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BcType {
    NeumannBoundary,
    OhmicContact,
    IfMetalOhmic,
    SchottkyContact,
    IfMetalSchottky,
    GateContact,
    SimpleGateContact,
    SolderPad,
    IfInsulatorSemiconductor,
    HeteroInterface,
    HomoInterface,
    ChargedContact,
    AbsorbingBoundary,
    SourceBoundary,
    IfSemiconductorVacuum,
    IfInsulatorVacuum,
    IfElectrodeVacuum,
    IfMetalVacuum,
    IfPmlPml,
    IfPmlScatter,
    IfElectrodeInsulator,
    IfInsulatorInsulator,
    IfElectrodeElectrode,
    IfElectrodeMetal,
    IfInsulatorMetal,
    IfMetalMetal,
    IfElectrodeSemiconductor,
    IfMetalSemiconductor,
    ChargeIntegral,
    InterConnect,
    InvalidBcType,
}

/// All kinds, in enumeration order (useful for table round-trips).
pub const ALL_BC_TYPES: &[BcType] = &[
    BcType::NeumannBoundary,
    BcType::OhmicContact,
    BcType::IfMetalOhmic,
    BcType::SchottkyContact,
    BcType::IfMetalSchottky,
    BcType::GateContact,
    BcType::SimpleGateContact,
    BcType::SolderPad,
    BcType::IfInsulatorSemiconductor,
    BcType::HeteroInterface,
    BcType::HomoInterface,
    BcType::ChargedContact,
    BcType::AbsorbingBoundary,
    BcType::SourceBoundary,
    BcType::IfSemiconductorVacuum,
    BcType::IfInsulatorVacuum,
    BcType::IfElectrodeVacuum,
    BcType::IfMetalVacuum,
    BcType::IfPmlPml,
    BcType::IfPmlScatter,
    BcType::IfElectrodeInsulator,
    BcType::IfInsulatorInsulator,
    BcType::IfElectrodeElectrode,
    BcType::IfElectrodeMetal,
    BcType::IfInsulatorMetal,
    BcType::IfMetalMetal,
    BcType::IfElectrodeSemiconductor,
    BcType::IfMetalSemiconductor,
    BcType::ChargeIntegral,
    BcType::InterConnect,
    BcType::InvalidBcType,
];

impl BcType {
    /// Canonical display name (the reverse map).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NeumannBoundary => "NeumannBoundary",
            Self::OhmicContact => "OhmicContact",
            Self::IfMetalOhmic => "IF_Metal_Ohmic",
            Self::SchottkyContact => "SchottkyContact",
            Self::IfMetalSchottky => "IF_Metal_Schottky",
            Self::GateContact => "GateContact",
            Self::SimpleGateContact => "SimpleGateContact",
            Self::SolderPad => "SolderPad",
            Self::IfInsulatorSemiconductor => "IF_Insulator_Semiconductor",
            Self::HeteroInterface => "HeteroInterface",
            Self::HomoInterface => "HomoInterface",
            Self::ChargedContact => "ChargedContact",
            Self::AbsorbingBoundary => "AbsorbingBoundary",
            Self::SourceBoundary => "SourceBoundary",
            Self::IfSemiconductorVacuum => "IF_Semiconductor_Vacuum",
            Self::IfInsulatorVacuum => "IF_Insulator_Vacuum",
            Self::IfElectrodeVacuum => "IF_Electrode_Vacuum",
            Self::IfMetalVacuum => "IF_Metal_Vacuum",
            Self::IfPmlPml => "IF_PML_PML",
            Self::IfPmlScatter => "IF_PML_Scatter",
            Self::IfElectrodeInsulator => "IF_Electrode_Insulator",
            Self::IfInsulatorInsulator => "IF_Insulator_Insulator",
            Self::IfElectrodeElectrode => "IF_Electrode_Electrode",
            Self::IfElectrodeMetal => "IF_Electrode_Metal",
            Self::IfInsulatorMetal => "IF_Insulator_Metal",
            Self::IfMetalMetal => "IF_Metal_Metal",
            Self::IfElectrodeSemiconductor => "IF_Electrode_Semiconductor",
            Self::IfMetalSemiconductor => "IF_Metal_Semiconductor",
            Self::ChargeIntegral => "ChargeIntegral",
            Self::InterConnect => "InterConnect",
            Self::InvalidBcType => "INVALID_BC_TYPE",
        }
    }

    /// Forward map from a user-facing name.
    ///
    /// Accepts the canonical names (case-insensitive, underscores ignored)
    /// plus the historical command-file spellings, including `floatmetal`
    /// as a one-way alias of [`BcType::ChargedContact`]: the reverse map
    /// never emits it.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "neumann" | "neumannboundary" => Self::NeumannBoundary,
            "ohmiccontact" => Self::OhmicContact,
            "metalohmicinterface" | "resistanceohmiccontact" | "ifmetalohmic" => Self::IfMetalOhmic,
            "schottkycontact" => Self::SchottkyContact,
            "metalschottkyinterface" | "resistanceschottkycontact" | "ifmetalschottky" => {
                Self::IfMetalSchottky
            }
            "gatecontact" => Self::GateContact,
            "simplegatecontact" => Self::SimpleGateContact,
            "solderpad" => Self::SolderPad,
            "insulatorinterface" | "ifinsulatorsemiconductor" => Self::IfInsulatorSemiconductor,
            "heterojunction" | "heterointerface" => Self::HeteroInterface,
            "homointerface" => Self::HomoInterface,
            "chargedcontact" | "floatmetal" => Self::ChargedContact,
            "absorbingboundary" => Self::AbsorbingBoundary,
            "sourceboundary" => Self::SourceBoundary,
            "ifsemiconductorvacuum" => Self::IfSemiconductorVacuum,
            "ifinsulatorvacuum" => Self::IfInsulatorVacuum,
            "ifelectrodevacuum" => Self::IfElectrodeVacuum,
            "ifmetalvacuum" => Self::IfMetalVacuum,
            "ifpmlpml" => Self::IfPmlPml,
            "ifpmlscatter" => Self::IfPmlScatter,
            "ifelectrodeinsulator" => Self::IfElectrodeInsulator,
            "ifinsulatorinsulator" => Self::IfInsulatorInsulator,
            "ifelectrodeelectrode" => Self::IfElectrodeElectrode,
            "ifelectrodemetal" => Self::IfElectrodeMetal,
            "ifinsulatormetal" => Self::IfInsulatorMetal,
            "ifmetalmetal" => Self::IfMetalMetal,
            "ifelectrodesemiconductor" => Self::IfElectrodeSemiconductor,
            "ifmetalsemiconductor" => Self::IfMetalSemiconductor,
            "chargeintegral" => Self::ChargeIntegral,
            "interconnect" => Self::InterConnect,
            _ => Self::InvalidBcType,
        }
    }

    /// Whether this kind carries an electrode potential unknown.
    #[must_use]
    pub const fn is_electrode(self) -> bool {
        matches!(
            self,
            Self::OhmicContact
                | Self::SchottkyContact
                | Self::GateContact
                | Self::SimpleGateContact
                | Self::SolderPad
                | Self::ChargedContact
        )
    }
}

/// Classify the interface between two adjacent materials into exactly one
/// boundary-condition kind.
///
/// The cascade is ordered: semiconductor pairings first, then insulator,
/// conductor, resistive metal, and finally PML. `resistive_metal_mode`
/// decides whether resistive metals keep their own interface kinds or
/// degrade to electrode behaviour.
///
/// # Errors
/// Fails with both material names when no rule matches; an unclassifiable
/// pair is a fatal mesh-setup error.
pub fn classify_interface(mat1: &str, mat2: &str, resistive_metal_mode: bool) -> Result<BcType> {
    // Both semiconductor: hetero or homo junction by material identity.
    if is_semiconductor(mat1) && is_semiconductor(mat2) {
        if mat1.eq_ignore_ascii_case(mat2) {
            return Ok(BcType::HomoInterface);
        }
        return Ok(BcType::HeteroInterface);
    }

    // One semiconductor.
    if is_semiconductor(mat1) || is_semiconductor(mat2) {
        if is_insulator(mat1) || is_insulator(mat2) {
            return Ok(BcType::IfInsulatorSemiconductor);
        }
        if is_vacuum(mat1) || is_vacuum(mat2) {
            return Ok(BcType::IfSemiconductorVacuum);
        }
        if is_conductor(mat1) || is_conductor(mat2) {
            return Ok(BcType::IfElectrodeSemiconductor);
        }
        if is_resistance(mat1) || is_resistance(mat2) {
            if resistive_metal_mode {
                return Ok(BcType::IfMetalSemiconductor);
            }
            return Ok(BcType::IfElectrodeSemiconductor);
        }
    }

    // Both insulator.
    if is_insulator(mat1) && is_insulator(mat2) {
        return Ok(BcType::IfInsulatorInsulator);
    }

    // One insulator.
    if is_insulator(mat1) || is_insulator(mat2) {
        if is_vacuum(mat1) || is_vacuum(mat2) {
            return Ok(BcType::IfInsulatorVacuum);
        }
        if is_conductor(mat1) || is_conductor(mat2) {
            return Ok(BcType::IfElectrodeInsulator);
        }
        if is_resistance(mat1) || is_resistance(mat2) {
            if resistive_metal_mode {
                return Ok(BcType::IfInsulatorMetal);
            }
            return Ok(BcType::IfElectrodeInsulator);
        }
    }

    // Both conductor.
    if is_conductor(mat1) && is_conductor(mat2) {
        return Ok(BcType::IfElectrodeElectrode);
    }

    // One conductor.
    if is_conductor(mat1) || is_conductor(mat2) {
        if is_vacuum(mat1) || is_vacuum(mat2) {
            return Ok(BcType::IfElectrodeVacuum);
        }
        if is_resistance(mat1) || is_resistance(mat2) {
            if resistive_metal_mode {
                return Ok(BcType::IfElectrodeMetal);
            }
            return Ok(BcType::IfElectrodeElectrode);
        }
    }

    // Both resistive metal.
    if is_resistance(mat1) && is_resistance(mat2) {
        if resistive_metal_mode {
            return Ok(BcType::IfMetalMetal);
        }
        return Ok(BcType::IfElectrodeElectrode);
    }

    // One resistive metal.
    if (is_resistance(mat1) || is_resistance(mat2)) && (is_vacuum(mat1) || is_vacuum(mat2)) {
        if resistive_metal_mode {
            return Ok(BcType::IfMetalVacuum);
        }
        return Ok(BcType::IfElectrodeVacuum);
    }

    // PML pairings.
    if is_pml(mat1) && is_pml(mat2) {
        return Ok(BcType::IfPmlPml);
    }
    if is_pml(mat1) || is_pml(mat2) {
        return Ok(BcType::IfPmlScatter);
    }

    bail!("the interface type between materials '{mat1}' and '{mat2}' can't be determined")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_the_forward_map() {
        for &bc in ALL_BC_TYPES {
            if bc == BcType::InvalidBcType {
                continue;
            }
            assert_eq!(BcType::from_name(bc.name()), bc, "{}", bc.name());
        }
    }

    #[test]
    fn float_metal_alias_is_one_way() {
        assert_eq!(BcType::from_name("floatmetal"), BcType::ChargedContact);
        assert_eq!(BcType::ChargedContact.name(), "ChargedContact");
        assert_eq!(BcType::from_name("no_such_bc"), BcType::InvalidBcType);
    }

    #[test]
    fn historical_spellings_resolve() {
        assert_eq!(BcType::from_name("neumann"), BcType::NeumannBoundary);
        assert_eq!(
            BcType::from_name("insulatorinterface"),
            BcType::IfInsulatorSemiconductor
        );
        assert_eq!(
            BcType::from_name("resistanceohmiccontact"),
            BcType::IfMetalOhmic
        );
        assert_eq!(BcType::from_name("heterojunction"), BcType::HeteroInterface);
    }

    #[test]
    fn resistive_metal_mode_switches_metal_pairings() {
        assert_eq!(
            classify_interface("si", "al", true).unwrap(),
            BcType::IfMetalSemiconductor
        );
        assert_eq!(
            classify_interface("si", "al", false).unwrap(),
            BcType::IfElectrodeSemiconductor
        );
        assert_eq!(
            classify_interface("al", "cu", true).unwrap(),
            BcType::IfMetalMetal
        );
        assert_eq!(
            classify_interface("al", "cu", false).unwrap(),
            BcType::IfElectrodeElectrode
        );
    }

    #[test]
    fn semiconductor_pairings() {
        assert_eq!(
            classify_interface("si", "si", true).unwrap(),
            BcType::HomoInterface
        );
        assert_eq!(
            classify_interface("si", "polysi", true).unwrap(),
            BcType::HeteroInterface
        );
        assert_eq!(
            classify_interface("sio2", "si", true).unwrap(),
            BcType::IfInsulatorSemiconductor
        );
    }

    #[test]
    fn unknown_pairs_are_fatal_with_both_names() {
        let err = classify_interface("si", "nosuchmat", true).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("si") && msg.contains("nosuchmat"));
    }
}
