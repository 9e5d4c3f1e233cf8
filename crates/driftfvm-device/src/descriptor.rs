// crates/driftfvm-device/src/descriptor.rs

//! One-line boundary descriptors.
//!
//! Every boundary emits `BOUNDARY string<id>=NAME enum<type>=KIND
//! [real<key>=value ...]` and the parser accepts exactly the documented
//! key set. Internal storage is the scaled unit system; display units are
//! the descriptor tokens (V, A, C, K, J/(s·cm²·K), μm, cm⁻²).

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::bc::BcType;
use crate::system::System;
use driftfvm_math::units::{HEAT_TRANSFER_UNIT, UM};

/// Keys a descriptor line may carry.
pub const RECOGNIZED_KEYS: &[&str] = &[
    "id",
    "type",
    "res",
    "cap",
    "ind",
    "potential",
    "workfunction",
    "ext.temp",
    "heat.transfer",
    "reflection",
    "z.width",
    "elec.recomb.velocity",
    "hole.recomb.velocity",
    "thickness",
    "eps",
    "qf",
    "electrode_id",
    "connectto",
    "charge",
    "chargeboundary",
    "float",
];

/// Parsed descriptor contents.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedBc {
    /// Boundary label.
    pub id: String,
    /// Resolved kind.
    pub bc_type: Option<BcType>,
    /// `real<...>` values in display units.
    pub reals: BTreeMap<String, f64>,
    /// `bool<...>` values.
    pub bools: BTreeMap<String, bool>,
    /// Repeatable `string<...>` values (`connectto`, `chargeboundary`,
    /// `electrode_id`).
    pub strings: Vec<(String, String)>,
}

/// Emit the one-line descriptor of boundary `bc` of `sys`.
#[must_use]
pub fn emit(sys: &System, bc: usize) -> String {
    let b = &sys.boundaries[bc];
    let p = &b.params;
    let two_d = sys.mesh.dim == 2;

    let mut line = String::from("BOUNDARY ");
    let _ = write!(line, "string<id>={} ", b.label);
    let _ = write!(line, "enum<type>={} ", b.bc_type.name());

    let mut real = |line: &mut String, key: &str, value: f64| {
        let _ = write!(line, "real<{key}>={value:.6e} ");
    };

    if let Some(ckt) = &b.ext_circuit {
        real(&mut line, "res", ckt.r);
        real(&mut line, "cap", ckt.c);
        real(&mut line, "ind", ckt.l);
        real(&mut line, "potential", ckt.potential);
    }

    match b.bc_type {
        BcType::NeumannBoundary => {
            real(&mut line, "ext.temp", p.ext_temp);
            real(&mut line, "heat.transfer", p.heat_transfer / HEAT_TRANSFER_UNIT);
            let _ = write!(line, "bool<reflection>={} ", p.reflection);
        }
        BcType::OhmicContact | BcType::SolderPad => {
            real(&mut line, "ext.temp", p.ext_temp);
            real(&mut line, "heat.transfer", p.heat_transfer / HEAT_TRANSFER_UNIT);
        }
        BcType::SchottkyContact | BcType::GateContact => {
            real(&mut line, "workfunction", p.workfunction);
            real(&mut line, "ext.temp", p.ext_temp);
            real(&mut line, "heat.transfer", p.heat_transfer / HEAT_TRANSFER_UNIT);
        }
        BcType::SimpleGateContact => {
            real(&mut line, "workfunction", p.workfunction);
            real(&mut line, "thickness", p.thickness / UM);
            real(&mut line, "eps", p.eps);
            real(&mut line, "qf", p.qf);
            real(&mut line, "ext.temp", p.ext_temp);
            real(&mut line, "heat.transfer", p.heat_transfer / HEAT_TRANSFER_UNIT);
        }
        BcType::IfMetalOhmic => {
            if p.elec_recomb_velocity.is_finite() {
                real(&mut line, "elec.recomb.velocity", p.elec_recomb_velocity);
                real(&mut line, "hole.recomb.velocity", p.hole_recomb_velocity);
            }
        }
        BcType::IfInsulatorSemiconductor | BcType::HeteroInterface => {
            real(&mut line, "qf", p.qf);
        }
        BcType::InterConnect => {
            let floating = b
                .ext_circuit
                .as_ref()
                .is_some_and(|c| c.drive == crate::circuit::CircuitDrive::Float);
            let _ = write!(line, "bool<float>={floating} ");
            for &other in &b.inter_connect {
                let _ = write!(line, "string<connectto>={} ", sys.boundaries[other].label);
            }
        }
        BcType::ChargeIntegral => {
            real(&mut line, "charge", p.qf);
            for &other in &b.inter_connect {
                let _ = write!(line, "string<chargeboundary>={} ", sys.boundaries[other].label);
            }
        }
        _ => {}
    }

    if two_d {
        real(&mut line, "z.width", sys.z_width / UM);
    }

    line.trim_end().to_owned()
}

/// Parse one descriptor line.
///
/// # Errors
/// Fails on a missing `BOUNDARY` head token, a malformed `kind<key>=value`
/// token, or an unrecognised key.
pub fn parse(line: &str) -> Result<ParsedBc> {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("BOUNDARY") => {}
        other => bail!("descriptor must start with BOUNDARY, found {other:?}"),
    }

    let mut out = ParsedBc::default();
    for token in tokens {
        let (head, value) = token
            .split_once('=')
            .with_context(|| format!("malformed token '{token}'"))?;
        let (kind, key) = head
            .strip_suffix('>')
            .and_then(|h| h.split_once('<'))
            .with_context(|| format!("malformed key '{head}'"))?;
        if !RECOGNIZED_KEYS.contains(&key) {
            bail!("unrecognised descriptor key '{key}'");
        }
        match kind {
            "string" if key == "id" => out.id = value.to_owned(),
            "string" => out.strings.push((key.to_owned(), value.to_owned())),
            "enum" if key == "type" => {
                let bc = BcType::from_name(value);
                if bc == BcType::InvalidBcType {
                    bail!("unknown boundary type '{value}'");
                }
                out.bc_type = Some(bc);
            }
            "real" => {
                let v: f64 = value
                    .parse()
                    .with_context(|| format!("bad real value '{value}' for key '{key}'"))?;
                out.reals.insert(key.to_owned(), v);
            }
            "bool" => {
                let v: bool = value
                    .parse()
                    .with_context(|| format!("bad bool value '{value}' for key '{key}'"))?;
                out.bools.insert(key.to_owned(), v);
            }
            other => bail!("unrecognised token kind '{other}'"),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_unknown_keys_and_types() {
        assert!(parse("BOUNDARY string<id>=a enum<type>=NoSuch").is_err());
        assert!(parse("BOUNDARY string<id>=a real<bogus>=1.0").is_err());
        assert!(parse("CONTACT string<id>=a").is_err());
    }

    #[test]
    fn parse_reads_typed_values() {
        let p = parse(
            "BOUNDARY string<id>=anode enum<type>=OhmicContact real<res>=1.000000e3 \
             bool<reflection>=true string<connectto>=cathode",
        )
        .unwrap();
        assert_eq!(p.id, "anode");
        assert_eq!(p.bc_type, Some(BcType::OhmicContact));
        assert_eq!(p.reals["res"], 1.0e3);
        assert!(p.bools["reflection"]);
        assert_eq!(p.strings, vec![("connectto".to_owned(), "cathode".to_owned())]);
    }
}
