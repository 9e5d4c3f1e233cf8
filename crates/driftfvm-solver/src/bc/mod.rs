// crates/driftfvm-solver/src/bc/mod.rs

//! Boundary conditions as row-level rewriters.
//!
//! Each kind implements up to five hooks — `fill_value`, `preprocess`
//! (collect rows to clear and rows to merge), `function`, `jacobian` and
//! `jacobian_reserve` — dispatched here by kind. The global driver flushes,
//! applies the merges, zeroes the cleared rows and only then lets the
//! hooks write their governing equations with `Add`, so assembly order
//! never affects the final row content.

use anyhow::{bail, Context, Result};

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{BcType, CircuitDrive, Communicator, System};

use crate::params::SolveParams;
use crate::proto::ClearLists;

pub mod charge;
pub mod continuity;
pub mod insulator_semi;
pub mod interconnect;
pub mod neumann;
pub mod ohmic;
pub mod schottky;
pub mod simple_gate;
pub mod solderpad;

/// Per-boundary scratch carried between the preprocess and write hooks:
/// terminal-current summands read from the residual before its rows are
/// cleared, and the matching Jacobian row read-backs.
#[derive(Clone, Debug, Default)]
pub struct BcScratch {
    /// Conduction-current contributions of on-processor boundary nodes.
    pub current_buffer: Vec<f64>,
    /// Column sets of the buffered `d(current)/dx` entries.
    pub buffer_cols: Vec<Vec<usize>>,
    /// Buffered `d(current)/dx` values (unscaled, per column set).
    pub buffer_jac: Vec<Vec<f64>>,
}

/// Behavioural family a kind resolves to.
fn family(sys: &System, bc: usize) -> BcFamily {
    let b = &sys.boundaries[bc];
    let circuit = b.ext_circuit.is_some();
    match b.bc_type {
        BcType::OhmicContact | BcType::IfMetalOhmic | BcType::IfElectrodeSemiconductor
            if circuit =>
        {
            BcFamily::Ohmic
        }
        BcType::SchottkyContact | BcType::GateContact | BcType::IfMetalSchottky if circuit => {
            BcFamily::Schottky
        }
        BcType::SimpleGateContact if circuit => BcFamily::SimpleGate,
        BcType::SolderPad if circuit => BcFamily::SolderPad,
        BcType::IfInsulatorSemiconductor => BcFamily::InsulatorSemi,
        BcType::HomoInterface => BcFamily::HomoJunction,
        BcType::HeteroInterface
        | BcType::IfElectrodeInsulator
        | BcType::IfInsulatorInsulator
        | BcType::IfElectrodeElectrode
        | BcType::IfElectrodeMetal
        | BcType::IfInsulatorMetal
        | BcType::IfMetalMetal
        | BcType::IfMetalSemiconductor
        | BcType::OhmicContact
        | BcType::IfMetalOhmic
        | BcType::IfElectrodeSemiconductor
        | BcType::SchottkyContact
        | BcType::GateContact
        | BcType::IfMetalSchottky
        | BcType::SimpleGateContact
        | BcType::SolderPad => BcFamily::Continuity,
        BcType::ChargedContact => BcFamily::ChargedContact,
        BcType::ChargeIntegral => BcFamily::ChargeIntegral,
        BcType::InterConnect => BcFamily::InterConnect,
        BcType::NeumannBoundary
        | BcType::AbsorbingBoundary
        | BcType::SourceBoundary
        | BcType::IfSemiconductorVacuum
        | BcType::IfInsulatorVacuum
        | BcType::IfElectrodeVacuum
        | BcType::IfMetalVacuum
        | BcType::IfPmlPml
        | BcType::IfPmlScatter => BcFamily::Natural,
        BcType::InvalidBcType => BcFamily::Invalid,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BcFamily {
    Ohmic,
    Schottky,
    SimpleGate,
    SolderPad,
    InsulatorSemi,
    HomoJunction,
    Continuity,
    ChargedContact,
    ChargeIntegral,
    InterConnect,
    Natural,
    Invalid,
}

/// Seed the electrode potential and its diagonal scale into the initial
/// guess, for every boundary that owns an extra unknown.
pub fn fill_value(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    x: &mut SysVector,
    l: &mut SysVector,
) -> Result<()> {
    let Some(row) = sys.dofs.bc_offset[bc] else {
        return Ok(());
    };
    let Some(ckt) = sys.boundaries[bc].ext_circuit.as_ref() else {
        return Ok(());
    };
    if comm.is_last_rank() {
        x.set_value(row, ckt.potential, AssemblyMode::Insert)?;
        let scale = if sys.boundaries[bc].is_inter_connect_bc() {
            1.0
        } else if ckt.is_voltage_driven() {
            1.0 / (1.0 + ckt.r)
        } else {
            1.0
        };
        l.set_value(row, scale, AssemblyMode::Insert)?;
    }
    Ok(())
}

/// Residual preprocess: collect clear/merge rows and read the
/// conduction-current summands out of the still-intact residual.
pub fn function_preprocess(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    f: &SysVector,
    lists: &mut ClearLists,
    scratch: &mut BcScratch,
) -> Result<()> {
    match family(sys, bc) {
        BcFamily::Ohmic => ohmic::function_preprocess(sys, bc, comm, f, lists, scratch),
        BcFamily::Schottky => schottky::function_preprocess(sys, bc, comm, lists),
        BcFamily::SolderPad => solderpad::function_preprocess(sys, bc, comm, lists),
        BcFamily::InsulatorSemi => insulator_semi::function_preprocess(sys, bc, comm, lists),
        BcFamily::HomoJunction => {
            continuity::function_preprocess(sys, bc, comm, lists, /*carriers=*/ true)
        }
        BcFamily::Continuity => {
            continuity::function_preprocess(sys, bc, comm, lists, /*carriers=*/ false)
        }
        BcFamily::ChargedContact => charge::function_preprocess(sys, bc, comm, lists),
        BcFamily::SimpleGate
        | BcFamily::ChargeIntegral
        | BcFamily::InterConnect
        | BcFamily::Natural => Ok(()),
        BcFamily::Invalid => bail!("boundary '{}' has invalid type", sys.boundaries[bc].label),
    }
}

/// Residual hook: write the governing equations with `Add`.
pub fn function(
    sys: &mut System,
    bc: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
    scratch: &BcScratch,
) -> Result<()> {
    match family(sys, bc) {
        BcFamily::Ohmic => ohmic::function(sys, bc, comm, params, x, f, mode, scratch),
        BcFamily::Schottky => schottky::function(sys, bc, comm, params, x, f, mode),
        BcFamily::SimpleGate => simple_gate::function(sys, bc, comm, params, x, f, mode),
        BcFamily::SolderPad => solderpad::function(sys, bc, comm, params, x, f, mode),
        BcFamily::InsulatorSemi => insulator_semi::function(sys, bc, comm, params, x, f, mode),
        BcFamily::HomoJunction => continuity::function(sys, bc, comm, x, f, mode, true),
        BcFamily::Continuity => continuity::function(sys, bc, comm, x, f, mode, false),
        BcFamily::ChargedContact => charge::charged_function(sys, bc, comm, params, x, f, mode),
        BcFamily::ChargeIntegral => charge::integral_function(sys, bc, comm, x, f, mode),
        BcFamily::InterConnect => interconnect::function(sys, bc, comm, x, f, mode),
        BcFamily::Natural => neumann::function(sys, bc, comm, x, f, mode),
        BcFamily::Invalid => bail!("boundary '{}' has invalid type", sys.boundaries[bc].label),
    }
}

/// Jacobian preprocess: buffer `d(current)/dx` row read-backs, then
/// collect the same clear/merge lists as the residual side.
pub fn jacobian_preprocess(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    jac: &SysMatrix,
    lists: &mut ClearLists,
    scratch: &mut BcScratch,
) -> Result<()> {
    match family(sys, bc) {
        BcFamily::Ohmic => ohmic::jacobian_preprocess(sys, bc, comm, params, jac, lists, scratch),
        BcFamily::Schottky => schottky::function_preprocess(sys, bc, comm, lists),
        BcFamily::SolderPad => solderpad::function_preprocess(sys, bc, comm, lists),
        BcFamily::InsulatorSemi => insulator_semi::function_preprocess(sys, bc, comm, lists),
        BcFamily::HomoJunction => continuity::function_preprocess(sys, bc, comm, lists, true),
        BcFamily::Continuity => continuity::function_preprocess(sys, bc, comm, lists, false),
        BcFamily::ChargedContact => charge::function_preprocess(sys, bc, comm, lists),
        BcFamily::SimpleGate
        | BcFamily::ChargeIntegral
        | BcFamily::InterConnect
        | BcFamily::Natural => Ok(()),
        BcFamily::Invalid => bail!("boundary '{}' has invalid type", sys.boundaries[bc].label),
    }
}

/// Jacobian hook.
#[allow(clippy::too_many_arguments)]
pub fn jacobian(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &[f64],
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
    scratch: &BcScratch,
) -> Result<()> {
    match family(sys, bc) {
        BcFamily::Ohmic => ohmic::jacobian(sys, bc, comm, params, x, jac, mode, scratch),
        BcFamily::Schottky => schottky::jacobian(sys, bc, comm, params, x, jac, mode),
        BcFamily::SimpleGate => simple_gate::jacobian(sys, bc, comm, params, x, jac, mode),
        BcFamily::SolderPad => solderpad::jacobian(sys, bc, comm, params, x, jac, mode),
        BcFamily::InsulatorSemi => insulator_semi::jacobian(sys, bc, comm, params, x, jac, mode),
        BcFamily::HomoJunction => continuity::jacobian(sys, bc, comm, jac, mode, true),
        BcFamily::Continuity => continuity::jacobian(sys, bc, comm, jac, mode, false),
        BcFamily::ChargedContact => charge::charged_jacobian(sys, bc, comm, params, x, jac, mode),
        BcFamily::ChargeIntegral => charge::integral_jacobian(sys, bc, comm, jac, mode),
        BcFamily::InterConnect => interconnect::jacobian(sys, bc, comm, jac, mode),
        BcFamily::Natural => neumann::jacobian(sys, bc, comm, jac, mode),
        BcFamily::Invalid => bail!("boundary '{}' has invalid type", sys.boundaries[bc].label),
    }
}

/// Pre-touch the off-pattern Jacobian entries a kind will need, so later
/// `Add` writes never relocate nonzeros.
pub fn jacobian_reserve(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
) -> Result<()> {
    crate::proto::ensure_mat_add(jac, mode);
    let b = &sys.boundaries[bc];
    let Some(bc_row) = sys.dofs.bc_offset[bc] else {
        return Ok(());
    };
    let rank = comm.rank();

    // Column of the electrode unknown in every boundary-node ψ row, and
    // the reserve list for the electrode-current row.
    let mut reserve: Vec<usize> = Vec::new();
    for bd in &b.nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            let base = sys.offset(region, fvm);
            jac.set_value(base, bc_row, 0.0, AssemblyMode::Add)?;
            let stride = sys.dofs.stride[region];
            for v in 0..stride {
                reserve.push(base + v);
            }
            for &(nb, _, _) in &sys.graphs[region].nodes[fvm].neighbors {
                let nb_base = sys.offset(region, nb);
                for v in 0..stride {
                    reserve.push(nb_base + v);
                }
            }
        }
    }
    let reserve = comm.allgather_indices(reserve);
    if comm.is_last_rank() {
        jac.set_value(bc_row, bc_row, 0.0, AssemblyMode::Add)?;
        if let Some(hub) = b.hub {
            let hub_row = sys.dofs.bc_offset[hub]
                .context("interconnect hub has no global offset")?;
            jac.set_value(bc_row, hub_row, 0.0, AssemblyMode::Add)?;
            jac.set_value(hub_row, bc_row, 0.0, AssemblyMode::Add)?;
        }
        let zeros = vec![0.0; reserve.len()];
        jac.set_values(bc_row, &reserve, &zeros, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Write the electrode-row residual shared by every contact family:
/// the locally-integrated terminal current scaled by the MNA factor, the
/// hub coupling, and (on the last rank) the source-side equation.
pub(crate) fn electrode_row_residual(
    sys: &mut System,
    bc: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &[f64],
    f: &mut SysVector,
    local_current: f64,
) -> Result<()> {
    let row = sys.dofs.bc_offset[bc]
        .with_context(|| format!("electrode '{}' has no global offset", sys.boundaries[bc].label))?;
    if sys.boundaries[bc].ext_circuit.is_none() {
        bail!("electrode '{}' has no circuit", sys.boundaries[bc].label);
    }
    let hub = sys.boundaries[bc].hub;
    let ve = x[row];

    {
        let ckt = sys.boundaries[bc]
            .ext_circuit
            .as_mut()
            .context("electrode circuit vanished")?;
        ckt.potential_itering = ve;
        ckt.current_itering = comm.sum_scalar(local_current);
        f.set_value(row, ckt.mna_scaling(params.dt) * local_current, AssemblyMode::Add)?;
    }

    if let Some(hub) = hub {
        let hub_row = sys.dofs.bc_offset[hub].context("interconnect hub has no global offset")?;
        let hub_scale = hub_coupling_scale(sys, hub);
        f.set_value(hub_row, hub_scale * local_current, AssemblyMode::Add)?;
        if comm.is_last_rank() {
            f.set_value(row, ve - x[hub_row], AssemblyMode::Add)?;
        }
    } else if comm.is_last_rank() {
        let ckt = sys.boundaries[bc]
            .ext_circuit
            .as_ref()
            .context("electrode circuit vanished")?;
        f.set_value(row, ckt.mna_function(params.dt), AssemblyMode::Add)?;
    }
    Ok(())
}

/// Scale on attached-electrode currents in the hub's own row: plain sum
/// for a floating hub, series-resistance coupling for a driven one.
pub(crate) fn hub_coupling_scale(sys: &System, hub: usize) -> f64 {
    sys.boundaries[hub].ext_circuit.as_ref().map_or(1.0, |c| {
        if c.drive == CircuitDrive::Float {
            1.0
        } else {
            c.r
        }
    })
}

/// Electrode-row Jacobian tail shared by the contact families: the
/// last-rank circuit-equation entries.
pub(crate) fn electrode_row_jacobian_tail(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    jac: &mut SysMatrix,
) -> Result<()> {
    if !comm.is_last_rank() {
        return Ok(());
    }
    let row = sys.dofs.bc_offset[bc].context("electrode has no global offset")?;
    if let Some(hub) = sys.boundaries[bc].hub {
        let hub_row = sys.dofs.bc_offset[hub].context("interconnect hub has no global offset")?;
        jac.set_value(row, row, 1.0, AssemblyMode::Add)?;
        jac.set_value(row, hub_row, -1.0, AssemblyMode::Add)?;
    } else {
        let ckt = sys.boundaries[bc]
            .ext_circuit
            .as_ref()
            .context("electrode circuit vanished")?;
        jac.set_value(row, row, ckt.mna_jacobian(params.dt), AssemblyMode::Add)?;
    }
    Ok(())
}
