// crates/driftfvm-solver/src/bc/charge.rs

//! Floating-metal charge boundaries.
//!
//! A `ChargedContact` pins every boundary vertex to a float potential
//! (its own unknown, or the hub's when tied to a `ChargeIntegral`
//! boundary) and integrates the dielectric flux leaving the surface. The
//! charge equation drives that integral to the injected charge.

use anyhow::{Context, Result};

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, System};

use crate::params::SolveParams;
use crate::proto::{ensure_mat_add, ensure_vec_add, ClearLists};

/// Row holding this contact's float potential: its own, or the hub's.
fn float_row(sys: &System, bc: usize) -> Result<usize> {
    let b = &sys.boundaries[bc];
    let owner = b.hub.unwrap_or(bc);
    sys.dofs.bc_offset[owner]
        .with_context(|| format!("charged contact '{}' has no float-potential row", b.label))
}

/// Row of the charge-balance equation for a stand-alone contact.
fn charge_row(sys: &System, bc: usize) -> Result<usize> {
    sys.dofs.bc_offset[bc]
        .with_context(|| format!("charged contact '{}' has no global offset", sys.boundaries[bc].label))
}

/// Preprocess: clear every boundary ψ row.
pub fn function_preprocess(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    lists: &mut ClearLists,
) -> Result<()> {
    let rank = comm.rank();
    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            lists.clear_row.push(sys.offset(region, fvm));
        }
    }
    Ok(())
}

/// Integrated dielectric flux leaving the contact surface (the surface
/// charge by Gauss's law).
fn surface_charge(sys: &System, bc: usize, comm: &dyn Communicator, x: &[f64]) -> f64 {
    let rank = comm.rank();
    let mut total = 0.0;
    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            let base = sys.offset(region, fvm);
            let d = &sys.node_data[region][fvm];
            for &(nb, len, area) in &sys.graphs[region].nodes[fvm].neighbors {
                let nb_base = sys.offset(region, nb);
                total += area * d.eps * (x[base] - x[nb_base]) / len;
            }
        }
    }
    total
}

/// Residual hook for a charged (float-metal) contact.
pub fn charged_function(
    sys: &mut System,
    bc: usize,
    comm: &dyn Communicator,
    _params: &SolveParams,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_vec_add(f, mode);

    let vf_row = float_row(sys, bc)?;
    let vf = x[vf_row];
    let rank = comm.rank();

    let mut iy = Vec::new();
    let mut y = Vec::new();
    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            let base = sys.offset(region, fvm);
            iy.push(base);
            y.push(x[base] - vf);
        }
    }
    if !iy.is_empty() {
        f.set_values(&iy, &y, AssemblyMode::Add)?;
    }

    let charge = comm.sum_scalar(surface_charge(sys, bc, comm, x));
    if sys.boundaries[bc].hub.is_some() {
        // Tied to a charge integral: contribute the surface charge there.
        let hub_row = float_row(sys, bc)?;
        if comm.is_last_rank() {
            f.set_value(hub_row, charge, AssemblyMode::Add)?;
        }
    } else if comm.is_last_rank() {
        let target = sys.boundaries[bc].params.qf;
        f.set_value(charge_row(sys, bc)?, charge - target, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Jacobian hook for a charged contact.
pub fn charged_jacobian(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    _params: &SolveParams,
    x: &[f64],
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_mat_add(jac, mode);
    let _ = x;

    let vf_row = float_row(sys, bc)?;
    let q_row = if sys.boundaries[bc].hub.is_some() {
        vf_row
    } else {
        charge_row(sys, bc)?
    };
    let rank = comm.rank();

    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            let base = sys.offset(region, fvm);
            jac.set_value(base, base, 1.0, AssemblyMode::Add)?;
            jac.set_value(base, vf_row, -1.0, AssemblyMode::Add)?;

            let d = &sys.node_data[region][fvm];
            for &(nb, len, area) in &sys.graphs[region].nodes[fvm].neighbors {
                let nb_base = sys.offset(region, nb);
                let g = area * d.eps / len;
                jac.set_value(q_row, base, g, AssemblyMode::Add)?;
                jac.set_value(q_row, nb_base, -g, AssemblyMode::Add)?;
            }
        }
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Residual hook for a charge-integral hub: its row accumulates the
/// connected contacts' surface charges (added by them) minus the target.
pub fn integral_function(
    sys: &mut System,
    bc: usize,
    comm: &dyn Communicator,
    _x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_vec_add(f, mode);
    if comm.is_last_rank() {
        let row = charge_row(sys, bc)?;
        let target = sys.boundaries[bc].params.qf;
        f.set_value(row, -target, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Jacobian hook for a charge-integral hub: the flux derivatives are
/// written by the connected contacts; nothing couples to the hub unknown
/// directly.
pub fn integral_jacobian(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_mat_add(jac, mode);
    if comm.is_last_rank() {
        // Keep the diagonal present even when no contact is attached yet.
        let row = charge_row(sys, bc)?;
        jac.set_value(row, row, 0.0, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}
