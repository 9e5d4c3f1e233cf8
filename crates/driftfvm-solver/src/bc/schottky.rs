// crates/driftfvm-solver/src/bc/schottky.rs

//! Schottky and gate contacts: Dirichlet on ψ shifted by the metal
//! workfunction, terminal current carried by the displacement term in
//! transient solves. Gate contacts share the implementation; they differ
//! only in which region kinds they sit on.

use anyhow::{Context, Result};

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, ModelLevel, RegionKind, System, Var};

use crate::params::SolveParams;
use crate::proto::{ensure_mat_add, ensure_vec_add, ClearLists};

use super::{electrode_row_jacobian_tail, electrode_row_residual};
use super::ohmic::current_scale;

/// Clear every co-located ψ row; at level 2, heat rows stay with their
/// regions (the contact exchanges heat through the Neumann-style term on
/// the semiconductor side only).
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
            if matches!(sys.regions[region].kind, RegionKind::Vacuum | RegionKind::Pml) {
                continue;
            }
            lists.clear_row.push(sys.offset(region, fvm));
        }
    }
    Ok(())
}

/// Residual hook: `ψ + W - V_e = 0` on every co-located node.
pub fn function(
    sys: &mut System,
    bc: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_vec_add(f, mode);

    let row = sys.dofs.bc_offset[bc].context("schottky/gate contact has no electrode row")?;
    let ve = x[row];
    let w = sys.boundaries[bc].params.workfunction;
    let rank = comm.rank();
    let scale = current_scale(sys);
    let heat = sys.level == ModelLevel::Ddm2;
    let t_ext = sys.t_external;

    let mut current = 0.0;
    let mut iy = Vec::new();
    let mut y = Vec::new();

    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            if matches!(sys.regions[region].kind, RegionKind::Vacuum | RegionKind::Pml) {
                continue;
            }
            let base = sys.offset(region, fvm);
            iy.push(base);
            y.push(x[base] + w - ve);

            if heat {
                let ti = sys
                    .var_index(region, Var::TLattice)
                    .context("level-2 region lost its temperature row")?;
                let h = sys.boundaries[bc].params.heat_transfer;
                let area = sys.graphs[region].nodes[fvm].boundary_area;
                iy.push(base + ti);
                y.push(h * (t_ext - x[base + ti]) * area);
            }

            if params.time_dependent {
                let d = &sys.node_data[region][fvm];
                for &(nb, len, area) in &sys.graphs[region].nodes[fvm].neighbors {
                    let nb_base = sys.offset(region, nb);
                    let dn = &sys.node_data[region][nb];
                    let de_dt = params.ddt(
                        x[base] - x[nb_base],
                        d.psi - dn.psi,
                        d.psi_last - dn.psi_last,
                    ) / len;
                    current += area * d.eps * de_dt;
                }
            }
        }
    }

    if !iy.is_empty() {
        f.set_values(&iy, &y, AssemblyMode::Add)?;
    }
    electrode_row_residual(sys, bc, comm, params, x, f, scale * current)?;
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Jacobian hook.
pub fn jacobian(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    _x: &[f64],
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_mat_add(jac, mode);

    let bc_row = sys.dofs.bc_offset[bc].context("schottky/gate contact has no electrode row")?;
    let rank = comm.rank();
    let scale = current_scale(sys);
    let heat = sys.level == ModelLevel::Ddm2;
    let mna_scale = sys.boundaries[bc]
        .ext_circuit
        .as_ref()
        .context("schottky/gate contact has no circuit")?
        .mna_scaling(params.dt);

    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            if matches!(sys.regions[region].kind, RegionKind::Vacuum | RegionKind::Pml) {
                continue;
            }
            let base = sys.offset(region, fvm);
            jac.set_value(base, base, 1.0, AssemblyMode::Add)?;
            jac.set_value(base, bc_row, -1.0, AssemblyMode::Add)?;

            if heat {
                let ti = sys
                    .var_index(region, Var::TLattice)
                    .context("level-2 region lost its temperature row")?;
                let h = sys.boundaries[bc].params.heat_transfer;
                let area = sys.graphs[region].nodes[fvm].boundary_area;
                jac.set_value(base + ti, base + ti, -h * area, AssemblyMode::Add)?;
            }

            if params.time_dependent {
                let d = &sys.node_data[region][fvm];
                let factor = params.ddt_factor();
                for &(nb, len, area) in &sys.graphs[region].nodes[fvm].neighbors {
                    let nb_base = sys.offset(region, nb);
                    let g = area * d.eps * factor / len * scale * mna_scale;
                    jac.set_value(bc_row, base, g, AssemblyMode::Add)?;
                    jac.set_value(bc_row, nb_base, -g, AssemblyMode::Add)?;
                }
            }
        }
    }

    electrode_row_jacobian_tail(sys, bc, comm, params, jac)?;
    *mode = AssemblyMode::Add;
    Ok(())
}
