// crates/driftfvm-solver/src/bc/solderpad.rs

//! Solder pad on a resistive-metal region: every pad vertex is pinned to
//! the electrode potential shifted by the metal workfunction, and the
//! terminal current is the conduction current `σ·A·(ψ-ψ_nb)/L` integrated
//! over the metal-side neighbours.

use anyhow::{bail, Context, Result};

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, ModelLevel, RegionKind, System, Var};

use crate::params::SolveParams;
use crate::proto::{ensure_mat_add, ensure_vec_add, ClearLists};

use super::ohmic::current_scale;
use super::{electrode_row_jacobian_tail, electrode_row_residual, hub_coupling_scale};

/// The resistive-metal region this pad sits on.
fn pad_metal_region(sys: &System, bc: usize) -> Result<usize> {
    let b = &sys.boundaries[bc];
    for region in [b.regions.0, b.regions.1].into_iter().flatten() {
        if sys.regions[region].kind == RegionKind::Metal {
            return Ok(region);
        }
    }
    bail!("solder pad '{}' is not attached to a resistive-metal region", b.label)
}

/// Clear every co-located ψ row (and slave heat rows at level 2 onto the
/// metal-side row).
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

/// Residual hook: metal side `ψ + χ - V_e = 0`, insulator side
/// `ψ + W - V_e = 0`; terminal current from the metal conduction flux.
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

    let row = sys.dofs.bc_offset[bc].context("solder pad has no electrode row")?;
    let ve = x[row];
    let metal_region = pad_metal_region(sys, bc)?;
    let metal = sys.regions[metal_region].material;
    let sigma = metal.conductance;
    let workfunction = metal.affinity;
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
            let base = sys.offset(region, fvm);
            match sys.regions[region].kind {
                RegionKind::Metal => {
                    let d = &sys.node_data[region][fvm];
                    iy.push(base);
                    y.push(x[base] + d.affinity - ve);

                    // Conduction current into the pad from the metal bulk.
                    for &(nb, len, area) in &sys.graphs[region].nodes[fvm].neighbors {
                        let nb_base = sys.offset(region, nb);
                        current += area * sigma * (x[base] - x[nb_base]) / len;
                    }
                }
                RegionKind::Insulator => {
                    iy.push(base);
                    y.push(x[base] + workfunction - ve);
                }
                RegionKind::Vacuum | RegionKind::Pml => {}
                other => bail!(
                    "solder pad '{}' touches unsupported region kind {other:?}",
                    sys.boundaries[bc].label
                ),
            }
            if heat {
                if let Some(ti) = sys.var_index(region, Var::TLattice) {
                    let h = sys.boundaries[bc].params.heat_transfer;
                    let area = sys.graphs[region].nodes[fvm].boundary_area;
                    iy.push(base + ti);
                    y.push(h * (t_ext - x[base + ti]) * area);
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

    let bc_row = sys.dofs.bc_offset[bc].context("solder pad has no electrode row")?;
    let b = &sys.boundaries[bc];
    let metal_region = pad_metal_region(sys, bc)?;
    let sigma = sys.regions[metal_region].material.conductance;
    let rank = comm.rank();
    let scale = current_scale(sys);
    let heat = sys.level == ModelLevel::Ddm2;
    let mna_scale = b
        .ext_circuit
        .as_ref()
        .context("solder pad has no circuit")?
        .mna_scaling(params.dt);
    let hub_row = match b.hub {
        Some(h) => Some((
            sys.dofs.bc_offset[h].context("interconnect hub has no global offset")?,
            hub_coupling_scale(sys, h),
        )),
        None => None,
    };

    for bd in &b.nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            if matches!(sys.regions[region].kind, RegionKind::Vacuum | RegionKind::Pml) {
                continue;
            }
            let base = sys.offset(region, fvm);
            // Governing equation ψ + χ - V_e.
            jac.set_value(base, base, 1.0, AssemblyMode::Add)?;
            jac.set_value(base, bc_row, -1.0, AssemblyMode::Add)?;

            if sys.regions[region].kind == RegionKind::Metal {
                for &(nb, len, area) in &sys.graphs[region].nodes[fvm].neighbors {
                    let nb_base = sys.offset(region, nb);
                    let g = area * sigma / len * scale;
                    jac.set_value(bc_row, base, g * mna_scale, AssemblyMode::Add)?;
                    jac.set_value(bc_row, nb_base, -g * mna_scale, AssemblyMode::Add)?;
                    if let Some((hrow, hscale)) = hub_row {
                        jac.set_value(hrow, base, g * hscale, AssemblyMode::Add)?;
                        jac.set_value(hrow, nb_base, -g * hscale, AssemblyMode::Add)?;
                    }
                }
            }
            if heat {
                if let Some(ti) = sys.var_index(region, Var::TLattice) {
                    let h = b.params.heat_transfer;
                    let area = sys.graphs[region].nodes[fvm].boundary_area;
                    jac.set_value(base + ti, base + ti, -h * area, AssemblyMode::Add)?;
                }
            }
        }
    }

    electrode_row_jacobian_tail(sys, bc, comm, params, jac)?;
    *mode = AssemblyMode::Add;
    Ok(())
}
