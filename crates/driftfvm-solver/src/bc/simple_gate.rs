// crates/driftfvm-solver/src/bc/simple_gate.rs

//! Simple gate: a lumped-oxide gate stack on a semiconductor surface. No
//! rows are cleared; the surface Poisson rows receive the oxide
//! capacitance `ε_ox/t_ox · (V_e - W - ψ_s)` plus the fixed sheet charge,
//! and the electrode current is the oxide displacement current.

use anyhow::{Context, Result};

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, RegionKind, System};
use driftfvm_math::units::{EPS0, Q};

use crate::params::SolveParams;
use crate::proto::{ensure_mat_add, ensure_vec_add};

use super::ohmic::current_scale;
use super::{electrode_row_jacobian_tail, electrode_row_residual};

fn oxide_capacitance(sys: &System, bc: usize) -> f64 {
    let p = &sys.boundaries[bc].params;
    EPS0 * p.eps / p.thickness
}

/// Residual hook.
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

    let row = sys.dofs.bc_offset[bc].context("simple gate has no electrode row")?;
    let ve = x[row];
    let w = sys.boundaries[bc].params.workfunction;
    let qf = sys.boundaries[bc].params.qf;
    let cox = oxide_capacitance(sys, bc);
    let rank = comm.rank();
    let scale = current_scale(sys);

    let mut current = 0.0;
    let mut iy = Vec::new();
    let mut y = Vec::new();

    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            if sys.regions[region].kind != RegionKind::Semiconductor {
                continue;
            }
            let base = sys.offset(region, fvm);
            let area = sys.graphs[region].nodes[fvm].boundary_area;
            iy.push(base);
            y.push(cox * (ve - w - x[base]) * area + Q * qf * area);

            if params.time_dependent {
                let d = &sys.node_data[region][fvm];
                let ckt = sys.boundaries[bc]
                    .ext_circuit
                    .as_ref()
                    .context("simple gate has no circuit")?;
                // Oxide displacement current: C_ox·A·d(ψ_s - V_e)/dt.
                let dv_dt = params.ddt(
                    x[base] - ve,
                    d.psi - ckt.potential,
                    d.psi_last - ckt.potential,
                );
                current -= cox * area * dv_dt;
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

    let bc_row = sys.dofs.bc_offset[bc].context("simple gate has no electrode row")?;
    let cox = oxide_capacitance(sys, bc);
    let rank = comm.rank();
    let scale = current_scale(sys);
    let mna_scale = sys.boundaries[bc]
        .ext_circuit
        .as_ref()
        .context("simple gate has no circuit")?
        .mna_scaling(params.dt);

    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            if sys.regions[region].kind != RegionKind::Semiconductor {
                continue;
            }
            let base = sys.offset(region, fvm);
            let area = sys.graphs[region].nodes[fvm].boundary_area;
            jac.set_value(base, base, -cox * area, AssemblyMode::Add)?;
            jac.set_value(base, bc_row, cox * area, AssemblyMode::Add)?;

            if params.time_dependent {
                let g = cox * area * params.ddt_factor() * scale * mna_scale;
                jac.set_value(bc_row, base, -g, AssemblyMode::Add)?;
                jac.set_value(bc_row, bc_row, g, AssemblyMode::Add)?;
            }
        }
    }

    electrode_row_jacobian_tail(sys, bc, comm, params, jac)?;
    *mode = AssemblyMode::Add;
    Ok(())
}
