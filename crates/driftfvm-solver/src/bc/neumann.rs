// crates/driftfvm-solver/src/bc/neumann.rs

//! Natural boundaries: Neumann (no flux), absorbing/source stubs and the
//! vacuum/PML-facing interface kinds. No rows are cleared; the only
//! contribution is the surface heat exchange on the lattice-temperature
//! row when one is present.

use anyhow::Result;

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, System, Var};

use crate::proto::{ensure_mat_add, ensure_vec_add};

/// Residual hook: `h·(T_ext - T)·A` on every temperature row.
pub fn function(
    sys: &mut System,
    bc: usize,
    comm: &dyn Communicator,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_vec_add(f, mode);
    let h = sys.boundaries[bc].params.heat_transfer;
    let t_ext = sys.boundaries[bc].params.ext_temp;
    if h == 0.0 {
        *mode = AssemblyMode::Add;
        return Ok(());
    }
    let rank = comm.rank();

    let mut iy = Vec::new();
    let mut y = Vec::new();
    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            if let Some(ti) = sys.var_index(region, Var::TLattice) {
                let base = sys.offset(region, fvm);
                let area = sys.graphs[region].nodes[fvm].boundary_area;
                iy.push(base + ti);
                y.push(h * (t_ext - x[base + ti]) * area);
            }
        }
    }
    if !iy.is_empty() {
        f.set_values(&iy, &y, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Jacobian hook.
pub fn jacobian(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_mat_add(jac, mode);
    let h = sys.boundaries[bc].params.heat_transfer;
    if h == 0.0 {
        *mode = AssemblyMode::Add;
        return Ok(());
    }
    let rank = comm.rank();

    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            if let Some(ti) = sys.var_index(region, Var::TLattice) {
                let base = sys.offset(region, fvm);
                let area = sys.graphs[region].nodes[fvm].boundary_area;
                jac.set_value(base + ti, base + ti, -h * area, AssemblyMode::Add)?;
            }
        }
    }
    *mode = AssemblyMode::Add;
    Ok(())
}
