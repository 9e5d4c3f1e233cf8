// crates/driftfvm-solver/src/bc/continuity.rs

//! Interface continuity: at every shared vertex the secondary regions'
//! conservation rows are merged onto the primary region's rows, and the
//! secondary rows are rewritten as equality constraints. Homo junctions
//! merge the carrier rows as well; every other pairing couples ψ (and the
//! lattice temperature at level 2) only.

use anyhow::Result;

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, System, Var};

use crate::proto::{ensure_mat_add, ensure_vec_add, ClearLists};

/// The variable pairs `(primary index, secondary index)` coupled across
/// the interface between `r_prim` and `r_sec`.
fn coupled_vars(sys: &System, r_prim: usize, r_sec: usize, carriers: bool) -> Vec<(usize, usize)> {
    let mut vars = vec![(0usize, 0usize)];
    if carriers {
        if let (Some(a), Some(b)) = (
            sys.var_index(r_prim, Var::N),
            sys.var_index(r_sec, Var::N),
        ) {
            vars.push((a, b));
        }
        if let (Some(a), Some(b)) = (
            sys.var_index(r_prim, Var::P),
            sys.var_index(r_sec, Var::P),
        ) {
            vars.push((a, b));
        }
    }
    if let (Some(a), Some(b)) = (
        sys.var_index(r_prim, Var::TLattice),
        sys.var_index(r_sec, Var::TLattice),
    ) {
        vars.push((a, b));
    }
    vars
}

/// Preprocess: merge secondary rows onto the primary rows and queue the
/// secondary rows for clearing.
pub fn function_preprocess(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    lists: &mut ClearLists,
    carriers: bool,
) -> Result<()> {
    let rank = comm.rank();
    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) || bd.rnodes.len() < 2 {
            continue;
        }
        let (rp, fp) = bd.rnodes[0];
        let prim = sys.offset(rp, fp);
        for &(rs, fs) in &bd.rnodes[1..] {
            let sec = sys.offset(rs, fs);
            for (vp, vs) in coupled_vars(sys, rp, rs, carriers) {
                lists.redirect(sec + vs, prim + vp, 1.0);
                lists.clear_row.push(sec + vs);
            }
        }
    }
    Ok(())
}

/// Residual hook: equality constraints in the cleared secondary rows.
pub fn function(
    sys: &mut System,
    bc: usize,
    comm: &dyn Communicator,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
    carriers: bool,
) -> Result<()> {
    ensure_vec_add(f, mode);
    let rank = comm.rank();

    let mut iy = Vec::new();
    let mut y = Vec::new();
    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) || bd.rnodes.len() < 2 {
            continue;
        }
        let (rp, fp) = bd.rnodes[0];
        let prim = sys.offset(rp, fp);
        for &(rs, fs) in &bd.rnodes[1..] {
            let sec = sys.offset(rs, fs);
            for (vp, vs) in coupled_vars(sys, rp, rs, carriers) {
                iy.push(sec + vs);
                y.push(x[sec + vs] - x[prim + vp]);
            }
        }
    }
    if !iy.is_empty() {
        f.set_values(&iy, &y, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Jacobian hook: `+1` on the secondary diagonal, `-1` against the primary
/// unknown.
pub fn jacobian(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
    carriers: bool,
) -> Result<()> {
    ensure_mat_add(jac, mode);
    let rank = comm.rank();

    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) || bd.rnodes.len() < 2 {
            continue;
        }
        let (rp, fp) = bd.rnodes[0];
        let prim = sys.offset(rp, fp);
        for &(rs, fs) in &bd.rnodes[1..] {
            let sec = sys.offset(rs, fs);
            for (vp, vs) in coupled_vars(sys, rp, rs, carriers) {
                jac.set_value(sec + vs, sec + vs, 1.0, AssemblyMode::Add)?;
                jac.set_value(sec + vs, prim + vp, -1.0, AssemblyMode::Add)?;
            }
        }
    }
    *mode = AssemblyMode::Add;
    Ok(())
}
