// crates/driftfvm-solver/src/hanging.rs

//! Hanging-node reconstruction.
//!
//! Each hanging node's accumulated flux rows are redistributed evenly onto
//! the vertices of the side (or edge) it hangs on, restoring discrete
//! conservation over the refined patch; the hanging rows are then rewritten
//! as interpolation constraints — linear for the potential (and lattice
//! temperature), Scharfetter–Gummel-consistent midpoints for the carrier
//! densities.

use anyhow::{Context, Result};

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, System};
use driftfvm_math::units::thermal_voltage;
use driftfvm_math::{nmid, pmid, Dual};
use driftfvm_mesh::HangingKind;

/// Resolve the vertices of the side/edge a hanging node sits on, as FVM
/// indices of the region graph.
fn side_fvm_nodes(sys: &System, region: usize, h: &driftfvm_mesh::HangingNode) -> Result<Vec<usize>> {
    let elem = &sys.mesh.elems[h.elem];
    let locals: Vec<usize> = match h.kind {
        HangingKind::OnSide => elem.shape.side_nodes(h.index).to_vec(),
        HangingKind::OnEdge => elem.shape.edge_nodes(h.index).to_vec(),
    };
    locals
        .iter()
        .map(|&l| {
            let node = elem.nodes[l];
            sys.graphs[region]
                .fvm_index(node)
                .with_context(|| format!("hanging-node side vertex {node} is outside region {region}"))
        })
        .collect()
}

/// Pick the interpolation endpoint pair among the side vertices: the
/// unique pair for a two-vertex side, or the quadrilateral diagonal with
/// the smaller `|ψ|` difference (the better-conditioned one for the S–G
/// reconstruction).
fn interpolation_pair(sys: &System, region: usize, x: &[f64], side: &[usize]) -> (usize, usize) {
    if side.len() == 2 {
        return (side[0], side[1]);
    }
    let psi = |i: usize| x[sys.offset(region, side[i])];
    let dv1 = (psi(0) - psi(2)).abs();
    let dv2 = (psi(1) - psi(3)).abs();
    if dv1 < dv2 {
        (side[0], side[2])
    } else {
        (side[1], side[3])
    }
}

/// Residual-side reconstruction: redistribute, then pin by interpolation.
pub fn hanging_function(
    sys: &System,
    region: usize,
    comm: &dyn Communicator,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
) -> Result<()> {
    let graph = &sys.graphs[region];
    if graph.hanging.is_empty() {
        return Ok(());
    }
    // Row surgery needs an assembled vector.
    if *mode != AssemblyMode::NotSet {
        f.assembly_begin();
        f.assembly_end();
        *mode = AssemblyMode::NotSet;
    }

    let stride = sys.dofs.stride[region];
    let vt = thermal_voltage(sys.t_external);
    let rank = comm.rank();

    let mut src_row = Vec::new();
    let mut dst_row = Vec::new();
    let mut alpha = Vec::new();
    let mut insert_index = Vec::new();
    let mut insert_value = Vec::new();

    for h in &graph.hanging {
        if !sys.mesh.on_processor(h.node, rank) {
            continue;
        }
        let fvm = graph
            .fvm_index(h.node)
            .context("hanging node is outside its region")?;
        let side = side_fvm_nodes(sys, region, h)?;
        let oh = sys.offset(region, fvm);

        // Spill the hanging rows evenly onto the side vertices.
        let w = 1.0 / side.len() as f64;
        for &s in &side {
            let os = sys.offset(region, s);
            for v in 0..stride {
                src_row.push(oh + v);
                dst_row.push(os + v);
                alpha.push(w);
            }
        }

        let (a, b) = interpolation_pair(sys, region, x, &side);
        let (oa, ob) = (sys.offset(region, a), sys.offset(region, b));

        insert_index.push(oh);
        insert_value.push(x[oh] - 0.5 * (x[oa] + x[ob]));
        if stride >= 3 {
            insert_index.push(oh + 1);
            insert_value
                .push(x[oh + 1] - nmid(vt, x[oa], x[ob], x[oa + 1], x[ob + 1]));
            insert_index.push(oh + 2);
            insert_value
                .push(x[oh + 2] - pmid(vt, x[oa], x[ob], x[oa + 2], x[ob + 2]));
        }
        if stride == 4 {
            insert_index.push(oh + 3);
            insert_value.push(x[oh + 3] - 0.5 * (x[oa + 3] + x[ob + 3]));
        }
        if stride == 2 {
            insert_index.push(oh + 1);
            insert_value.push(x[oh + 1] - 0.5 * (x[oa + 1] + x[ob + 1]));
        }
    }

    f.add_row_to_row(&src_row, &dst_row, &alpha)?;
    if !insert_index.is_empty() {
        f.set_values(&insert_index, &insert_value, AssemblyMode::Insert)?;
    }
    *mode = AssemblyMode::Insert;
    Ok(())
}

/// Jacobian-side reconstruction: row-add with the same weights, clear the
/// pinned rows, then write AD-derived interpolation entries over the full
/// endpoint dependency.
pub fn hanging_jacobian(
    sys: &System,
    region: usize,
    comm: &dyn Communicator,
    x: &[f64],
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
) -> Result<()> {
    let graph = &sys.graphs[region];
    if graph.hanging.is_empty() {
        return Ok(());
    }
    if *mode != AssemblyMode::NotSet {
        jac.flush_assembly();
        *mode = AssemblyMode::NotSet;
    }

    let stride = sys.dofs.stride[region];
    let vt = Dual::constant(thermal_voltage(sys.t_external));
    let rank = comm.rank();

    let mut src_row = Vec::new();
    let mut dst_row = Vec::new();
    let mut alpha = Vec::new();
    let mut rows: Vec<usize> = Vec::new();
    let mut cols_of: Vec<Vec<usize>> = Vec::new();
    let mut vals_of: Vec<Vec<f64>> = Vec::new();

    for h in &graph.hanging {
        if !sys.mesh.on_processor(h.node, rank) {
            continue;
        }
        let fvm = graph
            .fvm_index(h.node)
            .context("hanging node is outside its region")?;
        let side = side_fvm_nodes(sys, region, h)?;
        let oh = sys.offset(region, fvm);

        let w = 1.0 / side.len() as f64;
        for &s in &side {
            let os = sys.offset(region, s);
            for v in 0..stride {
                src_row.push(oh + v);
                dst_row.push(os + v);
                alpha.push(w);
            }
        }

        let (a, b) = interpolation_pair(sys, region, x, &side);
        let (oa, ob) = (sys.offset(region, a), sys.offset(region, b));

        let mut cols = Vec::with_capacity(3 * stride);
        for base in [oh, oa, ob] {
            for v in 0..stride {
                cols.push(base + v);
            }
        }
        let ndir = cols.len();
        let seed = |col: usize| {
            let pos = cols
                .iter()
                .position(|&c| c == col)
                .unwrap_or(0);
            Dual::var(x[col], pos)
        };

        let psi_c = seed(oh) - (seed(oa) + seed(ob)) * 0.5;
        rows.push(oh);
        cols_of.push(cols.clone());
        vals_of.push(psi_c.grad(ndir).to_vec());

        if stride >= 3 {
            let ff_n = seed(oh + 1)
                - nmid(vt, seed(oa), seed(ob), seed(oa + 1), seed(ob + 1));
            rows.push(oh + 1);
            cols_of.push(cols.clone());
            vals_of.push(ff_n.grad(ndir).to_vec());

            let ff_p = seed(oh + 2)
                - pmid(vt, seed(oa), seed(ob), seed(oa + 2), seed(ob + 2));
            rows.push(oh + 2);
            cols_of.push(cols.clone());
            vals_of.push(ff_p.grad(ndir).to_vec());
        }
        if stride == 2 || stride == 4 {
            let ti = stride - 1;
            let ff_t = seed(oh + ti) - (seed(oa + ti) + seed(ob + ti)) * 0.5;
            rows.push(oh + ti);
            cols_of.push(cols.clone());
            vals_of.push(ff_t.grad(ndir).to_vec());
        }
    }

    jac.add_row_to_row(&src_row, &dst_row, &alpha)?;
    jac.zero_rows(&rows, 0.0)?;
    for ((row, cols), vals) in rows.iter().zip(&cols_of).zip(&vals_of) {
        jac.set_values(*row, cols, vals, AssemblyMode::Insert)?;
    }
    *mode = AssemblyMode::Insert;
    Ok(())
}
