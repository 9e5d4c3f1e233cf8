// crates/driftfvm-solver/tests/hanging_node.rs

//! Hanging-node reconstruction keeps a linear potential field an exact
//! discrete solution: the redistributed flux cancels the non-conforming
//! imbalance and the interpolation pinning is satisfied identically.

use nalgebra::Point3;

use driftfvm_algebra::SysVector;
use driftfvm_device::{ModelLevel, SerialComm, System};
use driftfvm_material::by_name;
use driftfvm_mesh::{ElemShape, HangingKind, MeshBuilder};
use driftfvm_solver::bc::BcScratch;
use driftfvm_solver::{assemble_function, SolveParams};

/// One coarse unit quad next to a 2x2 patch of half-size quads; the fine
/// patch's mid-side vertex hangs on the coarse element's shared side.
fn nonconforming_patch() -> (System, usize) {
    let mut b = MeshBuilder::new();
    let p = |x: f64, y: f64| Point3::new(x, y, 0.0);

    let c00 = b.add_point(p(0.0, 0.0));
    let c10 = b.add_point(p(1.0, 0.0));
    let c11 = b.add_point(p(1.0, 1.0));
    let c01 = b.add_point(p(0.0, 1.0));
    let coarse = b.add_elem(ElemShape::Quad4, &[c00, c10, c11, c01], 0);

    // Fine grid nodes at x in {1, 1.5, 2}, y in {0, 0.5, 1}.
    let mut fine = [[0usize; 3]; 3];
    for (j, row) in fine.iter_mut().enumerate() {
        for (i, node) in row.iter_mut().enumerate() {
            let x = 1.0 + 0.5 * i as f64;
            let y = 0.5 * j as f64;
            *node = if (x - 1.0).abs() < 1.0e-12 && y.abs() < 1.0e-12 {
                c10
            } else if (x - 1.0).abs() < 1.0e-12 && (y - 1.0).abs() < 1.0e-12 {
                c11
            } else {
                b.add_point(p(x, y))
            };
        }
    }
    for j in 0..2 {
        for i in 0..2 {
            b.add_elem(
                ElemShape::Quad4,
                &[fine[j][i], fine[j][i + 1], fine[j + 1][i + 1], fine[j + 1][i]],
                0,
            );
        }
    }

    // fine[1][0] sits at (1, 0.5): the midpoint of the coarse side (c10, c11).
    let hanging = fine[1][0];
    b.add_hanging(hanging, coarse, 1, HangingKind::OnSide);

    let mesh = b.build().unwrap();
    let mut sys = System::new(mesh, &[by_name("sio2").unwrap()], ModelLevel::Poisson).unwrap();
    sys.finalize();
    (sys, hanging)
}

#[test]
fn linear_field_reconstructs_to_zero_residual() {
    let (mut sys, hanging) = nonconforming_patch();
    let comm = SerialComm;
    let params = SolveParams::default();

    // psi = x/2: satisfies Laplace exactly.
    let x: Vec<f64> = sys.graphs[0]
        .nodes
        .iter()
        .map(|n| sys.mesh.points[n.node].x / 2.0)
        .collect();

    let mut f = SysVector::new(sys.n_dofs());
    let mut scratch: Vec<BcScratch> = Vec::new();
    assemble_function(&mut sys, &comm, &params, &x, &mut f, &mut scratch).unwrap();

    // Every row away from the Dirichlet-carrying extremes must vanish,
    // including the pinned hanging row and the side vertices that receive
    // its redistributed flux.
    for (i, node) in sys.graphs[0].nodes.iter().enumerate() {
        let px = sys.mesh.points[node.node].x;
        if px < 1.0e-12 || px > 2.0 - 1.0e-12 {
            continue;
        }
        let r = f.get(sys.offset(0, i));
        assert!(
            r.abs() < 1.0e-24,
            "node {i} at x={px}: residual {r:e} after reconstruction"
        );
    }

    // The hanging row itself holds the interpolation constraint.
    let fvm = sys.graphs[0].fvm_index(hanging).unwrap();
    assert!(f.get(sys.offset(0, fvm)).abs() < 1.0e-24);
}

#[test]
fn without_reconstruction_the_patch_leaks_flux() {
    // Identical geometry but no hanging record: the non-conforming side
    // vertices see a genuine imbalance, which is exactly what the
    // redistribution repairs.
    let (mut sys, _) = nonconforming_patch();
    sys.graphs[0].hanging.clear();
    let comm = SerialComm;
    let params = SolveParams::default();

    let x: Vec<f64> = sys.graphs[0]
        .nodes
        .iter()
        .map(|n| sys.mesh.points[n.node].x / 2.0)
        .collect();

    let mut f = SysVector::new(sys.n_dofs());
    let mut scratch: Vec<BcScratch> = Vec::new();
    assemble_function(&mut sys, &comm, &params, &x, &mut f, &mut scratch).unwrap();

    let leak: f64 = sys.graphs[0]
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| {
            let px = sys.mesh.points[n.node].x;
            px > 1.0e-12 && px < 2.0 - 1.0e-12
        })
        .map(|(i, _)| f.get(sys.offset(0, i)).abs())
        .fold(0.0, f64::max);
    assert!(leak > 1.0e-16, "expected a conservation defect, got {leak:e}");
}

/// A hanging node at the centre of a quadrilateral face of a single hex:
/// the interpolation pair is picked along the flatter diagonal and the
/// pinning holds exactly for a linear field.
#[test]
fn hex_side_hanging_node_pins_along_the_flat_diagonal() {
    let mut b = MeshBuilder::new();
    let pts = [
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (1.0, 1.0, 0.0),
        (0.0, 1.0, 0.0),
        (0.0, 0.0, 1.0),
        (1.0, 0.0, 1.0),
        (1.0, 1.0, 1.0),
        (0.0, 1.0, 1.0),
    ];
    let nodes: Vec<usize> = pts
        .iter()
        .map(|&(x, y, z)| b.add_point(Point3::new(x, y, z)))
        .collect();
    let hex = b.add_elem(ElemShape::Hex8, &nodes, 0);
    // Side 3 of a hex is the x = 1 face {1, 2, 6, 5}; its centre:
    let h = b.add_point(Point3::new(1.0, 0.5, 0.5));
    b.add_hanging(h, hex, 3, HangingKind::OnSide);

    let mesh = b.build().unwrap();
    let mut sys = System::new(mesh, &[by_name("sio2").unwrap()], ModelLevel::Poisson).unwrap();
    sys.finalize();
    let comm = SerialComm;
    let params = SolveParams::default();

    // psi linear in y: the face diagonals differ in |Δψ|, so the pair
    // selection matters; either way the centre is the diagonal midpoint.
    let x: Vec<f64> = sys.graphs[0]
        .nodes
        .iter()
        .map(|n| {
            let p = sys.mesh.points[n.node];
            0.3 * p.y + 0.1 * p.z
        })
        .collect();

    let mut f = SysVector::new(sys.n_dofs());
    let mut scratch: Vec<BcScratch> = Vec::new();
    assemble_function(&mut sys, &comm, &params, &x, &mut f, &mut scratch).unwrap();

    let fvm = sys.graphs[0].fvm_index(h).unwrap();
    let r = f.get(sys.offset(0, fvm));
    assert!(r.abs() < 1.0e-15, "pinned hanging row residual {r:e}");
}
