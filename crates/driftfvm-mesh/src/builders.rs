// crates/driftfvm-mesh/src/builders.rs

//! Structured mesh builders for canonical device geometries. Region tags
//! are assigned per element from its centroid, so layered device stacks
//! (diode, MOS capacitor, pad-on-block) fall out of a closure.

use anyhow::Result;
use nalgebra::Point3;

use crate::elem::ElemShape;
use crate::mesh::{Mesh, MeshBuilder};

/// Uniform 1D line mesh of `n` nodes spanning `[0, length]` [cm], with
/// boundary labels `left` and `right` and the given cross-section [cm²].
///
/// # Errors
/// Fails if `n < 2`.
pub fn line_mesh(
    n: usize,
    length: f64,
    cross_section: f64,
    region_of: impl Fn(f64) -> usize,
) -> Result<Mesh> {
    let mut b = MeshBuilder::new().cross_section(cross_section);
    anyhow::ensure!(n >= 2, "line mesh needs at least 2 nodes, got {n}");
    let h = length / (n - 1) as f64;
    for i in 0..n {
        b.add_point(Point3::new(i as f64 * h, 0.0, 0.0));
    }
    for i in 0..n - 1 {
        let mid = (i as f64 + 0.5) * h;
        let e = b.add_elem(ElemShape::Edge2, &[i, i + 1], region_of(mid));
        if i == 0 {
            b.add_boundary_face(e, 0, "left");
        }
        if i == n - 2 {
            b.add_boundary_face(e, 1, "right");
        }
    }
    b.build()
}

/// Uniform 2D quad mesh of `nx × ny` nodes spanning `[0,w] × [0,h]` [cm],
/// with boundary labels `west`, `east`, `south`, `north`.
///
/// # Errors
/// Fails if either direction has fewer than 2 nodes.
pub fn rect_mesh(
    nx: usize,
    ny: usize,
    w: f64,
    h: f64,
    region_of: impl Fn(&Point3<f64>) -> usize,
) -> Result<Mesh> {
    anyhow::ensure!(nx >= 2 && ny >= 2, "rect mesh needs at least 2x2 nodes");
    let mut b = MeshBuilder::new();
    let (dx, dy) = (w / (nx - 1) as f64, h / (ny - 1) as f64);
    let id = |i: usize, j: usize| j * nx + i;
    for j in 0..ny {
        for i in 0..nx {
            b.add_point(Point3::new(i as f64 * dx, j as f64 * dy, 0.0));
        }
    }
    for j in 0..ny - 1 {
        for i in 0..nx - 1 {
            let corners = [id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)];
            let c = Point3::new((i as f64 + 0.5) * dx, (j as f64 + 0.5) * dy, 0.0);
            let e = b.add_elem(ElemShape::Quad4, &corners, region_of(&c));
            if j == 0 {
                b.add_boundary_face(e, 0, "south");
            }
            if i == nx - 2 {
                b.add_boundary_face(e, 1, "east");
            }
            if j == ny - 2 {
                b.add_boundary_face(e, 2, "north");
            }
            if i == 0 {
                b.add_boundary_face(e, 3, "west");
            }
        }
    }
    b.build()
}

/// Uniform 3D hex mesh of `nx × ny × nz` nodes spanning
/// `[0,w] × [0,h] × [0,d]` [cm], with boundary labels `xmin`, `xmax`,
/// `ymin`, `ymax`, `zmin`, `zmax`.
///
/// # Errors
/// Fails if any direction has fewer than 2 nodes.
pub fn cube_mesh(
    nx: usize,
    ny: usize,
    nz: usize,
    w: f64,
    h: f64,
    d: f64,
    region_of: impl Fn(&Point3<f64>) -> usize,
) -> Result<Mesh> {
    anyhow::ensure!(
        nx >= 2 && ny >= 2 && nz >= 2,
        "cube mesh needs at least 2x2x2 nodes"
    );
    let mut b = MeshBuilder::new();
    let (dx, dy, dz) = (
        w / (nx - 1) as f64,
        h / (ny - 1) as f64,
        d / (nz - 1) as f64,
    );
    let id = |i: usize, j: usize, k: usize| (k * ny + j) * nx + i;
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                b.add_point(Point3::new(i as f64 * dx, j as f64 * dy, k as f64 * dz));
            }
        }
    }
    for k in 0..nz - 1 {
        for j in 0..ny - 1 {
            for i in 0..nx - 1 {
                let corners = [
                    id(i, j, k),
                    id(i + 1, j, k),
                    id(i + 1, j + 1, k),
                    id(i, j + 1, k),
                    id(i, j, k + 1),
                    id(i + 1, j, k + 1),
                    id(i + 1, j + 1, k + 1),
                    id(i, j + 1, k + 1),
                ];
                let c = Point3::new(
                    (i as f64 + 0.5) * dx,
                    (j as f64 + 0.5) * dy,
                    (k as f64 + 0.5) * dz,
                );
                let e = b.add_elem(ElemShape::Hex8, &corners, region_of(&c));
                if k == 0 {
                    b.add_boundary_face(e, 0, "zmin");
                }
                if k == nz - 2 {
                    b.add_boundary_face(e, 1, "zmax");
                }
                if j == 0 {
                    b.add_boundary_face(e, 2, "ymin");
                }
                if i == nx - 2 {
                    b.add_boundary_face(e, 3, "xmax");
                }
                if j == ny - 2 {
                    b.add_boundary_face(e, 4, "ymax");
                }
                if i == 0 {
                    b.add_boundary_face(e, 5, "xmin");
                }
            }
        }
    }
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_boundary_labels_cover_all_faces() {
        let m = cube_mesh(3, 3, 3, 1.0, 1.0, 1.0, |_| 0).unwrap();
        let labels = m.boundary_labels();
        assert_eq!(
            labels,
            vec!["xmax", "xmin", "ymax", "ymin", "zmax", "zmin"]
        );
        // 9 nodes per face of a 3x3x3 grid.
        assert_eq!(m.nodes_on_boundary("zmin").len(), 9);
    }

    #[test]
    fn rect_corners_belong_to_two_boundaries() {
        let m = rect_mesh(3, 3, 1.0, 1.0, |_| 0).unwrap();
        assert!(m.nodes_on_boundary("west").contains(&0));
        assert!(m.nodes_on_boundary("south").contains(&0));
    }
}
