// crates/driftfvm-mesh/src/fvm.rs

//! Per-region finite-volume graph: median-dual control volumes.
//!
//! Every element contributes to each of its edges the dual facet spanned
//! by the edge midpoint, the incident face centroids and the element
//! centroid; contributions accumulate across elements so each node pair
//! appears as exactly one [`FvmEdge`]. Nodes and edges are ordered by
//! global index, so iteration is deterministic across processes.

use anyhow::{bail, Result};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;

use crate::elem::{Elem, ElemShape};
use crate::mesh::{HangingNode, Mesh};

/// One vertex viewed from one region.
#[derive(Clone, Debug)]
pub struct FvmNode {
    /// Global mesh node index.
    pub node: usize,
    /// Control-volume measure (cm³ in 3D, cm² per unit z in 2D,
    /// cm·cross-section in 1D).
    pub volume: f64,
    /// Outside boundary surface area, zero for interior nodes.
    pub boundary_area: f64,
    /// Neighbours inside the region: `(fvm index, edge length, cv face area)`.
    pub neighbors: Vec<(usize, f64, f64)>,
}

/// One region-internal edge, the primary integration unit.
#[derive(Clone, Copy, Debug)]
pub struct FvmEdge {
    /// FVM index of the lower-global-index endpoint.
    pub n1: usize,
    /// FVM index of the higher-global-index endpoint.
    pub n2: usize,
    /// Node-to-node distance [cm].
    pub length: f64,
    /// Accumulated control-volume face area between the endpoints.
    pub cv_area: f64,
}

/// The finite-volume graph of one region.
#[derive(Clone, Debug)]
pub struct FvmGraph {
    /// Region this graph integrates over.
    pub region: usize,
    /// FVM nodes, ordered by global mesh index.
    pub nodes: Vec<FvmNode>,
    /// Edges, ordered by (global, global) endpoint pair.
    pub edges: Vec<FvmEdge>,
    /// Hanging-node records whose vertex lies in this region.
    pub hanging: Vec<HangingNode>,
    index: BTreeMap<usize, usize>,
}

impl FvmGraph {
    /// Build the graph for `region`.
    ///
    /// # Errors
    /// Fails if the region has no elements.
    pub fn build(mesh: &Mesh, region: usize) -> Result<Self> {
        let elems: Vec<(usize, &Elem)> = mesh
            .elems
            .iter()
            .enumerate()
            .filter(|(_, e)| e.region == region)
            .collect();
        if elems.is_empty() {
            bail!("region {region} has no elements");
        }

        // Stable node numbering: sorted global index. Hanging vertices are
        // first-class FVM nodes even when no element of this region lists
        // them as a vertex.
        let mut index = BTreeMap::new();
        for (_, e) in &elems {
            for &n in &e.nodes {
                index.entry(n).or_insert(0usize);
            }
        }
        for h in &mesh.hanging {
            if mesh.elems[h.elem].region == region {
                index.entry(h.node).or_insert(0usize);
            }
        }
        for (i, v) in index.values_mut().enumerate() {
            *v = i;
        }

        let mut nodes: Vec<FvmNode> = index
            .keys()
            .map(|&node| FvmNode {
                node,
                volume: 0.0,
                boundary_area: 0.0,
                neighbors: Vec::new(),
            })
            .collect();

        // Accumulate edge dual areas and node volumes element by element.
        let mut edge_acc: BTreeMap<(usize, usize), (f64, f64)> = BTreeMap::new();
        for (_, e) in &elems {
            let pts: Vec<Point3<f64>> = e.nodes.iter().map(|&n| mesh.points[n]).collect();
            let vol = elem_volume(e.shape, &pts, mesh.cross_section);
            let share = vol / e.nodes.len() as f64;
            for &n in &e.nodes {
                nodes[index[&n]].volume += share;
            }
            for le in 0..e.shape.n_edges() {
                let [a, b] = e.shape.edge_nodes(le);
                let (ga, gb) = (e.nodes[a], e.nodes[b]);
                let key = (ga.min(gb), ga.max(gb));
                let area = edge_dual_area(e.shape, &pts, le, mesh.cross_section);
                let length = (mesh.points[ga] - mesh.points[gb]).norm();
                let entry = edge_acc.entry(key).or_insert((length, 0.0));
                entry.1 += area;
            }
        }

        // Outside boundary areas, equally split over face nodes.
        for f in &mesh.boundary_faces {
            let e = &mesh.elems[f.elem];
            if e.region != region {
                continue;
            }
            let side = e.shape.side_nodes(f.side);
            let pts: Vec<Point3<f64>> =
                side.iter().map(|&l| mesh.points[e.nodes[l]]).collect();
            let area = facet_area(&pts, mesh.cross_section);
            for &l in side {
                nodes[index[&e.nodes[l]]].boundary_area += area / side.len() as f64;
            }
        }

        let edges: Vec<FvmEdge> = edge_acc
            .iter()
            .map(|(&(ga, gb), &(length, cv_area))| FvmEdge {
                n1: index[&ga],
                n2: index[&gb],
                length,
                cv_area,
            })
            .collect();

        for edge in &edges {
            nodes[edge.n1]
                .neighbors
                .push((edge.n2, edge.length, edge.cv_area));
            nodes[edge.n2]
                .neighbors
                .push((edge.n1, edge.length, edge.cv_area));
        }

        let hanging = mesh
            .hanging
            .iter()
            .filter(|h| mesh.elems[h.elem].region == region)
            .copied()
            .collect();

        Ok(Self {
            region,
            nodes,
            edges,
            hanging,
            index,
        })
    }

    /// FVM index of a global mesh node, if the node lies in this region.
    #[must_use]
    pub fn fvm_index(&self, mesh_node: usize) -> Option<usize> {
        self.index.get(&mesh_node).copied()
    }

    /// Node count.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Edge count.
    #[must_use]
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }
}

fn centroid(pts: &[Point3<f64>]) -> Point3<f64> {
    let mut c = Vector3::zeros();
    for p in pts {
        c += p.coords;
    }
    Point3::from(c / pts.len() as f64)
}

fn tri_area(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> f64 {
    (b - a).cross(&(c - a)).norm() * 0.5
}

fn tet_volume(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>, d: Point3<f64>) -> f64 {
    ((b - a).cross(&(c - a)).dot(&(d - a)) / 6.0).abs()
}

/// Element measure: length×cross-section (1D), area (2D), volume (3D).
fn elem_volume(shape: ElemShape, pts: &[Point3<f64>], cross_section: f64) -> f64 {
    match shape {
        ElemShape::Edge2 => (pts[1] - pts[0]).norm() * cross_section,
        ElemShape::Tri3 => tri_area(pts[0], pts[1], pts[2]),
        ElemShape::Quad4 => tri_area(pts[0], pts[1], pts[2]) + tri_area(pts[0], pts[2], pts[3]),
        ElemShape::Tet4 => tet_volume(pts[0], pts[1], pts[2], pts[3]),
        ElemShape::Hex8 => {
            // Classic five-tetrahedra decomposition.
            const TETS: [[usize; 4]; 5] = [
                [0, 1, 2, 5],
                [0, 2, 3, 7],
                [0, 4, 5, 7],
                [2, 5, 6, 7],
                [0, 2, 5, 7],
            ];
            TETS.iter()
                .map(|t| tet_volume(pts[t[0]], pts[t[1]], pts[t[2]], pts[t[3]]))
                .sum()
        }
    }
}

/// Median-dual facet area contributed by one element to one of its edges.
fn edge_dual_area(
    shape: ElemShape,
    pts: &[Point3<f64>],
    local_edge: usize,
    cross_section: f64,
) -> f64 {
    let [a, b] = shape.edge_nodes(local_edge);
    let mid = Point3::from((pts[a].coords + pts[b].coords) * 0.5);
    match shape.dim() {
        1 => cross_section,
        2 => (centroid(pts) - mid).norm(),
        _ => {
            let c = centroid(pts);
            let sides = match shape.sides_of_edge(local_edge) {
                Some(s) => s,
                None => return 0.0,
            };
            let mut area = 0.0;
            for s in sides {
                let side_pts: Vec<Point3<f64>> =
                    shape.side_nodes(s).iter().map(|&l| pts[l]).collect();
                let fc = centroid(&side_pts);
                area += tri_area(mid, fc, c);
            }
            area
        }
    }
}

/// Area of a boundary facet: cross-section (point), length (edge),
/// area (polygon).
fn facet_area(pts: &[Point3<f64>], cross_section: f64) -> f64 {
    match pts.len() {
        1 => cross_section,
        2 => (pts[1] - pts[0]).norm(),
        3 => tri_area(pts[0], pts[1], pts[2]),
        _ => tri_area(pts[0], pts[1], pts[2]) + tri_area(pts[0], pts[2], pts[3]),
    }
}
