// crates/driftfvm-mesh/src/mesh.rs

//! The mesh container: points, elements, labelled boundary faces,
//! hanging-node records and processor ownership.

use anyhow::{bail, Result};
use nalgebra::Point3;

use crate::elem::{Elem, ElemShape};

/// Where a refinement-induced vertex hangs on its coarse neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HangingKind {
    /// Centre of an element side (2D edge side or 3D face).
    OnSide,
    /// Centre of an element edge (3D only).
    OnEdge,
}

/// Reconstruction record for one hanging node: the owning coarse element
/// and the side/edge index the node sits on.
#[derive(Clone, Copy, Debug)]
pub struct HangingNode {
    /// Global node index of the hanging vertex.
    pub node: usize,
    /// Coarse element the vertex hangs on.
    pub elem: usize,
    /// Side index (for [`HangingKind::OnSide`]) or edge index (for
    /// [`HangingKind::OnEdge`]) within that element.
    pub index: usize,
    /// Side or edge record.
    pub kind: HangingKind,
}

/// One labelled boundary facet: an element side on the domain surface or
/// on a region-region interface.
#[derive(Clone, Debug)]
pub struct BoundaryFace {
    /// Element owning the facet.
    pub elem: usize,
    /// Side index within the element.
    pub side: usize,
    /// Boundary label, e.g. `"anode"`.
    pub label: String,
}

/// Immutable simulation mesh.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex coordinates (z = 0 for 2D, y = z = 0 for 1D).
    pub points: Vec<Point3<f64>>,
    /// Mesh dimension: 1, 2 or 3.
    pub dim: usize,
    /// Elements with region tags.
    pub elems: Vec<Elem>,
    /// Labelled boundary facets.
    pub boundary_faces: Vec<BoundaryFace>,
    /// Hanging-node reconstruction records.
    pub hanging: Vec<HangingNode>,
    /// Owning processor per node.
    pub owner: Vec<usize>,
    /// Dual-face area of a 1D edge (device cross-section) [cm²].
    pub cross_section: f64,
}

impl Mesh {
    /// Highest region id present, plus one.
    #[must_use]
    pub fn n_regions(&self) -> usize {
        self.elems.iter().map(|e| e.region + 1).max().unwrap_or(0)
    }

    /// Whether `node` is owned by `rank`.
    #[must_use]
    pub fn on_processor(&self, node: usize, rank: usize) -> bool {
        self.owner[node] == rank
    }

    /// Sorted, de-duplicated global node indices on the labelled boundary.
    #[must_use]
    pub fn nodes_on_boundary(&self, label: &str) -> Vec<usize> {
        let mut nodes: Vec<usize> = self
            .boundary_faces
            .iter()
            .filter(|f| f.label == label)
            .flat_map(|f| {
                let elem = &self.elems[f.elem];
                elem.shape
                    .side_nodes(f.side)
                    .iter()
                    .map(|&l| elem.nodes[l])
                    .collect::<Vec<_>>()
            })
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Sorted region ids incident to the labelled boundary.
    #[must_use]
    pub fn regions_on_boundary(&self, label: &str) -> Vec<usize> {
        let mut nodes = self.nodes_on_boundary(label);
        nodes.sort_unstable();
        let mut regions: Vec<usize> = self
            .elems
            .iter()
            .filter(|e| e.nodes.iter().any(|n| nodes.binary_search(n).is_ok()))
            .map(|e| e.region)
            .collect();
        regions.sort_unstable();
        regions.dedup();
        regions
    }

    /// All distinct boundary labels, sorted.
    #[must_use]
    pub fn boundary_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .boundary_faces
            .iter()
            .map(|f| f.label.clone())
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }
}

/// Incremental mesh construction with final validation.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    points: Vec<Point3<f64>>,
    elems: Vec<Elem>,
    boundary_faces: Vec<BoundaryFace>,
    hanging: Vec<HangingNode>,
    cross_section: f64,
}

impl MeshBuilder {
    /// Fresh builder with unit 1D cross-section.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cross_section: 1.0,
            ..Self::default()
        }
    }

    /// Set the 1D dual-face area (device cross-section) [cm²].
    #[must_use]
    pub fn cross_section(mut self, area: f64) -> Self {
        self.cross_section = area;
        self
    }

    /// Add a vertex, returning its global index.
    pub fn add_point(&mut self, p: Point3<f64>) -> usize {
        self.points.push(p);
        self.points.len() - 1
    }

    /// Add an element, returning its index.
    pub fn add_elem(&mut self, shape: ElemShape, nodes: &[usize], region: usize) -> usize {
        self.elems.push(Elem {
            shape,
            nodes: nodes.to_vec(),
            region,
        });
        self.elems.len() - 1
    }

    /// Tag one element side with a boundary label.
    pub fn add_boundary_face(&mut self, elem: usize, side: usize, label: &str) {
        self.boundary_faces.push(BoundaryFace {
            elem,
            side,
            label: label.to_owned(),
        });
    }

    /// Register a hanging-node reconstruction record.
    pub fn add_hanging(&mut self, node: usize, elem: usize, index: usize, kind: HangingKind) {
        self.hanging.push(HangingNode {
            node,
            elem,
            index,
            kind,
        });
    }

    /// Validate and freeze the mesh.
    ///
    /// # Errors
    /// Fails on out-of-range node/element/side indices, an element arity
    /// mismatch, or an empty mesh.
    pub fn build(self) -> Result<Mesh> {
        if self.elems.is_empty() {
            bail!("mesh has no elements");
        }
        let n = self.points.len();
        let mut dim = 0;
        for (i, e) in self.elems.iter().enumerate() {
            if e.nodes.len() != e.shape.n_nodes() {
                bail!(
                    "element {i}: {:?} expects {} nodes, got {}",
                    e.shape,
                    e.shape.n_nodes(),
                    e.nodes.len()
                );
            }
            if let Some(&bad) = e.nodes.iter().find(|&&v| v >= n) {
                bail!("element {i}: node index {bad} out of range ({n} points)");
            }
            dim = dim.max(e.shape.dim());
        }
        for (i, f) in self.boundary_faces.iter().enumerate() {
            let Some(e) = self.elems.get(f.elem) else {
                bail!("boundary face {i} ('{}'): element {} out of range", f.label, f.elem);
            };
            if f.side >= e.shape.n_sides() {
                bail!(
                    "boundary face {i} ('{}'): side {} out of range for {:?}",
                    f.label,
                    f.side,
                    e.shape
                );
            }
        }
        for h in &self.hanging {
            if h.node >= n || h.elem >= self.elems.len() {
                bail!("hanging-node record references missing node or element");
            }
        }
        Ok(Mesh {
            owner: vec![0; n],
            points: self.points,
            dim,
            elems: self.elems,
            boundary_faces: self.boundary_faces,
            hanging: self.hanging,
            cross_section: self.cross_section,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_arity_mismatch() {
        let mut b = MeshBuilder::new();
        let p0 = b.add_point(Point3::origin());
        let p1 = b.add_point(Point3::new(1.0, 0.0, 0.0));
        b.add_elem(ElemShape::Tri3, &[p0, p1], 0);
        assert!(b.build().is_err());
    }

    #[test]
    fn boundary_node_query_is_sorted_and_unique() {
        let mut b = MeshBuilder::new();
        for i in 0..3 {
            b.add_point(Point3::new(f64::from(i), 0.0, 0.0));
        }
        let e0 = b.add_elem(ElemShape::Edge2, &[0, 1], 0);
        let e1 = b.add_elem(ElemShape::Edge2, &[1, 2], 0);
        b.add_boundary_face(e0, 0, "left");
        b.add_boundary_face(e1, 1, "right");
        let m = b.build().unwrap();
        assert_eq!(m.nodes_on_boundary("left"), vec![0]);
        assert_eq!(m.nodes_on_boundary("right"), vec![2]);
        assert_eq!(m.boundary_labels(), vec!["left".to_owned(), "right".to_owned()]);
    }
}
