// crates/driftfvm-mesh/src/elem.rs

//! Element shapes and their fixed local topology tables.

use serde::{Deserialize, Serialize};

/// Supported element shapes.
///
/// 1D devices use `Edge2`, 2D devices `Tri3`/`Quad4`, 3D devices
/// `Tet4`/`Hex8`. Hex numbering: nodes 0-3 counter-clockwise on the bottom
/// face, 4-7 stacked above them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElemShape {
    /// Two-node line segment.
    Edge2,
    /// Three-node triangle.
    Tri3,
    /// Four-node quadrilateral.
    Quad4,
    /// Four-node tetrahedron.
    Tet4,
    /// Eight-node hexahedron.
    Hex8,
}

impl ElemShape {
    /// Intrinsic dimension of the shape.
    #[must_use]
    pub const fn dim(self) -> usize {
        match self {
            Self::Edge2 => 1,
            Self::Tri3 | Self::Quad4 => 2,
            Self::Tet4 | Self::Hex8 => 3,
        }
    }

    /// Number of vertices.
    #[must_use]
    pub const fn n_nodes(self) -> usize {
        match self {
            Self::Edge2 => 2,
            Self::Tri3 => 3,
            Self::Quad4 | Self::Tet4 => 4,
            Self::Hex8 => 8,
        }
    }

    /// Number of element edges (the FVM integration units).
    #[must_use]
    pub const fn n_edges(self) -> usize {
        match self {
            Self::Edge2 => 1,
            Self::Tri3 => 3,
            Self::Quad4 => 4,
            Self::Tet4 => 6,
            Self::Hex8 => 12,
        }
    }

    /// Local node pair of edge `e`.
    #[must_use]
    pub const fn edge_nodes(self, e: usize) -> [usize; 2] {
        match self {
            Self::Edge2 => [0, 1],
            Self::Tri3 => [[0, 1], [1, 2], [2, 0]][e],
            Self::Quad4 => [[0, 1], [1, 2], [2, 3], [3, 0]][e],
            Self::Tet4 => [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]][e],
            Self::Hex8 => [
                [0, 1],
                [1, 2],
                [2, 3],
                [3, 0],
                [4, 5],
                [5, 6],
                [6, 7],
                [7, 4],
                [0, 4],
                [1, 5],
                [2, 6],
                [3, 7],
            ][e],
        }
    }

    /// Number of element sides (boundary facets).
    #[must_use]
    pub const fn n_sides(self) -> usize {
        match self {
            Self::Edge2 => 2,
            Self::Tri3 => 3,
            Self::Quad4 | Self::Tet4 => 4,
            Self::Hex8 => 6,
        }
    }

    /// Local nodes of side `s`, ordered so consecutive nodes share a
    /// face edge (quadrilateral sides list their perimeter).
    #[must_use]
    pub fn side_nodes(self, s: usize) -> &'static [usize] {
        match self {
            Self::Edge2 => [&[0][..], &[1][..]][s],
            Self::Tri3 => [&[0, 1][..], &[1, 2][..], &[2, 0][..]][s],
            Self::Quad4 => [&[0, 1][..], &[1, 2][..], &[2, 3][..], &[3, 0][..]][s],
            Self::Tet4 => [
                &[0, 1, 2][..],
                &[0, 1, 3][..],
                &[1, 2, 3][..],
                &[0, 2, 3][..],
            ][s],
            Self::Hex8 => [
                &[0, 3, 2, 1][..],
                &[4, 5, 6, 7][..],
                &[0, 1, 5, 4][..],
                &[1, 2, 6, 5][..],
                &[2, 3, 7, 6][..],
                &[3, 0, 4, 7][..],
            ][s],
        }
    }

    /// The two sides containing local edge `e` (3D shapes only).
    #[must_use]
    pub fn sides_of_edge(self, e: usize) -> Option<[usize; 2]> {
        if self.dim() < 3 {
            return None;
        }
        let [a, b] = self.edge_nodes(e);
        let mut found = [usize::MAX; 2];
        let mut k = 0;
        for s in 0..self.n_sides() {
            let side = self.side_nodes(s);
            if side.contains(&a) && side.contains(&b) && k < 2 {
                found[k] = s;
                k += 1;
            }
        }
        (k == 2).then_some(found)
    }
}

/// A mesh element: shape, global vertex list and region tag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Elem {
    /// Shape of this element.
    pub shape: ElemShape,
    /// Global node indices, `shape.n_nodes()` of them.
    pub nodes: Vec<usize>,
    /// Region (subdomain) this element belongs to.
    pub region: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_tables_are_consistent() {
        for shape in [
            ElemShape::Edge2,
            ElemShape::Tri3,
            ElemShape::Quad4,
            ElemShape::Tet4,
            ElemShape::Hex8,
        ] {
            for e in 0..shape.n_edges() {
                let [a, b] = shape.edge_nodes(e);
                assert!(a < shape.n_nodes() && b < shape.n_nodes() && a != b);
            }
            for s in 0..shape.n_sides() {
                for &n in shape.side_nodes(s) {
                    assert!(n < shape.n_nodes());
                }
            }
        }
    }

    #[test]
    fn every_hex_edge_lies_on_exactly_two_sides() {
        for e in 0..ElemShape::Hex8.n_edges() {
            let sides = ElemShape::Hex8.sides_of_edge(e).unwrap();
            assert_ne!(sides[0], sides[1]);
        }
        for e in 0..ElemShape::Tet4.n_edges() {
            assert!(ElemShape::Tet4.sides_of_edge(e).is_some());
        }
        assert!(ElemShape::Quad4.sides_of_edge(0).is_none());
    }
}
