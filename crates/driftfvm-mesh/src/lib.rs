// crates/driftfvm-mesh/src/lib.rs

//! Unstructured mesh and the finite-volume graph built over it.
//!
//! The mesh layer owns geometry and topology only: points, elements,
//! labelled boundary faces, hanging-node records and processor ownership.
//! [`FvmGraph`] derives the per-region integration structures from it —
//! edges with control-volume face areas, node volumes, outside boundary
//! areas — with deterministic (global-index) iteration order.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

pub mod builders;
pub mod elem;
pub mod fvm;
pub mod mesh;

pub use elem::{Elem, ElemShape};
pub use fvm::{FvmEdge, FvmGraph, FvmNode};
pub use mesh::{BoundaryFace, HangingKind, HangingNode, Mesh, MeshBuilder};
