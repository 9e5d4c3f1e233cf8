// crates/driftfvm-math/src/lib.rs

//! Numeric kernels shared by the driftfvm workspace: a stack-allocated
//! forward-mode dual scalar, the Bernoulli function and the
//! Scharfetter–Gummel midpoint forms built on it, the Fermi–Dirac integral
//! of order 1/2, and the scaled physical-unit system.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

pub mod ad;
pub mod bernoulli;
pub mod fermi;
pub mod sg;
pub mod units;

pub use ad::{Dual, Scalar, MAX_DIR};
pub use bernoulli::bern;
pub use fermi::fermi_half;
pub use sg::{nmid, pmid, sg_flux_n, sg_flux_p};
