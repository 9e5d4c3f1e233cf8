// crates/driftfvm-solver/src/lib.rs

//! The assembly engine: per-region residual/Jacobian assemblers over the
//! FVM graph, hanging-node reconstruction, the boundary-condition
//! row-clear/row-rewrite protocol, external-circuit coupling, and the
//! Newton driver that closes the loop.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

pub mod bc;
pub mod ddm1;
pub mod ddm2;
pub mod driver;
pub mod hanging;
pub mod newton;
pub mod params;
pub mod poisson;
pub mod proto;

pub use driver::{assemble_function, assemble_jacobian, electrode_trace};
pub use newton::{solve_steady_state, NewtonReport};
pub use params::{SolveParams, TsType};
