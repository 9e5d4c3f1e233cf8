// crates/driftfvm-device/src/solution_io.rs

//! Solution I/O surface.
//!
//! Mesh and field I/O belong to external collaborators; this module only
//! pins down the contract the core honours: DF-ISE write-back is not
//! provided and fails loudly rather than producing a partial file.

use anyhow::{bail, Result};
use std::path::Path;

use crate::system::System;

/// Write the solution in DF-ISE format.
///
/// # Errors
/// Always: DF-ISE output is not implemented.
pub fn write_dfise(_sys: &System, path: &Path) -> Result<()> {
    bail!(
        "writing DF-ISE format is not implemented (requested path: {})",
        path.display()
    )
}
