// crates/driftfvm-solver/src/bc/interconnect.rs

//! Electrode interconnect hub: one extra unknown (the hub potential) whose
//! row collects the attached electrodes' terminal currents. The attached
//! electrodes write their `scale·I` shares and their own `V_e - V_hub`
//! constraints; the hub contributes only the source side of its equation.

use anyhow::{Context, Result};

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{CircuitDrive, Communicator, System};

use crate::proto::{ensure_mat_add, ensure_vec_add};

/// Residual hook: `V_hub - V_app` for a driven hub; a floating hub's row
/// is purely the current sum the electrodes deposit.
pub fn function(
    sys: &mut System,
    bc: usize,
    comm: &dyn Communicator,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_vec_add(f, mode);
    let row = sys.dofs.bc_offset[bc].context("interconnect hub has no global offset")?;
    let ckt = sys.boundaries[bc]
        .ext_circuit
        .as_mut()
        .context("interconnect hub has no circuit")?;
    ckt.potential_itering = x[row];
    if comm.is_last_rank() && ckt.drive != CircuitDrive::Float {
        f.set_value(row, x[row] - ckt.v_app, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Jacobian hook.
pub fn jacobian(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_mat_add(jac, mode);
    let row = sys.dofs.bc_offset[bc].context("interconnect hub has no global offset")?;
    let ckt = sys.boundaries[bc]
        .ext_circuit
        .as_ref()
        .context("interconnect hub has no circuit")?;
    if comm.is_last_rank() {
        let diag = if ckt.drive == CircuitDrive::Float { 0.0 } else { 1.0 };
        jac.set_value(row, row, diag, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}
