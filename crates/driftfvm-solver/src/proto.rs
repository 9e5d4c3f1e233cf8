// crates/driftfvm-solver/src/proto.rs

//! Shared assembly-protocol helpers: the flush-on-mode-change dance every
//! assembler performs on entry, and the row lists collected by boundary
//! preprocessing.

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};

/// Flush the vector if the pending mode is incompatible with `Add`.
pub fn ensure_vec_add(f: &mut SysVector, mode: &mut AssemblyMode) {
    if !matches!(*mode, AssemblyMode::Add | AssemblyMode::NotSet) {
        f.assembly_begin();
        f.assembly_end();
        *mode = AssemblyMode::NotSet;
    }
}

/// Flush the matrix if the pending mode is incompatible with `Add`.
pub fn ensure_mat_add(jac: &mut SysMatrix, mode: &mut AssemblyMode) {
    if !matches!(*mode, AssemblyMode::Add | AssemblyMode::NotSet) {
        jac.flush_assembly();
        *mode = AssemblyMode::NotSet;
    }
}

/// Row bookkeeping gathered by boundary `preprocess` hooks: rows to merge
/// (`src → dst` with weight `alpha`) and rows to clear before the hooks
/// rewrite them.
#[derive(Clone, Debug, Default)]
pub struct ClearLists {
    /// Source rows of the merge redirections.
    pub src_row: Vec<usize>,
    /// Destination rows of the merge redirections.
    pub dst_row: Vec<usize>,
    /// Merge weights.
    pub alpha: Vec<f64>,
    /// Rows cleared before the boundary equations are written.
    pub clear_row: Vec<usize>,
}

impl ClearLists {
    /// Queue a `src → dst` merge with weight `alpha`.
    pub fn redirect(&mut self, src: usize, dst: usize, alpha: f64) {
        self.src_row.push(src);
        self.dst_row.push(dst);
        self.alpha.push(alpha);
    }
}
