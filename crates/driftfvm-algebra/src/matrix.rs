// crates/driftfvm-algebra/src/matrix.rs

//! Sparse square matrix with the INSERT/ADD protocol and the row surgery
//! the boundary-condition layer depends on: `zero_rows`, `get_values`
//! read-back and `add_row_to_row` redirection.

use anyhow::{bail, Result};
use nalgebra::DMatrix;
use std::collections::BTreeMap;

use crate::mode::AssemblyMode;

/// Row-major sparse matrix. Rows are ordered maps so iteration order is
/// deterministic, which keeps assembled systems bit-identical for a fixed
/// insertion order.
#[derive(Clone, Debug)]
pub struct SysMatrix {
    n: usize,
    rows: Vec<BTreeMap<usize, f64>>,
    staged: AssemblyMode,
}

impl SysMatrix {
    /// An empty `n × n` matrix.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            n,
            rows: vec![BTreeMap::new(); n],
            staged: AssemblyMode::NotSet,
        }
    }

    /// Matrix dimension.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Current staged write mode.
    #[must_use]
    pub fn staged_mode(&self) -> AssemblyMode {
        self.staged
    }

    /// Drop all entries, keeping the dimension.
    pub fn zero_entries(&mut self) {
        for row in &mut self.rows {
            row.clear();
        }
        self.staged = AssemblyMode::NotSet;
    }

    /// Write one entry.
    ///
    /// # Errors
    /// Fails on an `Insert`/`Add` mix without an intervening flush.
    pub fn set_value(&mut self, r: usize, c: usize, v: f64, mode: AssemblyMode) -> Result<()> {
        if !self.staged.accepts(mode) {
            bail!(
                "assembly mode violation: matrix is staged {:?}, write requested {:?} without flush",
                self.staged,
                mode
            );
        }
        match mode {
            AssemblyMode::Insert => {
                self.rows[r].insert(c, v);
            }
            AssemblyMode::Add => {
                *self.rows[r].entry(c).or_insert(0.0) += v;
            }
            AssemblyMode::NotSet => bail!("cannot write with mode NotSet"),
        }
        self.staged = mode;
        Ok(())
    }

    /// Write one row-slice of entries: `(r, cols[k]) = vals[k]`.
    ///
    /// # Errors
    /// Fails on a mode conflict or a column/value length mismatch.
    pub fn set_values(
        &mut self,
        r: usize,
        cols: &[usize],
        vals: &[f64],
        mode: AssemblyMode,
    ) -> Result<()> {
        if cols.len() != vals.len() {
            bail!(
                "matrix set_values: {} columns but {} values",
                cols.len(),
                vals.len()
            );
        }
        for (&c, &v) in cols.iter().zip(vals) {
            self.set_value(r, c, v, mode)?;
        }
        Ok(())
    }

    /// Flush pending writes; afterwards either mode is accepted again.
    /// The sparsity pattern is retained (flush, not final assembly).
    pub fn flush_assembly(&mut self) {
        self.staged = AssemblyMode::NotSet;
    }

    /// Final assembly; identical to a flush for this backend.
    pub fn final_assembly(&mut self) {
        self.staged = AssemblyMode::NotSet;
    }

    /// Read back a row-slice; absent entries read as zero.
    #[must_use]
    pub fn get_values(&self, r: usize, cols: &[usize]) -> Vec<f64> {
        cols.iter()
            .map(|c| self.rows[r].get(c).copied().unwrap_or(0.0))
            .collect()
    }

    /// Iterate the stored entries of one row in column order.
    pub fn row_entries(&self, r: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.rows[r].iter().map(|(&c, &v)| (c, v))
    }

    /// Replace the listed rows by `diag` on the diagonal and zero elsewhere.
    ///
    /// # Errors
    /// Fails if called with un-flushed writes pending.
    pub fn zero_rows(&mut self, rows: &[usize], diag: f64) -> Result<()> {
        if self.staged != AssemblyMode::NotSet {
            bail!("zero_rows requires an assembled matrix (flush first)");
        }
        for &r in rows {
            self.rows[r].clear();
            if diag != 0.0 {
                self.rows[r].insert(r, diag);
            }
        }
        Ok(())
    }

    /// For each `(src, dst, alpha)` triple, add `alpha · row(src)` onto
    /// `row(dst)`. Source rows are snapshotted first.
    ///
    /// # Errors
    /// Fails if called with un-flushed writes pending.
    pub fn add_row_to_row(&mut self, src: &[usize], dst: &[usize], alpha: &[f64]) -> Result<()> {
        if self.staged != AssemblyMode::NotSet {
            bail!("add_row_to_row requires an assembled matrix (flush first)");
        }
        let snapshot: Vec<BTreeMap<usize, f64>> =
            src.iter().map(|&s| self.rows[s].clone()).collect();
        for ((&d, &a), row) in dst.iter().zip(alpha).zip(snapshot) {
            for (c, v) in row {
                *self.rows[d].entry(c).or_insert(0.0) += a * v;
            }
        }
        Ok(())
    }

    /// Count of stored entries.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    /// Dense copy for the direct-solver path.
    #[must_use]
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(self.n, self.n);
        for (r, row) in self.rows.iter().enumerate() {
            for (&c, &v) in row {
                m[(r, c)] = v;
            }
        }
        m
    }

    /// Matrix-vector product `y = A·x`.
    #[must_use]
    pub fn mat_vec(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.n];
        for (r, row) in self.rows.iter().enumerate() {
            let mut acc = 0.0;
            for (&c, &v) in row {
                acc += v * x[c];
            }
            y[r] = acc;
        }
        y
    }

    /// Diagonal entries (zeros where absent).
    #[must_use]
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.n)
            .map(|r| self.rows[r].get(&r).copied().unwrap_or(0.0))
            .collect()
    }
}
