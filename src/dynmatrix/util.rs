use crate::traits::Scalar;

use super::DynMatrix;

// ── Shape editing ───────────────────────────────────────────────────

impl<T: Scalar> DynMatrix<T> {
    /// Change the shape in place.
    ///
    /// The overlapping top-left block is kept; new entries are zero.
    ///
    /// ```
    /// use stepwise::DynMatrix;
    /// let mut m = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// m.resize(3, 1);
    /// assert_eq!(m.shape(), (3, 1));
    /// assert_eq!(m.col(0), vec![1.0, 3.0, 0.0]);
    /// ```
    pub fn resize(&mut self, nrows: usize, ncols: usize) {
        if (nrows, ncols) == (self.nrows, self.ncols) {
            return;
        }
        let old = core::mem::take(&mut self.data);
        let old_rows = self.nrows;
        let keep_rows = old_rows.min(nrows);
        let keep_cols = self.ncols.min(ncols);
        let mut data = vec![T::zero(); nrows * ncols];
        for j in 0..keep_cols {
            data[j * nrows..j * nrows + keep_rows]
                .copy_from_slice(&old[j * old_rows..j * old_rows + keep_rows]);
        }
        self.data = data;
        self.nrows = nrows;
        self.ncols = ncols;
    }

    /// Copy of column `j`.
    pub fn col(&self, j: usize) -> Vec<T> {
        self.col_slice(j).to_vec()
    }

    /// Copy of row `i`.
    pub fn row(&self, i: usize) -> Vec<T> {
        assert!(i < self.nrows, "row {} out of range for {} rows", i, self.nrows);
        (0..self.ncols).map(|j| self.data[j * self.nrows + i]).collect()
    }

    /// Overwrite column `j` with `values`.
    pub fn set_col(&mut self, j: usize, values: &[T]) {
        assert_eq!(
            values.len(),
            self.nrows,
            "dimension mismatch: column of {} into {} rows",
            values.len(),
            self.nrows,
        );
        self.col_slice_mut(j).copy_from_slice(values);
    }

    /// Overwrite row `i` with `values`.
    pub fn set_row(&mut self, i: usize, values: &[T]) {
        assert!(i < self.nrows, "row {} out of range for {} rows", i, self.nrows);
        assert_eq!(
            values.len(),
            self.ncols,
            "dimension mismatch: row of {} into {} columns",
            values.len(),
            self.ncols,
        );
        for (j, &v) in values.iter().enumerate() {
            self.data[j * self.nrows + i] = v;
        }
    }

    /// Insert a new row before index `i` (`i == nrows` appends).
    ///
    /// ```
    /// use stepwise::DynMatrix;
    /// let mut m = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// m.insert_row(1, &[9.0, 9.0]);
    /// assert_eq!(m.row(1), vec![9.0, 9.0]);
    /// assert_eq!(m.row(2), vec![3.0, 4.0]);
    /// ```
    pub fn insert_row(&mut self, i: usize, values: &[T]) {
        assert!(i <= self.nrows, "row {} out of range for insertion into {} rows", i, self.nrows);
        if self.nrows == 0 && self.ncols == 0 {
            self.ncols = values.len();
        }
        assert_eq!(
            values.len(),
            self.ncols,
            "dimension mismatch: row of {} into {} columns",
            values.len(),
            self.ncols,
        );
        let new_rows = self.nrows + 1;
        let mut data = Vec::with_capacity(new_rows * self.ncols);
        for (j, &v) in values.iter().enumerate() {
            let col = &self.data[j * self.nrows..(j + 1) * self.nrows];
            data.extend_from_slice(&col[..i]);
            data.push(v);
            data.extend_from_slice(&col[i..]);
        }
        self.data = data;
        self.nrows = new_rows;
    }

    /// Remove row `i`.
    pub fn delete_row(&mut self, i: usize) {
        assert!(i < self.nrows, "row {} out of range for {} rows", i, self.nrows);
        let n = self.nrows;
        let mut k = 0usize;
        self.data.retain(|_| {
            let keep = k % n != i;
            k += 1;
            keep
        });
        self.nrows -= 1;
    }

    /// Remove column `j`.
    pub fn delete_col(&mut self, j: usize) {
        assert!(j < self.ncols, "column {} out of range for {} columns", j, self.ncols);
        self.data.drain(j * self.nrows..(j + 1) * self.nrows);
        self.ncols -= 1;
    }
}
