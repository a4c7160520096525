//! Growable sparse weight store

use std::collections::BTreeMap;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sparse 2-D store keyed by a row-major linear index.
///
/// The allocated bound (`rows` x `cols`) only ever grows, by doubling, so a
/// stream of inserts pays for re-keying a logarithmic number of times. The
/// logical size tracks the region actually in use and is what readers copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizableSparseMatrix {
    rows: usize,
    cols: usize,
    logical_rows: usize,
    logical_cols: usize,
    entries: BTreeMap<usize, f64>,
}

impl ResizableSparseMatrix {
    /// Create an empty matrix with the given allocated bound
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            logical_rows: 0,
            logical_cols: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Allocated bound as (rows, cols)
    pub fn capacity(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Region in use as (rows, cols)
    pub fn logical_size(&self) -> (usize, usize) {
        (self.logical_rows, self.logical_cols)
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    fn key(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    fn position(&self, key: usize) -> (usize, usize) {
        (key / self.cols, key % self.cols)
    }

    fn check_bounds(&self, i: usize, j: usize) {
        assert!(
            i < self.rows && j < self.cols,
            "cell ({}, {}) is outside the allocated {}x{} bound",
            i,
            j,
            self.rows,
            self.cols
        );
    }

    fn touch(&mut self, i: usize, j: usize) {
        self.logical_rows = self.logical_rows.max(i + 1);
        self.logical_cols = self.logical_cols.max(j + 1);
    }

    /// Value at (i, j); cells that were never written read as zero
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i >= self.rows || j >= self.cols {
            return 0.0;
        }
        self.entries.get(&self.key(i, j)).copied().unwrap_or(0.0)
    }

    /// Overwrite the value at (i, j)
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.check_bounds(i, j);
        let key = self.key(i, j);
        self.entries.insert(key, value);
        self.touch(i, j);
    }

    /// Add `delta` to the value at (i, j)
    pub fn accumulate(&mut self, i: usize, j: usize, delta: f64) {
        self.check_bounds(i, j);
        let key = self.key(i, j);
        *self.entries.entry(key).or_insert(0.0) += delta;
        self.touch(i, j);
    }

    /// Grow the allocated bound to the next power of two covering the request.
    ///
    /// Existing entries keep their (row, col) position. Asking for a smaller
    /// bound in either dimension is rejected.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        if rows < self.rows || cols < self.cols {
            return Err(Error::Dimension {
                operation: "resize",
                from: (self.rows, self.cols),
                to: (rows, cols),
            });
        }

        let new_rows = if rows == self.rows { rows } else { rows.next_power_of_two() };
        let new_cols = if cols == self.cols { cols } else { cols.next_power_of_two() };
        self.reallocate(new_rows, new_cols);

        Ok(())
    }

    /// Make sure the logical region covers (rows, cols), doubling the
    /// allocated bound only when the region would not fit
    pub fn ensure_logical_size(&mut self, rows: usize, cols: usize) {
        if rows > self.rows || cols > self.cols {
            let new_rows = grown_bound(self.rows, rows);
            let new_cols = grown_bound(self.cols, cols);
            log::debug!(
                "Growing weight matrix from {}x{} to {}x{}",
                self.rows,
                self.cols,
                new_rows,
                new_cols
            );
            self.reallocate(new_rows, new_cols);
        }

        self.logical_rows = self.logical_rows.max(rows);
        self.logical_cols = self.logical_cols.max(cols);
    }

    fn reallocate(&mut self, rows: usize, cols: usize) {
        if cols == self.cols {
            self.rows = rows;
            return;
        }

        // Linear keys depend on the column bound, so every entry is re-keyed
        let old = std::mem::take(&mut self.entries);
        let old_cols = self.cols;
        self.rows = rows;
        self.cols = cols;

        for (key, value) in old {
            let (i, j) = (key / old_cols, key % old_cols);
            self.entries.insert(i * cols + j, value);
        }
    }

    /// Stored entries in row-major order as (row, col, value)
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.entries.iter().map(move |(&key, &value)| {
            let (i, j) = self.position(key);
            (i, j, value)
        })
    }

    /// Stored entries of row `i` as (col, value)
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = if i < self.rows {
            self.key(i, 0)..self.key(i, 0) + self.cols
        } else {
            0..0
        };
        self.entries
            .range(range)
            .map(move |(&key, &value)| (key % self.cols, value))
    }

    /// Copy the entries inside the top-left `rows` x `cols` region
    pub fn copy_region(&self, rows: usize, cols: usize) -> ResizableSparseMatrix {
        let mut copy = ResizableSparseMatrix::new(rows, cols);
        for (i, j, value) in self.iter() {
            if i >= rows {
                break;
            }
            if j < cols {
                copy.set(i, j, value);
            }
        }
        copy
    }
}

fn grown_bound(current: usize, required: usize) -> usize {
    let mut bound = current.max(1);
    while bound < required {
        bound *= 2;
    }
    bound
}

impl AddAssign<f64> for ResizableSparseMatrix {
    fn add_assign(&mut self, rhs: f64) {
        self.entries.values_mut().for_each(|v| *v += rhs);
    }
}

impl SubAssign<f64> for ResizableSparseMatrix {
    fn sub_assign(&mut self, rhs: f64) {
        self.entries.values_mut().for_each(|v| *v -= rhs);
    }
}

impl MulAssign<f64> for ResizableSparseMatrix {
    fn mul_assign(&mut self, rhs: f64) {
        self.entries.values_mut().for_each(|v| *v *= rhs);
    }
}

impl DivAssign<f64> for ResizableSparseMatrix {
    fn div_assign(&mut self, rhs: f64) {
        self.entries.values_mut().for_each(|v| *v /= rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResizableSparseMatrix {
        let mut m = ResizableSparseMatrix::new(2, 2);
        m.set(0, 0, 1.0);
        m.set(1, 0, 3.0);
        m.set(1, 1, -2.0);
        m
    }

    #[test]
    fn test_resize_preserves_entries() {
        let mut m = sample();
        m.resize(4, 4).unwrap();

        assert_eq!(m.capacity(), (4, 4));
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(1, 0), 3.0);
        assert_eq!(m.get(1, 1), -2.0);
        assert_eq!(m.get(0, 1), 0.0);
        assert_eq!(m.nnz(), 3);
    }

    #[test]
    fn test_resize_rounds_up_to_power_of_two() {
        let mut m = sample();
        m.resize(5, 3).unwrap();
        assert_eq!(m.capacity(), (8, 4));
        assert_eq!(m.get(1, 1), -2.0);
    }

    #[test]
    fn test_resize_rejects_shrinking() {
        let mut m = ResizableSparseMatrix::new(4, 4);
        let err = m.resize(2, 8).unwrap_err();
        assert!(matches!(err, Error::Dimension { operation: "resize", .. }));
        assert_eq!(m.capacity(), (4, 4));
    }

    #[test]
    fn test_rectangular_growth_rekeys_entries() {
        let mut m = ResizableSparseMatrix::new(2, 3);
        m.set(1, 2, 7.0);
        m.set(0, 1, 5.0);
        m.ensure_logical_size(3, 9);

        assert_eq!(m.capacity(), (4, 12));
        assert_eq!(m.get(1, 2), 7.0);
        assert_eq!(m.get(0, 1), 5.0);
        assert_eq!(m.logical_size(), (3, 9));
    }

    #[test]
    fn test_logical_size_is_distinct_from_capacity() {
        let mut m = ResizableSparseMatrix::new(16, 16);
        m.ensure_logical_size(3, 3);
        assert_eq!(m.logical_size(), (3, 3));
        assert_eq!(m.capacity(), (16, 16));

        m.ensure_logical_size(17, 2);
        assert_eq!(m.capacity(), (32, 16));
        assert_eq!(m.logical_size(), (17, 3));
    }

    #[test]
    fn test_scalar_operations_touch_only_stored_entries() {
        let mut m = sample();
        m += 3.0;
        assert_eq!(m.get(0, 0), 4.0);
        assert_eq!(m.get(1, 0), 6.0);
        assert_eq!(m.get(1, 1), 1.0);
        assert_eq!(m.get(0, 1), 0.0);

        let mut m = sample();
        m -= 2.0;
        assert_eq!(m.get(1, 1), -4.0);
        assert_eq!(m.get(0, 1), 0.0);

        let mut m = sample();
        m *= 3.0;
        assert_eq!(m.get(1, 0), 9.0);
        assert_eq!(m.get(1, 1), -6.0);

        let mut m = sample();
        m /= 2.0;
        assert_eq!(m.get(0, 0), 0.5);
        assert_eq!(m.get(1, 1), -1.0);
    }

    #[test]
    fn test_accumulate_and_row_iteration() {
        let mut m = ResizableSparseMatrix::new(4, 4);
        m.accumulate(2, 3, 1.5);
        m.accumulate(2, 3, 1.0);
        m.accumulate(2, 0, -1.0);
        m.accumulate(3, 1, 4.0);

        let row: Vec<(usize, f64)> = m.row(2).collect();
        assert_eq!(row, vec![(0, -1.0), (3, 2.5)]);
        assert_eq!(m.row(9).count(), 0);

        let all: Vec<(usize, usize, f64)> = m.iter().collect();
        assert_eq!(all, vec![(2, 0, -1.0), (2, 3, 2.5), (3, 1, 4.0)]);
    }

    #[test]
    fn test_copy_region_is_bounded() {
        let mut m = ResizableSparseMatrix::new(4, 4);
        m.set(0, 0, 1.0);
        m.set(0, 3, 2.0);
        m.set(3, 0, 3.0);
        m.set(1, 1, 4.0);

        let copy = m.copy_region(2, 2);
        assert_eq!(copy.capacity(), (2, 2));
        assert_eq!(copy.nnz(), 2);
        assert_eq!(copy.get(1, 1), 4.0);
    }

    #[test]
    #[should_panic(expected = "outside the allocated")]
    fn test_writes_outside_the_bound_panic() {
        let mut m = ResizableSparseMatrix::new(2, 2);
        m.set(2, 0, 1.0);
    }
}
