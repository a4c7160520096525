//! Frozen compressed-row matrix used inside the power iteration

use ndarray::Array1;
use rayon::prelude::*;

use crate::matrix::{split_range, LinearOperator, ResizableSparseMatrix};

/// Compressed sparse row matrix.
///
/// Built once per calculation from a bounded working copy; rows are
/// contiguous so the product can hand disjoint row ranges to workers.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build from unordered (row, col, value) triplets, summing duplicates
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        row_ptr.push(0);

        let mut current_row = 0;
        for (i, j, value) in triplets {
            assert!(i < rows && j < cols, "triplet ({}, {}) outside {}x{}", i, j, rows, cols);

            while current_row < i {
                row_ptr.push(col_idx.len());
                current_row += 1;
            }

            let row_start = row_ptr[current_row];
            if col_idx.len() > row_start && col_idx[col_idx.len() - 1] == j {
                if let Some(last) = values.last_mut() {
                    *last += value;
                }
            } else {
                col_idx.push(j);
                values.push(value);
            }
        }

        while row_ptr.len() < rows + 1 {
            row_ptr.push(col_idx.len());
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Freeze the top-left `rows` x `cols` region of a sparse store
    pub fn from_sparse(m: &ResizableSparseMatrix, rows: usize, cols: usize) -> Self {
        let triplets = m
            .iter()
            .filter(|&(i, j, value)| i < rows && j < cols && value != 0.0)
            .collect();
        Self::from_triplets(rows, cols, triplets)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored entries of row `i` as (col, value)
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// All stored entries as (row, col, value)
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.rows).flat_map(move |i| self.row(i).map(move |(j, v)| (i, j, v)))
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i >= self.rows {
            return 0.0;
        }
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        match self.col_idx[range.clone()].binary_search(&j) {
            Ok(pos) => self.values[range.start + pos],
            Err(_) => 0.0,
        }
    }

    /// Multiply every stored entry of column `j` by `factors[j]`
    pub fn scale_columns(&mut self, factors: &[f64]) {
        assert_eq!(factors.len(), self.cols, "one factor per column is required");
        for (value, &j) in self.values.iter_mut().zip(self.col_idx.iter()) {
            *value *= factors[j];
        }
    }

    /// Sum of the stored entries of each column
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for (&j, &value) in self.col_idx.iter().zip(self.values.iter()) {
            sums[j] += value;
        }
        sums
    }

    /// Divide each column by its sum; all-zero columns are left untouched
    pub fn normalize_columns(&mut self) {
        let factors: Vec<f64> = self
            .column_sums()
            .into_iter()
            .map(|sum| if sum != 0.0 { 1.0 / sum } else { 1.0 })
            .collect();
        self.scale_columns(&factors);
    }

    fn row_dot(&self, i: usize, x: &[f64]) -> f64 {
        self.row(i).map(|(j, value)| value * x[j]).sum()
    }
}

impl LinearOperator for CsrMatrix {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Parallel product over row ranges, one range per worker of the
    /// current rayon pool
    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        assert_eq!(x.len(), self.cols, "vector length must match matrix columns");

        let input = x.to_vec();
        let ranges = split_range(self.rows, rayon::current_num_threads());

        let parts: Vec<Vec<f64>> = ranges
            .into_par_iter()
            .map(|range| range.map(|i| self.row_dot(i, &input)).collect())
            .collect();

        Array1::from(parts.concat())
    }
}
