//! Outer-product correction matrices

use itertools::Itertools;
use ndarray::{Array1, Array2};

use crate::matrix::LinearOperator;

/// Matrix `left * right^T` kept as its two generators.
///
/// Dangling-column mass is spread over whole columns; storing it this way
/// keeps every product O(n) instead of densifying the transition matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct RankOneMatrix {
    left: Array1<f64>,
    right: Array1<f64>,
}

impl RankOneMatrix {
    pub fn new(left: Array1<f64>, right: Array1<f64>) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &Array1<f64> {
        &self.left
    }

    pub fn right(&self) -> &Array1<f64> {
        &self.right
    }

    /// Value of cell (i, j)
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.left[i] * self.right[j]
    }

    /// Multiply the matrix by a scalar
    pub fn scale(&mut self, factor: f64) {
        self.right *= factor;
    }

    /// Sum of column `j`
    pub fn column_sum(&self, j: usize) -> f64 {
        self.left.sum() * self.right[j]
    }

    /// Dense equivalent
    pub fn materialize(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.left.len(), self.right.len()));
        for ((i, j), cell) in dense.indexed_iter_mut() {
            *cell = self.left[i] * self.right[j];
        }
        dense
    }
}

impl LinearOperator for RankOneMatrix {
    fn shape(&self) -> (usize, usize) {
        (self.left.len(), self.right.len())
    }

    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        assert_eq!(x.len(), self.right.len(), "vector length must match matrix columns");
        let dot: f64 = self.right.iter().zip_eq(x.iter()).map(|(r, v)| r * v).sum();
        &self.left * dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_matches_dense_form() {
        let mut m = RankOneMatrix::new(
            Array1::from(vec![1.0, 0.0, 0.0, 0.0, -1.0]),
            Array1::from(vec![1.0, 2.0, 3.0, 4.0]),
        );
        m.scale(2.0);

        let v = Array1::from(vec![1.0, 1.0, 1.0, 1.0]);
        let product = m.apply(&v);
        assert_eq!(product.to_vec(), vec![20.0, 0.0, 0.0, 0.0, -20.0]);
        assert_eq!(m.materialize().dot(&v), product);
        assert_eq!(m.shape(), (5, 4));
        assert_eq!(m.get(4, 3), -8.0);
    }

    #[test]
    fn test_column_sum() {
        let m = RankOneMatrix::new(
            Array1::from(vec![0.25, 0.25, 0.5]),
            Array1::from(vec![0.0, 2.0, 1.0]),
        );
        assert_eq!(m.column_sum(0), 0.0);
        assert_eq!(m.column_sum(1), 2.0);
        assert_eq!(m.materialize().column(1).sum(), 2.0);
    }
}
