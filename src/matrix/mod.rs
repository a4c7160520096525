//! Sparse storage and the operators the ranking pipeline multiplies with

pub mod csr;
pub mod rank_one;
pub mod resizable;

use std::ops::Range;

use ndarray::Array1;

pub use csr::CsrMatrix;
pub use rank_one::RankOneMatrix;
pub use resizable::ResizableSparseMatrix;

/// Anything that can be multiplied with a dense vector.
///
/// Sparse and rank-one operands go through the same capability so the
/// solver never needs to know how a correction is represented.
pub trait LinearOperator: Send + Sync {
    /// (rows, cols)
    fn shape(&self) -> (usize, usize);

    /// Matrix-vector product; panics if `x` does not have `cols` entries
    fn apply(&self, x: &Array1<f64>) -> Array1<f64>;
}

/// Split `0..len` into at most `parts` contiguous ranges of
/// `ceil(len / parts)` elements (the last one may be shorter)
pub fn split_range(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let chunk = if len <= parts { 1 } else { len.div_ceil(parts) };

    let mut ranges = Vec::with_capacity(parts.min(len));
    let mut start = 0;
    while start < len {
        let end = (start + chunk).min(len);
        ranges.push(start..end);
        start = end;
    }
    ranges
}
