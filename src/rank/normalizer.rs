//! Column-stochastic transition matrices from raw weights

use ndarray::Array1;

use crate::config::{CalculationMode, CorrectionScope, Parameters};
use crate::graph::NodeLayout;
use crate::matrix::{CsrMatrix, RankOneMatrix, ResizableSparseMatrix};

/// Sparse transition part plus the rank-one corrections that complete it.
///
/// `matrix + sum(corrections)` is column stochastic with non-negative
/// entries under the `Global` and `PerType` scopes.
#[derive(Debug, Clone)]
pub struct Transition {
    pub matrix: CsrMatrix,
    pub corrections: Vec<RankOneMatrix>,
}

impl Transition {
    pub fn len(&self) -> usize {
        self.matrix.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.rows() == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnStats {
    sum: f64,
    min: f64,
}

/// Turns a working weight matrix into a `Transition`.
///
/// Column `j` gets a correction weight `c_j = -min_j` when it holds a
/// negative entry, `1` when it holds nothing, `0` otherwise. It is then
/// scaled by `f_j = 1 / (sum_j + N c_j)` and the correction carries
/// `c_j f_j` spread over `N` rows, where `N` and the rows depend on the
/// scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlinkNormalizer {
    scope: CorrectionScope,
    clamp_negative: bool,
    mode: CalculationMode,
}

impl OutlinkNormalizer {
    pub fn new(scope: CorrectionScope, clamp_negative: bool, mode: CalculationMode) -> Self {
        Self {
            scope,
            clamp_negative,
            mode,
        }
    }

    pub fn from_parameters(params: &Parameters) -> Self {
        Self::new(
            params.correction_scope,
            params.disable_negative_weights,
            params.calculation_mode,
        )
    }

    /// Normalize the working matrix over `layout`. `weights` is only read by
    /// the `Weighted` scope.
    pub fn normalize(&self, working: &ResizableSparseMatrix, layout: &NodeLayout, weights: &Array1<f64>) -> Transition {
        let n = layout.len();

        let mut triplets: Vec<(usize, usize, f64)> = working
            .iter()
            .filter(|&(i, j, value)| i < n && j < n && value != 0.0)
            .filter(|&(_, _, value)| !(self.clamp_negative && value < 0.0))
            .collect();

        if self.mode == CalculationMode::PhantomAccount {
            attach_phantoms(&mut triplets, layout);
        }

        let mut matrix = CsrMatrix::from_triplets(n, n, triplets);
        let stats = column_stats(&matrix);

        let mut factors = vec![0.0; n];
        let corrections = match self.scope {
            CorrectionScope::Global => {
                let right = column_corrections(&stats, 0..n, n as f64, &mut factors);
                vec![RankOneMatrix::new(Array1::ones(n), right)]
            }
            CorrectionScope::PerType => per_type_corrections(&matrix, &stats, layout, &mut factors),
            CorrectionScope::Weighted => {
                let right = column_corrections(&stats, 0..n, 1.0, &mut factors);
                vec![RankOneMatrix::new(distribution(weights, n), right)]
            }
        };

        matrix.scale_columns(&factors);

        log::debug!(
            "Normalized {} columns into {} entries and {} corrections",
            n,
            matrix.nnz(),
            corrections.len()
        );

        Transition { matrix, corrections }
    }
}

/// Link every external column with no positive mass to the phantom node of
/// its own type. Phantom columns are left empty.
fn attach_phantoms(triplets: &mut Vec<(usize, usize, f64)>, layout: &NodeLayout) {
    let mut has_positive = vec![false; layout.len()];
    for &(_, j, value) in triplets.iter() {
        if value > 0.0 {
            has_positive[j] = true;
        }
    }

    for partition in layout.partitions() {
        let Some(phantom) = partition.phantom else {
            continue;
        };
        for j in partition.range.clone() {
            if !has_positive[j] && !layout.is_reserved(j) {
                triplets.push((phantom, j, 1.0));
            }
        }
    }
}

fn column_stats(matrix: &CsrMatrix) -> Vec<ColumnStats> {
    let mut stats = vec![ColumnStats { sum: 0.0, min: 0.0 }; matrix.cols()];
    for (_, j, value) in matrix.iter() {
        stats[j].sum += value;
        stats[j].min = stats[j].min.min(value);
    }
    stats
}

/// `-min` for a column holding a negative entry, `1` for an empty column
fn lift(stats: ColumnStats) -> f64 {
    if stats.min < 0.0 {
        -stats.min
    } else if stats.sum == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Column factor and the per-row share of its correction when the
/// correction is spread over `spread` rows
fn scale_column(stats: ColumnStats, correction: f64, spread: f64) -> (f64, f64) {
    let denominator = stats.sum + spread * correction;
    if denominator > 0.0 {
        (1.0 / denominator, correction / denominator)
    } else {
        // Nothing usable left in the column: route it uniformly
        (0.0, 1.0 / spread)
    }
}

/// Fill `factors` for the columns in `columns` and return the right
/// generator of their correction (zero outside `columns`)
fn column_corrections(
    stats: &[ColumnStats],
    columns: std::ops::Range<usize>,
    spread: f64,
    factors: &mut [f64],
) -> Array1<f64> {
    let mut right = Array1::zeros(stats.len());

    for j in columns {
        let (factor, share) = scale_column(stats[j], lift(stats[j]), spread);
        factors[j] = factor;
        right[j] = share;
    }

    right
}

/// One correction per row type. An empty column spreads over its own type;
/// a column with negative entries is lifted over every type its entries
/// sit in, so each of those entries ends up non-negative.
fn per_type_corrections(
    matrix: &CsrMatrix,
    stats: &[ColumnStats],
    layout: &NodeLayout,
    factors: &mut [f64],
) -> Vec<RankOneMatrix> {
    let n = layout.len();
    let partitions = layout.partitions();

    let mut partition_of = vec![0; n];
    for (p, partition) in partitions.iter().enumerate() {
        for i in partition.range.clone() {
            partition_of[i] = p;
        }
    }

    // Bit p set when the column has an entry in a row of partition p
    let mut touched = vec![0u32; n];
    for (i, j, _) in matrix.iter() {
        touched[j] |= 1 << partition_of[i];
    }

    let mut rights = vec![Array1::<f64>::zeros(n); partitions.len()];

    for (p, partition) in partitions.iter().enumerate() {
        for j in partition.range.clone() {
            let correction = lift(stats[j]);
            let rows = if stats[j].min < 0.0 {
                touched[j]
            } else if correction > 0.0 {
                1 << p
            } else {
                0
            };

            let spread: usize = partitions
                .iter()
                .enumerate()
                .filter(|&(q, _)| rows & (1 << q) != 0)
                .map(|(_, q)| q.range.len())
                .sum();
            if spread == 0 {
                factors[j] = 1.0 / stats[j].sum;
                continue;
            }

            let (factor, share) = scale_column(stats[j], correction, spread as f64);
            factors[j] = factor;
            for (q, right) in rights.iter_mut().enumerate() {
                if rows & (1 << q) != 0 {
                    right[j] = share;
                }
            }
        }
    }

    rights
        .into_iter()
        .zip(partitions)
        .filter(|(right, _)| right.iter().any(|&r| r != 0.0))
        .map(|(right, partition)| RankOneMatrix::new(layout.type_mask(partition.node_type), right))
        .collect()
}

/// `weights` scaled to sum 1, or uniform when it carries no mass
fn distribution(weights: &Array1<f64>, n: usize) -> Array1<f64> {
    let total = weights.sum();
    if weights.len() == n && total > 0.0 {
        weights / total
    } else {
        Array1::from_elem(n, 1.0 / n as f64)
    }
}
