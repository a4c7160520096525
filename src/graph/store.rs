//! Thread-safe accumulation of relation weights into typed blocks

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{DecayManager, NodeLayout, NodeRegistry, NodeType, Relation, RelationFilter};
use crate::matrix::ResizableSparseMatrix;

/// Allocated bound of a freshly created block
pub const INITIAL_CAPACITY: usize = 1024;

/// Label carried by the reserved node of each type in phantom mode
pub const PHANTOM_LABEL: &str = "<phantom>";

/// One block per (target type, source type): rows are targets, columns are
/// sources
type Blocks = BTreeMap<(NodeType, NodeType), ResizableSparseMatrix>;

#[derive(Debug, Default)]
struct WeightState {
    blocks: Blocks,
    total_handled_blocks: u64,
}

/// Everything the store owns, detached from its locks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub phantom_nodes: bool,
    pub total_handled_blocks: u64,
    pub registries: BTreeMap<NodeType, NodeRegistry>,
    pub blocks: Vec<((NodeType, NodeType), ResizableSparseMatrix)>,
}

/// Square copy of all blocks over the concatenated id space
#[derive(Debug, Clone)]
pub struct WorkingSet {
    pub matrix: ResizableSparseMatrix,
    pub layout: NodeLayout,
}

struct Cell {
    source_type: NodeType,
    target_type: NodeType,
    source: usize,
    target: usize,
    weight: f64,
    reverse_weight: f64,
}

/// Accumulates relation blocks into per-type weight matrices.
///
/// The convention is inlink style: a relation adds its `weight` to the
/// (target, source) cell and its `reverse_weight` to the (source, target)
/// cell, so column `j` holds everything node `j` points at.
///
/// Locks are always taken weights first, registries second.
pub struct RelationGraphStore {
    weights: Mutex<WeightState>,
    registries: Mutex<BTreeMap<NodeType, NodeRegistry>>,
    decay: DecayManager,
    filter: Option<Box<dyn RelationFilter>>,
    recognized: Option<BTreeSet<String>>,
    phantom_nodes: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // The guarded data is plain numeric state that stays consistent even if
    // a holder panicked
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn registry_for(
    registries: &mut BTreeMap<NodeType, NodeRegistry>,
    node_type: NodeType,
    phantom_nodes: bool,
) -> &mut NodeRegistry {
    registries.entry(node_type).or_insert_with(|| {
        let mut registry = NodeRegistry::new();
        if phantom_nodes {
            registry.reserve(PHANTOM_LABEL);
        }
        registry
    })
}

fn block_for<'a>(
    blocks: &'a mut Blocks,
    rows: NodeType,
    cols: NodeType,
    sizes: &BTreeMap<NodeType, usize>,
) -> &'a mut ResizableSparseMatrix {
    let block = blocks
        .entry((rows, cols))
        .or_insert_with(|| ResizableSparseMatrix::new(INITIAL_CAPACITY, INITIAL_CAPACITY));
    let size = |t: NodeType| sizes.get(&t).copied().unwrap_or(0);
    block.ensure_logical_size(size(rows), size(cols));
    block
}

impl RelationGraphStore {
    pub fn new(decay: DecayManager, phantom_nodes: bool) -> Self {
        Self {
            weights: Mutex::new(WeightState::default()),
            registries: Mutex::new(BTreeMap::new()),
            decay,
            filter: None,
            recognized: None,
            phantom_nodes,
        }
    }

    /// Drop relations the filter rejects before they touch the store
    pub fn with_filter(mut self, filter: impl RelationFilter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Only the named relation kinds carry weight; others still register
    /// their endpoints but contribute zero
    pub fn with_recognized<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recognized = Some(names.into_iter().map(Into::into).collect());
        self
    }

    fn recognizes(&self, relation: &Relation) -> bool {
        self.recognized
            .as_ref()
            .map_or(true, |names| names.contains(relation.name()))
    }

    /// Fold one block of relations into the weight matrices
    pub fn add_block(&self, relations: &[Relation]) {
        let mut weights = lock(&self.weights);
        weights.total_handled_blocks += 1;

        let accepted: Vec<&Relation> = relations
            .iter()
            .filter(|r| self.filter.as_ref().map_or(true, |f| f.check(r)))
            .collect();

        let (cells, sizes) = {
            let mut registries = lock(&self.registries);

            let cells: Vec<Cell> = accepted
                .iter()
                .map(|relation| {
                    let policy = relation.policy();
                    let source = registry_for(&mut registries, policy.source_type, self.phantom_nodes)
                        .get_or_insert(&relation.source);
                    let target = registry_for(&mut registries, policy.target_type, self.phantom_nodes)
                        .get_or_insert(&relation.target);

                    let factor = if self.recognizes(relation) {
                        self.decay.factor_for(policy.decayable, relation.height)
                    } else {
                        0.0
                    };

                    Cell {
                        source_type: policy.source_type,
                        target_type: policy.target_type,
                        source,
                        target,
                        weight: factor * policy.weight as f64,
                        reverse_weight: factor * policy.reverse_weight as f64,
                    }
                })
                .collect();

            let sizes: BTreeMap<NodeType, usize> =
                registries.iter().map(|(&t, r)| (t, r.len())).collect();
            (cells, sizes)
        };

        for cell in &cells {
            if cell.weight != 0.0 {
                block_for(&mut weights.blocks, cell.target_type, cell.source_type, &sizes)
                    .accumulate(cell.target, cell.source, cell.weight);
            }
            if cell.reverse_weight != 0.0 {
                block_for(&mut weights.blocks, cell.source_type, cell.target_type, &sizes)
                    .accumulate(cell.source, cell.target, cell.reverse_weight);
            }
        }

        log::debug!(
            "Handled block #{}: {} of {} relations accepted",
            weights.total_handled_blocks,
            accepted.len(),
            relations.len()
        );
    }

    /// Count `count` blocks as handled without touching any weights
    pub fn skip_blocks(&self, count: u64) {
        let mut weights = lock(&self.weights);
        weights.total_handled_blocks += count;
    }

    pub fn total_handled_blocks(&self) -> u64 {
        lock(&self.weights).total_handled_blocks
    }

    /// Number of ids per node type, phantoms included
    pub fn node_counts(&self) -> BTreeMap<NodeType, usize> {
        let _weights = lock(&self.weights);
        let registries = lock(&self.registries);
        registries.iter().map(|(&t, r)| (t, r.len())).collect()
    }

    /// Copy the logical region of every block into one square matrix.
    ///
    /// Later blocks never affect the copy.
    pub fn working_copy(&self) -> WorkingSet {
        let weights = lock(&self.weights);
        let registries = lock(&self.registries);

        let layout = NodeLayout::from_registries(&registries);
        let n = layout.len();
        let mut matrix = ResizableSparseMatrix::new(n, n);

        for (&(rows, cols), block) in &weights.blocks {
            let (Some(row_part), Some(col_part)) = (layout.partition(rows), layout.partition(cols)) else {
                continue;
            };
            let (height, width) = (row_part.range.len(), col_part.range.len());

            for (i, j, value) in block.iter() {
                if i < height && j < width {
                    matrix.set(row_part.range.start + i, col_part.range.start + j, value);
                }
            }
        }

        log::debug!("Copied {} weights over {} nodes", matrix.nnz(), n);
        WorkingSet { matrix, layout }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let weights = lock(&self.weights);
        let registries = lock(&self.registries);

        StoreSnapshot {
            phantom_nodes: self.phantom_nodes,
            total_handled_blocks: weights.total_handled_blocks,
            registries: registries.clone(),
            blocks: weights
                .blocks
                .iter()
                .map(|(&key, block)| (key, block.clone()))
                .collect(),
        }
    }

    /// Replace the whole state with a snapshot taken in the same mode
    pub fn restore(&self, snapshot: StoreSnapshot) -> Result<()> {
        if snapshot.phantom_nodes != self.phantom_nodes {
            return Err(Error::io(
                "restoring relation graph",
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "snapshot was taken with a different calculation mode",
                ),
            ));
        }

        let mut weights = lock(&self.weights);
        let mut registries = lock(&self.registries);

        weights.total_handled_blocks = snapshot.total_handled_blocks;
        weights.blocks = snapshot.blocks.into_iter().collect();
        *registries = snapshot.registries;

        Ok(())
    }
}
