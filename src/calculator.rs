//! Public entry point: ingest relation blocks, compute per-node scores

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

use ndarray::Array1;

use crate::cluster::ClusterAssignment;
use crate::config::{CalculationMode, CorrectionScope, Parameters, RankAlgorithm};
use crate::error::Result;
use crate::graph::{
    builder, CompressedGraph, DecayManager, NodeLayout, NodeType, Relation, RelationFilter, RelationGraphStore,
    RelationKind, TransferFilter, WorkingSet,
};
use crate::rank::{OutlinkNormalizer, RankSolver};
use crate::storage::snapshot;

/// Score per external id, grouped by node type
pub type Scores = BTreeMap<NodeType, BTreeMap<String, f64>>;

/// Relation kinds the social network calculator gives weight to
pub const SOCIAL_RELATIONS: [&str; 8] = [
    RelationKind::UPVOTE,
    RelationKind::DOWNVOTE,
    RelationKind::TRUST,
    RelationKind::FOLLOW,
    RelationKind::OWNERSHIP,
    RelationKind::REPOST,
    RelationKind::MEMBERSHIP,
    RelationKind::COMMENT,
];

/// Structural clustering of the current graph, for inspection and export
#[derive(Debug, Clone)]
pub struct Clustering {
    pub layout: NodeLayout,
    pub graph: CompressedGraph,
    pub assignment: ClusterAssignment,
}

/// Incremental ranking engine.
///
/// Blocks may be added from several threads while calculations run; every
/// calculation works on a copy of the graph taken when it starts.
pub struct IndexCalculator {
    params: Parameters,
    store: RelationGraphStore,
    normalizer: OutlinkNormalizer,
    solver: RankSolver,
}

impl IndexCalculator {
    /// Calculator that accepts every relation as is
    pub fn new(params: Parameters) -> Result<Self> {
        Self::build(params, |store| store)
    }

    /// Calculator that drops relations rejected by `filter`
    pub fn with_filter(params: Parameters, filter: impl RelationFilter + 'static) -> Result<Self> {
        Self::build(params, |store| store.with_filter(filter))
    }

    /// Token transfer ranking: thresholds on amount and balances, negative
    /// weights clamped, cluster-smoothed rank
    pub fn for_transfer(params: Parameters) -> Result<Self> {
        let params = Parameters {
            calculation_mode: CalculationMode::Direct,
            disable_negative_weights: true,
            algorithm: RankAlgorithm::NcdAwareRank,
            correction_scope: CorrectionScope::Global,
            ..params
        };
        let filter = TransferFilter::new(&params);

        Self::build(params, |store| {
            store
                .with_filter(filter)
                .with_recognized([RelationKind::TRANSFER])
        })
    }

    /// Social activity ranking: phantom nodes absorb inactive columns,
    /// negative weights are kept, plain rank with per-type corrections
    pub fn for_social_network(params: Parameters) -> Result<Self> {
        let params = Parameters {
            calculation_mode: CalculationMode::PhantomAccount,
            disable_negative_weights: false,
            algorithm: RankAlgorithm::PageRank,
            correction_scope: CorrectionScope::PerType,
            ..params
        };

        Self::build(params, |store| store.with_recognized(SOCIAL_RELATIONS))
    }

    fn build(params: Parameters, configure: impl FnOnce(RelationGraphStore) -> RelationGraphStore) -> Result<Self> {
        params.validate()?;

        let solver = RankSolver::new(&params)?;
        let normalizer = OutlinkNormalizer::from_parameters(&params);
        let store = configure(RelationGraphStore::new(
            DecayManager::from_parameters(&params),
            params.calculation_mode == CalculationMode::PhantomAccount,
        ));

        log::debug!("Created calculator with {:?}", params);

        Ok(Self {
            params,
            store,
            normalizer,
            solver,
        })
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn add_block(&self, relations: &[Relation]) {
        self.store.add_block(relations);
    }

    /// Count empty blocks without changing any weight
    pub fn skip_blocks(&self, count: u64) {
        self.store.skip_blocks(count);
    }

    pub fn get_total_handled_block_count(&self) -> u64 {
        self.store.total_handled_blocks()
    }

    /// Scores with uniform teleportation over all known nodes
    pub fn calculate(&self) -> Scores {
        let working = self.store.working_copy();
        let weight = uniform(&working.layout);
        self.rank(working, weight)
    }

    /// Scores with teleportation proportional to `priority`. Missing or
    /// negative priorities count as zero; an all-zero priority falls back to
    /// uniform.
    pub fn calculate_with_priority(&self, priority: &Scores) -> Scores {
        let working = self.store.working_copy();
        let layout = &working.layout;

        let mut weight = Array1::zeros(layout.len());
        for partition in layout.partitions() {
            let Some(by_id) = priority.get(&partition.node_type) else {
                continue;
            };
            for idx in partition.range.clone() {
                if !layout.is_reserved(idx) {
                    weight[idx] = by_id.get(layout.label(idx)).copied().unwrap_or(0.0).max(0.0);
                }
            }
        }

        let total = weight.sum();
        let weight = if total > 0.0 { weight / total } else { uniform(layout) };
        self.rank(working, weight)
    }

    fn rank(&self, working: WorkingSet, weight: Array1<f64>) -> Scores {
        let WorkingSet { matrix, layout } = working;
        if layout.external_count() == 0 {
            return Scores::new();
        }

        let started = Instant::now();
        let transition = self.normalizer.normalize(&matrix, &layout, &weight);
        let outcome = self.solver.process(&transition, &weight, &weight);

        log::info!(
            "Ranked {} nodes in {} iterations ({:.2?})",
            layout.len(),
            outcome.iterations,
            started.elapsed()
        );

        let mut scores = Scores::new();
        for partition in layout.partitions() {
            for idx in partition.range.clone() {
                if !layout.is_reserved(idx) {
                    scores
                        .entry(partition.node_type)
                        .or_default()
                        .insert(layout.label(idx).to_string(), outcome.vector[idx]);
                }
            }
        }
        scores
    }

    /// SCAN over the current transition structure
    pub fn clustering(&self) -> Clustering {
        let WorkingSet { matrix, layout } = self.store.working_copy();
        let weight = uniform(&layout);
        let transition = self.normalizer.normalize(&matrix, &layout, &weight);

        let graph = builder::from_transition(&transition.matrix);
        let assignment = self.solver.cluster_graph(&graph);

        Clustering {
            layout,
            graph,
            assignment,
        }
    }

    pub fn save_state<W: Write>(&self, writer: W) -> Result<()> {
        snapshot::write_snapshot(writer, &self.store.snapshot())
    }

    /// Replace the current state; on error the state is left untouched
    pub fn load_state<R: Read>(&self, reader: R) -> Result<()> {
        let state = snapshot::read_snapshot(reader)?;
        self.store.restore(state)
    }

    pub fn save_state_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        snapshot::save_to_file(path.as_ref(), &self.store.snapshot())
    }

    pub fn load_state_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let state = snapshot::load_from_file(path.as_ref())?;
        self.store.restore(state)
    }
}

/// 1 / count on every external id, 0 on phantoms
fn uniform(layout: &NodeLayout) -> Array1<f64> {
    let count = layout.external_count();
    if count == 0 {
        return Array1::zeros(layout.len());
    }
    layout.external_mask() / count as f64
}

/// Rescale so all scores sum to `new_norm`; an all-zero map scales to empty
pub fn scale_scores(scores: &Scores, new_norm: f64) -> Scores {
    let old_norm: f64 = scores.values().flat_map(|by_id| by_id.values()).sum();
    if old_norm == 0.0 {
        return Scores::new();
    }

    let factor = new_norm / old_norm;
    scores
        .iter()
        .map(|(&node_type, by_id)| {
            let scaled = by_id.iter().map(|(id, &score)| (id.clone(), score * factor)).collect();
            (node_type, scaled)
        })
        .collect()
}

pub fn scale_scores_to_one(scores: &Scores) -> Scores {
    scale_scores(scores, 1.0)
}

/// Rescale so the mean score is 1
pub fn scale_scores_to_node_count(scores: &Scores) -> Scores {
    let count: usize = scores.values().map(BTreeMap::len).sum();
    if count == 0 {
        return Scores::new();
    }
    scale_scores(scores, count as f64)
}
