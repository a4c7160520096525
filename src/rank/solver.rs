//! Power iteration over a transition and its corrections

use ndarray::Array1;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::cluster::{ClusterAssignment, StructuralClusterer};
use crate::config::{Parameters, RankAlgorithm};
use crate::error::Result;
use crate::graph::{builder, CompressedGraph};
use crate::matrix::{CsrMatrix, LinearOperator};
use crate::rank::interlevel;
use crate::rank::Transition;

/// Hard cap on power iterations
pub const MAX_ITERATIONS: usize = 1000;

/// Result of one solver run
#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub vector: Array1<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Runs plain PageRank or the cluster-smoothed NCD-aware variant:
///
/// ```text
/// next = ow * (T + C) * p  [+ iw * S * (L * p)]  + tw * w
/// ```
///
/// where `tw` is whatever weight `ow` (and `iw`) leave over.
pub struct RankSolver {
    algorithm: RankAlgorithm,
    outlink_weight: f64,
    interlevel_weight: f64,
    teleportation_weight: f64,
    precision: f64,
    clusterer: StructuralClusterer,
    pool: ThreadPool,
}

impl RankSolver {
    pub fn new(params: &Parameters) -> Result<Self> {
        params.validate()?;

        let pool = ThreadPoolBuilder::new().num_threads(params.num_threads).build()?;

        Ok(Self {
            algorithm: params.algorithm,
            outlink_weight: params.outlink_weight,
            interlevel_weight: params.interlevel_weight,
            teleportation_weight: params.teleportation_weight(),
            precision: params.rank_calculation_precision,
            clusterer: StructuralClusterer::new(params.clustering_e, params.clustering_m),
            pool,
        })
    }

    /// SCAN over an undirected graph
    pub fn cluster_graph(&self, graph: &CompressedGraph) -> ClusterAssignment {
        self.pool.install(|| self.clusterer.process(graph))
    }

    /// SCAN over the undirected, unweighted view of `matrix`
    pub fn cluster(&self, matrix: &CsrMatrix) -> ClusterAssignment {
        self.cluster_graph(&builder::from_transition(matrix))
    }

    /// Iterate from `initial` with teleportation towards `weight` until the
    /// L1 change drops to the precision or `MAX_ITERATIONS` is reached
    pub fn process(&self, transition: &Transition, initial: &Array1<f64>, weight: &Array1<f64>) -> RankOutcome {
        let n = transition.len();
        assert_eq!(initial.len(), n, "initial vector must cover every node");
        assert_eq!(weight.len(), n, "weight vector must cover every node");

        if n == 0 {
            return RankOutcome {
                vector: Array1::zeros(0),
                iterations: 0,
                converged: true,
            };
        }

        self.pool.install(|| {
            let interlevel = match self.algorithm {
                RankAlgorithm::PageRank => None,
                RankAlgorithm::NcdAwareRank => {
                    let assignment = self.cluster(&transition.matrix);
                    log::info!(
                        "Clustered {} nodes into {} clusters",
                        n,
                        assignment.cluster_count()
                    );
                    Some((
                        interlevel::vertex_to_cluster(&assignment),
                        interlevel::cluster_to_vertex(&assignment, &transition.matrix),
                    ))
                }
            };

            let teleport = weight * self.teleportation_weight;
            let mut current = initial.clone();

            for iteration in 1..=MAX_ITERATIONS {
                let mut next = transition.matrix.apply(&current);
                for correction in &transition.corrections {
                    next += &correction.apply(&current);
                }
                next *= self.outlink_weight;

                if let Some((s, l)) = &interlevel {
                    next.scaled_add(self.interlevel_weight, &s.apply(&l.apply(&current)));
                }
                next += &teleport;

                let delta: f64 = next
                    .iter()
                    .zip(current.iter())
                    .map(|(a, b)| (a - b).abs())
                    .sum();
                current = next;

                if delta <= self.precision {
                    log::debug!("Rank converged after {} iterations (delta {:e})", iteration, delta);
                    return RankOutcome {
                        vector: current,
                        iterations: iteration,
                        converged: true,
                    };
                }
            }

            log::warn!("Rank did not converge within {} iterations", MAX_ITERATIONS);
            RankOutcome {
                vector: current,
                iterations: MAX_ITERATIONS,
                converged: false,
            }
        })
    }
}
