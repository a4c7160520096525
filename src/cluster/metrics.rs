//! Cluster statistics and metrics

use std::collections::HashSet;

use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cluster::{Cluster, ClusterAssignment, VertexStatus};
use crate::graph::CompressedGraph;

/// Aggregate view of one clustering run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringSummary {
    pub vertex_count: usize,
    pub cluster_count: usize,
    pub core_count: usize,
    pub hub_count: usize,
    pub outlier_count: usize,

    /// Clusters grown from cores, largest first
    pub clusters: Vec<Cluster>,
}

/// Calculate density (internal edges / potential edges) of an undirected
/// vertex set
pub fn calculate_density(graph: &CompressedGraph, members: &[usize]) -> f32 {
    let n = members.len();
    if n <= 1 {
        return 1.0; // By convention, singleton clusters have density 1
    }

    let potential_edges = n * (n - 1) / 2;
    let member_set: HashSet<usize> = members.iter().copied().collect();

    // Every internal edge is seen from both endpoints
    let endpoints: usize = members
        .iter()
        .map(|&v| {
            graph
                .neighbours(v)
                .iter()
                .filter(|&&u| member_set.contains(&(u as usize)))
                .count()
        })
        .sum();

    (endpoints / 2) as f32 / potential_edges as f32
}

/// Up to `top_n` members with the most neighbours inside the cluster
pub fn central_nodes(graph: &CompressedGraph, members: &[usize], top_n: usize) -> Vec<usize> {
    let member_set: HashSet<usize> = members.iter().copied().collect();

    members
        .iter()
        .map(|&v| {
            let degree = graph
                .neighbours(v)
                .iter()
                .filter(|&&u| member_set.contains(&(u as usize)))
                .count();
            (v, degree)
        })
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
        .take(top_n)
        .map(|(v, _)| v)
        .collect()
}

/// Summarize an assignment over the graph it was computed on
pub fn summarize(graph: &CompressedGraph, assignment: &ClusterAssignment) -> ClusteringSummary {
    let groups = assignment.groups();

    let mut clusters: Vec<Cluster> = groups
        .into_par_iter()
        .enumerate()
        .filter(|(_, members)| members.iter().any(|&v| assignment.status(v) == VertexStatus::Member))
        .map(|(id, members)| Cluster {
            id,
            size: members.len(),
            density: calculate_density(graph, &members),
            central_nodes: central_nodes(graph, &members, 5),
            members,
        })
        .collect();
    clusters.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));

    let count_status = |status: VertexStatus| (0..assignment.len()).filter(|&v| assignment.status(v) == status).count();

    ClusteringSummary {
        vertex_count: assignment.len(),
        cluster_count: assignment.cluster_count(),
        core_count: (0..assignment.len()).filter(|&v| assignment.is_core(v)).count(),
        hub_count: count_status(VertexStatus::Hub),
        outlier_count: count_status(VertexStatus::Outlier),
        clusters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::StructuralClusterer;
    use crate::graph::builder::GraphBuilder;

    fn graph() -> CompressedGraph {
        let mut builder = GraphBuilder::new(5);
        for (a, b) in [(0, 1), (1, 2), (0, 2), (2, 3), (3, 4)] {
            builder.add_edge(a, b);
        }
        builder.build()
    }

    #[test]
    fn test_density() {
        let g = graph();
        assert_eq!(calculate_density(&g, &[0, 1, 2]), 1.0);
        assert_eq!(calculate_density(&g, &[0, 1, 3]), 1.0 / 3.0);
        assert_eq!(calculate_density(&g, &[4]), 1.0);
    }

    #[test]
    fn test_central_nodes_order() {
        let g = graph();
        assert_eq!(central_nodes(&g, &[0, 1, 2, 3], 2), vec![2, 0]);
    }

    #[test]
    fn test_summary_counts() {
        let g = graph();
        let assignment = StructuralClusterer::new(0.5, 2).process(&g);
        let summary = summarize(&g, &assignment);

        assert_eq!(summary.vertex_count, 5);
        assert_eq!(summary.cluster_count, assignment.cluster_count());
        assert_eq!(
            summary.hub_count + summary.outlier_count + summary.clusters.iter().map(|c| c.size).sum::<usize>(),
            5
        );
    }
}
