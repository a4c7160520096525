//! SCAN: structural clustering of an undirected graph

use std::collections::VecDeque;

use rayon::prelude::*;

use crate::cluster::{ClusterAssignment, VertexStatus};
use crate::graph::CompressedGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unclassified,
    Member,
    NonMember,
}

/// Groups vertices whose neighbourhoods overlap strongly.
///
/// Two adjacent vertices are similar when
/// `|Γ(u) ∩ Γ(v)| / sqrt(|Γ(u)| |Γ(v)|) >= epsilon`, where `Γ` is the closed
/// neighbourhood. A vertex with at least `mu` similar neighbours is a core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructuralClusterer {
    epsilon: f64,
    mu: u32,
}

impl StructuralClusterer {
    pub fn new(epsilon: f64, mu: u32) -> Self {
        Self { epsilon, mu }
    }

    /// Neighbours of `v` that pass the similarity threshold
    fn similar_neighbours(&self, graph: &CompressedGraph, v: usize) -> Vec<usize> {
        let threshold = self.epsilon * self.epsilon;
        let degree_v = (graph.degree(v) + 1) as f64;

        graph
            .neighbours(v)
            .iter()
            .map(|&u| u as usize)
            .filter(|&u| {
                // Both endpoints sit in both closed neighbourhoods
                let common = (graph.common_neighbour_count(v, u) + 2) as f64;
                let degree_u = (graph.degree(u) + 1) as f64;
                common * common >= threshold * degree_v * degree_u
            })
            .collect()
    }

    pub fn process(&self, graph: &CompressedGraph) -> ClusterAssignment {
        let n = graph.node_count;

        let similar: Vec<Vec<usize>> = (0..n)
            .into_par_iter()
            .map(|v| self.similar_neighbours(graph, v))
            .collect();
        let core: Vec<bool> = similar.iter().map(|s| s.len() >= self.mu as usize).collect();

        let mut labels = vec![Label::Unclassified; n];
        let mut cluster_of = vec![0usize; n];
        let mut next_id = 0;

        for v in 0..n {
            if labels[v] != Label::Unclassified {
                continue;
            }
            if !core[v] {
                labels[v] = Label::NonMember;
                continue;
            }

            let id = next_id;
            next_id += 1;
            labels[v] = Label::Member;
            cluster_of[v] = id;

            let mut queue = VecDeque::from([v]);
            while let Some(x) = queue.pop_front() {
                if !core[x] {
                    continue;
                }
                for &y in &similar[x] {
                    match labels[y] {
                        Label::Unclassified => {
                            labels[y] = Label::Member;
                            cluster_of[y] = id;
                            queue.push_back(y);
                        }
                        Label::NonMember => {
                            labels[y] = Label::Member;
                            cluster_of[y] = id;
                        }
                        Label::Member => {}
                    }
                }
            }
        }

        let mut status = vec![VertexStatus::Member; n];
        for v in 0..n {
            if labels[v] != Label::NonMember {
                continue;
            }

            let mut touched: Vec<usize> = graph
                .neighbours(v)
                .iter()
                .map(|&u| u as usize)
                .filter(|&u| labels[u] == Label::Member)
                .map(|u| cluster_of[u])
                .collect();
            touched.sort_unstable();
            touched.dedup();

            status[v] = if touched.len() >= 2 {
                VertexStatus::Hub
            } else {
                VertexStatus::Outlier
            };
        }

        // Singletons are numbered after all real clusters, in vertex order
        for v in 0..n {
            if labels[v] == Label::NonMember {
                cluster_of[v] = next_id;
                next_id += 1;
            }
        }

        let assignment = ClusterAssignment::new(cluster_of, status, core);
        log::debug!(
            "SCAN over {} vertices produced {} clusters",
            n,
            assignment.cluster_count()
        );
        assignment
    }
}
