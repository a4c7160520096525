//! Vertex-to-cluster and cluster-to-vertex matrices of the NCD-aware walk

use std::collections::BTreeSet;

use crate::cluster::ClusterAssignment;
use crate::matrix::CsrMatrix;

/// `S` (N x K): `S[v, cluster(v)] = 1`, columns normalized so each cluster
/// spreads its mass evenly over its members
pub fn vertex_to_cluster(assignment: &ClusterAssignment) -> CsrMatrix {
    let triplets = assignment
        .clusters()
        .iter()
        .enumerate()
        .map(|(v, &cluster)| (v, cluster, 1.0))
        .collect();

    let mut s = CsrMatrix::from_triplets(assignment.len(), assignment.cluster_count(), triplets);
    s.normalize_columns();
    s
}

/// `L` (K x N): column `j` marks the cluster of `j` and the clusters of
/// every node `j` links to in `transition`, normalized to sum 1
pub fn cluster_to_vertex(assignment: &ClusterAssignment, transition: &CsrMatrix) -> CsrMatrix {
    let mut cells: BTreeSet<(usize, usize)> = (0..assignment.len())
        .map(|v| (assignment.cluster_of(v), v))
        .collect();

    for (i, j, value) in transition.iter() {
        if value > 0.0 {
            cells.insert((assignment.cluster_of(i), j));
        }
    }

    let triplets = cells.into_iter().map(|(k, j)| (k, j, 1.0)).collect();
    let mut l = CsrMatrix::from_triplets(assignment.cluster_count(), assignment.len(), triplets);
    l.normalize_columns();
    l
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::VertexStatus;

    fn assignment() -> ClusterAssignment {
        ClusterAssignment::new(
            vec![0, 0, 1],
            vec![VertexStatus::Member, VertexStatus::Member, VertexStatus::Outlier],
            vec![true, true, false],
        )
    }

    #[test]
    fn test_vertex_to_cluster() {
        let s = vertex_to_cluster(&assignment());
        assert_eq!((s.rows(), s.cols()), (3, 2));
        assert_eq!(s.get(0, 0), 0.5);
        assert_eq!(s.get(1, 0), 0.5);
        assert_eq!(s.get(2, 1), 1.0);
        assert_eq!(s.column_sums(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_cluster_to_vertex_follows_outlinks() {
        // node 0 links to node 2, node 2 links to node 1 (twice in value)
        let t = CsrMatrix::from_triplets(3, 3, vec![(2, 0, 1.0), (1, 2, 2.0), (0, 1, 0.0)]);
        let l = cluster_to_vertex(&assignment(), &t);

        assert_eq!((l.rows(), l.cols()), (2, 3));
        assert_eq!(l.get(0, 0), 0.5);
        assert_eq!(l.get(1, 0), 0.5);
        assert_eq!(l.get(0, 1), 1.0);
        assert_eq!(l.get(0, 2), 0.5);
        assert_eq!(l.get(1, 2), 0.5);
        assert_eq!(l.column_sums(), vec![1.0, 1.0, 1.0]);
    }
}
