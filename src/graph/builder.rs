//! Graph construction module

use crate::graph::CompressedGraph;
use crate::matrix::CsrMatrix;

/// Builder for incrementally constructing an undirected CompressedGraph
pub struct GraphBuilder {
    /// Adjacency lists for each node
    adjacency_lists: Vec<Vec<u32>>,
}

impl GraphBuilder {
    /// Create a builder over `node_count` nodes
    pub fn new(node_count: usize) -> Self {
        Self {
            adjacency_lists: vec![Vec::new(); node_count],
        }
    }

    /// Connect `a` and `b`; self-loops are dropped and repeated edges
    /// collapse when the graph is built
    pub fn add_edge(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.adjacency_lists[a].push(b as u32);
        self.adjacency_lists[b].push(a as u32);
    }

    /// Build the compressed graph
    pub fn build(mut self) -> CompressedGraph {
        let node_count = self.adjacency_lists.len();

        let mut offsets = Vec::with_capacity(node_count + 1);
        offsets.push(0);
        let mut edges = Vec::new();

        for list in &mut self.adjacency_lists {
            // Sorted lists allow binary search and merge-based intersection
            list.sort_unstable();
            list.dedup();
            edges.extend_from_slice(list);
            offsets.push(edges.len() as u32);
        }

        CompressedGraph {
            node_count,
            offsets,
            edges,
        }
    }
}

/// Undirected, unweighted view of a square transition matrix: `i` and `j`
/// are adjacent when either direction carries positive weight
pub fn from_transition(matrix: &CsrMatrix) -> CompressedGraph {
    let mut builder = GraphBuilder::new(matrix.rows());
    for (i, j, value) in matrix.iter() {
        if value > 0.0 {
            builder.add_edge(i, j);
        }
    }
    builder.build()
}
