//! Compact adjacency representation used by the structural clustering

/// Compressed sparse adjacency of an undirected graph.
///
/// Every edge is stored in both endpoint lists; lists are sorted and free of
/// duplicates and self-loops.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedGraph {
    /// Number of nodes in the graph
    pub node_count: usize,

    /// Offset array: index where each node's neighbours begin
    /// offsets[i] to offsets[i+1] defines the range for node i
    pub offsets: Vec<u32>,

    /// Concatenated, sorted neighbour lists
    pub edges: Vec<u32>,
}

impl CompressedGraph {
    /// Graph with `node_count` isolated nodes
    pub fn empty(node_count: usize) -> Self {
        Self {
            node_count,
            offsets: vec![0; node_count + 1],
            edges: Vec::new(),
        }
    }

    /// Neighbours of a node
    pub fn neighbours(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.edges[start..end]
    }

    /// Check whether `a` and `b` are adjacent
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.neighbours(a).binary_search(&(b as u32)).is_ok()
    }

    pub fn degree(&self, node: usize) -> usize {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        end - start
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.edges.len() / 2
    }

    /// Size of the shared neighbourhood, by merging the two sorted lists
    pub fn common_neighbour_count(&self, a: usize, b: usize) -> usize {
        let (left, right) = (self.neighbours(a), self.neighbours(b));
        let (mut i, mut j, mut count) = (0, 0, 0);
        while i < left.len() && j < right.len() {
            match left[i].cmp(&right[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    count += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        count
    }
}
