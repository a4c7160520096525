//! Structural clustering module

pub mod metrics;
pub mod scan;

use serde::{Deserialize, Serialize};

pub use metrics::ClusteringSummary;
pub use scan::StructuralClusterer;

/// Final role of a vertex after clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexStatus {
    /// Belongs to a cluster grown from a core vertex
    Member,
    /// Singleton adjacent to members of at least two clusters
    Hub,
    /// Any other singleton
    Outlier,
}

/// Cluster id per vertex. Every vertex has exactly one id and ids are
/// dense in `0..cluster_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    cluster_of: Vec<usize>,
    status: Vec<VertexStatus>,
    core: Vec<bool>,
    cluster_count: usize,
}

impl ClusterAssignment {
    pub(crate) fn new(cluster_of: Vec<usize>, status: Vec<VertexStatus>, core: Vec<bool>) -> Self {
        let cluster_count = cluster_of.iter().max().map_or(0, |&max| max + 1);
        Self {
            cluster_of,
            status,
            core,
            cluster_count,
        }
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.cluster_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cluster_of.is_empty()
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    pub fn cluster_of(&self, vertex: usize) -> usize {
        self.cluster_of[vertex]
    }

    /// Cluster id of every vertex, in vertex order
    pub fn clusters(&self) -> &[usize] {
        &self.cluster_of
    }

    pub fn status(&self, vertex: usize) -> VertexStatus {
        self.status[vertex]
    }

    pub fn is_core(&self, vertex: usize) -> bool {
        self.core[vertex]
    }

    /// Vertices of every cluster, indexed by cluster id
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.cluster_count];
        for (vertex, &cluster) in self.cluster_of.iter().enumerate() {
            groups[cluster].push(vertex);
        }
        groups
    }
}

/// A cluster together with its structural statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique identifier for this cluster
    pub id: usize,

    /// Members of this cluster (node indices)
    pub members: Vec<usize>,

    /// Size of the cluster
    pub size: usize,

    /// Density: internal edges / potential edges
    pub density: f32,

    /// Members with the most internal neighbours, highest first
    pub central_nodes: Vec<usize>,
}
