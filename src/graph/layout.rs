//! Mapping between per-type registries and one concatenated id space

use std::collections::BTreeMap;
use std::ops::Range;

use ndarray::Array1;

use crate::graph::{NodeRegistry, NodeType};

/// Contiguous slice of the working id space owned by one node type
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub node_type: NodeType,
    pub range: Range<usize>,
    /// Global index of the type's phantom node, if it has one
    pub phantom: Option<usize>,
}

/// Types laid out back to back in `NodeType` order. Empty types get no
/// partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLayout {
    partitions: Vec<Partition>,
    labels: Vec<String>,
    reserved: Vec<bool>,
}

impl NodeLayout {
    pub fn from_registries(registries: &BTreeMap<NodeType, NodeRegistry>) -> Self {
        let mut layout = NodeLayout::default();

        for (&node_type, registry) in registries {
            if registry.is_empty() {
                continue;
            }

            let start = layout.labels.len();
            let mut phantom = None;
            for (idx, label) in registry.labels().iter().enumerate() {
                let reserved = registry.is_reserved(idx);
                if reserved && phantom.is_none() {
                    phantom = Some(start + idx);
                }
                layout.labels.push(label.clone());
                layout.reserved.push(reserved);
            }

            layout.partitions.push(Partition {
                node_type,
                range: start..layout.labels.len(),
                phantom,
            });
        }

        layout
    }

    /// Total number of working ids, phantoms included
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn partition(&self, node_type: NodeType) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.node_type == node_type)
    }

    /// Partition containing the global index `idx`
    pub fn partition_of(&self, idx: usize) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.range.contains(&idx))
    }

    pub fn offset(&self, node_type: NodeType) -> Option<usize> {
        self.partition(node_type).map(|p| p.range.start)
    }

    pub fn label(&self, idx: usize) -> &str {
        &self.labels[idx]
    }

    pub fn is_reserved(&self, idx: usize) -> bool {
        self.reserved[idx]
    }

    /// Number of ids that correspond to external nodes
    pub fn external_count(&self) -> usize {
        self.reserved.iter().filter(|&&r| !r).count()
    }

    /// 1 for external ids, 0 for phantoms
    pub fn external_mask(&self) -> Array1<f64> {
        self.reserved.iter().map(|&r| if r { 0.0 } else { 1.0 }).collect()
    }

    /// 1 inside the partition of `node_type`, 0 elsewhere
    pub fn type_mask(&self, node_type: NodeType) -> Array1<f64> {
        let mut mask = Array1::zeros(self.len());
        if let Some(partition) = self.partition(node_type) {
            mask.slice_mut(ndarray::s![partition.range.clone()]).fill(1.0);
        }
        mask
    }
}
