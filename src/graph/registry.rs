//! External id to dense index mapping, one registry per node type

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Bidirectional map between external string ids and dense indices.
///
/// Indices are assigned on first sight, start at 0 and are never reused.
/// Reserved entries occupy an index but cannot be reached by external id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRegistry {
    /// Mapping from external ids to node indices
    ids: HashMap<String, usize>,

    /// Label per index; external id for regular entries
    names: Vec<String>,

    reserved: BTreeSet<usize>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the index for the given external id
    pub fn get_or_insert(&mut self, external_id: &str) -> usize {
        if let Some(&idx) = self.ids.get(external_id) {
            return idx;
        }

        let idx = self.names.len();
        self.ids.insert(external_id.to_string(), idx);
        self.names.push(external_id.to_string());
        idx
    }

    pub fn get(&self, external_id: &str) -> Option<usize> {
        self.ids.get(external_id).copied()
    }

    /// Allocate an index that no external id resolves to
    pub fn reserve(&mut self, label: &str) -> usize {
        let idx = self.names.len();
        self.names.push(label.to_string());
        self.reserved.insert(idx);
        idx
    }

    pub fn is_reserved(&self, idx: usize) -> bool {
        self.reserved.contains(&idx)
    }

    pub fn name_of(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    /// Number of indices handed out, reserved ones included
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Labels of all indices, in index order
    pub fn labels(&self) -> &[String] {
        &self.names
    }

    /// Regular entries as (external id, index), in index order
    pub fn iter_external(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.names
            .iter()
            .enumerate()
            .filter(move |(idx, _)| !self.reserved.contains(idx))
            .map(|(idx, name)| (name.as_str(), idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_stable() {
        let mut r = NodeRegistry::new();
        assert_eq!(r.get_or_insert("a"), 0);
        assert_eq!(r.get_or_insert("b"), 1);
        assert_eq!(r.get_or_insert("a"), 0);
        assert_eq!(r.len(), 2);
        assert_eq!(r.get("b"), Some(1));
        assert_eq!(r.get("c"), None);
        assert_eq!(r.name_of(1), Some("b"));
    }

    #[test]
    fn test_reserved_entries_are_hidden() {
        let mut r = NodeRegistry::new();
        let phantom = r.reserve("phantom");
        assert_eq!(phantom, 0);

        // the label of a reserved entry is not an external id
        assert_eq!(r.get_or_insert("phantom"), 1);
        assert!(r.is_reserved(0));
        assert!(!r.is_reserved(1));

        let external: Vec<(&str, usize)> = r.iter_external().collect();
        assert_eq!(external, vec![("phantom", 1)]);
        assert_eq!(r.len(), 2);
    }
}
