//! Per-node prefill configuration.
//!
//! The store is persistent: `set_mapping`/`clear_mapping` return a new
//! store and leave the receiver untouched.  Unrelated nodes share their
//! mapping with the previous snapshot through `Arc`; only the touched
//! node's mapping is copied.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::document::WorkflowGraph;
use crate::models::SourceRef;

/// Target field key → source of its prefill value.
pub type NodeMapping = BTreeMap<String, SourceRef>;

/// Mapping configuration of every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingStore {
    by_node: HashMap<String, Arc<NodeMapping>>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from each node's `input_mapping`.
    pub fn seeded_from(graph: &WorkflowGraph) -> Self {
        let by_node = graph
            .nodes()
            .iter()
            .map(|node| (node.id.clone(), node.initial_mapping()))
            .filter(|(_, mapping)| !mapping.is_empty())
            .map(|(id, mapping)| (id, Arc::new(mapping)))
            .collect();
        Self { by_node }
    }

    /// The node's mapping; `None` when nothing was ever mapped.
    pub fn mapping(&self, node_id: &str) -> Option<&NodeMapping> {
        self.by_node.get(node_id).map(Arc::as_ref)
    }

    /// Map `field_key` of `node_id` to `source`, replacing any previous
    /// entry.  The source is not checked against the graph.
    pub fn set_mapping(&self, node_id: &str, field_key: &str, source: SourceRef) -> Self {
        debug!(
            node_id,
            field_key,
            source_node = %source.source_node_id,
            source_field = %source.source_field_key,
            "set mapping"
        );
        let mut next = self.clone();
        let mapping = next.by_node.entry(node_id.to_owned()).or_default();
        Arc::make_mut(mapping).insert(field_key.to_owned(), source);
        next
    }

    /// Remove the mapping of `field_key`; a no-op when it is absent.
    pub fn clear_mapping(&self, node_id: &str, field_key: &str) -> Self {
        let mapped = self
            .mapping(node_id)
            .is_some_and(|m| m.contains_key(field_key));
        if !mapped {
            return self.clone();
        }

        debug!(node_id, field_key, "clear mapping");
        let mut next = self.clone();
        if let Some(mapping) = next.by_node.get_mut(node_id) {
            Arc::make_mut(mapping).remove(field_key);
        }
        next
    }

    /// True when both stores hold the very same mapping allocation for
    /// `node_id` (or neither holds one).
    #[cfg(test)]
    pub(crate) fn shares_mapping(&self, other: &Self, node_id: &str) -> bool {
        match (self.by_node.get(node_id), other.by_node.get(node_id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_inserts_and_overwrites() {
        let store = MappingStore::new()
            .set_mapping("y", "name", SourceRef::new("form-a", "fullName"))
            .set_mapping("y", "name", SourceRef::new("form-b", "name"));

        assert_eq!(store.mapping("y").unwrap().len(), 1);
        assert_eq!(store.mapping("y").unwrap()["name"], SourceRef::new("form-b", "name"));
    }

    #[test]
    fn set_is_idempotent() {
        let source = SourceRef::global("user_id");
        let once = MappingStore::new().set_mapping("x", "email", source.clone());
        let twice = once.set_mapping("x", "email", source);
        assert_eq!(once, twice);
    }

    #[test]
    fn clear_removes_only_the_named_field() {
        let store = MappingStore::new()
            .set_mapping("y", "name", SourceRef::new("form-a", "fullName"))
            .set_mapping("y", "email", SourceRef::global("user_id"))
            .clear_mapping("y", "name");

        let mapping = store.mapping("y").unwrap();
        assert!(!mapping.contains_key("name"));
        assert!(mapping.contains_key("email"));
    }

    #[test]
    fn clear_of_absent_field_is_a_no_op() {
        let store = MappingStore::new().set_mapping("y", "email", SourceRef::global("user_id"));
        assert_eq!(store.clear_mapping("y", "missing"), store);
        assert_eq!(store.clear_mapping("nobody", "email"), store);
    }

    #[test]
    fn previous_snapshot_is_untouched() {
        let before = MappingStore::new().set_mapping("y", "name", SourceRef::new("a", "f"));
        let after = before.clear_mapping("y", "name");

        assert!(before.mapping("y").unwrap().contains_key("name"));
        assert!(after.mapping("y").unwrap().is_empty());
    }

    #[test]
    fn unrelated_nodes_share_their_mapping() {
        let before = MappingStore::new()
            .set_mapping("x", "email", SourceRef::global("user_id"))
            .set_mapping("y", "name", SourceRef::new("a", "f"));
        let after = before.set_mapping("y", "notes", SourceRef::new("a", "g"));

        assert!(after.shares_mapping(&before, "x"));
        assert!(!after.shares_mapping(&before, "y"));
    }
}
