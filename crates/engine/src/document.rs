//! The loaded workflow graph: read-only after load.
//!
//! Parsing is lenient per entry: a node, edge or form that does not
//! deserialise is skipped with a warning instead of failing the whole
//! document.  Only a document without `nodes`/`edges` arrays is rejected.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::{FormDefinition, WorkflowEdge, WorkflowNode};
use crate::EngineError;

/// Nodes, edges and forms of one workflow, with lookup indices.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    forms: HashMap<String, FormDefinition>,
    node_index: HashMap<String, usize>,
}

impl WorkflowGraph {
    /// Build a graph from already-typed parts.
    ///
    /// Duplicate node ids keep the first occurrence.  Edges without an id
    /// get the synthetic `source-target` id.
    pub fn from_parts(
        nodes: Vec<WorkflowNode>,
        mut edges: Vec<WorkflowEdge>,
        forms: Vec<FormDefinition>,
    ) -> Self {
        let mut kept = Vec::with_capacity(nodes.len());
        let mut node_index = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if node_index.contains_key(&node.id) {
                warn!("duplicate node id '{}', keeping the first occurrence", node.id);
                continue;
            }
            node_index.insert(node.id.clone(), kept.len());
            kept.push(node);
        }

        for edge in &mut edges {
            edge.ensure_id();
        }

        let forms = forms.into_iter().map(|f| (f.id.clone(), f)).collect();

        Self {
            nodes: kept,
            edges,
            forms,
            node_index,
        }
    }

    /// Parse a raw graph document.
    ///
    /// # Errors
    /// [`EngineError::MalformedDocument`] if the document is not an object
    /// with `nodes` and `edges` arrays.  `forms` may be absent.
    pub fn from_value(document: Value) -> Result<Self, EngineError> {
        let Value::Object(mut doc) = document else {
            return Err(EngineError::MalformedDocument(
                "expected a JSON object".into(),
            ));
        };

        let nodes = take_array(&mut doc, "nodes")?
            .ok_or_else(|| EngineError::MalformedDocument("missing 'nodes' array".into()))?;
        let edges = take_array(&mut doc, "edges")?
            .ok_or_else(|| EngineError::MalformedDocument("missing 'edges' array".into()))?;
        let forms = take_array(&mut doc, "forms")?.unwrap_or_default();

        let graph = Self::from_parts(
            parse_entries::<WorkflowNode>(nodes, "node"),
            parse_entries::<WorkflowEdge>(edges, "edge"),
            parse_entries::<FormDefinition>(forms, "form"),
        );

        info!(
            "graph loaded: {} nodes, {} edges, {} forms",
            graph.nodes.len(),
            graph.edges.len(),
            graph.forms.len()
        );
        Ok(graph)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in document order.
    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    pub fn node(&self, node_id: &str) -> Option<&WorkflowNode> {
        self.node_index.get(node_id).map(|&i| &self.nodes[i])
    }

    pub fn form(&self, form_id: &str) -> Option<&FormDefinition> {
        self.forms.get(form_id)
    }

    /// The form a node renders, if the node references one that exists.
    pub fn form_for(&self, node: &WorkflowNode) -> Option<&FormDefinition> {
        node.form_id().and_then(|id| self.form(id))
    }

    /// Node name, else the form's name, else the node id.
    ///
    /// The node name wins because one form may back several nodes.
    pub fn display_name(&self, node: &WorkflowNode) -> String {
        node.data
            .name
            .clone()
            .or_else(|| self.form_for(node).and_then(|f| f.name.clone()))
            .unwrap_or_else(|| node.id.clone())
    }
}

fn take_array(
    doc: &mut serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<Value>>, EngineError> {
    match doc.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(EngineError::MalformedDocument(format!(
            "'{key}' must be an array"
        ))),
    }
}

fn parse_entries<T: DeserializeOwned>(items: Vec<Value>, kind: &str) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("skipping malformed {kind} at index {i}: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fixture_document_loads_every_entry() {
        let doc: Value =
            serde_json::from_str(include_str!("../../../fixtures/blueprint.json")).unwrap();
        let graph = WorkflowGraph::from_value(doc).expect("fixture is well-formed");

        assert_eq!(graph.nodes().len(), 6);
        assert_eq!(graph.edges().len(), 6);
        assert!(graph.form("f_contact").is_some());
        assert!(graph.edges().iter().all(|e| e.id == format!("{}-{}", e.source, e.target)));
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let graph = WorkflowGraph::from_value(json!({
            "nodes": [
                { "id": "a", "data": { "component_id": "f1", "name": "A" } },
                { "data": { "name": "no id" } },
                42
            ],
            "edges": [
                { "source": "a", "target": "b" },
                { "source": "a" }
            ],
            "forms": [ { "id": "f1" }, { "name": "no id" } ]
        }))
        .expect("document shape is fine");

        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.edges().len(), 1);
        assert!(graph.form("f1").is_some());
    }

    #[test]
    fn null_edge_id_is_synthesised_not_dropped() {
        let graph = WorkflowGraph::from_value(json!({
            "nodes": [
                { "id": "a", "data": { "component_id": "f1" } },
                { "id": "b", "data": { "component_id": "f1" } }
            ],
            "edges": [ { "id": null, "source": "a", "target": "b" } ]
        }))
        .unwrap();

        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges()[0].id, "a-b");
        let upstream = crate::traversal::compute_upstream_ids("b", graph.edges());
        assert!(upstream.contains("a"));
    }

    #[test]
    fn null_optional_attributes_keep_the_node() {
        let graph = WorkflowGraph::from_value(json!({
            "nodes": [
                { "id": "a", "data": { "component_id": "f1", "input_mapping": null } },
                { "id": "b", "data": { "component_id": "f1", "prerequisites": null } },
                { "id": "c", "data": null }
            ],
            "edges": [],
            "forms": [ { "id": "f1", "field_schema": null } ]
        }))
        .unwrap();

        assert_eq!(graph.nodes().len(), 3);
        assert!(graph.node("a").unwrap().initial_mapping().is_empty());
        assert!(graph.node("c").unwrap().form_id().is_none());
        assert!(graph.form("f1").unwrap().field_schema.properties.is_empty());
    }

    #[test]
    fn missing_forms_array_is_allowed() {
        let graph = WorkflowGraph::from_value(json!({ "nodes": [], "edges": [] })).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn missing_nodes_is_rejected() {
        assert!(matches!(
            WorkflowGraph::from_value(json!({ "edges": [] })),
            Err(EngineError::MalformedDocument(_))
        ));
        assert!(matches!(
            WorkflowGraph::from_value(json!([1, 2, 3])),
            Err(EngineError::MalformedDocument(_))
        ));
    }

    #[test]
    fn duplicate_node_ids_keep_the_first() {
        let graph = WorkflowGraph::from_parts(
            vec![
                WorkflowNode::new("a", "f1", "First"),
                WorkflowNode::new("a", "f1", "Second"),
            ],
            vec![],
            vec![],
        );
        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.node("a").unwrap().data.name.as_deref(), Some("First"));
    }

    #[test]
    fn display_name_falls_back_to_form_then_id() {
        let mut unnamed = WorkflowNode::new("b", "f1", "");
        unnamed.data.name = None;
        let mut orphan = WorkflowNode::new("c", "missing", "");
        orphan.data.name = None;

        let graph = WorkflowGraph::from_parts(
            vec![WorkflowNode::new("a", "f1", "Form A"), unnamed, orphan],
            vec![],
            vec![FormDefinition {
                id: "f1".into(),
                name: Some("Contact".into()),
                description: None,
                field_schema: Default::default(),
            }],
        );

        assert_eq!(graph.display_name(graph.node("a").unwrap()), "Form A");
        assert_eq!(graph.display_name(graph.node("b").unwrap()), "Contact");
        assert_eq!(graph.display_name(graph.node("c").unwrap()), "c");
    }
}
