//! Upstream form catalog: the prefill sources offered for one node.
//!
//! Global Data always comes first.  It is followed by every ancestor that
//! has submitted at least one value, in document order.  Ancestors that
//! are still pending are left out entirely: a mapping to them could never
//! resolve.  The catalog is rebuilt on every call, so a submit shows up on
//! the next read.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::document::WorkflowGraph;
use crate::global::{GlobalData, GLOBAL_DATA_ID, GLOBAL_DATA_NAME};
use crate::models::{FieldSchema, SourceRef};
use crate::submission::{SubmissionRecord, SubmissionTracker};
use crate::traversal::compute_upstream_ids;

/// One selectable prefill source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub node_id: String,
    pub form_id: Option<String>,
    /// Node display name (not the form's, which may be shared).
    pub name: String,
    pub field_schema: FieldSchema,
    /// The node's current submission; `None` for Global Data.
    pub submitted: Option<Arc<SubmissionRecord>>,
}

impl CatalogEntry {
    pub fn global(global: &GlobalData) -> Self {
        Self {
            node_id: GLOBAL_DATA_ID.to_owned(),
            form_id: Some(GLOBAL_DATA_ID.to_owned()),
            name: GLOBAL_DATA_NAME.to_owned(),
            field_schema: global.schema().clone(),
            submitted: None,
        }
    }

    pub fn is_global(&self) -> bool {
        self.node_id == GLOBAL_DATA_ID
    }
}

/// Prefill sources available to `node_id` right now.
pub fn build_catalog(
    node_id: &str,
    graph: &WorkflowGraph,
    submissions: &SubmissionTracker,
    global: &GlobalData,
) -> Vec<CatalogEntry> {
    let upstream = compute_upstream_ids(node_id, graph.edges());

    let mut catalog = vec![CatalogEntry::global(global)];
    for node in graph.nodes() {
        if !upstream.contains(&node.id) || !submissions.has_values(&node.id) {
            continue;
        }
        let Some(form) = graph.form_for(node) else {
            debug!("node '{}' has no usable form reference, left out of catalog", node.id);
            continue;
        };
        catalog.push(CatalogEntry {
            node_id: node.id.clone(),
            form_id: Some(form.id.clone()),
            name: graph.display_name(node),
            field_schema: form.field_schema.clone(),
            submitted: submissions.record(&node.id),
        });
    }

    debug!(
        node_id,
        upstream = upstream.len(),
        offered = catalog.len() - 1,
        "catalog built"
    );
    catalog
}

/// Human-readable label of a mapping: `"<source name>.<field>"`.
///
/// The source is looked up by node id first (unique per instance), then by
/// form id; failing both, the raw id is used.
pub fn describe_source(source: &SourceRef, catalog: &[CatalogEntry]) -> String {
    let by_node = catalog.iter().find(|e| e.node_id == source.source_node_id);
    let by_form = || {
        source
            .form_id
            .as_deref()
            .and_then(|form_id| catalog.iter().find(|e| e.form_id.as_deref() == Some(form_id)))
    };

    let name = by_node
        .or_else(by_form)
        .map(|e| e.name.as_str())
        .unwrap_or(source.source_node_id.as_str());
    format!("{}.{}", name, source.source_field_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldMeta, FieldValue, FormDefinition, WorkflowEdge, WorkflowNode};

    fn form(id: &str, fields: &[&str]) -> FormDefinition {
        let mut schema = FieldSchema::default();
        for f in fields {
            schema.properties.insert(f.to_string(), FieldMeta::new(f, "string"));
        }
        FormDefinition {
            id: id.into(),
            name: Some(format!("{id} form")),
            description: None,
            field_schema: schema,
        }
    }

    /// A → B → C, A → C; B and C reuse the same form.
    fn graph() -> WorkflowGraph {
        WorkflowGraph::from_parts(
            vec![
                WorkflowNode::new("a", "f_person", "Applicant"),
                WorkflowNode::new("b", "f_contact", "Primary contact"),
                WorkflowNode::new("c", "f_contact", "Secondary contact"),
            ],
            vec![
                WorkflowEdge::new("a", "b"),
                WorkflowEdge::new("b", "c"),
                WorkflowEdge::new("a", "c"),
            ],
            vec![form("f_person", &["fullName"]), form("f_contact", &["email"])],
        )
    }

    fn submitted(ids: &[&str]) -> SubmissionTracker {
        ids.iter().fold(SubmissionTracker::new(), |t, id| {
            t.submit(id, [("x".to_string(), FieldValue::from("1"))].into())
        })
    }

    fn ids(catalog: &[CatalogEntry]) -> Vec<&str> {
        catalog.iter().map(|e| e.node_id.as_str()).collect()
    }

    #[test]
    fn global_data_is_always_first_and_alone_without_submissions() {
        let catalog = build_catalog("c", &graph(), &SubmissionTracker::new(), &GlobalData::standard());
        assert_eq!(ids(&catalog), vec![GLOBAL_DATA_ID]);
        assert!(catalog[0].is_global());
        assert!(catalog[0].submitted.is_none());
    }

    #[test]
    fn only_submitted_ancestors_are_offered() {
        let catalog = build_catalog("c", &graph(), &submitted(&["a"]), &GlobalData::standard());
        assert_eq!(ids(&catalog), vec![GLOBAL_DATA_ID, "a"]);
    }

    #[test]
    fn submitted_non_ancestors_are_never_offered() {
        // c is downstream of b, b must not see it.
        let catalog = build_catalog("b", &graph(), &submitted(&["a", "c"]), &GlobalData::standard());
        assert_eq!(ids(&catalog), vec![GLOBAL_DATA_ID, "a"]);
    }

    #[test]
    fn entries_use_node_names_for_shared_forms() {
        let catalog = build_catalog("c", &graph(), &submitted(&["a", "b"]), &GlobalData::standard());
        let b = catalog.iter().find(|e| e.node_id == "b").unwrap();
        assert_eq!(b.name, "Primary contact");
        assert_eq!(b.form_id.as_deref(), Some("f_contact"));
        assert!(b.field_schema.properties.contains_key("email"));
        assert_eq!(b.submitted.as_ref().unwrap()["x"], FieldValue::from("1"));
    }

    #[test]
    fn empty_submissions_are_not_offered() {
        let tracker = SubmissionTracker::new().submit("a", SubmissionRecord::new());
        let catalog = build_catalog("c", &graph(), &tracker, &GlobalData::standard());
        assert_eq!(ids(&catalog), vec![GLOBAL_DATA_ID]);
    }

    #[test]
    fn nodes_without_a_form_are_left_out() {
        let mut orphan = WorkflowNode::new("a", "f_missing", "Orphan");
        orphan.data.component_id = None;
        let graph = WorkflowGraph::from_parts(
            vec![orphan, WorkflowNode::new("b", "f_contact", "B")],
            vec![WorkflowEdge::new("a", "b")],
            vec![form("f_contact", &["email"])],
        );
        let catalog = build_catalog("b", &graph, &submitted(&["a"]), &GlobalData::standard());
        assert_eq!(ids(&catalog), vec![GLOBAL_DATA_ID]);
    }

    #[test]
    fn empty_graph_still_offers_global_data() {
        let catalog = build_catalog(
            "anything",
            &WorkflowGraph::default(),
            &SubmissionTracker::new(),
            &GlobalData::standard(),
        );
        assert_eq!(ids(&catalog), vec![GLOBAL_DATA_ID]);
    }

    #[test]
    fn describe_source_prefers_node_then_form_then_raw_id() {
        let catalog = build_catalog("c", &graph(), &submitted(&["a", "b"]), &GlobalData::standard());

        assert_eq!(describe_source(&SourceRef::new("b", "email"), &catalog), "Primary contact.email");
        assert_eq!(describe_source(&SourceRef::global("user_id"), &catalog), "Global Data.user_id");

        let mut by_form = SourceRef::new("gone", "fullName");
        by_form.form_id = Some("f_person".into());
        assert_eq!(describe_source(&by_form, &catalog), "Applicant.fullName");

        assert_eq!(describe_source(&SourceRef::new("gone", "x"), &catalog), "gone.x");
    }
}
