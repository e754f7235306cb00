//! The session: one snapshot of `{ graph, mappings, submissions }`.
//!
//! `Session` is the explicit state container threaded through every user
//! action.  Mutating operations take `&self` and return the next snapshot;
//! the graph and global data are shared, the mapping store and submission
//! tracker share every untouched node.  A reader holding an older snapshot
//! never observes a half-applied change.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use source::GraphSource;

use crate::catalog::{build_catalog, CatalogEntry};
use crate::document::WorkflowGraph;
use crate::global::GlobalData;
use crate::mapping::{MappingStore, NodeMapping};
use crate::models::{FieldValue, SourceRef, WorkflowNode};
use crate::resolver::resolve_values;
use crate::submission::{compose_submission, SubmissionRecord, SubmissionState, SubmissionTracker};
use crate::traversal::{compute_downstream_ids, compute_upstream_ids};
use crate::EngineError;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Result of [`Session::load`].
#[derive(Debug)]
pub struct Loaded {
    pub session: Session,
    /// Set when the source or document failed; `session` is then empty.
    pub error: Option<EngineError>,
}

/// Result of [`Session::submit`].
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub session: Session,
    /// Descendants whose catalog gained the submitted node, sorted.
    pub unlocked: Vec<String>,
}

/// Summary of one node, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub node_id: String,
    pub name: String,
    pub form_id: Option<String>,
    pub state: SubmissionState,
    pub upstream: usize,
    pub mapped_fields: usize,
    pub resolved_fields: usize,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Session {
    graph: Arc<WorkflowGraph>,
    global: Arc<GlobalData>,
    mappings: MappingStore,
    submissions: SubmissionTracker,
}

impl Session {
    /// Start a session over `graph`, seeding mappings from the document.
    pub fn new(graph: WorkflowGraph, global: GlobalData) -> Self {
        let mappings = MappingStore::seeded_from(&graph);
        Self {
            graph: Arc::new(graph),
            global: Arc::new(global),
            mappings,
            submissions: SubmissionTracker::new(),
        }
    }

    /// A session with no graph; catalogs contain only Global Data.
    pub fn empty(global: GlobalData) -> Self {
        Self::new(WorkflowGraph::default(), global)
    }

    /// Fetch the graph document from `source` and start a session.
    ///
    /// A failure is reported once through [`Loaded::error`]; the returned
    /// session is then empty rather than partially populated.
    pub async fn load(source: &dyn GraphSource, global: GlobalData) -> Loaded {
        let parsed = match source.fetch().await {
            Ok(document) => WorkflowGraph::from_value(document),
            Err(e) => Err(EngineError::from(e)),
        };

        match parsed {
            Ok(graph) => {
                info!("session started from {}", source.describe());
                Loaded {
                    session: Self::new(graph, global),
                    error: None,
                }
            }
            Err(e) => {
                warn!("could not load graph from {}: {}", source.describe(), e);
                Loaded {
                    session: Self::empty(global),
                    error: Some(e),
                }
            }
        }
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn global(&self) -> &GlobalData {
        &self.global
    }

    pub fn mappings(&self) -> &MappingStore {
        &self.mappings
    }

    pub fn submissions(&self) -> &SubmissionTracker {
        &self.submissions
    }

    /// Look a node up, as an error when it is not part of the graph.
    pub fn require_node(&self, node_id: &str) -> Result<&WorkflowNode, EngineError> {
        self.graph
            .node(node_id)
            .ok_or_else(|| EngineError::UnknownNode(node_id.to_owned()))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn upstream_ids(&self, node_id: &str) -> HashSet<String> {
        compute_upstream_ids(node_id, self.graph.edges())
    }

    pub fn catalog(&self, node_id: &str) -> Vec<CatalogEntry> {
        build_catalog(node_id, &self.graph, &self.submissions, &self.global)
    }

    /// The node's mapping; empty when nothing is mapped.
    pub fn mapping(&self, node_id: &str) -> NodeMapping {
        self.mappings.mapping(node_id).cloned().unwrap_or_default()
    }

    /// Prefill values for every resolvable mapped field of `node_id`.
    ///
    /// Nodes without a usable form reference resolve to nothing.
    pub fn resolve(&self, node_id: &str) -> BTreeMap<String, FieldValue> {
        let Some(node) = self.graph.node(node_id) else {
            return BTreeMap::new();
        };
        if self.graph.form_for(node).is_none() {
            return BTreeMap::new();
        }
        let Some(mapping) = self.mappings.mapping(node_id) else {
            return BTreeMap::new();
        };
        // Only ancestors with a usable form can serve values.
        let mut upstream = self.upstream_ids(node_id);
        upstream.retain(|id| {
            self.graph
                .node(id)
                .is_some_and(|n| self.graph.form_for(n).is_some())
        });
        resolve_values(node_id, mapping, &self.submissions, &self.global, &upstream)
    }

    pub fn status(&self, node_id: &str) -> Option<NodeStatus> {
        let node = self.graph.node(node_id)?;
        Some(NodeStatus {
            node_id: node.id.clone(),
            name: self.graph.display_name(node),
            form_id: node.form_id().map(str::to_owned),
            state: self.submissions.state(node_id),
            upstream: self.upstream_ids(node_id).len(),
            mapped_fields: self.mappings.mapping(node_id).map_or(0, |m| m.len()),
            resolved_fields: self.resolve(node_id).len(),
        })
    }

    /// Status of every node, in document order.
    pub fn statuses(&self) -> Vec<NodeStatus> {
        self.graph
            .nodes()
            .iter()
            .filter_map(|n| self.status(&n.id))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Map a field of `node_id`.  Unknown nodes are left untouched.
    #[instrument(skip_all, fields(node_id = %node_id, field_key = %field_key))]
    pub fn set_mapping(&self, node_id: &str, field_key: &str, source: SourceRef) -> Session {
        if self.graph.node(node_id).is_none() {
            warn!("set_mapping on unknown node ignored");
            return self.clone();
        }
        Session {
            mappings: self.mappings.set_mapping(node_id, field_key, source),
            ..self.clone()
        }
    }

    #[instrument(skip_all, fields(node_id = %node_id, field_key = %field_key))]
    pub fn clear_mapping(&self, node_id: &str, field_key: &str) -> Session {
        Session {
            mappings: self.mappings.clear_mapping(node_id, field_key),
            ..self.clone()
        }
    }

    /// Record `values` for `node_id`, replacing any previous submission.
    ///
    /// Ids that are not part of the graph are ignored: the returned session
    /// is unchanged and nothing is unlocked.
    #[instrument(skip_all, fields(node_id = %node_id, fields = values.len()))]
    pub fn submit(&self, node_id: &str, values: SubmissionRecord) -> SubmitOutcome {
        if self.graph.node(node_id).is_none() {
            warn!("submit on unknown node ignored");
            return SubmitOutcome {
                session: self.clone(),
                unlocked: Vec::new(),
            };
        }

        let newly_offered = !self.submissions.has_values(node_id) && !values.is_empty();
        let next = Session {
            submissions: self.submissions.submit(node_id, values),
            ..self.clone()
        };

        let mut unlocked: Vec<String> = if newly_offered {
            compute_downstream_ids(node_id, self.graph.edges())
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };
        unlocked.sort();

        info!("node submitted; {} downstream node(s) unlocked", unlocked.len());
        SubmitOutcome {
            session: next,
            unlocked,
        }
    }

    /// Submit the node's current prefill values, overlaid with `edits`.
    pub fn submit_prefilled(
        &self,
        node_id: &str,
        edits: &BTreeMap<String, FieldValue>,
    ) -> SubmitOutcome {
        let values = compose_submission(&self.resolve(node_id), edits);
        self.submit(node_id, values)
    }
}
