//! `engine` crate: dependency & prefill resolution for form workflows.
//!
//! Given a workflow graph of forms, the engine computes each node's
//! ancestors, offers submitted ancestors (plus Global Data) as prefill
//! sources, keeps per-node field mappings, resolves prefill values and
//! tracks submissions.  All operations are synchronous and pure over a
//! [`Session`] snapshot; only the initial graph load is asynchronous.

pub mod models;
pub mod error;
pub mod document;
pub mod traversal;
pub mod global;
pub mod catalog;
pub mod mapping;
pub mod submission;
pub mod resolver;
pub mod session;
pub mod action;

pub use models::{FieldMeta, FieldSchema, FieldValue, FormDefinition, SourceRef, WorkflowEdge, WorkflowNode};
pub use error::EngineError;
pub use document::WorkflowGraph;
pub use traversal::{compute_downstream_ids, compute_upstream_ids};
pub use global::{GlobalData, GlobalDataConfig, GLOBAL_DATA_ID};
pub use catalog::{build_catalog, describe_source, CatalogEntry};
pub use mapping::{MappingStore, NodeMapping};
pub use submission::{compose_submission, SubmissionRecord, SubmissionState, SubmissionTracker};
pub use resolver::resolve_values;
pub use session::{Loaded, NodeStatus, Session, SubmitOutcome};
pub use action::{Action, Applied};
