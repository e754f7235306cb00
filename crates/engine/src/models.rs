//! Core domain models for the prefill engine.
//!
//! These types are the source of truth for what a workflow graph looks
//! like in memory.  They deserialise from the blueprint graph document
//! (`{ nodes, edges, forms }`) delivered by the `source` crate.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::global::GLOBAL_DATA_ID;

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A scalar form-field value.
///
/// Numbers keep their JSON representation so a value read back out of a
/// submission is exactly the value that went in.  Anything that is not a
/// string, number or boolean is carried as `Opaque`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Opaque(Value),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Opaque(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// SourceRef
// ---------------------------------------------------------------------------

/// Where a prefilled field takes its value from: a field of an upstream
/// node, or a key of the global data catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Upstream node id, or [`GLOBAL_DATA_ID`].
    #[serde(rename = "node_id")]
    pub source_node_id: String,
    /// Field key within the source's values.
    #[serde(rename = "field_key")]
    pub source_field_key: String,
    /// Form id of the source, kept only as a display fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
}

impl SourceRef {
    pub fn new(source_node_id: impl Into<String>, source_field_key: impl Into<String>) -> Self {
        Self {
            source_node_id: source_node_id.into(),
            source_field_key: source_field_key.into(),
            form_id: None,
        }
    }

    /// A reference into the global data catalog.
    pub fn global(source_field_key: impl Into<String>) -> Self {
        Self::new(GLOBAL_DATA_ID, source_field_key)
    }

    pub fn is_global(&self) -> bool {
        self.source_node_id == GLOBAL_DATA_ID
    }
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Display metadata for one field of a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avantos_type: Option<String>,
}

impl FieldMeta {
    pub fn new(title: &str, field_type: &str) -> Self {
        Self {
            title: Some(title.to_owned()),
            field_type: Some(field_type.to_owned()),
            avantos_type: None,
        }
    }

    /// The field's title, or its key when untitled.
    pub fn display_title<'a>(&'a self, key: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(key)
    }

    /// The most specific type name available.
    pub fn display_type(&self) -> Option<&str> {
        self.avantos_type.as_deref().or(self.field_type.as_deref())
    }
}

/// Field key → metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: BTreeMap<String, FieldMeta>,
}

/// A reusable form; many nodes may reference the same definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub field_schema: FieldSchema,
}

// ---------------------------------------------------------------------------
// WorkflowNode
// ---------------------------------------------------------------------------

/// The `data` block of a node in the blueprint document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Id of the [`FormDefinition`] this node renders.
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Raw prefill configuration; entries are validated when the mapping
    /// store is seeded.
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_mapping: BTreeMap<String, Value>,
}

/// A single form in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique identifier within the graph (referenced by edges).
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: NodeData,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, form_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: Some("form".into()),
            data: NodeData {
                component_id: Some(form_id.into()),
                name: Some(name.into()),
                ..NodeData::default()
            },
        }
    }

    pub fn form_id(&self) -> Option<&str> {
        self.data.component_id.as_deref()
    }

    /// Parse `input_mapping` into source references.
    ///
    /// `null` entries mean "unmapped" and are dropped silently; entries
    /// of any other unexpected shape are dropped with a warning.
    pub fn initial_mapping(&self) -> BTreeMap<String, SourceRef> {
        let mut mapping = BTreeMap::new();
        for (field_key, raw) in &self.data.input_mapping {
            if raw.is_null() {
                continue;
            }
            match serde_json::from_value::<SourceRef>(raw.clone()) {
                Ok(source) => {
                    mapping.insert(field_key.clone(), source);
                }
                Err(e) => warn!(
                    "node '{}': ignoring malformed mapping for '{}': {}",
                    self.id, field_key, e
                ),
            }
        }
        mapping
    }
}

// ---------------------------------------------------------------------------
// WorkflowEdge
// ---------------------------------------------------------------------------

/// Directed edge: `target` depends on / comes after `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    /// Stable identifier; synthesised as `source-target` when absent.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    pub source: String,
    pub target: String,
}

impl WorkflowEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let mut edge = Self {
            id: String::new(),
            source: source.into(),
            target: target.into(),
        };
        edge.ensure_id();
        edge
    }

    /// Fill in the synthetic id if the document did not carry one.
    pub fn ensure_id(&mut self) {
        if self.id.is_empty() {
            self.id = format!("{}-{}", self.source, self.target);
        }
    }
}
