//! Prefill resolution.
//!
//! A pure function of mapping + submission snapshot + global data: it never
//! sees live user edits.  Every mapped field whose source cannot currently
//! deliver a value is simply absent from the result, so "has a prefill" is
//! a key-presence check for the caller.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::global::GlobalData;
use crate::mapping::NodeMapping;
use crate::models::{FieldValue, SourceRef};
use crate::submission::SubmissionTracker;

/// Concrete prefill value for every resolvable field of `node_id`.
///
/// `upstream` is the node's ancestor set; a non-global source outside it
/// is treated as unresolved even if that node has submitted.
pub fn resolve_values(
    node_id: &str,
    mapping: &NodeMapping,
    submissions: &SubmissionTracker,
    global: &GlobalData,
    upstream: &HashSet<String>,
) -> BTreeMap<String, FieldValue> {
    let mut resolved = BTreeMap::new();

    for (field_key, source) in mapping {
        match resolve_one(source, submissions, global, upstream) {
            Some(value) => {
                resolved.insert(field_key.clone(), value.clone());
            }
            None => debug!(
                node_id,
                field_key = %field_key,
                source_node = %source.source_node_id,
                source_field = %source.source_field_key,
                "prefill unresolved"
            ),
        }
    }

    resolved
}

fn resolve_one<'a>(
    source: &SourceRef,
    submissions: &'a SubmissionTracker,
    global: &'a GlobalData,
    upstream: &HashSet<String>,
) -> Option<&'a FieldValue> {
    if source.is_global() {
        return global.value(&source.source_field_key);
    }
    if !upstream.contains(&source.source_node_id) {
        return None;
    }
    submissions
        .values(&source.source_node_id)?
        .get(&source.source_field_key)
}
