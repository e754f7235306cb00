//! Submission tracking.
//!
//! Each node is either `Pending` (no record) or `Submitted` (record
//! present).  A submit always succeeds and replaces the previous record
//! wholesale; there is no way back to `Pending`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::FieldValue;

/// Field key → submitted value.
pub type SubmissionRecord = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Pending,
    Submitted,
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Submitted => write!(f, "submitted"),
        }
    }
}

/// Submitted values of every node.
///
/// Like the mapping store, a submit yields a new tracker and shares every
/// other node's record with the previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionTracker {
    records: HashMap<String, Arc<SubmissionRecord>>,
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `values` for `node_id`, replacing any earlier submission.
    pub fn submit(&self, node_id: &str, values: SubmissionRecord) -> Self {
        let mut next = self.clone();
        next.records.insert(node_id.to_owned(), Arc::new(values));
        next
    }

    pub fn state(&self, node_id: &str) -> SubmissionState {
        if self.records.contains_key(node_id) {
            SubmissionState::Submitted
        } else {
            SubmissionState::Pending
        }
    }

    pub fn is_submitted(&self, node_id: &str) -> bool {
        self.state(node_id) == SubmissionState::Submitted
    }

    /// Submitted with at least one value, i.e. usable as a prefill source.
    pub fn has_values(&self, node_id: &str) -> bool {
        self.records.get(node_id).is_some_and(|r| !r.is_empty())
    }

    pub fn values(&self, node_id: &str) -> Option<&SubmissionRecord> {
        self.records.get(node_id).map(Arc::as_ref)
    }

    /// Shared handle to the node's record.
    pub fn record(&self, node_id: &str) -> Option<Arc<SubmissionRecord>> {
        self.records.get(node_id).cloned()
    }
}

/// The value set for one submit: resolved prefill values overlaid with the
/// user's explicit edits.  An edit always wins over a prefilled value.
pub fn compose_submission(
    prefill: &BTreeMap<String, FieldValue>,
    edits: &BTreeMap<String, FieldValue>,
) -> SubmissionRecord {
    let mut values = prefill.clone();
    values.extend(edits.iter().map(|(k, v)| (k.clone(), v.clone())));
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> SubmissionRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
            .collect()
    }

    #[test]
    fn nodes_start_pending() {
        let tracker = SubmissionTracker::new();
        assert_eq!(tracker.state("form-a"), SubmissionState::Pending);
        assert_eq!(tracker.state("form-a").to_string(), "pending");
        assert!(tracker.values("form-a").is_none());
    }

    #[test]
    fn submit_flips_to_submitted() {
        let tracker = SubmissionTracker::new().submit("form-a", record(&[("fullName", "Ada")]));
        assert!(tracker.is_submitted("form-a"));
        assert!(tracker.has_values("form-a"));
        assert_eq!(tracker.values("form-a").unwrap()["fullName"], FieldValue::from("Ada"));
    }

    #[test]
    fn resubmission_replaces_rather_than_merges() {
        let tracker = SubmissionTracker::new()
            .submit("form-a", record(&[("fullName", "Ada"), ("email", "ada@example.com")]))
            .submit("form-a", record(&[("fullName", "Grace")]));

        let values = tracker.values("form-a").unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values["fullName"], FieldValue::from("Grace"));
    }

    #[test]
    fn empty_submit_counts_as_submitted_but_offers_nothing() {
        let tracker = SubmissionTracker::new().submit("form-a", SubmissionRecord::new());
        assert!(tracker.is_submitted("form-a"));
        assert!(!tracker.has_values("form-a"));
    }

    #[test]
    fn earlier_snapshots_are_not_affected() {
        let before = SubmissionTracker::new();
        let after = before.submit("form-a", record(&[("x", "1")]));
        assert!(!before.is_submitted("form-a"));
        assert!(after.is_submitted("form-a"));
    }

    #[test]
    fn edits_override_prefill() {
        let prefill = record(&[("name", "Ada"), ("email", "ada@example.com")]);
        let edits = record(&[("name", "Grace"), ("notes", "hi")]);

        let values = compose_submission(&prefill, &edits);
        assert_eq!(values["name"], FieldValue::from("Grace"));
        assert_eq!(values["email"], FieldValue::from("ada@example.com"));
        assert_eq!(values["notes"], FieldValue::from("hi"));
    }
}
