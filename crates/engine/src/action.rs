//! User actions, applied one at a time to a [`Session`].
//!
//! Each action is handled to completion and yields the next snapshot, so
//! a sequence of actions can be replayed deterministically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{FieldValue, SourceRef};
use crate::session::Session;
use crate::submission::SubmissionRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Bind a target field to a source.
    SetMapping {
        node_id: String,
        field_key: String,
        source: SourceRef,
    },
    /// Remove a field's binding.
    ClearMapping { node_id: String, field_key: String },
    /// Submit exactly these values.
    Submit {
        node_id: String,
        #[serde(default)]
        values: SubmissionRecord,
    },
    /// Submit the node's prefill values, with `edits` taking precedence.
    SubmitPrefilled {
        node_id: String,
        #[serde(default)]
        edits: BTreeMap<String, FieldValue>,
    },
}

impl Action {
    /// The node this action targets.
    pub fn node_id(&self) -> &str {
        match self {
            Self::SetMapping { node_id, .. }
            | Self::ClearMapping { node_id, .. }
            | Self::Submit { node_id, .. }
            | Self::SubmitPrefilled { node_id, .. } => node_id,
        }
    }
}

/// The session after an action, plus the nodes a submit unlocked.
#[derive(Debug, Clone)]
pub struct Applied {
    pub session: Session,
    pub unlocked: Vec<String>,
}

impl Session {
    pub fn apply(&self, action: &Action) -> Applied {
        let (session, unlocked) = match action {
            Action::SetMapping {
                node_id,
                field_key,
                source,
            } => (self.set_mapping(node_id, field_key, source.clone()), Vec::new()),
            Action::ClearMapping { node_id, field_key } => {
                (self.clear_mapping(node_id, field_key), Vec::new())
            }
            Action::Submit { node_id, values } => {
                let outcome = self.submit(node_id, values.clone());
                (outcome.session, outcome.unlocked)
            }
            Action::SubmitPrefilled { node_id, edits } => {
                let outcome = self.submit_prefilled(node_id, edits);
                (outcome.session, outcome.unlocked)
            }
        };
        Applied { session, unlocked }
    }
}
