//! Engine-level error types.
//!
//! Only loading and explicit lookups can fail.  Unreachable prefill
//! references and malformed nodes are never errors: they degrade to
//! omission.

use thiserror::Error;

/// Errors produced by the prefill engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The graph source could not deliver a document.
    #[error("graph source failed: {0}")]
    Source(#[from] source::SourceError),

    /// The document is not shaped like `{ nodes, edges, forms }`.
    #[error("malformed graph document: {0}")]
    MalformedDocument(String),

    /// A node id that is not part of the loaded graph.
    #[error("unknown node: '{0}'")]
    UnknownNode(String),
}
