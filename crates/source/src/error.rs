//! Typed error type for the source crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("graph document not found at '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read graph document: {0}")]
    Io(#[from] std::io::Error),

    #[error("graph document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The source exists but could not deliver a document.
    #[error("graph source unavailable: {0}")]
    Unavailable(String),
}
