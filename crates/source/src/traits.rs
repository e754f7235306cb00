//! The `GraphSource` trait: the contract every graph source must fulfil.

use async_trait::async_trait;
use serde_json::Value;

use crate::SourceError;

/// Delivers the workflow graph document, once, at startup.
///
/// The returned value is the raw `{ nodes, edges, forms }` document; shape
/// checks belong to the engine.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Short human-readable description used in log lines.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Value, SourceError>;
}
