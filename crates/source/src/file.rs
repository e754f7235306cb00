//! File-backed graph source.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::{GraphSource, SourceError};

/// Reads the graph document from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl GraphSource for FileSource {
    fn describe(&self) -> String {
        format!("file '{}'", self.path.display())
    }

    async fn fetch(&self) -> Result<Value, SourceError> {
        info!("Reading graph document from {}", self.path.display());
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_reported_as_not_found() {
        let source = FileSource::new("/definitely/not/here/graph.json");
        assert!(matches!(source.fetch().await, Err(SourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn reads_the_shared_fixture() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures/blueprint.json");
        let doc = FileSource::new(path).fetch().await.expect("fixture should load");
        assert!(doc["nodes"].is_array());
        assert!(doc["edges"].is_array());
        assert!(doc["forms"].is_array());
    }
}
