//! `MockSource`: a test double for `GraphSource`.
//!
//! Useful in unit and integration tests where reading a real file is
//! either unavailable or irrelevant.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::{GraphSource, SourceError};

/// Behaviour injected into `MockSource` at construction time.
pub enum MockBehaviour {
    /// Return a specific JSON document.
    ReturnDocument(Value),
    /// Fail with `SourceError::Unavailable`.
    FailUnavailable(String),
}

/// A mock source that counts fetches and returns a programmer-specified
/// result.
pub struct MockSource {
    pub behaviour: MockBehaviour,
    fetches: Arc<Mutex<usize>>,
}

impl MockSource {
    /// Create a mock that always succeeds with the given document.
    pub fn returning(document: Value) -> Self {
        Self {
            behaviour: MockBehaviour::ReturnDocument(document),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a mock that always fails.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            behaviour: MockBehaviour::FailUnavailable(msg.into()),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of times `fetch` has been called.
    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl GraphSource for MockSource {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    async fn fetch(&self) -> Result<Value, SourceError> {
        *self.fetches.lock().unwrap() += 1;

        match &self.behaviour {
            MockBehaviour::ReturnDocument(doc) => Ok(doc.clone()),
            MockBehaviour::FailUnavailable(msg) => Err(SourceError::Unavailable(msg.clone())),
        }
    }
}
