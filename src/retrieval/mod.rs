//! Semantic retrieval collaborator interface.
//!
//! The pipeline seeds research with snippets of prior knowledge from a
//! semantic index. The index's similarity-search mechanics live behind
//! [`DocumentRetriever`]; the orchestrator only depends on the contract that
//! a search may return fewer (or zero) snippets and may fail, in which case
//! the run proceeds with empty context.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A snippet of prior knowledge returned by the semantic index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
    /// Snippet text.
    pub content: String,
    /// Optional provenance label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl RetrievedDoc {
    /// Creates a snippet without provenance.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: None,
        }
    }

    /// Attaches a provenance label.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Semantic index lookup used to seed research with prior knowledge.
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Returns up to `k` snippets semantically similar to `query`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDoc>, RetrievalError>;
}
