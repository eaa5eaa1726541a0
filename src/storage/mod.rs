//! Persistence collaborators: result store and document index.
//!
//! Completed runs are persisted through [`ResultStore`] and their
//! non-degraded stage outputs are fed back into the semantic index through
//! [`DocumentIndex`]. Both are best-effort from the pipeline's perspective:
//! the orchestrator fires them in the background and only logs failures.
//!
//! [`FileStore`] is the bundled store implementation (one JSON document per
//! run); database-backed stores implement the same trait.

pub mod file_store;

pub use file_store::FileStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RetrievalError, StoreError};
use crate::pipeline::PipelineRun;

/// A generated document queued for indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Document text, prefixed with its kind (e.g. "Research: ...").
    pub content: String,
    /// Stage kind that produced the text ("research", "analysis", ...).
    pub kind: String,
    /// Query of the run the text came from.
    pub query: String,
}

impl IndexDocument {
    /// Creates an index document for one stage output.
    pub fn new(kind: impl Into<String>, query: impl Into<String>, text: &str) -> Self {
        let kind = kind.into();
        let mut label = kind.clone();
        if let Some(first) = label.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Self {
            content: format!("{label}: {text}"),
            kind,
            query: query.into(),
        }
    }
}

/// Write interface of the semantic index.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Adds documents to the index. Best-effort; callers log and drop errors.
    async fn add_documents(&self, docs: Vec<IndexDocument>) -> Result<(), RetrievalError>;
}

/// Durable store for completed pipeline runs.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persists a run, returning its record id.
    async fn save(&self, run: &PipelineRun) -> Result<String, StoreError>;

    /// Returns up to `limit` recent runs, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<PipelineRun>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_document_prefixes_kind() {
        let doc = IndexDocument::new("research", "solar", "findings text");
        assert_eq!(doc.content, "Research: findings text");
        assert_eq!(doc.kind, "research");
        assert_eq!(doc.query, "solar");
    }
}
