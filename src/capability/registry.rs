//! Worker registry: a lazily-populated cache of capability workers.
//!
//! The registry is the only state shared across concurrent pipeline runs.
//! It guarantees at most one worker per capability even under concurrent
//! first access: construction happens while holding the map lock, which is
//! safe because building a worker is pure struct assembly with no I/O.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::llm::LlmProvider;

use super::{Capability, CapabilityWorker};

/// Lazily-populated mapping from capability to an initialized worker.
pub struct WorkerRegistry {
    provider: Arc<dyn LlmProvider>,
    workers: Mutex<HashMap<Capability, Arc<CapabilityWorker>>>,
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry").finish_non_exhaustive()
    }
}

impl WorkerRegistry {
    /// Creates an empty registry over the given provider.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached worker for a capability, constructing it on first
    /// access. All callers observe the same instance until [`clear`] is
    /// called.
    ///
    /// [`clear`]: WorkerRegistry::clear
    pub async fn get(&self, capability: Capability) -> Arc<CapabilityWorker> {
        let mut workers = self.workers.lock().await;
        let worker = workers.entry(capability).or_insert_with(|| {
            debug!(%capability, "initializing capability worker");
            Arc::new(CapabilityWorker::new(
                capability,
                Arc::clone(&self.provider),
            ))
        });
        Arc::clone(worker)
    }

    /// Evicts all cached workers. Subsequent `get` calls construct fresh
    /// instances.
    pub async fn clear(&self) {
        self.workers.lock().await.clear();
        debug!("worker registry cleared");
    }

    /// Number of currently cached workers.
    pub async fn len(&self) -> usize {
        self.workers.lock().await.len()
    }

    /// Whether the registry has no cached workers.
    pub async fn is_empty(&self) -> bool {
        self.workers.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{GenerationRequest, GenerationResponse};
    use async_trait::async_trait;

    struct NullProvider;

    #[async_trait]
    impl LlmProvider for NullProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            Err(LlmError::RequestFailed("null provider".to_string()))
        }
    }

    #[tokio::test]
    async fn test_get_returns_same_instance() {
        let registry = WorkerRegistry::new(Arc::new(NullProvider));

        let first = registry.get(Capability::Research).await;
        let second = registry.get(Capability::Research).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_capabilities_distinct_workers() {
        let registry = WorkerRegistry::new(Arc::new(NullProvider));

        let research = registry.get(Capability::Research).await;
        let analysis = registry.get(Capability::Analysis).await;
        assert!(!Arc::ptr_eq(&research, &analysis));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_clear_evicts_all_entries() {
        let registry = WorkerRegistry::new(Arc::new(NullProvider));

        let before = registry.get(Capability::Swot).await;
        registry.clear().await;
        assert!(registry.is_empty().await);

        let after = registry.get(Capability::Swot).await;
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_concurrent_first_access_single_instance() {
        let registry = Arc::new(WorkerRegistry::new(Arc::new(NullProvider)));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.get(Capability::Writing).await })
            })
            .collect();

        let mut workers = Vec::new();
        for task in tasks {
            workers.push(task.await.expect("task completes"));
        }

        for worker in &workers[1..] {
            assert!(Arc::ptr_eq(&workers[0], worker));
        }
        assert_eq!(registry.len().await, 1);
    }
}
