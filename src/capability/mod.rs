//! Generative capabilities and their workers.
//!
//! Each pipeline stage depends on one [`Capability`]: a named generation
//! function exposed behind the uniform `invoke(input) -> text` contract of
//! [`CapabilityWorker`]. Workers are cheap handles (system prompt + sampling
//! parameters + a shared provider), but they are cached in a
//! [`WorkerRegistry`] so repeated pipeline runs reuse one instance per
//! capability.

pub mod registry;

pub use registry::WorkerRegistry;

use std::sync::Arc;

use crate::error::LlmError;
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::prompts;

/// A generative capability backing one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Research,
    Analysis,
    Planning,
    Writing,
    Validation,
    Report,
    Swot,
    Timeline,
}

impl Capability {
    /// All capabilities, in stage dependency order.
    pub const ALL: [Capability; 8] = [
        Capability::Research,
        Capability::Analysis,
        Capability::Planning,
        Capability::Writing,
        Capability::Validation,
        Capability::Report,
        Capability::Swot,
        Capability::Timeline,
    ];

    /// Stable name, used as the cache key and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Research => "research",
            Capability::Analysis => "analysis",
            Capability::Planning => "planning",
            Capability::Writing => "writing",
            Capability::Validation => "validation",
            Capability::Report => "report",
            Capability::Swot => "swot",
            Capability::Timeline => "timeline",
        }
    }

    /// Sampling temperature for this capability.
    ///
    /// Research and writing benefit from some creativity; the timeline needs
    /// structured, low-variance output.
    fn temperature(&self) -> f64 {
        match self {
            Capability::Research | Capability::Writing => 0.7,
            Capability::Timeline => 0.1,
            _ => 0.3,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Wraps one generation capability behind a uniform invoke contract.
pub struct CapabilityWorker {
    capability: Capability,
    provider: Arc<dyn LlmProvider>,
    max_tokens: u32,
}

impl std::fmt::Debug for CapabilityWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityWorker")
            .field("capability", &self.capability)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl CapabilityWorker {
    /// Creates a worker for a capability over the given provider.
    pub fn new(capability: Capability, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            capability,
            provider,
            max_tokens: 2048,
        }
    }

    /// The capability this worker serves.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Invokes the capability with the given prompt input.
    ///
    /// Latency is unbounded; callers run this through a bounded executor.
    pub async fn invoke(&self, input: &str) -> Result<String, LlmError> {
        let request = GenerationRequest::new(
            "",
            vec![
                Message::system(prompts::system_prompt(self.capability)),
                Message::user(input),
            ],
        )
        .with_temperature(self.capability.temperature())
        .with_max_tokens(self.max_tokens);

        let response = self.provider.generate(request).await?;

        response
            .first_content()
            .map(str::to_owned)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Choice, GenerationResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct EchoProvider {
        last_request: Mutex<Option<GenerationRequest>>,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            *self.last_request.lock().expect("lock not poisoned") = Some(request);
            Ok(GenerationResponse {
                id: "test".to_string(),
                model: "test".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant("output"),
                    finish_reason: Some("stop".to_string()),
                }],
                usage: None,
            })
        }
    }

    #[test]
    fn test_capability_names_unique() {
        for (i, a) in Capability::ALL.iter().enumerate() {
            for b in Capability::ALL.iter().skip(i + 1) {
                assert_ne!(a.name(), b.name());
            }
        }
    }

    #[tokio::test]
    async fn test_worker_sends_system_prompt_and_input() {
        let provider = Arc::new(EchoProvider {
            last_request: Mutex::new(None),
        });
        let worker = CapabilityWorker::new(Capability::Analysis, provider.clone());

        let output = worker.invoke("analyze this").await.expect("invoke succeeds");
        assert_eq!(output, "output");

        let request = provider
            .last_request
            .lock()
            .expect("lock not poisoned")
            .clone()
            .expect("request recorded");
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(
            request.messages[0].content,
            prompts::system_prompt(Capability::Analysis)
        );
        assert_eq!(request.messages[1].content, "analyze this");
    }
}
