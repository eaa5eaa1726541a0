//! reportforge: long-form research artifact generation.
//!
//! This library orchestrates a sequence of generative stages (research,
//! analysis, planning, writing, and a parallel validation/report/SWOT/timeline
//! finish) over an OpenAI-compatible text-generation API. Each stage is
//! bounded by a wall-clock timeout and degrades to deterministic fallback
//! content instead of failing the run; completed runs are indexed and
//! persisted in the background without blocking the caller.

pub mod capability;
pub mod cli;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod retrieval;
pub mod storage;

// Re-export commonly used types
pub use error::{LlmError, RetrievalError, StoreError};
pub use pipeline::{
    PipelineConfig, PipelineMode, PipelineOrchestrator, PipelineRun, RunStatus, StageResult,
};
