//! The generation pipeline.
//!
//! The pipeline runs a query through sequential stages (research → analysis →
//! planning → writing), then fans the four independent final stages
//! (validation, strategic report, SWOT, timeline) out in parallel, and
//! finally fires background indexing/persistence without blocking the
//! caller.
//!
//! Every stage is bounded by a per-stage timeout and substitutes
//! deterministic fallback content on timeout or capability failure; a run
//! always produces a complete [`PipelineRun`], with
//! [`StageResult::degraded`] marking where quality was traded for
//! availability.

pub mod background;
pub mod config;
pub mod executor;
pub mod fanout;
pub mod orchestrator;
pub mod stage;
pub mod text;

pub use background::BackgroundTasks;
pub use config::{ConfigError, PipelineConfig, StageBudget};
pub use executor::BoundedExecutor;
pub use fanout::FinalSections;
pub use orchestrator::{PipelineMode, PipelineOrchestrator, PipelineRun, RunState, RunStatus};
pub use stage::{
    AnalysisOutput, DegradeReason, StageOutcome, StageResult, StageRunner, SKIPPED_MARKER,
};
