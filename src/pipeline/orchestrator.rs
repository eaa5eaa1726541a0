//! Pipeline orchestrator for research artifact generation.
//!
//! This module provides the main `PipelineOrchestrator` that coordinates:
//! - Retrieval of prior knowledge to seed research
//! - The sequential research → analysis → planning → writing stages
//! - The parallel validation/report/SWOT/timeline finish
//! - Assembly of the final `PipelineRun` record
//! - Best-effort background indexing and persistence
//!
//! There is no run-fatal path in normal operation: every run returns a
//! complete record, with per-stage `degraded` markers showing where quality
//! was sacrificed for availability.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::capability::WorkerRegistry;
use crate::llm::LlmProvider;
use crate::retrieval::DocumentRetriever;
use crate::storage::{DocumentIndex, IndexDocument, ResultStore};

use super::background::BackgroundTasks;
use super::config::{ConfigError, PipelineConfig};
use super::executor::BoundedExecutor;
use super::fanout::{run_final, FinalSections};
use super::stage::{StageOutcome, StageResult, StageRunner};
use super::text::truncate_chars;

/// How long `shutdown` waits for in-flight background work.
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Run mode: the enabled stage set, decided once at run start.
///
/// Degradation never changes the stage sequence; skipping stages is a
/// mode-level decision only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Research and analysis only; no retrieval, fan-out, or persistence.
    /// Optimized for lowest latency.
    Express,
    /// Everything except the fan-out stages; their fields carry the skipped
    /// marker.
    Balanced,
    /// The full stage set.
    Comprehensive,
}

impl PipelineMode {
    fn includes_retrieval(self) -> bool {
        !matches!(self, PipelineMode::Express)
    }

    fn includes_planning_and_writing(self) -> bool {
        !matches!(self, PipelineMode::Express)
    }

    fn includes_fanout(self) -> bool {
        matches!(self, PipelineMode::Comprehensive)
    }

    fn includes_background_effects(self) -> bool {
        !matches!(self, PipelineMode::Express)
    }

    fn final_status(self) -> RunStatus {
        match self {
            PipelineMode::Express => RunStatus::ExpressCompleted,
            _ => RunStatus::Completed,
        }
    }
}

impl std::fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineMode::Express => write!(f, "express"),
            PipelineMode::Balanced => write!(f, "balanced"),
            PipelineMode::Comprehensive => write!(f, "comprehensive"),
        }
    }
}

/// Progression of a single run. Transitions are logged in dependency order;
/// a degraded stage still passes through its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Started,
    Retrieving,
    Researching,
    Analyzing,
    Planning,
    Writing,
    Finalizing,
    Completed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunState::Started => "started",
            RunState::Retrieving => "retrieving",
            RunState::Researching => "researching",
            RunState::Analyzing => "analyzing",
            RunState::Planning => "planning",
            RunState::Writing => "writing",
            RunState::Finalizing => "finalizing",
            RunState::Completed => "completed",
        };
        write!(f, "{name}")
    }
}

/// Final status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    ExpressCompleted,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::ExpressCompleted => write!(f, "express_completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A completed pipeline run.
///
/// Field order reflects stage dependency order; the four fan-out fields keep
/// a fixed order by convention, independent of completion order. Immutable
/// once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub query: String,
    pub started_at: DateTime<Utc>,
    /// Wall-clock execution time in seconds.
    pub execution_time: f64,
    pub retrieved_docs: Vec<String>,
    pub research: StageResult,
    pub analysis: StageResult,
    pub plan: StageResult,
    pub draft: StageResult,
    pub validation: StageResult,
    pub strategic_report: StageResult,
    pub swot_analysis: StageResult,
    pub timeline: StageResult,
    pub key_points: Vec<String>,
    pub status: RunStatus,
}

/// Coordinates stage execution, result assembly, and background effects.
///
/// The worker registry is the only state shared across concurrent runs;
/// everything else is run-scoped. Collaborators are injected as trait
/// objects so tests can run isolated orchestrators against mocks.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    registry: Arc<WorkerRegistry>,
    runner: Arc<StageRunner>,
    background: BackgroundTasks,
    retriever: Option<Arc<dyn DocumentRetriever>>,
    index: Option<Arc<dyn DocumentIndex>>,
    store: Option<Arc<dyn ResultStore>>,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator over the given provider and configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let registry = Arc::new(WorkerRegistry::new(provider));
        let executor = Arc::new(BoundedExecutor::new(config.max_workers));
        let runner = Arc::new(StageRunner::new(
            Arc::clone(&registry),
            executor,
            config.clone(),
        ));

        Ok(Self {
            config,
            registry,
            runner,
            background: BackgroundTasks::new(),
            retriever: None,
            index: None,
            store: None,
        })
    }

    /// Attaches a retrieval collaborator.
    pub fn with_retriever(mut self, retriever: Arc<dyn DocumentRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Attaches an index collaborator for background re-indexing.
    pub fn with_index(mut self, index: Arc<dyn DocumentIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Attaches a result store for background persistence.
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// The orchestrator's configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the full stage set.
    pub async fn run_full(&self, query: &str) -> PipelineRun {
        self.run(query, PipelineMode::Comprehensive).await
    }

    /// Runs research and analysis only, for lowest latency.
    pub async fn run_express(&self, query: &str) -> PipelineRun {
        self.run(query, PipelineMode::Express).await
    }

    /// Runs everything except the fan-out stages.
    pub async fn run_balanced(&self, query: &str) -> PipelineRun {
        self.run(query, PipelineMode::Balanced).await
    }

    /// Evicts all cached capability workers.
    pub async fn clear_cache(&self) {
        self.registry.clear().await;
    }

    /// Waits for in-flight background indexing/persistence to finish.
    pub async fn shutdown(&self) {
        self.background.drain(SHUTDOWN_DRAIN_TIMEOUT).await;
    }

    /// Executes one run with the stage set selected by `mode`.
    async fn run(&self, query: &str, mode: PipelineMode) -> PipelineRun {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut state = RunState::Started;
        info!(%query, %mode, "starting pipeline run");

        let retrieved_docs = if mode.includes_retrieval() {
            advance(&mut state, RunState::Retrieving);
            self.retrieve(query).await
        } else {
            Vec::new()
        };

        advance(&mut state, RunState::Researching);
        let research = self.runner.research(query, &retrieved_docs).await;

        advance(&mut state, RunState::Analyzing);
        let analysis = self.runner.analysis(query, research.text()).await;
        let key_points = analysis.key_points;
        let analysis = analysis.outcome;

        let (plan, draft) = if mode.includes_planning_and_writing() {
            advance(&mut state, RunState::Planning);
            let plan = self.runner.planning(query, analysis.text()).await;

            advance(&mut state, RunState::Writing);
            let draft = self.runner.writing(query, plan.text(), analysis.text()).await;
            (Some(plan), Some(draft))
        } else {
            (None, None)
        };

        advance(&mut state, RunState::Finalizing);
        let finals: Option<FinalSections> = if mode.includes_fanout() {
            Some(
                run_final(
                    &self.runner,
                    query,
                    research.text(),
                    analysis.text(),
                    plan.as_ref().map(|p| p.text()).unwrap_or_default(),
                    draft.as_ref().map(|d| d.text()).unwrap_or_default(),
                )
                .await,
            )
        } else {
            None
        };

        let (validation, strategic_report, swot_analysis, timeline) = match finals {
            Some(sections) => (
                sections.validation.into(),
                sections.report.into(),
                sections.swot.into(),
                sections.timeline.into(),
            ),
            None => (
                StageResult::skipped(),
                StageResult::skipped(),
                StageResult::skipped(),
                StageResult::skipped(),
            ),
        };

        let index_docs = if mode.includes_background_effects() {
            collect_index_docs(query, &research, &analysis, plan.as_ref(), draft.as_ref())
        } else {
            Vec::new()
        };

        let run = PipelineRun {
            id: Uuid::new_v4(),
            query: query.to_string(),
            started_at,
            execution_time: start.elapsed().as_secs_f64(),
            retrieved_docs,
            research: research.into(),
            analysis: analysis.into(),
            plan: plan.map(Into::into).unwrap_or_else(StageResult::skipped),
            draft: draft.map(Into::into).unwrap_or_else(StageResult::skipped),
            validation,
            strategic_report,
            swot_analysis,
            timeline,
            key_points,
            status: mode.final_status(),
        };

        advance(&mut state, RunState::Completed);
        info!(
            run_id = %run.id,
            elapsed_secs = run.execution_time,
            status = %run.status,
            "pipeline run complete"
        );

        if mode.includes_background_effects() {
            self.queue_indexing(&run.query, index_docs);
            self.queue_persistence(&run);
        }

        run
    }

    /// Queries the retrieval collaborator; failure yields empty context.
    async fn retrieve(&self, query: &str) -> Vec<String> {
        let Some(retriever) = &self.retriever else {
            return Vec::new();
        };

        match retriever.search(query, self.config.search_k).await {
            Ok(docs) => docs
                .into_iter()
                .map(|doc| truncate_chars(&doc.content, self.config.max_doc_chars).to_string())
                .collect(),
            Err(e) => {
                error!(error = %e, "retrieval failed, continuing with empty context");
                Vec::new()
            }
        }
    }

    /// Queues background re-indexing of the given documents.
    fn queue_indexing(&self, query: &str, docs: Vec<IndexDocument>) {
        let Some(index) = &self.index else {
            return;
        };
        if docs.is_empty() {
            return;
        }

        let index = Arc::clone(index);
        let query = query.to_string();
        let count = docs.len();
        self.background.spawn("index_update", async move {
            match index.add_documents(docs).await {
                Ok(()) => info!(%query, count, "indexed pipeline outputs"),
                Err(e) => error!(%query, error = %e, "background indexing failed"),
            }
        });
    }

    /// Queues background persistence of the full run record.
    fn queue_persistence(&self, run: &PipelineRun) {
        let Some(store) = &self.store else {
            return;
        };

        let store = Arc::clone(store);
        let run = run.clone();
        self.background.spawn("persist_run", async move {
            match store.save(&run).await {
                Ok(record_id) => info!(%record_id, "pipeline run persisted"),
                Err(e) => error!(run_id = %run.id, error = %e, "background persistence failed"),
            }
        });
    }
}

fn advance(state: &mut RunState, next: RunState) {
    info!(from = %state, to = %next, "pipeline state transition");
    *state = next;
}

/// Index candidates for one run: the live (non-degraded) outputs of the
/// sequential stages. Stages the mode never ran are absent from the candidate
/// set, so eligibility is decided by the outcome tag alone and never by
/// inspecting the text.
fn collect_index_docs(
    query: &str,
    research: &StageOutcome,
    analysis: &StageOutcome,
    plan: Option<&StageOutcome>,
    draft: Option<&StageOutcome>,
) -> Vec<IndexDocument> {
    let candidates = [
        ("research", Some(research)),
        ("analysis", Some(analysis)),
        ("plan", plan),
        ("article", draft),
    ];

    candidates
        .into_iter()
        .filter_map(|(kind, outcome)| {
            outcome
                .filter(|o| !o.is_degraded())
                .map(|o| IndexDocument::new(kind, query, o.text()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_stage_sets() {
        assert!(!PipelineMode::Express.includes_retrieval());
        assert!(!PipelineMode::Express.includes_planning_and_writing());
        assert!(!PipelineMode::Express.includes_fanout());
        assert!(!PipelineMode::Express.includes_background_effects());

        assert!(PipelineMode::Balanced.includes_retrieval());
        assert!(PipelineMode::Balanced.includes_planning_and_writing());
        assert!(!PipelineMode::Balanced.includes_fanout());
        assert!(PipelineMode::Balanced.includes_background_effects());

        assert!(PipelineMode::Comprehensive.includes_fanout());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(RunStatus::Completed).expect("serializes"),
            serde_json::json!("completed")
        );
        assert_eq!(
            serde_json::to_value(RunStatus::ExpressCompleted).expect("serializes"),
            serde_json::json!("express_completed")
        );
        assert_eq!(
            serde_json::to_value(RunStatus::Failed).expect("serializes"),
            serde_json::json!("failed")
        );
    }

    #[test]
    fn test_run_state_display_order() {
        let states = [
            RunState::Started,
            RunState::Retrieving,
            RunState::Researching,
            RunState::Analyzing,
            RunState::Planning,
            RunState::Writing,
            RunState::Finalizing,
            RunState::Completed,
        ];
        let names: Vec<String> = states.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "started",
                "retrieving",
                "researching",
                "analyzing",
                "planning",
                "writing",
                "finalizing",
                "completed"
            ]
        );
    }
}
