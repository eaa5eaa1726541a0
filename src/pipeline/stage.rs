//! Pipeline stages and their fallback policy.
//!
//! Every stage follows the same shape: build a bounded prompt input, fetch
//! the cached worker, invoke it through the bounded executor, and substitute
//! deterministic fallback content on timeout or failure. Fallback selection
//! is a value-level branch on [`StageOutcome`], so no stage ever escalates a
//! capability problem past its own boundary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};

use crate::capability::{Capability, WorkerRegistry};
use crate::prompts;

use super::config::PipelineConfig;
use super::executor::BoundedExecutor;
use super::text::{clean_output, extract_key_points, truncate_chars};

/// Marker stored in stage fields a run mode skipped entirely.
pub const SKIPPED_MARKER: &str = "skipped";

/// Why a stage fell back to deterministic content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// The capability call exceeded the stage's wall-clock budget. The
    /// underlying call was abandoned, so its true outcome is unknown.
    TimedOut,
    /// The capability call returned an error, or produced empty output.
    Failed(String),
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradeReason::TimedOut => write!(f, "timed out"),
            DegradeReason::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome of a single stage: live generation or deterministic fallback.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    /// Cleaned output from a live capability call.
    Generated(String),
    /// Fallback content substituted for a missing or failed call.
    Degraded { text: String, reason: DegradeReason },
}

impl StageOutcome {
    /// The stage's text, regardless of how it was produced.
    pub fn text(&self) -> &str {
        match self {
            StageOutcome::Generated(text) => text,
            StageOutcome::Degraded { text, .. } => text,
        }
    }

    /// Whether this outcome came from a fallback.
    pub fn is_degraded(&self) -> bool {
        matches!(self, StageOutcome::Degraded { .. })
    }
}

/// Serialized stage output: the text plus a degradation marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub text: String,
    pub degraded: bool,
}

impl StageResult {
    /// Result recorded for stages a run mode skipped entirely.
    pub fn skipped() -> Self {
        Self {
            text: SKIPPED_MARKER.to_string(),
            degraded: false,
        }
    }

    /// Whether this field holds the skipped marker.
    pub fn is_skipped(&self) -> bool {
        self.text == SKIPPED_MARKER && !self.degraded
    }
}

impl From<StageOutcome> for StageResult {
    fn from(outcome: StageOutcome) -> Self {
        match outcome {
            StageOutcome::Generated(text) => Self {
                text,
                degraded: false,
            },
            StageOutcome::Degraded { text, .. } => Self {
                text,
                degraded: true,
            },
        }
    }
}

/// Output of the analysis stage: the stage result plus derived key points.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub outcome: StageOutcome,
    pub key_points: Vec<String>,
}

/// Runs individual pipeline stages against cached capability workers.
pub struct StageRunner {
    registry: Arc<WorkerRegistry>,
    executor: Arc<BoundedExecutor>,
    config: PipelineConfig,
}

impl StageRunner {
    /// Creates a runner over the given registry and executor.
    pub fn new(
        registry: Arc<WorkerRegistry>,
        executor: Arc<BoundedExecutor>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            executor,
            config,
        }
    }

    /// The runner's configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Uniform stage body: invoke the capability under its timeout, fall back
    /// on timeout, failure, or empty output.
    async fn run(
        &self,
        capability: Capability,
        timeout: Duration,
        input: String,
        fallback: String,
    ) -> StageOutcome {
        let worker = self.registry.get(capability).await;
        let invocation = async move { worker.invoke(&input).await };

        match self.executor.run_with_timeout(timeout, invocation).await {
            None => {
                warn!(stage = %capability, "no result within the stage budget, using fallback");
                StageOutcome::Degraded {
                    text: fallback,
                    reason: DegradeReason::TimedOut,
                }
            }
            Some(Err(e)) => {
                error!(stage = %capability, error = %e, "capability call failed, using fallback");
                StageOutcome::Degraded {
                    text: fallback,
                    reason: DegradeReason::Failed(e.to_string()),
                }
            }
            Some(Ok(raw)) => {
                let cleaned = clean_output(&raw);
                if cleaned.is_empty() {
                    warn!(stage = %capability, "capability returned empty output, using fallback");
                    StageOutcome::Degraded {
                        text: fallback,
                        reason: DegradeReason::Failed("empty output".to_string()),
                    }
                } else {
                    StageOutcome::Generated(cleaned)
                }
            }
        }
    }

    /// Research stage: query plus truncated retrieved context.
    pub async fn research(&self, query: &str, context: &[String]) -> StageOutcome {
        let budget = self.config.research;
        let joined = context.join("\n\n");
        let input =
            prompts::build_research_input(query, truncate_chars(&joined, budget.max_input_chars));
        let fallback =
            format!("Unable to complete research for: {query}. Using basic information.");
        self.run(Capability::Research, budget.timeout, input, fallback)
            .await
    }

    /// Analysis stage: query plus truncated research; also derives key points.
    pub async fn analysis(&self, query: &str, research: &str) -> AnalysisOutput {
        let budget = self.config.analysis;
        let input =
            prompts::build_analysis_input(query, truncate_chars(research, budget.max_input_chars));
        let fallback = format!(
            "Basic analysis: {query} has significant impacts that require detailed examination."
        );
        let outcome = self
            .run(Capability::Analysis, budget.timeout, input, fallback)
            .await;
        let key_points = extract_key_points(outcome.text());
        AnalysisOutput {
            outcome,
            key_points,
        }
    }

    /// Planning stage: query plus truncated analysis.
    pub async fn planning(&self, query: &str, analysis: &str) -> StageOutcome {
        let budget = self.config.planning;
        let input =
            prompts::build_plan_input(query, truncate_chars(analysis, budget.max_input_chars));
        self.run(
            Capability::Planning,
            budget.timeout,
            input,
            fallback_plan(query),
        )
        .await
    }

    /// Writing stage: query plus truncated plan and truncated analysis.
    pub async fn writing(&self, query: &str, plan: &str, analysis: &str) -> StageOutcome {
        let budget = self.config.writing;
        let analysis_excerpt = truncate_chars(analysis, budget.max_input_chars);
        let input = prompts::build_write_input(
            query,
            truncate_chars(plan, budget.max_input_chars),
            analysis_excerpt,
        );
        let fallback = fallback_draft(query, analysis_excerpt);
        self.run(Capability::Writing, budget.timeout, input, fallback)
            .await
    }

    /// Validation stage: query plus truncated draft.
    pub async fn validation(&self, query: &str, draft: &str) -> StageOutcome {
        let budget = self.config.validation;
        let input =
            prompts::build_validation_input(query, truncate_chars(draft, budget.max_input_chars));
        let fallback = format!(
            "Content validation completed for {query}. The article covers the main aspects of \
the topic."
        );
        self.run(Capability::Validation, budget.timeout, input, fallback)
            .await
    }

    /// Strategic report stage: truncated research plus truncated plan.
    pub async fn report(&self, query: &str, research: &str, plan: &str) -> StageOutcome {
        let budget = self.config.report;
        let input = prompts::build_report_input(
            query,
            truncate_chars(research, budget.max_input_chars),
            truncate_chars(plan, budget.max_input_chars),
        );
        let fallback = format!(
            "Strategic report unavailable for {query}. Refer to the research findings and \
content plan for guidance."
        );
        self.run(Capability::Report, budget.timeout, input, fallback)
            .await
    }

    /// SWOT stage: truncated analysis.
    pub async fn swot(&self, query: &str, analysis: &str) -> StageOutcome {
        let budget = self.config.swot;
        let input =
            prompts::build_swot_input(query, truncate_chars(analysis, budget.max_input_chars));
        let fallback = format!(
            "SWOT analysis unavailable for {query}.\n\
Strengths: pending detailed assessment.\n\
Weaknesses: pending detailed assessment.\n\
Opportunities: pending detailed assessment.\n\
Threats: pending detailed assessment."
        );
        self.run(Capability::Swot, budget.timeout, input, fallback)
            .await
    }

    /// Timeline stage: truncated plan.
    pub async fn timeline(&self, query: &str, plan: &str) -> StageOutcome {
        let budget = self.config.timeline;
        let input =
            prompts::build_timeline_input(query, truncate_chars(plan, budget.max_input_chars));
        let fallback = format!(
            "Timeline unavailable for {query}. A quarterly breakdown should be derived from \
the content plan."
        );
        self.run(Capability::Timeline, budget.timeout, input, fallback)
            .await
    }
}

fn fallback_plan(query: &str) -> String {
    format!(
        "Content Plan for {query}:\n\
1. Introduction and Overview\n\
2. Current State Analysis\n\
3. Key Benefits and Opportunities\n\
4. Challenges and Concerns\n\
5. Future Implications\n\
6. Recommendations and Conclusion"
    )
}

fn fallback_draft(query: &str, analysis: &str) -> String {
    format!(
        "# {query}\n\
## Introduction\n\
{query} represents a significant area of development with far-reaching implications.\n\
## Analysis\n\
{analysis}\n\
## Conclusion\n\
Understanding {query} is crucial for navigating future developments in this field."
    )
}
