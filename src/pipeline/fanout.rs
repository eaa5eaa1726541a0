//! Parallel fan-out of the four independent final stages.
//!
//! Validation, strategic report, SWOT, and timeline have no ordering
//! relationship with each other; they share the bounded executor's pool
//! (sized so none queues behind another) and are joined as a unit. A timeout
//! or failure in one stage degrades only that stage. The aggregate resolves
//! once all four have, so its worst case is the maximum of the four stage
//! timeouts, not their sum.

use std::sync::Arc;

use super::stage::{StageOutcome, StageRunner};

/// Results of the four final stages, in fixed field order regardless of
/// completion order.
#[derive(Debug, Clone)]
pub struct FinalSections {
    pub validation: StageOutcome,
    pub report: StageOutcome,
    pub swot: StageOutcome,
    pub timeline: StageOutcome,
}

/// Runs the four final stages concurrently and joins all results.
pub async fn run_final(
    runner: &Arc<StageRunner>,
    query: &str,
    research: &str,
    analysis: &str,
    plan: &str,
    draft: &str,
) -> FinalSections {
    let (validation, report, swot, timeline) = futures::join!(
        runner.validation(query, draft),
        runner.report(query, research, plan),
        runner.swot(query, analysis),
        runner.timeline(query, plan),
    );

    FinalSections {
        validation,
        report,
        swot,
        timeline,
    }
}
