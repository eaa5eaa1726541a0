//! Prompts for each pipeline capability.
//!
//! System prompts define the role a capability plays; the `build_*_input`
//! functions assemble the user-side prompt input from the query and the
//! upstream stage outputs. Callers are responsible for truncating upstream
//! text to the stage's input budget before building the prompt.

use crate::capability::Capability;

/// System prompt for the research capability.
pub const RESEARCHER_SYSTEM: &str = "You are a research specialist. Gather comprehensive, \
factual background on the requested topic: current state, key developments, notable figures \
and organizations, and open problems. Prefer concrete details over generalities.";

/// System prompt for the analysis capability.
pub const ANALYST_SYSTEM: &str = "You are an analyst. Examine the supplied research findings \
and surface the most significant implications, tensions, and opportunities. Answer as concise \
bullet points, one point per line.";

/// System prompt for the planning capability.
pub const PLANNER_SYSTEM: &str = "You are a content strategist. Produce a clear, numbered \
content plan for a long-form article: section titles with a one-line description of what each \
section covers.";

/// System prompt for the writing capability.
pub const WRITER_SYSTEM: &str = "You are a professional writer. Write a well-structured \
long-form article in markdown, following the supplied content plan and grounded in the \
supplied analysis.";

/// System prompt for the validation capability.
pub const VALIDATOR_SYSTEM: &str = "You are an editor. Review the supplied article for \
factual plausibility, structure, and topic coverage. Report concrete issues and an overall \
assessment.";

/// System prompt for the strategic report capability.
pub const REPORT_SYSTEM: &str = "You are a strategy consultant. Based on the supplied \
research and plan, write a comprehensive strategic report. Ensure clarity, structure, and \
actionable recommendations.";

/// System prompt for the SWOT capability.
pub const SWOT_SYSTEM: &str = "Perform a SWOT analysis of the supplied content. Return the \
analysis in bullet format with headings for Strengths, Weaknesses, Opportunities, and \
Threats.";

/// System prompt for the timeline capability.
pub const TIMELINE_SYSTEM: &str = "Given a content plan, create a detailed quarterly timeline \
(Q1 through Q4) with key milestones, deliverables, and success criteria per quarter. Include \
dependencies between quarters. Be specific and actionable.";

/// Returns the system prompt for a capability.
pub fn system_prompt(capability: Capability) -> &'static str {
    match capability {
        Capability::Research => RESEARCHER_SYSTEM,
        Capability::Analysis => ANALYST_SYSTEM,
        Capability::Planning => PLANNER_SYSTEM,
        Capability::Writing => WRITER_SYSTEM,
        Capability::Validation => VALIDATOR_SYSTEM,
        Capability::Report => REPORT_SYSTEM,
        Capability::Swot => SWOT_SYSTEM,
        Capability::Timeline => TIMELINE_SYSTEM,
    }
}

/// Builds the research prompt input from the query and retrieved context.
pub fn build_research_input(query: &str, context: &str) -> String {
    let mut input = format!("Research the following topic: {query}");
    if !context.is_empty() {
        input.push_str(&format!("\n\nContext from knowledge base:\n{context}"));
    }
    input
}

/// Builds the analysis prompt input from the query and research output.
pub fn build_analysis_input(query: &str, research: &str) -> String {
    format!("Analyze the following research findings about '{query}':\n\n{research}")
}

/// Builds the planning prompt input from the query and analysis output.
pub fn build_plan_input(query: &str, analysis: &str) -> String {
    format!(
        "Create a comprehensive content plan for the topic '{query}' based on this \
analysis:\n\n{analysis}"
    )
}

/// Builds the writing prompt input from the query, plan, and analysis.
pub fn build_write_input(query: &str, plan: &str, analysis: &str) -> String {
    format!(
        "Write a comprehensive article about '{query}' following this content \
plan:\n\n{plan}\n\nBased on this analysis:\n{analysis}"
    )
}

/// Builds the validation prompt input from the query and article draft.
pub fn build_validation_input(query: &str, draft: &str) -> String {
    format!("Review and validate this article about '{query}':\n\n{draft}")
}

/// Builds the strategic report prompt input from the research and plan.
pub fn build_report_input(query: &str, research: &str, plan: &str) -> String {
    format!("Write a strategic report for '{query}'.\n\nResearch:\n{research}\n\nPlan:\n{plan}")
}

/// Builds the SWOT prompt input from the analysis output.
pub fn build_swot_input(query: &str, analysis: &str) -> String {
    format!("Perform a SWOT analysis of '{query}' based on the following content:\n\n{analysis}")
}

/// Builds the timeline prompt input from the content plan.
pub fn build_timeline_input(query: &str, plan: &str) -> String {
    format!("Create a quarterly timeline for '{query}' based on the following plan:\n\n{plan}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_input_without_context() {
        let input = build_research_input("solar grids", "");
        assert!(input.contains("solar grids"));
        assert!(!input.contains("knowledge base"));
    }

    #[test]
    fn test_research_input_with_context() {
        let input = build_research_input("solar grids", "prior findings");
        assert!(input.contains("Context from knowledge base:\nprior findings"));
    }

    #[test]
    fn test_inputs_chain_upstream_text() {
        assert!(build_analysis_input("q", "research text").contains("research text"));
        assert!(build_plan_input("q", "analysis text").contains("analysis text"));
        let write = build_write_input("q", "the plan", "the analysis");
        assert!(write.contains("the plan"));
        assert!(write.contains("the analysis"));
    }

    #[test]
    fn test_system_prompts_are_distinct() {
        let prompts: Vec<&str> = Capability::ALL.iter().map(|c| system_prompt(*c)).collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
