//! Pipeline configuration.
//!
//! Per-stage budgets (timeout + prompt-input size) plus global settings for
//! retrieval and the fan-out worker pool. The named presets mirror the three
//! run modes: `express` trims every budget for latency, `balanced` sits in
//! the middle, and `comprehensive` runs everything with full budgets.
//!
//! The numbers are policy, not law; `validate` only enforces the relative
//! ordering the pipeline depends on (writing gets the longest timeout,
//! planning the shortest) and a fan-out pool wide enough that no final stage
//! queues behind another.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Execution budget for a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageBudget {
    /// Hard wall-clock limit for the capability call.
    pub timeout: Duration,
    /// Character budget applied to each upstream input in the prompt.
    pub max_input_chars: usize,
}

impl StageBudget {
    /// Creates a budget from whole seconds and a character limit.
    pub const fn new(timeout_secs: u64, max_input_chars: usize) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            max_input_chars,
        }
    }
}

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Sequential stage budgets
    pub research: StageBudget,
    pub analysis: StageBudget,
    pub planning: StageBudget,
    pub writing: StageBudget,

    // Final (fan-out) stage budgets
    pub validation: StageBudget,
    pub report: StageBudget,
    pub swot: StageBudget,
    pub timeline: StageBudget,

    // Retrieval settings
    /// Number of snippets requested from the semantic index.
    pub search_k: usize,
    /// Per-snippet character bound applied to retrieved content.
    pub max_doc_chars: usize,

    // Execution settings
    /// Size of the shared capability worker pool.
    pub max_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::comprehensive()
    }
}

impl PipelineConfig {
    /// Full-featured configuration: all stages, full budgets.
    pub fn comprehensive() -> Self {
        Self {
            research: StageBudget::new(30, 1000),
            analysis: StageBudget::new(25, 2000),
            planning: StageBudget::new(20, 1500),
            writing: StageBudget::new(40, 1000),
            validation: StageBudget::new(20, 2000),
            report: StageBudget::new(25, 1500),
            swot: StageBudget::new(25, 1500),
            timeline: StageBudget::new(25, 1500),
            search_k: 3,
            max_doc_chars: 500,
            max_workers: 4,
        }
    }

    /// Lowest-latency configuration, used by express runs.
    pub fn express() -> Self {
        Self {
            research: StageBudget::new(15, 500),
            analysis: StageBudget::new(15, 1000),
            planning: StageBudget::new(10, 1000),
            writing: StageBudget::new(20, 800),
            validation: StageBudget::new(10, 1000),
            report: StageBudget::new(15, 1000),
            swot: StageBudget::new(15, 1000),
            timeline: StageBudget::new(15, 1000),
            search_k: 1,
            max_doc_chars: 500,
            max_workers: 4,
        }
    }

    /// Middle-ground configuration, used by balanced runs.
    pub fn balanced() -> Self {
        Self {
            research: StageBudget::new(20, 800),
            analysis: StageBudget::new(20, 1500),
            planning: StageBudget::new(15, 1200),
            writing: StageBudget::new(30, 1000),
            validation: StageBudget::new(15, 1500),
            report: StageBudget::new(20, 1200),
            swot: StageBudget::new(20, 1200),
            timeline: StageBudget::new(20, 1200),
            search_k: 2,
            max_doc_chars: 500,
            max_workers: 4,
        }
    }

    /// Sets the number of snippets requested from the semantic index.
    pub fn with_search_k(mut self, k: usize) -> Self {
        self.search_k = k;
        self
    }

    /// Sets the worker pool size.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if a timeout is zero, the
    /// relative timeout ordering is violated, or the worker pool cannot hold
    /// the four fan-out stages at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let budgets = [
            ("research", self.research),
            ("analysis", self.analysis),
            ("planning", self.planning),
            ("writing", self.writing),
            ("validation", self.validation),
            ("report", self.report),
            ("swot", self.swot),
            ("timeline", self.timeline),
        ];

        for (name, budget) in &budgets {
            if budget.timeout.is_zero() {
                return Err(ConfigError::ValidationFailed(format!(
                    "{name} timeout must be non-zero"
                )));
            }
            if budget.max_input_chars == 0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "{name} input budget must be non-zero"
                )));
            }
        }

        for (name, budget) in &budgets {
            if budget.timeout > self.writing.timeout {
                return Err(ConfigError::ValidationFailed(format!(
                    "writing must have the longest timeout, but {name} exceeds it"
                )));
            }
            if budget.timeout < self.planning.timeout {
                return Err(ConfigError::ValidationFailed(format!(
                    "planning must have the shortest timeout, but {name} undercuts it"
                )));
            }
        }

        if self.max_workers < 4 {
            return Err(ConfigError::ValidationFailed(
                "worker pool must hold at least 4 workers so the final stages run in parallel"
                    .to_string(),
            ));
        }

        if self.search_k == 0 {
            return Err(ConfigError::ValidationFailed(
                "search_k must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        PipelineConfig::comprehensive().validate().expect("valid");
        PipelineConfig::express().validate().expect("valid");
        PipelineConfig::balanced().validate().expect("valid");
    }

    #[test]
    fn test_writing_has_longest_timeout_in_presets() {
        for config in [
            PipelineConfig::comprehensive(),
            PipelineConfig::express(),
            PipelineConfig::balanced(),
        ] {
            assert!(config.writing.timeout >= config.research.timeout);
            assert!(config.writing.timeout >= config.analysis.timeout);
            assert!(config.writing.timeout >= config.planning.timeout);
            assert!(config.planning.timeout <= config.research.timeout);
        }
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = PipelineConfig::comprehensive();
        config.analysis.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_ordering() {
        let mut config = PipelineConfig::comprehensive();
        config.planning.timeout = Duration::from_secs(120);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_small_pool() {
        let config = PipelineConfig::comprehensive().with_max_workers(2);
        assert!(config.validate().is_err());
    }
}
