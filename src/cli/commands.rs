//! CLI command definitions for reportforge.
//!
//! This module provides the command-line interface for running the
//! generation pipeline against an OpenAI-compatible API and inspecting
//! persisted runs.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::llm::ChatClient;
use crate::pipeline::{PipelineConfig, PipelineOrchestrator, PipelineRun};
use crate::storage::{FileStore, ResultStore};

/// Default directory for persisted run records.
const DEFAULT_DATA_DIR: &str = "./reportforge-data";

/// Long-form research artifact generator.
#[derive(Parser)]
#[command(name = "reportforge")]
#[command(about = "Generate long-form research artifacts from a topic query")]
#[command(version)]
#[command(
    long_about = "reportforge runs a topic query through research, analysis, planning, and \
writing stages, then finishes with parallel validation, strategic report, SWOT, and timeline \
sections.\n\nEvery stage is bounded by a timeout and degrades to deterministic fallback content \
instead of failing the run.\n\nExample usage:\n  reportforge run \"grid-scale battery storage\" \
--mode comprehensive"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the generation pipeline for a topic query.
    Run(RunArgs),

    /// Show recently persisted pipeline runs.
    History(HistoryArgs),
}

/// Pipeline run mode selector.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ModeArg {
    /// Research and analysis only; fastest, no persistence.
    Express,
    /// Sequential stages without the parallel final sections.
    Balanced,
    /// The full stage set.
    Comprehensive,
}

/// Arguments for `reportforge run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Topic query to generate an artifact for.
    pub query: String,

    /// Run mode.
    #[arg(short, long, value_enum, default_value = "comprehensive")]
    pub mode: ModeArg,

    /// Directory for persisted run records.
    #[arg(long, env = "REPORTFORGE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    /// Print the full run record as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `reportforge history`.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Maximum number of runs to show, newest first.
    #[arg(short = 'n', long, default_value = "5")]
    pub limit: usize,

    /// Directory holding persisted run records.
    #[arg(long, env = "REPORTFORGE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,
}

/// Parse CLI arguments without executing.
///
/// Useful when the caller wants to handle logging initialization itself
/// before running the command with [`run_with_cli`].
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI end to end: parse arguments, install logging, execute.
pub async fn run() -> anyhow::Result<()> {
    let cli = parse_cli();
    init_logging(&cli.log_level);
    run_with_cli(cli).await
}

/// Installs the global tracing subscriber. `RUST_LOG` outranks the
/// `--log-level` flag; the flag's value is the fallback filter.
fn init_logging(log_level: &str) {
    let fallback = std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&fallback)))
        .init();
}

/// Run the CLI with the parsed arguments.
///
/// This is the main entry point for the reportforge CLI.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_pipeline_command(args).await?,
        Commands::History(args) => run_history_command(args).await?,
    }
    Ok(())
}

async fn run_pipeline_command(args: RunArgs) -> anyhow::Result<()> {
    let provider = Arc::new(ChatClient::from_env()?);

    let (config, mode) = match args.mode {
        ModeArg::Express => (PipelineConfig::express(), args.mode),
        ModeArg::Balanced => (PipelineConfig::balanced(), args.mode),
        ModeArg::Comprehensive => (PipelineConfig::comprehensive(), args.mode),
    };

    let store = Arc::new(FileStore::new(&args.data_dir));
    let orchestrator = PipelineOrchestrator::new(provider, config)?.with_store(store);

    info!(query = %args.query, mode = ?mode, "running pipeline");
    let run = match mode {
        ModeArg::Express => orchestrator.run_express(&args.query).await,
        ModeArg::Balanced => orchestrator.run_balanced(&args.query).await,
        ModeArg::Comprehensive => orchestrator.run_full(&args.query).await,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_summary(&run);
    }

    // Let background persistence finish before the process exits.
    orchestrator.shutdown().await;
    Ok(())
}

async fn run_history_command(args: HistoryArgs) -> anyhow::Result<()> {
    let store = FileStore::new(&args.data_dir);
    let runs = store.recent(args.limit).await?;

    if runs.is_empty() {
        warn!(data_dir = %args.data_dir, "no persisted runs found");
        println!("No runs found in {}", args.data_dir);
        return Ok(());
    }

    for run in &runs {
        println!(
            "{}  {}  {:>7.1}s  {}  {}",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.id,
            run.execution_time,
            run.status,
            run.query,
        );
    }
    Ok(())
}

fn print_summary(run: &PipelineRun) {
    println!("Run {} ({})", run.id, run.status);
    println!("Query: {}", run.query);
    println!("Elapsed: {:.1}s", run.execution_time);
    println!();
    println!("{}", run.draft.text);

    let degraded: Vec<&str> = [
        ("research", &run.research),
        ("analysis", &run.analysis),
        ("plan", &run.plan),
        ("draft", &run.draft),
        ("validation", &run.validation),
        ("strategic_report", &run.strategic_report),
        ("swot_analysis", &run.swot_analysis),
        ("timeline", &run.timeline),
    ]
    .into_iter()
    .filter(|(_, result)| result.degraded)
    .map(|(name, _)| name)
    .collect();

    if !degraded.is_empty() {
        println!();
        println!("Degraded sections: {}", degraded.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["reportforge", "run", "solar power"]).expect("parses");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.query, "solar power");
                assert!(matches!(args.mode, ModeArg::Comprehensive));
                assert_eq!(args.data_dir, DEFAULT_DATA_DIR);
                assert!(!args.json);
            }
            Commands::History(_) => panic!("expected run command"),
        }
    }

    #[test]
    fn test_mode_parsing() {
        let cli = Cli::try_parse_from(["reportforge", "run", "q", "--mode", "express"])
            .expect("parses");
        match cli.command {
            Commands::Run(args) => assert!(matches!(args.mode, ModeArg::Express)),
            Commands::History(_) => panic!("expected run command"),
        }
    }

    #[test]
    fn test_history_limit() {
        let cli = Cli::try_parse_from(["reportforge", "history", "-n", "10"]).expect("parses");
        match cli.command {
            Commands::History(args) => assert_eq!(args.limit, 10),
            Commands::Run(_) => panic!("expected history command"),
        }
    }
}
