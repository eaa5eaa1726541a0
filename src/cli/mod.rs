//! Command-line interface for reportforge.
//!
//! Provides commands for running the generation pipeline and browsing
//! persisted run history.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, ModeArg};
