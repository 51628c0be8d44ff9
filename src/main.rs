//! Tandem: resumable executor/checker loop driving an LLM CLI agent.
//!
//! This is the main entry point for the `tandem` CLI. It parses arguments,
//! dispatches to the run command, and maps errors to exit codes. Loop-level
//! failures (agent errors, ambiguous verdicts, exhausted budgets) are
//! reported by the command itself and exit 0; only startup errors reach the
//! error path here.

mod cli;
mod commands;
pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod report;
pub mod state;
pub mod task;
pub mod verdict;
pub mod workflow;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(err.exit_code() as u8)
        }
    }
}
