//! Command implementations for tandem.
//!
//! The CLI has a single command: drive a task through the execution loop.

mod run;

use crate::cli::Cli;
use crate::error::Result;

/// Dispatch the parsed CLI invocation.
pub fn dispatch(cli: Cli) -> Result<()> {
    run::execute(&cli.task_name, cli.restart)
}
