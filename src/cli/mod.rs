//! CLI argument parsing for tandem.
//!
//! Uses clap derive macros for declarative argument definitions. The CLI
//! surface is deliberately small: one positional task name and a restart
//! flag; everything else lives in `tandem.yaml`.

use clap::Parser;

/// Tandem: resumable executor/checker loop driving an LLM CLI agent.
///
/// An executor agent works on the named task and a checker agent reviews the
/// result, for up to 10 iterations. State is persisted after every agent
/// turn; an interrupted run resumes where it left off.
#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Name of the task to drive (resolved as `<tasks_dir>/<name>.md`).
    pub task_name: String,

    /// Discard any saved state and start the task from scratch.
    #[arg(long)]
    pub restart: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
