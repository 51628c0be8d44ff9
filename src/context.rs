//! Workspace layout resolution for tandem.
//!
//! All commands locate task files and run state through this module so that
//! every path is derived from one root directory plus the configured layout.

use crate::config::Config;
use crate::error::{Result, TandemError};
use std::env;
use std::path::{Path, PathBuf};

/// Filename of the completion report the executor agent is instructed to
/// write inside the state directory.
pub const REPORT_FILENAME: &str = "execution_report.md";

/// Filename of the temporary prompt file handed to the agent CLI.
pub const PROMPT_FILENAME: &str = "prompt.md";

/// Resolved paths for a tandem workspace.
///
/// All paths are absolute once resolved from an absolute root.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Workspace root (where `tandem.yaml` lives, if present).
    pub root: PathBuf,

    /// Directory holding task markdown files.
    pub tasks_dir: PathBuf,

    /// Directory holding run state, agent logs, and the completion report.
    pub state_dir: PathBuf,
}

impl Workspace {
    /// Resolve the workspace from the current working directory.
    pub fn resolve(config: &Config) -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            TandemError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Ok(Self::resolve_from(cwd, config))
    }

    /// Resolve the workspace from a specific root directory.
    pub fn resolve_from<P: AsRef<Path>>(root: P, config: &Config) -> Self {
        let root = root.as_ref().to_path_buf();
        let tasks_dir = root.join(&config.tasks_dir);
        let state_dir = root.join(&config.state_dir);

        Self {
            root,
            tasks_dir,
            state_dir,
        }
    }

    /// Path to the markdown file for a task.
    pub fn task_path(&self, task_name: &str) -> PathBuf {
        self.tasks_dir.join(format!("{}.md", task_name))
    }

    /// Path to the executor's completion report.
    pub fn report_path(&self) -> PathBuf {
        self.state_dir.join(REPORT_FILENAME)
    }

    /// Path to the temporary prompt file for agent invocations.
    pub fn prompt_path(&self) -> PathBuf {
        self.state_dir.join(PROMPT_FILENAME)
    }

    /// Directory for per-invocation agent stdout/stderr logs.
    pub fn logs_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    /// Path to the append-only audit event log.
    pub fn events_path(&self) -> PathBuf {
        self.state_dir.join("events.ndjson")
    }
}
