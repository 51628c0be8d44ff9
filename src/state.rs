//! Run-state persistence for tandem.
//!
//! One JSON record per task name, overwritten in place on every save. The
//! record is what makes runs resumable: it is written immediately after each
//! successful agent turn, so an interruption at any point leaves the most
//! recently persisted turn intact.
//!
//! Saves are overwrite-whole-record, not merge: optional fields omitted by
//! the caller are persisted as absent. Callers pass through anything they
//! want retained.

use crate::error::Result;
use crate::fs::atomic_write_file;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Status of a persisted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run has not reached a successful verdict.
    InProgress,
    /// Transient marker written just before the record is cleared.
    Completed,
}

/// The resumable execution record for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Task identifier; also the storage key.
    pub task_name: String,

    /// Last iteration index that was attempted (0-based).
    pub iteration: u32,

    /// Continuation handle for the executor's ongoing conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_session: Option<String>,

    /// Checker verdict text from the current unresolved iteration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checker_output: Option<String>,

    /// Verdict text carried forward to seed the next iteration's feedback
    /// prompt; survives the reset at iteration boundaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checker_output: Option<String>,

    /// Last write time.
    pub timestamp: DateTime<Utc>,

    /// Run status.
    pub status: RunStatus,

    /// Set only when status becomes Completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
}

/// Persists and retrieves run state records under one state directory.
///
/// Single-writer-per-task: one loop instance owns a task's record at a time;
/// concurrent runs of the same task name are undefined.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Create a store rooted at the given state directory.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the state record for a task.
    pub fn state_path(&self, task_name: &str) -> PathBuf {
        self.dir.join(format!("{}_state.json", task_name))
    }

    /// Write the full run state for a task.
    ///
    /// Status is forced to `InProgress` and the timestamp set to now. The
    /// previous record, if any, is replaced atomically.
    pub fn save(
        &self,
        task_name: &str,
        iteration: u32,
        executor_session: Option<&str>,
        checker_output: Option<&str>,
        last_checker_output: Option<&str>,
    ) -> Result<()> {
        let state = RunState {
            task_name: task_name.to_string(),
            iteration,
            executor_session: executor_session.map(str::to_string),
            checker_output: checker_output.map(str::to_string),
            last_checker_output: last_checker_output.map(str::to_string),
            timestamp: Utc::now(),
            status: RunStatus::InProgress,
            completion_time: None,
        };

        self.write(&state)
    }

    /// Load the run state for a task.
    ///
    /// Returns `None` if no record exists or the record is unreadable or
    /// corrupt; a damaged record is never a fatal error, it just means the
    /// run starts fresh.
    pub fn load(&self, task_name: &str) -> Option<RunState> {
        let path = self.state_path(task_name);
        let content = fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Delete the record for a task; no-op if absent.
    pub fn clear(&self, task_name: &str) -> Result<()> {
        let path = self.state_path(task_name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                crate::error::TandemError::UserError(format!(
                    "failed to remove state file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Mark an existing record Completed and stamp the completion time.
    ///
    /// No-op if no record exists. This only rewrites the record; callers
    /// must separately `clear` to remove it.
    pub fn mark_completed(&self, task_name: &str) -> Result<()> {
        let Some(mut state) = self.load(task_name) else {
            return Ok(());
        };

        state.status = RunStatus::Completed;
        state.completion_time = Some(Utc::now());
        self.write(&state)
    }

    fn write(&self, state: &RunState) -> Result<()> {
        let serialized = serde_json::to_string_pretty(state).map_err(|e| {
            crate::error::TandemError::UserError(format!(
                "failed to serialize run state for '{}': {}",
                state.task_name, e
            ))
        })?;

        atomic_write_file(self.state_path(&state.task_name), &serialized)
    }
}
