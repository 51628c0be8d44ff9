//! Task source for tandem.
//!
//! Tasks are plain markdown files named `<tasks_dir>/<name>.md`. The task
//! text is handed verbatim to the prompt builders; tandem never interprets
//! its content.

use crate::context::Workspace;
use crate::error::{Result, TandemError};
use std::fs;

/// Validate a task name for use as a filename and storage key.
///
/// Rejects empty names, path separators, and `..` to keep task lookups and
/// state files inside their directories.
pub fn validate_task_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TandemError::UserError(
            "task name must not be empty".to_string(),
        ));
    }

    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(TandemError::UserError(format!(
            "invalid task name '{}': contains path traversal characters",
            name
        )));
    }

    Ok(())
}

/// Read the task text for a named task.
///
/// Returns `TandemError::TaskNotFound` if the task file does not exist.
pub fn read_task(ws: &Workspace, task_name: &str) -> Result<String> {
    validate_task_name(task_name)?;

    let path = ws.task_path(task_name);
    if !path.exists() {
        return Err(TandemError::TaskNotFound {
            name: task_name.to_string(),
            path: path.display().to_string(),
        });
    }

    fs::read_to_string(&path).map_err(|e| {
        TandemError::UserError(format!(
            "failed to read task file '{}': {}",
            path.display(),
            e
        ))
    })
}
