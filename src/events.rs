//! Audit event logging for tandem.
//!
//! Run lifecycle transitions are appended to an NDJSON log (one JSON object
//! per line) at `<state_dir>/events.ndjson`, so an operator can reconstruct
//! what every run did without trawling agent logs.
//!
//! Each event carries:
//! - `ts`: RFC3339 timestamp
//! - `action`: the lifecycle transition
//! - `actor`: `user@HOST`
//! - `task`: task name
//! - `details`: freeform action-specific object

use crate::context::Workspace;
use crate::error::{Result, TandemError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Run lifecycle transitions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// A fresh run started (iteration 0).
    Started,
    /// A run resumed from persisted state.
    Resumed,
    /// An executor turn completed and was persisted.
    ExecutorTurn,
    /// A checker turn completed and was persisted.
    CheckerTurn,
    /// The checker accepted; state cleared.
    Completed,
    /// The iteration budget ran out on a rejection.
    Exhausted,
    /// The run stopped early (invocation failure or ambiguous verdict).
    Aborted,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Started => write!(f, "started"),
            EventAction::Resumed => write!(f, "resumed"),
            EventAction::ExecutorTurn => write!(f, "executor_turn"),
            EventAction::CheckerTurn => write!(f, "checker_turn"),
            EventAction::Completed => write!(f, "completed"),
            EventAction::Exhausted => write!(f, "exhausted"),
            EventAction::Aborted => write!(f, "aborted"),
        }
    }
}

/// One audit log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The lifecycle transition.
    pub action: EventAction,

    /// The actor who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// Task name the event belongs to.
    pub task: String,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event for a task.
    ///
    /// The timestamp is set to now and the actor is determined from the
    /// environment (USER@HOSTNAME).
    pub fn new(action: EventAction, task: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            task: task.into(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Attach a details object to this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single NDJSON line.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            TandemError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Get the actor string for event metadata.
fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the audit log, creating the file if needed.
pub fn append_event(ws: &Workspace, event: &Event) -> Result<()> {
    let events_file = ws.events_path();
    let json_line = event.to_ndjson_line()?;

    if !ws.state_dir.exists() {
        fs::create_dir_all(&ws.state_dir).map_err(|e| {
            TandemError::UserError(format!(
                "failed to create state directory '{}': {}",
                ws.state_dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            TandemError::UserError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        TandemError::UserError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(())
}
