//! Completion report artifact.
//!
//! The executor agent is instructed (via its prompt) to write a completion
//! report into the state directory when it believes the task is done. The
//! loop never reads the report; its only interaction is deleting a stale one
//! at the start of a fresh run so downstream review cannot mistake an old
//! report for the current one.

use crate::context::Workspace;
use crate::error::{Result, TandemError};
use std::fs;
use std::path::{Path, PathBuf};

/// Handle to the executor's side-channel completion report.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    path: PathBuf,
}

impl ReportArtifact {
    /// Report artifact for a workspace.
    pub fn new(ws: &Workspace) -> Self {
        Self {
            path: ws.report_path(),
        }
    }

    /// Path to the report file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a stale report left by a previous run.
    ///
    /// Returns `true` if a report existed and was removed.
    pub fn remove_stale(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }

        fs::remove_file(&self.path).map_err(|e| {
            TandemError::UserError(format!(
                "failed to remove stale report '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn make_report(temp: &TempDir) -> ReportArtifact {
        let ws = Workspace::resolve_from(temp.path(), &Config::default());
        ReportArtifact::new(&ws)
    }

    #[test]
    fn test_remove_stale_when_present() {
        let temp = TempDir::new().unwrap();
        let report = make_report(&temp);

        fs::create_dir_all(report.path().parent().unwrap()).unwrap();
        fs::write(report.path(), "old report").unwrap();

        assert!(report.remove_stale().unwrap());
        assert!(!report.path().exists());
    }

    #[test]
    fn test_remove_stale_when_absent() {
        let temp = TempDir::new().unwrap();
        let report = make_report(&temp);

        assert!(!report.remove_stale().unwrap());
    }
}
