//! Configuration schema for tandem.
//!
//! An optional `tandem.yaml` at the workspace root overrides the agent
//! command and directory layout:
//!
//! ```yaml
//! agent:
//!   command: "claude --dangerously-skip-permissions -p --output-format json"
//!   resume_flag: "--resume"
//!   timeout_seconds: 3600
//! tasks_dir: tasks
//! state_dir: .tandem
//! ```
//!
//! When the file is absent, defaults matching the stock `claude` CLI are
//! used. Unknown fields are preserved for forward compatibility.

use crate::error::{Result, TandemError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Config filename looked up at the workspace root.
pub const CONFIG_FILENAME: &str = "tandem.yaml";

/// Default agent invocation timeout in seconds.
const DEFAULT_TIMEOUT_SECONDS: u64 = 3600;

/// Top-level configuration, loaded from `tandem.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agent invocation settings.
    pub agent: AgentConfig,

    /// Directory holding task markdown files, relative to the workspace root.
    pub tasks_dir: String,

    /// Directory holding run state, logs, and reports, relative to the root.
    pub state_dir: String,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            tasks_dir: default_tasks_dir(),
            state_dir: default_state_dir(),
            extra: BTreeMap::new(),
        }
    }
}

/// Settings for the external agent CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base command line for one agent turn. The prompt file reference and
    /// any resume arguments are appended at invocation time.
    pub command: String,

    /// Flag used to continue an existing agent conversation; the session
    /// handle is passed as the flag's value.
    pub resume_flag: String,

    /// Maximum seconds to wait for one agent turn before killing it.
    pub timeout_seconds: u64,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: default_agent_command(),
            resume_flag: default_resume_flag(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            extra: BTreeMap::new(),
        }
    }
}

fn default_agent_command() -> String {
    "claude --dangerously-skip-permissions -p --output-format json".to_string()
}

fn default_resume_flag() -> String {
    "--resume".to_string()
}

fn default_tasks_dir() -> String {
    "tasks".to_string()
}

fn default_state_dir() -> String {
    ".tandem".to_string()
}

impl Config {
    /// Load config from a YAML file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    /// Returns `Err` if the file exists but cannot be parsed or is invalid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            TandemError::UserError(format!(
                "failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_yaml(&content)?;
        Ok(Some(config))
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            TandemError::UserError(format!("failed to parse {}: {}", CONFIG_FILENAME, e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load the config from `<root>/tandem.yaml`, falling back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self::load(root.as_ref().join(CONFIG_FILENAME))?.unwrap_or_default())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.agent.command.trim().is_empty() {
            return Err(TandemError::UserError(format!(
                "{} validation failed: agent.command must not be empty",
                CONFIG_FILENAME
            )));
        }

        if self.agent.resume_flag.trim().is_empty() {
            return Err(TandemError::UserError(format!(
                "{} validation failed: agent.resume_flag must not be empty",
                CONFIG_FILENAME
            )));
        }

        if self.agent.timeout_seconds == 0 {
            return Err(TandemError::UserError(format!(
                "{} validation failed: agent.timeout_seconds must be greater than 0",
                CONFIG_FILENAME
            )));
        }

        if self.tasks_dir.trim().is_empty() || self.state_dir.trim().is_empty() {
            return Err(TandemError::UserError(format!(
                "{} validation failed: tasks_dir and state_dir must not be empty",
                CONFIG_FILENAME
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.agent.command.starts_with("claude"));
        assert_eq!(config.agent.resume_flag, "--resume");
        assert_eq!(config.agent.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(config.tasks_dir, "tasks");
        assert_eq!(config.state_dir, ".tandem");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.tasks_dir, "tasks");
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
agent:
  command: "codex exec --json"
  resume_flag: "--session"
  timeout_seconds: 900
tasks_dir: docs/tasks
state_dir: .runs
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.agent.command, "codex exec --json");
        assert_eq!(config.agent.resume_flag, "--session");
        assert_eq!(config.agent.timeout_seconds, 900);
        assert_eq!(config.tasks_dir, "docs/tasks");
        assert_eq!(config.state_dir, ".runs");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let yaml = r#"
tasks_dir: docs/tasks
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.tasks_dir, "docs/tasks");
        assert!(config.agent.command.starts_with("claude"));
        assert_eq!(config.state_dir, ".tandem");
    }

    #[test]
    fn test_empty_command_fails() {
        let yaml = r#"
agent:
  command: ""
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("agent.command"));
    }

    #[test]
    fn test_zero_timeout_fails() {
        let yaml = r#"
agent:
  timeout_seconds: 0
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let temp = TempDir::new().unwrap();
        let loaded = Config::load(temp.path().join(CONFIG_FILENAME)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_or_default() {
        let temp = TempDir::new().unwrap();

        let config = Config::load_or_default(temp.path()).unwrap();
        assert_eq!(config.state_dir, ".tandem");

        std::fs::write(
            temp.path().join(CONFIG_FILENAME),
            "state_dir: custom_state\n",
        )
        .unwrap();
        let config = Config::load_or_default(temp.path()).unwrap();
        assert_eq!(config.state_dir, "custom_state");
    }

    #[test]
    fn test_forward_compatibility() {
        let yaml = r#"
agent:
  command: "claude -p"
  future_setting: true
future_top_level: "preserved"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.agent.extra.contains_key("future_setting"));
        assert!(config.extra.contains_key("future_top_level"));
    }

    #[test]
    fn test_malformed_yaml_fails() {
        let result = Config::from_yaml("agent: [not, a, mapping]");
        assert!(result.is_err());
    }
}
