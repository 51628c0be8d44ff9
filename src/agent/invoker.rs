//! Agent subprocess invoker.
//!
//! One invocation is one blocking LLM turn: the prompt is written to a temp
//! file, the configured CLI is spawned with an `@file` reference to it, and
//! stdout is captured and parsed. Invocation failure (spawn error, nonzero
//! exit, timeout) is distinguishable from a successful turn with empty
//! output: only the former maps to `Err`.

use crate::config::AgentConfig;
use crate::context::Workspace;
use crate::error::{Result, TandemError};
use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Result of one successful agent turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    /// The agent's reply text.
    pub text: String,

    /// Opaque continuation handle for the conversation, when the CLI
    /// reported one.
    pub session: Option<String>,
}

/// Failure of one agent turn.
///
/// These abort the current run but are not process errors: state persisted
/// before the failing turn remains valid and the run is resumable.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// The agent command could not be started.
    #[error("failed to launch agent command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// The agent command exited with a nonzero status.
    #[error("agent command exited with status {code:?}: {stderr}")]
    Failed {
        code: Option<i32>,
        stderr: String,
    },

    /// The agent command ran past the configured timeout and was killed.
    #[error("agent command timed out after {0} seconds")]
    TimedOut(u64),

    /// Reading or writing invocation files failed.
    #[error("agent io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One LLM turn: prompt in, reply text plus optional continuation handle out.
pub trait AgentInvoker {
    /// Invoke the agent with a prompt, optionally continuing an existing
    /// conversation identified by `resume`.
    fn invoke(
        &self,
        prompt: &str,
        resume: Option<&str>,
    ) -> std::result::Result<AgentReply, InvokeError>;
}

/// Production invoker spawning the configured agent CLI.
#[derive(Debug, Clone)]
pub struct CliInvoker {
    argv: Vec<String>,
    resume_flag: String,
    timeout: Duration,
    prompt_path: PathBuf,
    logs_dir: PathBuf,
}

impl CliInvoker {
    /// Build an invoker from the agent configuration and workspace layout.
    pub fn from_config(agent: &AgentConfig, ws: &Workspace) -> Result<Self> {
        let argv = shell_words::split(&agent.command).map_err(|e| {
            TandemError::UserError(format!(
                "failed to parse agent command '{}': {}",
                agent.command, e
            ))
        })?;

        if argv.is_empty() {
            return Err(TandemError::UserError(format!(
                "agent command is empty after parsing: '{}'",
                agent.command
            )));
        }

        Ok(Self {
            argv,
            resume_flag: agent.resume_flag.clone(),
            timeout: Duration::from_secs(agent.timeout_seconds),
            prompt_path: ws.prompt_path(),
            logs_dir: ws.logs_dir(),
        })
    }
}

impl AgentInvoker for CliInvoker {
    fn invoke(
        &self,
        prompt: &str,
        resume: Option<&str>,
    ) -> std::result::Result<AgentReply, InvokeError> {
        if let Some(parent) = self.prompt_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&self.logs_dir)?;
        fs::write(&self.prompt_path, prompt)?;

        let result = self.spawn_and_wait(resume);

        // The prompt file only exists for the child to read.
        let _ = fs::remove_file(&self.prompt_path);

        result
    }
}

impl CliInvoker {
    fn spawn_and_wait(
        &self,
        resume: Option<&str>,
    ) -> std::result::Result<AgentReply, InvokeError> {
        let stdout_path = self.logs_dir.join("stdout.log");
        let stderr_path = self.logs_dir.join("stderr.log");
        let stdout_file = fs::File::create(&stdout_path)?;
        let stderr_file = fs::File::create(&stderr_path)?;

        let mut command = Command::new(&self.argv[0]);
        command
            .args(&self.argv[1..])
            .stdout(Stdio::from(stdout_file))
            .stderr(Stdio::from(stderr_file));

        if let Some(session) = resume {
            command.arg(&self.resume_flag).arg(session);
        }
        command.arg(format!("@{}", self.prompt_path.display()));

        let mut child = command.spawn().map_err(|source| InvokeError::Spawn {
            command: self.argv[0].clone(),
            source,
        })?;

        let (exit_code, timed_out) = wait_with_timeout(&mut child, self.timeout)?;

        if timed_out {
            return Err(InvokeError::TimedOut(self.timeout.as_secs()));
        }

        if exit_code != Some(0) {
            let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(InvokeError::Failed {
                code: exit_code,
                stderr: stderr.trim_end().to_string(),
            });
        }

        let stdout = fs::read_to_string(&stdout_path)?;
        Ok(parse_reply(&stdout))
    }
}

/// Parse the CLI's JSON envelope, falling back to raw text.
///
/// The `claude` CLI with `--output-format json` prints one object carrying
/// `session_id` and `result`. Any output that is not such an object is used
/// verbatim as the reply text with no session handle.
fn parse_reply(stdout: &str) -> AgentReply {
    match serde_json::from_str::<serde_json::Value>(stdout) {
        Ok(value) if value.is_object() => {
            let session = value
                .get("session_id")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let text = value
                .get("result")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| stdout.to_string());

            AgentReply { text, session }
        }
        _ => AgentReply {
            text: stdout.to_string(),
            session: None,
        },
    }
}

/// Wait for a child process with timeout; on timeout the child is killed.
///
/// Returns (exit_code, timed_out).
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> std::io::Result<(Option<i32>, bool)> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(100);

    loop {
        match child.try_wait()? {
            Some(status) => return Ok((status.code(), false)),
            None => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok((None, true));
                }
                std::thread::sleep(poll_interval);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn make_invoker(temp: &TempDir, command: &str, timeout_seconds: u64) -> CliInvoker {
        let ws = Workspace::resolve_from(temp.path(), &Config::default());
        let agent = AgentConfig {
            command: command.to_string(),
            timeout_seconds,
            ..Default::default()
        };
        CliInvoker::from_config(&agent, &ws).unwrap()
    }

    #[test]
    fn test_parse_reply_json_envelope() {
        let reply = parse_reply(r#"{"session_id": "sess-1", "result": "hello"}"#);
        assert_eq!(reply.text, "hello");
        assert_eq!(reply.session.as_deref(), Some("sess-1"));
    }

    #[test]
    fn test_parse_reply_json_without_session() {
        let reply = parse_reply(r#"{"result": "hello"}"#);
        assert_eq!(reply.text, "hello");
        assert!(reply.session.is_none());
    }

    #[test]
    fn test_parse_reply_json_without_result_uses_raw() {
        let raw = r#"{"session_id": "sess-1"}"#;
        let reply = parse_reply(raw);
        assert_eq!(reply.text, raw);
        assert_eq!(reply.session.as_deref(), Some("sess-1"));
    }

    #[test]
    fn test_parse_reply_plain_text() {
        let reply = parse_reply("just some text\nover two lines");
        assert_eq!(reply.text, "just some text\nover two lines");
        assert!(reply.session.is_none());
    }

    #[test]
    fn test_parse_reply_json_array_is_raw_text() {
        let reply = parse_reply(r#"["not", "an", "object"]"#);
        assert_eq!(reply.text, r#"["not", "an", "object"]"#);
        assert!(reply.session.is_none());
    }

    #[test]
    fn test_from_config_empty_command_fails() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::resolve_from(temp.path(), &Config::default());
        let agent = AgentConfig {
            command: "   ".to_string(),
            ..Default::default()
        };
        assert!(CliInvoker::from_config(&agent, &ws).is_err());
    }

    #[test]
    fn test_from_config_unmatched_quote_fails() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::resolve_from(temp.path(), &Config::default());
        let agent = AgentConfig {
            command: "claude \"unmatched".to_string(),
            ..Default::default()
        };
        assert!(CliInvoker::from_config(&agent, &ws).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_parses_envelope() {
        let temp = TempDir::new().unwrap();
        let invoker = make_invoker(
            &temp,
            r#"sh -c "echo '{\"session_id\": \"sess-1\", \"result\": \"hello\"}'""#,
            10,
        );

        let reply = invoker.invoke("prompt", None).unwrap();
        assert_eq!(reply.text, "hello");
        assert_eq!(reply.session.as_deref(), Some("sess-1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_reads_prompt_file_and_cleans_up() {
        let temp = TempDir::new().unwrap();
        // The appended positional argument is `@<prompt path>`; strip the
        // `@` and cat the file back as the reply.
        let invoker = make_invoker(&temp, r#"sh -c 'cat "${0#@}"'"#, 10);

        let reply = invoker.invoke("the prompt body", None).unwrap();
        assert_eq!(reply.text, "the prompt body");

        let ws = Workspace::resolve_from(temp.path(), &Config::default());
        assert!(!ws.prompt_path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_appends_resume_arguments() {
        let temp = TempDir::new().unwrap();
        let invoker = make_invoker(&temp, r#"sh -c 'printf "%s %s" "$0" "$1"'"#, 10);

        let reply = invoker.invoke("prompt", Some("sess-9")).unwrap();
        assert_eq!(reply.text, "--resume sess-9");
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_nonzero_exit_is_failure() {
        let temp = TempDir::new().unwrap();
        let invoker = make_invoker(&temp, "sh -c 'echo oops >&2; exit 3'", 10);

        let err = invoker.invoke("prompt", None).unwrap_err();
        match err {
            InvokeError::Failed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("oops"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invoke_missing_command_is_spawn_failure() {
        let temp = TempDir::new().unwrap();
        let invoker = make_invoker(&temp, "tandem_nonexistent_agent_xyz", 10);

        let err = invoker.invoke("prompt", None).unwrap_err();
        assert!(matches!(err, InvokeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_timeout_kills_child() {
        let temp = TempDir::new().unwrap();
        let invoker = make_invoker(&temp, "sh -c 'sleep 10'", 1);

        let err = invoker.invoke("prompt", None).unwrap_err();
        assert!(matches!(err, InvokeError::TimedOut(1)));
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_empty_output_is_success() {
        let temp = TempDir::new().unwrap();
        let invoker = make_invoker(&temp, "true", 10);

        let reply = invoker.invoke("prompt", None).unwrap();
        assert_eq!(reply.text, "");
        assert!(reply.session.is_none());
    }
}
