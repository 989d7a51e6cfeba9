//! Shell command execution seam
//!
//! Everything gantry runs - toolchain installs, job commands, hook
//! entries - goes through the [`CommandExecutor`] trait so engines can be
//! tested against a mock.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default per-command timeout. Tool installs compile from source, so
/// this is generous.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// A command to run, with its environment and working directory
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The shell command line
    pub command: String,

    /// Working directory (inherited when unset)
    pub cwd: Option<PathBuf>,

    /// Extra environment variables
    pub env: Vec<(String, String)>,

    /// Timeout in seconds
    pub timeout_secs: u64,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
            env: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Captured output of a completed command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Errors from running a command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' exited with code {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Command '{command}' timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },
}

/// Trait for command execution - allows engines to run against a mock
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command to completion, capturing its output.
    ///
    /// A non-zero exit status is an error.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;

    /// Whether a binary is resolvable on PATH
    async fn binary_exists(&self, name: &str) -> bool;
}

/// Executor that runs commands through the platform shell
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }

    fn shell_command(command_line: &str) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command_line]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command_line]);
            cmd
        }
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        debug!("Running command: {}", spec.command);

        let mut cmd = Self::shell_command(&spec.command);
        if let Some(ref cwd) = spec.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        cmd.kill_on_drop(true);

        let result = timeout(Duration::from_secs(spec.timeout_secs), cmd.output())
            .await
            .map_err(|_| CommandError::Timeout {
                command: spec.command.clone(),
                timeout_secs: spec.timeout_secs,
            })?;

        let output = result.map_err(|e| CommandError::Spawn {
            command: spec.command.clone(),
            source: e,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            warn!("Command '{}' exited with code {}", spec.command, code);
            return Err(CommandError::NonZeroExit {
                command: spec.command.clone(),
                code,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }

    async fn binary_exists(&self, name: &str) -> bool {
        let probe = if cfg!(target_os = "windows") {
            format!("where {}", name)
        } else {
            format!("command -v {}", name)
        };
        let spec = CommandSpec::new(probe).timeout_secs(30);
        self.run(&spec).await.is_ok()
    }
}
