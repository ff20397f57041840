//! Construction and execution of `ansible-playbook` invocations.
//!
//! Building a command validates every caller-controlled piece (playbook and
//! inventory are sandbox-resolved, extra vars must be well-formed JSON)
//! before anything touches a process. Execution is single-shot and
//! synchronous from the caller's perspective: the subprocess runs to
//! completion, times out, or fails to start. A non-zero exit code is data,
//! not an error.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::RunnerConfig;
use crate::error::ToolError;
use crate::project::ProjectLayout;
use crate::sandbox::PathSandbox;

/// Caller-supplied parameters for one playbook run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Playbook file name, e.g. "sno-deploy.yml" (top-level under ansible/).
    pub playbook: String,
    /// Optional project-relative inventory path.
    pub inventory: Option<String>,
    /// Optional --limit pattern.
    pub limit: Option<String>,
    /// Optional --tags filter.
    pub tags: Option<String>,
    /// Optional JSON object passed through opaquely with -e.
    pub extra_vars: Option<String>,
    /// Run with --check (dry run).
    pub check: bool,
}

/// A fully validated command, ready to execute.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Extra environment entries layered over the inherited environment.
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

impl CommandSpec {
    /// Shell-quoted rendering of the full command line, for diagnostics.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of a completed subprocess, reported verbatim to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
    /// The effective command line, shell-quoted.
    pub command: String,
    pub cwd: String,
}

/// Builds and runs playbook commands against one project.
pub struct PlaybookRunner {
    config: RunnerConfig,
}

impl PlaybookRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Default timeout applied when the caller does not pass one.
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }

    /// Assembles the argument vector for a run.
    ///
    /// The playbook must exist as a top-level file under ansible/; the
    /// inventory, when given, must resolve inside the project root. The
    /// extra-vars blob must parse as JSON but is otherwise passed through
    /// untouched — key-by-key validation is the tool's own business.
    pub fn build(
        &self,
        layout: &ProjectLayout,
        request: &RunRequest,
        run_timeout: Duration,
    ) -> Result<CommandSpec, ToolError> {
        let ansible_sandbox = PathSandbox::new(&layout.ansible_dir())?;
        let playbook_path = ansible_sandbox.resolve_relative(&request.playbook)?;

        let program = self.resolve_program(layout);
        let mut args = vec![playbook_path.display().to_string()];

        if let Some(ref inventory) = request.inventory {
            let inventory_path = layout.sandbox().resolve_relative(inventory)?;
            args.push("-i".to_string());
            args.push(inventory_path.display().to_string());
        }
        if let Some(ref limit) = request.limit {
            args.push("--limit".to_string());
            args.push(limit.clone());
        }
        if let Some(ref tags) = request.tags {
            args.push("--tags".to_string());
            args.push(tags.clone());
        }
        if let Some(ref extra_vars) = request.extra_vars {
            serde_json::from_str::<serde_json::Value>(extra_vars).map_err(|e| {
                ToolError::Validation(format!("extra_vars is not valid JSON: {e}"))
            })?;
            args.push("-e".to_string());
            args.push(extra_vars.clone());
        }
        if request.check {
            args.push("--check".to_string());
        }

        // Make Ansible honor the project config when there is one
        let mut env = Vec::new();
        let ansible_cfg = layout.root().join("ansible.cfg");
        if ansible_cfg.exists() {
            env.push((
                "ANSIBLE_CONFIG".to_string(),
                ansible_cfg.display().to_string(),
            ));
        }

        Ok(CommandSpec {
            program,
            args,
            cwd: layout.root().to_path_buf(),
            env,
            timeout: run_timeout,
        })
    }

    /// Prefers the project-bundled executable when present, otherwise the
    /// bare name resolved via PATH.
    fn resolve_program(&self, layout: &ProjectLayout) -> String {
        let bundled = layout.root().join(&self.config.bundled_bin);
        if bundled.exists() {
            bundled.display().to_string()
        } else {
            self.config.playbook_bin.clone()
        }
    }
}

/// Runs the command to completion and captures its outcome.
///
/// The working directory is the project root so relative paths inside
/// playbooks resolve against the project, not against whoever launched this
/// server. On timeout the child is killed (`kill_on_drop`) and `Timeout` is
/// returned; a spawn failure is `Launch`.
pub async fn execute(spec: &CommandSpec) -> Result<ExecutionResult, ToolError> {
    info!("Running: {} (cwd {})", spec.command_line(), spec.cwd.display());

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    let child = command.spawn().map_err(|e| ToolError::Launch {
        program: spec.program.clone(),
        reason: e.to_string(),
    })?;

    let output = match timeout(spec.timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(ToolError::Io {
                path: PathBuf::from(&spec.program),
                source: e,
            })
        }
        // Dropping the wait future kills the child (kill_on_drop)
        Err(_) => {
            return Err(ToolError::Timeout {
                seconds: spec.timeout.as_secs(),
            })
        }
    };

    let returncode = output.status.code().unwrap_or(-1);
    debug!("Command exited with code {returncode}");

    Ok(ExecutionResult {
        returncode,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        command: spec.command_line(),
        cwd: spec.cwd.display().to_string(),
    })
}

/// POSIX single-quote escaping for diagnostics output.
fn shell_quote(token: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c);
    if !token.is_empty() && token.chars().all(safe) {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', "'\\''"))
    }
}
