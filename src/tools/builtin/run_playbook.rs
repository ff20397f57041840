//! The run_playbook tool — builds a validated command and executes it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::exec::{self, RunRequest};
use crate::tools::{opt_bool, opt_str, opt_u64, require_str, Tool, ToolContext};

/// Runs a top-level playbook by name with optional inventory, limit, tags,
/// extra vars, and check mode.
///
/// The subprocess outcome — exit code included — is returned as data; a
/// failed play is a normal result, not a tool error.
pub struct RunPlaybookTool;

#[async_trait]
impl Tool for RunPlaybookTool {
    fn name(&self) -> &str {
        "run_playbook"
    }

    fn description(&self) -> &str {
        "Run an Ansible playbook by name (top-level file under the project's \
         ansible/ directory). Returns exit code, stdout, and stderr; a non-zero \
         exit code is reported, not raised."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "playbook_name": {
                    "type": "string",
                    "description": "Playbook file name, e.g. 'sno-deploy.yml'"
                },
                "inventory_relpath": {
                    "type": "string",
                    "description": "Optional inventory path relative to the project root \
                                    (e.g. 'ansible/inventory/lab.sample')"
                },
                "limit": {
                    "type": "string",
                    "description": "Optional Ansible --limit pattern"
                },
                "tags": {
                    "type": "string",
                    "description": "Optional Ansible --tags filter"
                },
                "extra_vars_json": {
                    "type": "string",
                    "description": "JSON object of variables passed with -e"
                },
                "check": {
                    "type": "boolean",
                    "description": "Run with --check (dry run)",
                    "default": false
                },
                "timeout_seconds": {
                    "type": "integer",
                    "description": "Process timeout in seconds (default 7200)"
                }
            },
            "required": ["playbook_name"]
        })
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> Result<Value, ToolError> {
        let request = RunRequest {
            playbook: require_str(&params, "playbook_name")?.to_string(),
            inventory: opt_str(&params, "inventory_relpath")?,
            limit: opt_str(&params, "limit")?,
            tags: opt_str(&params, "tags")?,
            extra_vars: opt_str(&params, "extra_vars_json")?,
            check: opt_bool(&params, "check", false)?,
        };
        let run_timeout = opt_u64(&params, "timeout_seconds")?
            .map(Duration::from_secs)
            .unwrap_or_else(|| context.runner.default_timeout());

        let spec = context.runner.build(&context.layout, &request, run_timeout)?;
        let result = exec::execute(&spec).await?;
        Ok(json!(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunnerConfig, VarsConfig};
    use crate::exec::PlaybookRunner;
    use crate::project::ProjectLayout;
    use crate::vars::TemplateEngine;

    /// Project whose bundled "ansible-playbook" is a shell stub, so runs
    /// stay hermetic.
    fn stub_project(stub_body: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ansible")).unwrap();
        std::fs::write(dir.path().join("ansible/deploy.yml"), "---\n").unwrap();
        let bin = dir.path().join(".ansible/bin");
        std::fs::create_dir_all(&bin).unwrap();
        let stub = bin.join("ansible-playbook");
        std::fs::write(&stub, format!("#!/bin/sh\n{stub_body}\n")).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        dir
    }

    fn context(root: &std::path::Path) -> ToolContext {
        let vars = VarsConfig::default();
        ToolContext {
            layout: ProjectLayout::new(root).unwrap(),
            runner: PlaybookRunner::new(RunnerConfig::default()),
            engine: TemplateEngine::new(vars.anchor.clone(), vars.quote_keys.clone()),
            vars,
        }
    }

    #[tokio::test]
    async fn test_run_reports_exit_code_and_output() {
        let dir = stub_project("echo play ok; echo warn >&2; exit 2");
        let ctx = context(dir.path());

        let result = RunPlaybookTool
            .execute(json!({"playbook_name": "deploy.yml"}), &ctx)
            .await
            .unwrap();
        assert_eq!(result["returncode"], 2);
        assert_eq!(result["stdout"], "play ok\n");
        assert_eq!(result["stderr"], "warn\n");
        assert!(result["command"].as_str().unwrap().contains("deploy.yml"));
        assert_eq!(result["cwd"].as_str().unwrap(), ctx.layout.root().to_str().unwrap());
    }

    #[tokio::test]
    async fn test_missing_playbook_param() {
        let dir = stub_project("exit 0");
        let ctx = context(dir.path());
        let err = RunPlaybookTool.execute(json!({}), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_playbook_is_not_found() {
        let dir = stub_project("exit 0");
        let ctx = context(dir.path());
        let err = RunPlaybookTool
            .execute(json!({"playbook_name": "ghost.yml"}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bad_extra_vars_rejected_before_launch() {
        let dir = stub_project("echo should not run; exit 0");
        let ctx = context(dir.path());
        let err = RunPlaybookTool
            .execute(
                json!({"playbook_name": "deploy.yml", "extra_vars_json": "{oops"}),
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn test_timeout_kills_run() {
        let dir = stub_project("sleep 30");
        let ctx = context(dir.path());
        let err = RunPlaybookTool
            .execute(
                json!({"playbook_name": "deploy.yml", "timeout_seconds": 1}),
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { seconds: 1 }));
    }

    #[tokio::test]
    async fn test_flags_forwarded_to_command_line() {
        let dir = stub_project("echo \"$@\"");
        let ctx = context(dir.path());
        let result = RunPlaybookTool
            .execute(
                json!({
                    "playbook_name": "deploy.yml",
                    "limit": "workers",
                    "tags": "install",
                    "check": true
                }),
                &ctx,
            )
            .await
            .unwrap();
        let stdout = result["stdout"].as_str().unwrap();
        assert!(stdout.contains("--limit workers"));
        assert!(stdout.contains("--tags install"));
        assert!(stdout.contains("--check"));
    }
}
