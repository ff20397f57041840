//! Sandboxed text reads from the project tree.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tools::{require_str, Tool, ToolContext};

/// Reads a UTF-8 file by project-relative path.
///
/// The path is resolved through the project sandbox, so `..` segments and
/// symlinks pointing outside the project are rejected before any read.
pub struct ReadTextFileTool;

#[async_trait]
impl Tool for ReadTextFileTool {
    fn name(&self) -> &str {
        "read_text_file"
    }

    fn description(&self) -> &str {
        "Read a text file from within the project by relative path. \
         Only files inside the project directory are allowed. Use forward slashes."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "relative_path": {
                    "type": "string",
                    "description": "Path relative to the project root \
                                    (e.g. 'docs/deploy/sno.md')"
                }
            },
            "required": ["relative_path"]
        })
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> Result<Value, ToolError> {
        let relative_path = require_str(&params, "relative_path")?;
        let text = context.layout.read_text_file(relative_path)?;
        Ok(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunnerConfig, VarsConfig};
    use crate::exec::PlaybookRunner;
    use crate::project::ProjectLayout;
    use crate::vars::TemplateEngine;

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
    async fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

        let ctx = context(dir.path());
        let result = ReadTextFileTool
            .execute(json!({"relative_path": "notes.txt"}), &ctx)
            .await
            .unwrap();
        assert_eq!(result, json!("hello\n"));
    }

    #[tokio::test]
    async fn test_missing_param() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let err = ReadTextFileTool.execute(json!({}), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
        assert!(err.to_string().contains("relative_path"));
    }

    #[tokio::test]
    async fn test_escape_rejected() {
        let outer = tempfile::tempdir().unwrap();
        let base = outer.path().join("proj");
        std::fs::create_dir(&base).unwrap();
        std::fs::write(outer.path().join("secret"), "x").unwrap();

        let ctx = context(&base);
        let err = ReadTextFileTool
            .execute(json!({"relative_path": "../secret"}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { .. }));
    }
}
