pub mod builtin;
pub mod registry;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::VarsConfig;
use crate::error::ToolError;
use crate::exec::PlaybookRunner;
use crate::project::ProjectLayout;
use crate::vars::TemplateEngine;

/// Shared state handed to every tool execution.
///
/// Holds the project layout (with its sandbox), the playbook runner, and the
/// vars template engine — built once at startup from config, never mutated.
pub struct ToolContext {
    pub layout: ProjectLayout,
    pub runner: PlaybookRunner,
    pub engine: TemplateEngine,
    pub vars: VarsConfig,
}

/// A tool the MCP client can invoke via tools/call.
///
/// All exposed operations implement this trait. The registry calls
/// `execute()` when the client requests the tool by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique identifier used in the MCP `tools[]` array.
    /// Must be lowercase alphanumeric + underscores (e.g. "run_playbook").
    fn name(&self) -> &str;

    /// Human-readable description shown to the client so it knows
    /// when to invoke this tool.
    fn description(&self) -> &str;

    /// JSON Schema describing the parameters this tool accepts.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given parameters. The returned JSON value
    /// is sent back to the client as the tool result.
    async fn execute(&self, params: Value, context: &ToolContext) -> Result<Value, ToolError>;
}

/// Wire shape of one entry in the tools/list response.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub use registry::ToolRegistry;

// ── Parameter extraction ─────────────────────────────────

/// Required string parameter; missing or mistyped is a validation failure.
pub(crate) fn require_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    params[key]
        .as_str()
        .ok_or_else(|| ToolError::Validation(format!("missing required parameter: {key}")))
}

/// Optional string parameter; null and absent both mean None.
pub(crate) fn opt_str(params: &Value, key: &str) -> Result<Option<String>, ToolError> {
    match &params[key] {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(ToolError::Validation(format!(
            "parameter {key} must be a string, got {other}"
        ))),
    }
}

/// Optional boolean parameter with a default.
pub(crate) fn opt_bool(params: &Value, key: &str, default: bool) -> Result<bool, ToolError> {
    match &params[key] {
        Value::Null => Ok(default),
        Value::Bool(b) => Ok(*b),
        other => Err(ToolError::Validation(format!(
            "parameter {key} must be a boolean, got {other}"
        ))),
    }
}

/// Optional non-negative integer parameter.
pub(crate) fn opt_u64(params: &Value, key: &str) -> Result<Option<u64>, ToolError> {
    match &params[key] {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().ok_or_else(|| {
            ToolError::Validation(format!("parameter {key} must be a non-negative integer"))
        }).map(Some),
        other => Err(ToolError::Validation(format!(
            "parameter {key} must be an integer, got {other}"
        ))),
    }
}
