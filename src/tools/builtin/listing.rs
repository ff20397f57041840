//! Discovery tools: what the project contains.
//!
//! Thin wrappers over [`ProjectLayout`] — the listing logic itself lives
//! there so it stays testable without a tool context.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tools::{Tool, ToolContext};

/// Lists the top-level playbooks of the project.
pub struct ListPlaybooksTool;

#[async_trait]
impl Tool for ListPlaybooksTool {
    fn name(&self) -> &str {
        "list_playbooks"
    }

    fn description(&self) -> &str {
        "List top-level Ansible playbooks under the project's ansible/ directory \
         (excludes role internals). Returns name and absolute path for each."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _params: Value, context: &ToolContext) -> Result<Value, ToolError> {
        Ok(json!(context.layout.list_playbooks()?))
    }
}

/// Lists role names under ansible/roles.
pub struct ListRolesTool;

#[async_trait]
impl Tool for ListRolesTool {
    fn name(&self) -> &str {
        "list_roles"
    }

    fn description(&self) -> &str {
        "List Ansible role names available under the project's ansible/roles directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _params: Value, context: &ToolContext) -> Result<Value, ToolError> {
        Ok(json!(context.layout.list_roles()?))
    }
}

/// Lists Markdown docs, recursively, excluding image directories.
pub struct ListDocsTool;

#[async_trait]
impl Tool for ListDocsTool {
    fn name(&self) -> &str {
        "list_docs"
    }

    fn description(&self) -> &str {
        "List Markdown documentation files under the project's docs/ directory \
         (recursive, excluding images)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _params: Value, context: &ToolContext) -> Result<Value, ToolError> {
        Ok(json!(context.layout.list_docs()?))
    }
}
