//! Tool registry — maps MCP tool names to implementations.
//!
//! Tools are registered once at startup (see `main.rs`) and dispatched by
//! name for each tools/call request. Dispatch is sequential: one request
//! runs to completion before the next is read off the wire.

use serde_json::Value;
use tracing::debug;

use crate::error::ToolError;

use super::{Tool, ToolContext, ToolDefinition};

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        debug!("Registered tool: {}", tool.name());
        self.tools.push(tool);
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Definitions for the tools/list response, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.parameters_schema(),
            })
            .collect()
    }

    /// Dispatches a tools/call by name.
    pub async fn execute(
        &self,
        name: &str,
        params: Value,
        context: &ToolContext,
    ) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| ToolError::Validation(format!("unknown tool: {name}")))?;
        tool.execute(params, context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes its parameters back."
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, params: Value, _: &ToolContext) -> Result<Value, ToolError> {
            Ok(params)
        }
    }

    fn test_context() -> (tempfile::TempDir, ToolContext) {
        let dir = tempfile::tempdir().unwrap();
        let vars = crate::config::VarsConfig::default();
        let context = ToolContext {
            layout: crate::project::ProjectLayout::new(dir.path()).unwrap(),
            runner: crate::exec::PlaybookRunner::new(crate::config::RunnerConfig::default()),
            engine: crate::vars::TemplateEngine::new(
                vars.anchor.clone(),
                vars.quote_keys.clone(),
            ),
            vars,
        };
        (dir, context)
    }

    #[test]
    fn test_definitions_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert!(!defs[0].description.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_by_name() {
        let (_dir, context) = test_context();
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let result = registry
            .execute("echo", json!({"k": "v"}), &context)
            .await
            .unwrap();
        assert_eq!(result, json!({"k": "v"}));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_validation_error() {
        let (_dir, context) = test_context();
        let registry = ToolRegistry::new();
        let err = registry
            .execute("nope", json!({}), &context)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }
}
