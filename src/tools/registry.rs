//! Name-keyed tool registry
//!
//! The registry is built once at startup and resolves tool calls by name.
//! Dispatch never propagates a failure: unknown tools and execution errors
//! both come back as error-flagged results so a tool fault can never crash
//! the conversation loop.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::tool::{Tool, ToolResult};
use super::{CalculatorTool, ClockTool, KnowledgeBaseTool, TextStatsTool};
use crate::llm::ToolDefinition;

/// Registry of tools available to the agent
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with the built-in tools registered
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ClockTool));
        registry.register(Arc::new(CalculatorTool));
        registry.register(Arc::new(KnowledgeBaseTool::new()));
        registry.register(Arc::new(TextStatsTool));
        registry
    }

    /// Register a tool under its declared name
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        tracing::debug!(tool = tool.name(), "Registering tool");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Catalog entries for every registered tool, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute the named tool with the given input
    pub async fn dispatch(&self, name: &str, input: &Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = name, "Unknown tool requested");
            return ToolResult::error(format!("Unknown tool: {}", name));
        };

        tracing::info!(tool = name, "Executing tool");
        match tool.execute(input).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool execution failed");
                ToolResult::error(format!("Tool {} failed: {}", name, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_builtin_registry_has_four_tools() {
        let registry = ToolRegistry::builtin();
        assert_eq!(registry.len(), 4);

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "calculate",
                "get_current_time",
                "search_knowledge_base",
                "text_analysis"
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error_result() {
        let registry = ToolRegistry::builtin();
        let result = registry.dispatch("launch_rockets", &json!({})).await;
        assert!(result.is_error);
        assert!(result.output.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_dispatch_reaches_a_registered_tool() {
        let registry = ToolRegistry::builtin();
        let result = registry
            .dispatch("calculate", &json!({"expression": "1 + 1"}))
            .await;
        assert!(!result.is_error);
        assert_eq!(result.output, "2");
    }
}
