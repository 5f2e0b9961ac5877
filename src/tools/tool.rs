//! Tool trait definition
//!
//! All tools implement this trait to provide a consistent interface.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::ToolDefinition;

/// Result of executing a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Output text shown to the model
    pub output: String,
    /// Whether the tool execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
        }
    }
}

/// Trait for tools the agent can use
///
/// Tools are stateless and side-effect-free apart from reading the system
/// clock. A tool reports failures through `ToolResult::error` (or an `Err`,
/// which the registry converts); either way the conversation continues with
/// the error text visible to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of this tool
    fn name(&self) -> &str;

    /// Get a description of this tool
    fn description(&self) -> &str;

    /// Get the catalog entry sent to the model
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given input
    ///
    /// The input is a JSON value matching the tool's input schema.
    async fn execute(&self, input: &Value) -> Result<ToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("output");
        assert_eq!(result.output, "output");
        assert!(!result.is_error);
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("error message");
        assert_eq!(result.output, "error message");
        assert!(result.is_error);
    }
}
