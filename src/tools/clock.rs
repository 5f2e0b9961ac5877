//! Clock tool
//!
//! Returns the current local date and time. The only tool that reads
//! ambient state.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::tool::{Tool, ToolResult};
use crate::llm::{ToolDefinition, ToolInputSchema};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Tool reporting the current local date-time
pub struct ClockTool;

#[async_trait]
impl Tool for ClockTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time in a readable format."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: ToolInputSchema::empty(),
        }
    }

    async fn execute(&self, _input: &Value) -> Result<ToolResult> {
        let now = chrono::Local::now();
        Ok(ToolResult::success(now.format(TIME_FORMAT).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_clock_output_matches_format() {
        let result = ClockTool.execute(&json!({})).await.unwrap();
        assert!(!result.is_error);
        assert!(
            chrono::NaiveDateTime::parse_from_str(&result.output, TIME_FORMAT).is_ok(),
            "unexpected clock output: {}",
            result.output
        );
    }
}
