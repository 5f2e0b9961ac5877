//! Knowledge base tool
//!
//! Case-insensitive substring lookup against a small fixed keyword → fact
//! table. A stand-in for a real knowledge backend; swap the table out for
//! your own search.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::tool::{Tool, ToolResult};
use crate::llm::{ToolDefinition, ToolInputSchema};

/// Tool answering queries from a fixed fact table
pub struct KnowledgeBaseTool {
    entries: Vec<(&'static str, &'static str)>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeInput {
    query: String,
}

impl KnowledgeBaseTool {
    pub fn new() -> Self {
        Self {
            entries: vec![
                (
                    "python",
                    "Python is a high-level, interpreted programming language known for its simplicity and readability.",
                ),
                (
                    "rust",
                    "Rust is a systems programming language focused on safety, speed, and concurrency, enforced at compile time.",
                ),
                (
                    "ai",
                    "Artificial Intelligence (AI) refers to the simulation of human intelligence in machines programmed to think and learn.",
                ),
            ],
        }
    }

    /// Look a query up in the fact table
    fn lookup(&self, query: &str) -> Option<&'static str> {
        let query_lower = query.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| query_lower.contains(key))
            .map(|(_, fact)| *fact)
    }
}

impl Default for KnowledgeBaseTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for KnowledgeBaseTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Search the knowledge base for information about a topic."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: ToolInputSchema::single_string("query", "The search query"),
        }
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let input: KnowledgeInput = serde_json::from_value(input.clone())
            .map_err(|e| anyhow::anyhow!("Invalid knowledge base input: {}", e))?;

        match self.lookup(&input.query) {
            Some(fact) => Ok(ToolResult::success(fact)),
            None => Ok(ToolResult::success(format!(
                "No information found for query: {}",
                input.query
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_match_is_case_insensitive() {
        let tool = KnowledgeBaseTool::new();
        let result = tool
            .execute(&json!({"query": "Tell me about PYTHON programming"}))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert!(result.output.contains("Python is a high-level"));
    }

    #[tokio::test]
    async fn test_miss_returns_sentinel() {
        let tool = KnowledgeBaseTool::new();
        let result = tool.execute(&json!({"query": "zzz"})).await.unwrap();
        assert!(!result.is_error);
        assert_eq!(result.output, "No information found for query: zzz");
    }
}
