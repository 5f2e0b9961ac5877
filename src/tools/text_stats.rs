//! Text statistics tool
//!
//! Computes basic statistics over arbitrary text: word count, character
//! counts, a naive sentence count, and average word length.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::tool::{Tool, ToolResult};
use crate::llm::{ToolDefinition, ToolInputSchema};

/// Tool reporting basic text statistics
pub struct TextStatsTool;

#[derive(Debug, Deserialize)]
struct TextStatsInput {
    text: String,
}

/// Statistics over a piece of text
#[derive(Debug, PartialEq)]
pub struct TextStats {
    pub word_count: usize,
    pub char_count: usize,
    pub char_count_no_spaces: usize,
    /// Count of '.', '!' and '?' occurrences
    pub sentence_count: usize,
    pub average_word_length: f64,
}

impl TextStats {
    /// Compute statistics for `text`
    pub fn analyze(text: &str) -> Self {
        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();
        let char_count_no_spaces = text.chars().filter(|c| *c != ' ').count();
        let sentence_count = text
            .chars()
            .filter(|c| matches!(c, '.' | '!' | '?'))
            .count();
        let average_word_length = char_count_no_spaces as f64 / word_count.max(1) as f64;

        Self {
            word_count,
            char_count,
            char_count_no_spaces,
            sentence_count,
            average_word_length,
        }
    }

    fn render(&self) -> String {
        format!(
            "Text Analysis Results:\n\
             - Word count: {}\n\
             - Character count: {}\n\
             - Characters (no spaces): {}\n\
             - Estimated sentences: {}\n\
             - Average word length: {:.2} characters",
            self.word_count,
            self.char_count,
            self.char_count_no_spaces,
            self.sentence_count,
            self.average_word_length
        )
    }
}

#[async_trait]
impl Tool for TextStatsTool {
    fn name(&self) -> &str {
        "text_analysis"
    }

    fn description(&self) -> &str {
        "Analyze text and return basic statistics: word count, character counts, \
         sentence count, and average word length."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: ToolInputSchema::single_string("text", "The text to analyze"),
        }
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let input: TextStatsInput = serde_json::from_value(input.clone())
            .map_err(|e| anyhow::anyhow!("Invalid text analysis input: {}", e))?;

        Ok(ToolResult::success(TextStats::analyze(&input.text).render()))
    }
}
