//! Conversation and tool-catalog types
//!
//! These are the internal types the agent loop operates on. They are
//! provider-neutral; each provider converts them to its wire format at the
//! boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human user
    User,
    /// The language model
    Assistant,
    /// The result of executing a tool call
    Tool,
}

/// A model-issued request to execute a named tool with arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id, echoed back in the matching tool result
    pub id: String,
    /// Name of the tool to execute
    pub name: String,
    /// Arguments matching the tool's input schema
    pub arguments: Value,
}

/// One immutable turn in a conversation
///
/// A history is an ordered, append-only `Vec<Message>`. Messages are created
/// once (by the user, the model, or a tool execution) and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Textual content; `None` when the turn only carries tool calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool invocations requested by the model (assistant turns only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Id of the tool call this message answers (tool turns only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
    /// Whether a tool turn carries an error result
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_use_id: None,
            is_error: false,
        }
    }

    /// Create a plain assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_use_id: None,
            is_error: false,
        }
    }

    /// Create an assistant message that requests tool calls
    pub fn assistant_with_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: calls,
            tool_use_id: None,
            is_error: false,
        }
    }

    /// Create a successful tool-result message answering `tool_use_id`
    pub fn tool_result(tool_use_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(output.into()),
            tool_calls: Vec::new(),
            tool_use_id: Some(tool_use_id.into()),
            is_error: false,
        }
    }

    /// Create an error tool-result message answering `tool_use_id`
    pub fn tool_error(tool_use_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(message.into()),
            tool_calls: Vec::new(),
            tool_use_id: Some(tool_use_id.into()),
            is_error: true,
        }
    }

    /// Whether this is an assistant message that requests no tool calls
    pub fn is_final_answer(&self) -> bool {
        self.role == Role::Assistant && self.tool_calls.is_empty()
    }
}

/// The model's decision for one round: answer directly, or call tools
///
/// Modeling the decision as an enum makes the loop's terminal condition
/// explicit and exhaustively checked.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// The model produced a plain answer; the loop is done
    FinalAnswer { text: String },
    /// The model wants one or more tools executed before continuing
    ToolCalls {
        /// Any text the model emitted alongside the calls
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
}

impl ModelTurn {
    /// Convert this turn into the assistant message to append to the history
    pub fn into_message(self) -> Message {
        match self {
            ModelTurn::FinalAnswer { text } => Message::assistant(text),
            ModelTurn::ToolCalls { text, calls } => Message::assistant_with_calls(text, calls),
        }
    }
}

/// JSON-schema description of a tool's input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ToolInputSchema {
    /// Schema for a tool that takes no input
    pub fn empty() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: None,
            required: None,
        }
    }

    /// Schema for a tool that takes a single required string argument
    pub fn single_string(name: &str, description: &str) -> Self {
        let mut properties = serde_json::Map::new();
        properties.insert(
            name.to_string(),
            serde_json::json!({
                "type": "string",
                "description": description,
            }),
        );
        Self {
            schema_type: "object".to_string(),
            properties: Some(Value::Object(properties)),
            required: Some(vec![name.to_string()]),
        }
    }
}

/// A tool catalog entry sent to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// Token usage reported by the provider for one request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}
