//! Anthropic Messages API client
//!
//! Translates between the crate's internal message types and the Anthropic
//! wire format. All conversion happens at this boundary; the agent loop only
//! ever sees [`Message`] and [`ModelTurn`].

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{LlmError, LlmProvider};
use super::types::{Message, ModelTurn, Role, ToolCall, ToolDefinition, Usage};
use crate::config::Config;

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Request timeout for a single model call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<&'a ToolDefinition>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: Vec<WireBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<WireBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ============================================================================
// AnthropicProvider
// ============================================================================

/// Anthropic LLM provider
///
/// Constructed from a validated [`Config`]; it never reads the environment
/// itself.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    api_base: String,
}

impl AnthropicProvider {
    /// Create a provider from a validated configuration
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        tracing::info!(model = %config.model, "Creating Anthropic provider");

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: 4096,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Override the API base URL (proxies, test servers)
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Override the response token budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The model this provider targets
    pub fn model(&self) -> &str {
        &self.model
    }

    // ========================================================================
    // Format conversion: internal -> wire
    // ========================================================================

    /// Convert internal messages to the wire format
    ///
    /// Consecutive tool-result messages collapse into a single `user` message
    /// carrying one `tool_result` block per call, preserving order.
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        let mut wire: Vec<WireMessage> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::User => {
                    wire.push(WireMessage {
                        role: "user".to_string(),
                        content: vec![WireBlock::Text {
                            text: msg.content.clone().unwrap_or_default(),
                        }],
                    });
                }
                Role::Assistant => {
                    let mut blocks = Vec::new();
                    if let Some(text) = &msg.content {
                        if !text.is_empty() {
                            blocks.push(WireBlock::Text { text: text.clone() });
                        }
                    }
                    for call in &msg.tool_calls {
                        blocks.push(WireBlock::ToolUse {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            input: call.arguments.clone(),
                        });
                    }
                    wire.push(WireMessage {
                        role: "assistant".to_string(),
                        content: blocks,
                    });
                }
                Role::Tool => {
                    let block = WireBlock::ToolResult {
                        tool_use_id: msg.tool_use_id.clone().unwrap_or_default(),
                        content: msg.content.clone().unwrap_or_default(),
                        is_error: msg.is_error.then_some(true),
                    };
                    // Append to a preceding tool-result user message if one
                    // is already open, so a batch of results stays one turn.
                    match wire.last_mut() {
                        Some(last)
                            if last.role == "user"
                                && last
                                    .content
                                    .iter()
                                    .all(|b| matches!(b, WireBlock::ToolResult { .. })) =>
                        {
                            last.content.push(block);
                        }
                        _ => wire.push(WireMessage {
                            role: "user".to_string(),
                            content: vec![block],
                        }),
                    }
                }
            }
        }

        wire
    }

    // ========================================================================
    // Format conversion: wire -> internal
    // ========================================================================

    fn convert_response(response: MessagesResponse) -> Result<ModelTurn, LlmError> {
        let mut text_parts: Vec<String> = Vec::new();
        let mut calls: Vec<ToolCall> = Vec::new();

        for block in response.content {
            match block {
                WireBlock::Text { text } => text_parts.push(text),
                WireBlock::ToolUse { id, name, input } => {
                    calls.push(ToolCall {
                        id,
                        name,
                        arguments: input,
                    });
                }
                WireBlock::ToolResult { .. } => {
                    return Err(LlmError::Malformed(
                        "tool_result block in assistant response".to_string(),
                    ));
                }
            }
        }

        let text = if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join("\n"))
        };

        let wants_tools = response.stop_reason.as_deref() == Some("tool_use");
        if wants_tools && !calls.is_empty() {
            Ok(ModelTurn::ToolCalls { text, calls })
        } else {
            Ok(ModelTurn::FinalAnswer {
                text: text.unwrap_or_default(),
            })
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(
        &self,
        history: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
    ) -> Result<ModelTurn, LlmError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            system,
            messages: Self::convert_messages(history),
            tools: tools.iter().collect(),
        };

        tracing::debug!(
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending messages request"
        );

        let response = self
            .client
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            let usage = Usage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
            };
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Model call completed"
            );
        }

        Self::convert_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_results_collapse_into_one_user_turn() {
        let history = vec![
            Message::user("what time is it, and what is 2+2?"),
            Message::assistant_with_calls(
                None,
                vec![
                    ToolCall {
                        id: "call_1".to_string(),
                        name: "get_current_time".to_string(),
                        arguments: serde_json::json!({}),
                    },
                    ToolCall {
                        id: "call_2".to_string(),
                        name: "calculate".to_string(),
                        arguments: serde_json::json!({"expression": "2 + 2"}),
                    },
                ],
            ),
            Message::tool_result("call_1", "2024-05-01 10:30:00"),
            Message::tool_result("call_2", "4"),
        ];

        let wire = AnthropicProvider::convert_messages(&history);
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[2].role, "user");
        assert_eq!(wire[2].content.len(), 2);
        match &wire[2].content[0] {
            WireBlock::ToolResult { tool_use_id, .. } => assert_eq!(tool_use_id, "call_1"),
            other => panic!("expected tool_result, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_results_do_not_merge_across_user_text() {
        let history = vec![
            Message::tool_result("call_1", "ok"),
            Message::user("thanks"),
            Message::tool_result("call_2", "ok"),
        ];
        let wire = AnthropicProvider::convert_messages(&history);
        assert_eq!(wire.len(), 3);
    }

    #[test]
    fn test_stop_reason_maps_to_turn_variant() {
        let response = MessagesResponse {
            content: vec![
                WireBlock::Text {
                    text: "Let me check.".to_string(),
                },
                WireBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: "get_current_time".to_string(),
                    input: serde_json::json!({}),
                },
            ],
            stop_reason: Some("tool_use".to_string()),
            usage: None,
        };

        match AnthropicProvider::convert_response(response).unwrap() {
            ModelTurn::ToolCalls { text, calls } => {
                assert_eq!(text.as_deref(), Some("Let me check."));
                assert_eq!(calls.len(), 1);
            }
            other => panic!("expected tool calls, got {:?}", other),
        }

        let response = MessagesResponse {
            content: vec![WireBlock::Text {
                text: "It is noon.".to_string(),
            }],
            stop_reason: Some("end_turn".to_string()),
            usage: None,
        };
        match AnthropicProvider::convert_response(response).unwrap() {
            ModelTurn::FinalAnswer { text } => assert_eq!(text, "It is noon."),
            other => panic!("expected final answer, got {:?}", other),
        }
    }
}
