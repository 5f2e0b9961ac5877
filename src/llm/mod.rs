pub mod anthropic;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use provider::{LlmError, LlmProvider};
pub use types::{Message, ModelTurn, Role, ToolCall, ToolDefinition, ToolInputSchema, Usage};
