//! LLM provider trait
//!
//! The hosted model service is a black box behind this trait: given the full
//! history and the tool catalog, it returns either a final answer or a list
//! of requested tool invocations. Tests substitute a scripted
//! implementation.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{Message, ModelTurn, ToolDefinition};

/// Errors from the model service boundary
///
/// There is no retry layer; failures carry the underlying message and
/// propagate to the caller.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to model service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not interpret model response: {0}")]
    Malformed(String),
}

/// Request/response contract with the model service
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Ask the model for its next turn given the history and tool catalog
    async fn complete(
        &self,
        history: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
    ) -> Result<ModelTurn, LlmError>;
}
