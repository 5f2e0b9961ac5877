//! Sourdough - a starter template for tool-calling LLM agents
//!
//! The crate wires a chat-capable language model to a small set of callable
//! tools through a conversation loop: user input is appended to the history,
//! the model decides whether to answer or call tools, requested tools run
//! and their results feed back to the model, and the loop repeats until the
//! model produces a plain answer (or the round cap trips).
//!
//! ```ignore
//! let config = Config::from_env()?;
//! let agent = Agent::from_config(&config)?;
//! let history = agent.ask("What is sqrt(16)?", Vec::new()).await?;
//! ```
//!
//! The [`receipt`] module is an unrelated standalone client for a receipt
//! OCR service, shipped alongside the template.

pub mod agent;
pub mod cli;
pub mod config;
pub mod llm;
pub mod logging;
pub mod receipt;
pub mod tools;

pub use agent::{Agent, AgentError, LoopEvent};
pub use config::{Config, ConfigError};
pub use llm::{LlmError, LlmProvider, Message, ModelTurn, Role, ToolCall};
pub use tools::{Tool, ToolRegistry, ToolResult};
