//! Tool system for the agent
//!
//! This module provides the Tool trait, the built-in tools, and the
//! ToolRegistry that resolves tool calls by name.

pub mod calculator;
pub mod clock;
pub mod knowledge;
mod registry;
pub mod text_stats;
mod tool;

pub use calculator::CalculatorTool;
pub use clock::ClockTool;
pub use knowledge::KnowledgeBaseTool;
pub use registry::ToolRegistry;
pub use text_stats::TextStatsTool;
pub use tool::{Tool, ToolResult};
