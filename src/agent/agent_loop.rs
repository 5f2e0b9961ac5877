//! Agent loop with tool calling support
//!
//! One call to [`Agent::respond`] runs the inner loop for a single user
//! turn: ask the model, execute any requested tools, feed the results back,
//! repeat until the model produces a plain answer. The caller owns the
//! history and appends the user message before calling; the loop consumes
//! the history and returns a new one.

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::Stream;
use thiserror::Error;

use crate::agent::system_prompt::SYSTEM_PROMPT;
use crate::config::Config;
use crate::llm::{
    AnthropicProvider, LlmError, LlmProvider, Message, ModelTurn, ToolDefinition,
};
use crate::tools::ToolRegistry;

/// Errors from driving the conversation loop
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model kept requesting tools past the configured round cap
    #[error("model requested tools for {rounds} consecutive rounds without answering")]
    RoundLimit {
        rounds: usize,
        /// History accumulated up to the point the loop gave up
        history: Vec<Message>,
    },

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("failed to start blocking runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// A state update yielded by [`Agent::respond_stream`]
///
/// Each update carries a full snapshot of the history so far; `Done` is the
/// terminal update and carries the final history.
#[derive(Debug, Clone)]
pub enum LoopEvent {
    /// The model replied (round `round`); the snapshot ends with its message
    ModelReply { round: usize, messages: Vec<Message> },
    /// Requested tools were executed; the snapshot ends with their results
    ToolResults { round: usize, messages: Vec<Message> },
    /// The loop terminated; the final history
    Done { messages: Vec<Message> },
}

/// What one round produced
enum RoundStep {
    /// The model answered; the loop is done
    Answer(Message),
    /// The model requested tools; results are in request order
    Tools {
        reply: Message,
        results: Vec<Message>,
    },
}

/// Main agent orchestrating the conversation loop
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: ToolRegistry,
    system_prompt: Option<String>,
    max_rounds: usize,
}

impl Agent {
    /// Create an agent from a provider and a tool registry
    pub fn new(provider: Arc<dyn LlmProvider>, tools: ToolRegistry) -> Self {
        Self {
            provider,
            tools,
            system_prompt: Some(SYSTEM_PROMPT.to_string()),
            max_rounds: crate::config::DEFAULT_MAX_ROUNDS,
        }
    }

    /// Create an agent from a validated configuration: Anthropic provider,
    /// built-in tools, default system prompt
    pub fn from_config(config: &Config) -> Result<Self, AgentError> {
        let provider = AnthropicProvider::new(config)?;
        let mut agent = Self::new(Arc::new(provider), ToolRegistry::builtin());
        agent.max_rounds = config.max_rounds;
        Ok(agent)
    }

    /// Replace the system prompt (`None` sends none)
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// Cap the number of model/tool round-trips per call
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// The registry of tools this agent can call
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run the loop for one user turn
    ///
    /// The caller appends the user message before calling; this appends only
    /// model replies and tool results. If the history already ends in an
    /// assistant message with no tool calls, it is returned unchanged
    /// without invoking the model.
    pub async fn respond(&self, history: Vec<Message>) -> Result<Vec<Message>, AgentError> {
        if history.last().is_some_and(Message::is_final_answer) {
            return Ok(history);
        }

        let catalog = self.tools.definitions();
        let mut messages = history;

        for round in 1..=self.max_rounds {
            match self.run_round(round, &messages, &catalog).await? {
                RoundStep::Answer(reply) => {
                    messages.push(reply);
                    return Ok(messages);
                }
                RoundStep::Tools { reply, results } => {
                    messages.push(reply);
                    messages.extend(results);
                }
            }
        }

        tracing::warn!(rounds = self.max_rounds, "Round limit reached");
        Err(AgentError::RoundLimit {
            rounds: self.max_rounds,
            history: messages,
        })
    }

    /// Append `input` as a user message, then run the loop
    pub async fn ask(
        &self,
        input: impl Into<String>,
        mut history: Vec<Message>,
    ) -> Result<Vec<Message>, AgentError> {
        history.push(Message::user(input));
        self.respond(history).await
    }

    /// Synchronous variant of [`Agent::respond`]
    ///
    /// Spins up a current-thread runtime; must not be called from inside an
    /// async context.
    pub fn respond_blocking(&self, history: Vec<Message>) -> Result<Vec<Message>, AgentError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.respond(history))
    }

    /// Streaming variant of [`Agent::respond`]
    ///
    /// Lazily yields a history snapshot after each model reply and each
    /// batch of tool results, terminating with [`LoopEvent::Done`] when the
    /// loop terminates. Each call starts a fresh run; a partially consumed
    /// stream cannot be resumed.
    pub fn respond_stream(
        &self,
        history: Vec<Message>,
    ) -> impl Stream<Item = Result<LoopEvent, AgentError>> + '_ {
        try_stream! {
            if history.last().is_some_and(Message::is_final_answer) {
                yield LoopEvent::Done { messages: history };
                return;
            }

            let catalog = self.tools.definitions();
            let mut messages = history;

            for round in 1..=self.max_rounds {
                match self.run_round(round, &messages, &catalog).await? {
                    RoundStep::Answer(reply) => {
                        messages.push(reply);
                        yield LoopEvent::ModelReply {
                            round,
                            messages: messages.clone(),
                        };
                        yield LoopEvent::Done { messages };
                        return;
                    }
                    RoundStep::Tools { reply, results } => {
                        messages.push(reply);
                        yield LoopEvent::ModelReply {
                            round,
                            messages: messages.clone(),
                        };
                        messages.extend(results);
                        yield LoopEvent::ToolResults {
                            round,
                            messages: messages.clone(),
                        };
                    }
                }
            }

            Err(AgentError::RoundLimit {
                rounds: self.max_rounds,
                history: messages,
            })?;
        }
    }

    /// One round: invoke the model, then execute any requested tools
    ///
    /// Tool faults never abort the round; they come back as error-flagged
    /// tool-result messages visible to the model. Results are appended in
    /// request order, one message per call.
    async fn run_round(
        &self,
        round: usize,
        messages: &[Message],
        catalog: &[ToolDefinition],
    ) -> Result<RoundStep, AgentError> {
        tracing::debug!(round, messages = messages.len(), "Invoking model");

        let turn = self
            .provider
            .complete(messages, self.system_prompt.as_deref(), catalog)
            .await?;

        match turn {
            ModelTurn::FinalAnswer { text } => {
                tracing::debug!(round, "Model produced final answer");
                Ok(RoundStep::Answer(Message::assistant(text)))
            }
            ModelTurn::ToolCalls { text, calls } => {
                tracing::info!(
                    round,
                    tools = ?calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                    "Model requested tools"
                );

                let reply = Message::assistant_with_calls(text, calls.clone());
                let mut results = Vec::with_capacity(calls.len());
                for call in &calls {
                    let result = self.tools.dispatch(&call.name, &call.arguments).await;
                    results.push(if result.is_error {
                        Message::tool_error(&call.id, result.output)
                    } else {
                        Message::tool_result(&call.id, result.output)
                    });
                }
                Ok(RoundStep::Tools { reply, results })
            }
        }
    }
}
