//! Integration tests for the conversation loop against the public API
//!
//! A scripted provider stands in for the hosted model; the built-in tools
//! run for real.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{pin_mut, StreamExt};
use serde_json::json;

use sourdough::llm::{LlmError, ToolDefinition};
use sourdough::{
    Agent, AgentError, LlmProvider, LoopEvent, Message, ModelTurn, Role, ToolCall, ToolRegistry,
};

/// Plays back a fixed script of model turns and records what it was sent
struct ScriptedProvider {
    turns: Mutex<Vec<ModelTurn>>,
    histories_seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    fn new(mut turns: Vec<ModelTurn>) -> Arc<Self> {
        turns.reverse();
        Arc::new(Self {
            turns: Mutex::new(turns),
            histories_seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        history: &[Message],
        _system: Option<&str>,
        _tools: &[ToolDefinition],
    ) -> Result<ModelTurn, LlmError> {
        self.histories_seen.lock().unwrap().push(history.to_vec());
        self.turns
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| LlmError::Malformed("script exhausted".to_string()))
    }
}

fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

#[tokio::test]
async fn test_turn_with_real_tools_end_to_end() {
    let provider = ScriptedProvider::new(vec![
        ModelTurn::ToolCalls {
            text: Some("Let me work that out.".to_string()),
            calls: vec![
                call("call_1", "calculate", json!({"expression": "sqrt(16)"})),
                call("call_2", "search_knowledge_base", json!({"query": "rust"})),
            ],
        },
        ModelTurn::FinalAnswer {
            text: "sqrt(16) is 4.0, and Rust is a systems language.".to_string(),
        },
    ]);
    let agent = Agent::new(provider.clone(), ToolRegistry::builtin());

    let history = agent
        .ask("What is sqrt(16), and what is Rust?", Vec::new())
        .await
        .unwrap();

    // user, assistant(2 calls), 2 tool results, final answer
    assert_eq!(history.len(), 5);
    assert_eq!(history[2].content.as_deref(), Some("4.0"));
    assert!(history[3]
        .content
        .as_deref()
        .unwrap()
        .contains("Rust is a systems programming language"));
    assert!(history[4].is_final_answer());

    // The second model invocation saw both tool results, in request order,
    // before anything else was appended.
    let seen = provider.histories_seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    let second = &seen[1];
    assert_eq!(second.len(), 4);
    assert_eq!(second[2].role, Role::Tool);
    assert_eq!(second[2].tool_use_id.as_deref(), Some("call_1"));
    assert_eq!(second[3].tool_use_id.as_deref(), Some("call_2"));
}

#[tokio::test]
async fn test_settled_history_is_returned_unchanged() {
    let provider = ScriptedProvider::new(vec![]);
    let agent = Agent::new(provider.clone(), ToolRegistry::builtin());

    let history = vec![
        Message::user("hello"),
        Message::assistant("hi, how can I help?"),
    ];
    let result = agent.respond(history.clone()).await.unwrap();

    assert_eq!(result, history);
    assert!(provider.histories_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_stream_terminates_with_final_history() {
    let provider = ScriptedProvider::new(vec![
        ModelTurn::ToolCalls {
            text: None,
            calls: vec![call("call_1", "get_current_time", json!({}))],
        },
        ModelTurn::FinalAnswer {
            text: "done".to_string(),
        },
    ]);
    let agent = Agent::new(provider, ToolRegistry::builtin());

    let stream = agent.respond_stream(vec![Message::user("time?")]);
    pin_mut!(stream);

    let mut snapshots = 0;
    let mut final_history = None;
    while let Some(event) = stream.next().await {
        match event.unwrap() {
            LoopEvent::ModelReply { messages, .. } | LoopEvent::ToolResults { messages, .. } => {
                snapshots += 1;
                // snapshots grow monotonically
                assert!(messages.len() > 1);
            }
            LoopEvent::Done { messages } => final_history = Some(messages),
        }
    }

    assert_eq!(snapshots, 3);
    let final_history = final_history.expect("stream ended without Done");
    assert_eq!(final_history.len(), 4);
    assert!(final_history[3].is_final_answer());
}

#[tokio::test]
async fn test_round_cap_reports_partial_history() {
    let looping: Vec<ModelTurn> = (0..5)
        .map(|i| ModelTurn::ToolCalls {
            text: None,
            calls: vec![call(&format!("call_{}", i), "get_current_time", json!({}))],
        })
        .collect();
    let agent =
        Agent::new(ScriptedProvider::new(looping), ToolRegistry::builtin()).with_max_rounds(2);

    let err = agent.ask("loop forever", Vec::new()).await.unwrap_err();
    match err {
        AgentError::RoundLimit { rounds, history } => {
            assert_eq!(rounds, 2);
            assert_eq!(history.len(), 5);
            assert_eq!(history[0], Message::user("loop forever"));
        }
        other => panic!("expected RoundLimit, got {:?}", other),
    }
}

#[test]
fn test_blocking_call_from_sync_context() {
    let provider = ScriptedProvider::new(vec![ModelTurn::FinalAnswer {
        text: "hello from sync".to_string(),
    }]);
    let agent = Agent::new(provider, ToolRegistry::builtin());

    let history = agent
        .respond_blocking(vec![Message::user("hi")])
        .unwrap();
    assert_eq!(history[1].content.as_deref(), Some("hello from sync"));
}
