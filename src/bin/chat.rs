//! Interactive chat session driving the agent loop

use anyhow::Result;
use futures::{pin_mut, StreamExt};
use uuid::Uuid;

use sourdough::cli::Console;
use sourdough::{Agent, AgentError, Config, LoopEvent, Message, Role};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    sourdough::logging::init_logging(config.verbose)?;

    let console = Console::new();
    let agent = Agent::from_config(&config)?;

    let session_id = Uuid::new_v4();
    tracing::info!(%session_id, model = %config.model, "Starting chat session");

    console.print_banner();
    let mut history: Vec<Message> = Vec::new();

    loop {
        let input = match console.read_input() {
            Ok(input) => input,
            Err(e) => {
                console.print_error(&format!("Failed to read input: {}", e));
                continue;
            }
        };

        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "bye") {
            console.print_system("Goodbye!");
            break;
        }

        console.println();
        history.push(Message::user(&input));

        match run_turn(&agent, &console, history.clone()).await {
            Ok(updated) => history = updated,
            Err(AgentError::RoundLimit { rounds, history: partial }) => {
                console.print_system(&format!(
                    "Stopped after {} rounds without a final answer.",
                    rounds
                ));
                history = partial;
            }
            Err(e) => {
                tracing::error!(error = %e, "Turn failed");
                console.print_error(&format!("Error processing message: {}", e));
                // drop the unanswered user message so the next turn starts clean
                history.pop();
            }
        }

        console.println();
        console.print_separator();
    }

    Ok(())
}

/// Drive one turn through the streaming loop, printing messages as they land
async fn run_turn(
    agent: &Agent,
    console: &Console,
    history: Vec<Message>,
) -> Result<Vec<Message>, AgentError> {
    let mut printed = history.len();
    let mut final_history = Vec::new();

    let stream = agent.respond_stream(history);
    pin_mut!(stream);

    while let Some(event) = stream.next().await {
        match event? {
            LoopEvent::ModelReply { messages, .. } | LoopEvent::ToolResults { messages, .. } => {
                for msg in &messages[printed..] {
                    print_message(console, msg);
                }
                printed = messages.len();
            }
            LoopEvent::Done { messages } => final_history = messages,
        }
    }

    Ok(final_history)
}

fn print_message(console: &Console, msg: &Message) {
    match msg.role {
        Role::Assistant => {
            if let Some(text) = msg.content.as_deref().filter(|t| !t.is_empty()) {
                console.print_assistant(text);
            }
            for call in &msg.tool_calls {
                console.print_tool_call(&call.name);
            }
        }
        Role::Tool => {
            if let Some(output) = &msg.content {
                console.print_tool_result(output, msg.is_error);
            }
        }
        Role::User => {}
    }
}
