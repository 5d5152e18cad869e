//! Traced agent runs on a scripted engine
//!
//! This example wraps a TinyAgent-style engine that replays a fixed script instead of
//! calling a model, runs it on several prompts at once and prints what each run's trace
//! recorded. The runs overlap, yet every trace only holds the spans of its own run.
//!
//! # Running the example
//!
//! ```bash
//! cargo run --example scripted_run
//! ```
//!
//! Set `AGENTWEAVE_TRACE_DIR` to also append every span to `spans.jsonl` in that
//! directory, and `AGENTWEAVE_CONSOLE=false` to silence the span panels.

use agentweave::engine::native::{tinyagent, CompletionUsage, FunctionRef, RoleMessage};
use agentweave::logging::init_logging;
use agentweave::prelude::*;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const MODEL: &str = "mistral/mistral-small-latest";

fn event(event: tinyagent::Event) -> NativeEvent {
    NativeEvent::TinyAgent(event)
}

fn request(prompt: &str) -> NativeEvent {
    event(EngineEvent::ModelRequest(tinyagent::CompletionRequest {
        model: Some(MODEL.to_string()),
        messages: vec![
            RoleMessage::new("system", "Answer with the capital city only."),
            RoleMessage::new("user", prompt),
        ],
    }))
}

fn response(message: tinyagent::ResponseMessage, prompt_tokens: u64, completion_tokens: u64) -> NativeEvent {
    event(EngineEvent::ModelResponse(tinyagent::ModelResponse {
        choices: vec![tinyagent::Choice { message: Some(message) }],
        usage: Some(CompletionUsage {
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
        }),
    }))
}

/// Ask for the capital through a lookup tool, then answer
fn capital_script(prompt: &str) -> Script {
    let (country, capital) = [("France", "Paris"), ("Spain", "Madrid"), ("Japan", "Tokyo")]
        .into_iter()
        .find(|(country, _)| prompt.contains(country))
        .unwrap_or(("Atlantis", "unknown"));

    let call_tool = tinyagent::ResponseMessage {
        content: None,
        tool_calls: vec![tinyagent::ToolCallEntry {
            function: Some(FunctionRef {
                name: Some("lookup_capital".to_string()),
                arguments: json!({ "country": country }),
            }),
        }],
    };
    let answer = tinyagent::ResponseMessage {
        content: Some(capital.to_string()),
        tool_calls: Vec::new(),
    };

    Script::new(capital)
        .model(request(prompt), response(call_tool, 42, 12))
        .tool(
            event(EngineEvent::ToolCall(tinyagent::ToolRequest {
                name: Some("lookup_capital".to_string()),
                arguments: json!({ "country": country }),
            })),
            event(EngineEvent::ToolResult(tinyagent::ToolResult { output: json!(capital) })),
        )
        .model(request(prompt), response(answer, 61, 3))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let engine = ScriptedEngine::new(capital_script).with_step_delay(Duration::from_millis(50));
    let native = NativeAgent::new(EngineKind::TinyAgent, Arc::new(engine));
    let config = AgentConfig::new(MODEL)
        .with_name("geographer")
        .with_description("Answers questions about capital cities");
    let agent = InstrumentedAgent::new(config, native, TracingConfig::from_env()?)?;

    let prompts = [
        "What is the capital of France?",
        "What is the capital of Spain?",
        "What is the capital of Japan?",
    ];
    let results = join_all(prompts.iter().map(|prompt| agent.run(prompt))).await;

    println!("{}", "=".repeat(80));
    println!("Trace Summary");
    println!("{}", "=".repeat(80));

    for (prompt, result) in prompts.iter().zip(&results) {
        match result {
            Ok(trace) => {
                let tokens = trace.tokens();
                println!();
                println!("{}", prompt);
                println!("  run:      {}", trace.run_id().unwrap_or("?"));
                println!("  answer:   {}", trace.final_output.as_deref().unwrap_or(""));
                println!("  spans:    {}", trace.len());
                println!("  tokens:   {} in / {} out", tokens.input_tokens, tokens.output_tokens);
                println!("  cost:     ${:.8}", trace.cost().total());
                if let Some(duration) = trace.duration() {
                    println!("  duration: {:?}", duration);
                }
            }
            Err(e) => eprintln!("{}: {}", prompt, e),
        }
    }

    if let Some(Ok(trace)) = results.first() {
        println!();
        println!("{}", "-".repeat(80));
        println!("{}", agent.evidence(trace));
    }

    agent.exit();
    Ok(())
}
