//! Trace of a single agent run

use super::attributes::gen_ai;
use super::messages::{ChatRecord, ConversationMessage, MessageRole};
use super::span::AgentSpan;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Token usage summed over the LLM calls of a trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenInfo {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Dollar cost summed over the LLM calls of a trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostInfo {
    pub input_cost: f64,
    pub output_cost: f64,
}

impl CostInfo {
    pub fn total(&self) -> f64 {
        self.input_cost + self.output_cost
    }
}

/// Finished spans of one run, in completion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentTrace {
    pub spans: Vec<AgentSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_output: Option<String>,
}

impl AgentTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Identifier of the run the spans belong to
    pub fn run_id(&self) -> Option<&str> {
        self.spans.iter().find_map(AgentSpan::run_id)
    }

    /// Wall-clock time from the earliest span start to the latest span end
    pub fn duration(&self) -> Option<Duration> {
        let start = self.spans.iter().map(|s| s.start_time).min()?;
        let end = self.spans.iter().map(|s| s.end_time).max()?;
        Some(Duration::from_nanos(end.saturating_sub(start)))
    }

    pub fn llm_calls(&self) -> impl Iterator<Item = &AgentSpan> {
        self.spans.iter().filter(|s| s.is_llm_call())
    }

    pub fn tool_executions(&self) -> impl Iterator<Item = &AgentSpan> {
        self.spans.iter().filter(|s| s.is_tool_execution())
    }

    pub fn tokens(&self) -> TokenInfo {
        self.llm_calls().fold(TokenInfo::default(), |acc, span| {
            let count = |key| span.attribute(key).and_then(|v| v.as_u64()).unwrap_or(0);
            TokenInfo {
                input_tokens: acc.input_tokens + count(gen_ai::USAGE_INPUT_TOKENS),
                output_tokens: acc.output_tokens + count(gen_ai::USAGE_OUTPUT_TOKENS),
            }
        })
    }

    pub fn cost(&self) -> CostInfo {
        self.llm_calls().fold(CostInfo::default(), |acc, span| {
            let cost = |key| span.attribute(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
            CostInfo {
                input_cost: acc.input_cost + cost(gen_ai::USAGE_INPUT_COST),
                output_cost: acc.output_cost + cost(gen_ai::USAGE_OUTPUT_COST),
            }
        })
    }

    /// Flatten the trace into the conversation the agent had
    ///
    /// The input messages of the first LLM call come first, followed by one assistant
    /// message per LLM output and one tool message per tool output, in trace order.
    pub fn spans_to_messages(&self) -> Vec<ConversationMessage> {
        let mut messages = Vec::new();

        if let Some(first) = self.llm_calls().next() {
            if let Some(raw) = first.str_attribute(gen_ai::INPUT_MESSAGES) {
                match serde_json::from_str::<Vec<ChatRecord>>(raw) {
                    Ok(records) => messages.extend(records.into_iter().map(|record| {
                        let role = MessageRole::from_native(&record.role).unwrap_or(MessageRole::User);
                        ConversationMessage::new(role, record.content)
                    })),
                    Err(e) => debug!("Skipping undecodable input messages: {}", e),
                }
            }
        }

        for span in &self.spans {
            let Some(output) = span.str_attribute(gen_ai::OUTPUT) else {
                continue;
            };
            if span.is_llm_call() {
                messages.push(ConversationMessage::assistant(output));
            } else if span.is_tool_execution() {
                messages.push(ConversationMessage::tool(output));
            }
        }

        messages
    }
}
