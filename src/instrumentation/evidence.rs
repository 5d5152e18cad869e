//! Trace summaries for evaluation
//!
//! Evaluators read an agent's behavior from a compact markdown rendering of its trace:
//! one JSON block per span, with long strings cut short.

use super::Instrumentor;
use crate::tracer::attributes::{gen_ai, output_type};
use crate::tracer::{AgentSpan, AgentTrace};
use serde_json::{Map, Value};
use tracing::debug;

/// Strings longer than this many characters are truncated in evidence
pub const MAX_EVIDENCE_LENGTH: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Agent,
    Llm,
    Tool,
    Unknown,
}

/// Salient fields of one span, keyed by name
pub type Interaction = Map<String, Value>;

/// Parse `raw` as JSON, keeping it as a string when it is not
fn json_or_text(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn copy(span: &AgentSpan, key: &str, name: &str, into: &mut Interaction) {
    if let Some(value) = span.attribute(key) {
        into.insert(name.to_string(), value.clone());
    }
}

fn output_value(span: &AgentSpan) -> Option<Value> {
    let output = span.str_attribute(gen_ai::OUTPUT)?;
    Some(if span.str_attribute(gen_ai::OUTPUT_TYPE) == Some(output_type::JSON) {
        json_or_text(output)
    } else {
        Value::String(output.to_string())
    })
}

/// Classify `span` and pull out the fields an evaluator cares about
pub fn extract_interaction(span: &AgentSpan) -> (InteractionKind, Interaction) {
    let mut interaction = Interaction::new();

    if span.is_llm_call() {
        copy(span, gen_ai::REQUEST_MODEL, "model", &mut interaction);
        if let Some(messages) = span.str_attribute(gen_ai::INPUT_MESSAGES) {
            interaction.insert("input".to_string(), json_or_text(messages));
        }
        if let Some(output) = output_value(span) {
            interaction.insert("output".to_string(), output);
        }
        copy(span, gen_ai::USAGE_INPUT_TOKENS, "input_tokens", &mut interaction);
        copy(span, gen_ai::USAGE_OUTPUT_TOKENS, "output_tokens", &mut interaction);
        return (InteractionKind::Llm, interaction);
    }

    if span.is_tool_execution() {
        copy(span, gen_ai::TOOL_NAME, "tool_name", &mut interaction);
        if let Some(args) = span.str_attribute(gen_ai::TOOL_ARGS) {
            interaction.insert("input".to_string(), json_or_text(args));
        }
        if let Some(output) = output_value(span) {
            interaction.insert("output".to_string(), output);
        }
        if span.status.is_error() {
            interaction.insert("status".to_string(), Value::from("error"));
        }
        return (InteractionKind::Tool, interaction);
    }

    if span.is_agent_invocation() {
        interaction.insert("type".to_string(), Value::from("agent"));
        interaction.insert("workflow".to_string(), Value::from(span.name.clone()));
        interaction.insert("start_time".to_string(), Value::from(span.start_time));
        interaction.insert("end_time".to_string(), Value::from(span.end_time));
        copy(span, gen_ai::AGENT_NAME, "agent_name", &mut interaction);
        if let Some(service) = span.resource.attributes.get("service.name") {
            interaction.insert("service".to_string(), service.clone());
        }
        return (InteractionKind::Agent, interaction);
    }

    debug!("Unknown span kind for '{}'", span.name);
    (InteractionKind::Unknown, interaction)
}

fn truncate(value: Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > MAX_EVIDENCE_LENGTH => {
            let mut cut: String = s.chars().take(MAX_EVIDENCE_LENGTH).collect();
            cut.push_str("...");
            Value::String(cut)
        }
        other => other,
    }
}

/// Render `trace` as markdown evidence
///
/// # Arguments
///
/// * `trace` - The trace to summarize
/// * `instrumentor` - Instrumentor of the engine that produced the trace
pub fn format_evidence(trace: &AgentTrace, instrumentor: &Instrumentor) -> String {
    let mut evidence = format!(
        "## {} Agent Execution\n\n",
        instrumentor.engine().as_str().to_uppercase()
    );

    for (idx, span) in trace.spans.iter().enumerate() {
        let (_, interaction) = instrumentor.extract_interaction(span);
        let call: Interaction = interaction
            .into_iter()
            .map(|(k, v)| (k, truncate(v)))
            .collect();

        evidence.push_str(&format!("### Call {}\n", idx + 1));
        let body = serde_json::to_string_pretty(&Value::Object(call)).unwrap_or_else(|_| "{}".to_string());
        evidence.push_str(&body);
        evidence.push_str("\n\n");
    }

    evidence
}
