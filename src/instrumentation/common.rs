//! Span construction shared by every engine adapter

use crate::tracer::attributes::{gen_ai, operation, output_type};
use crate::tracer::{ActiveSpan, ChatRecord, RunContext, SpanKind, SpanStatus};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use tracing::debug;

/// Marker engines put in the output of a tool that failed
pub const TOOL_ERROR_MARKER: &str = "Error calling tool:";

/// A tool call requested by the model, as recorded in `gen_ai.output`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    #[serde(rename = "tool.name")]
    pub name: String,
    #[serde(rename = "tool.args")]
    pub args: Value,
}

impl ToolCallRecord {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// What an LLM call produced
#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutput {
    Text(String),
    ToolCalls(Vec<ToolCallRecord>),
}

impl Default for LlmOutput {
    fn default() -> Self {
        LlmOutput::Text(String::new())
    }
}

/// Token counts of one LLM call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Counts that may be missing individually default to zero
    pub fn or_zero(input_tokens: Option<u64>, output_tokens: Option<u64>) -> Self {
        Self::new(input_tokens.unwrap_or(0), output_tokens.unwrap_or(0))
    }
}

fn to_json_text(value: &impl Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        debug!("Falling back to empty JSON: {}", e);
        "[]".to_string()
    })
}

/// Open a `call_llm` span
///
/// Input messages are only recorded on the first LLM call of the run; later calls would
/// repeat the same history.
pub fn start_llm_span(run: &RunContext, model_id: &str, input_messages: &[ChatRecord]) -> ActiveSpan {
    let mut span = run.start_span(format!("{} {}", operation::CALL_LLM, model_id), SpanKind::Client);
    span.set_attributes([
        (gen_ai::OPERATION_NAME, operation::CALL_LLM),
        (gen_ai::REQUEST_MODEL, model_id),
    ]);

    if run.claim_first_llm_call() {
        span.set_attribute(gen_ai::INPUT_MESSAGES, to_json_text(&input_messages));
    }
    span
}

/// Record the output of an LLM call and, when known, its token usage
pub fn set_llm_output(span: &mut ActiveSpan, output: LlmOutput, usage: Option<Usage>) {
    match output {
        LlmOutput::Text(text) => {
            span.set_attribute(gen_ai::OUTPUT, text);
            span.set_attribute(gen_ai::OUTPUT_TYPE, output_type::TEXT);
        }
        LlmOutput::ToolCalls(calls) => {
            span.set_attribute(gen_ai::OUTPUT, to_json_text(&calls));
            span.set_attribute(gen_ai::OUTPUT_TYPE, output_type::JSON);
        }
    }

    if let Some(usage) = usage {
        span.set_attribute(gen_ai::USAGE_INPUT_TOKENS, usage.input_tokens);
        span.set_attribute(gen_ai::USAGE_OUTPUT_TOKENS, usage.output_tokens);
    }

    span.set_status(SpanStatus::ok());
}

/// Arguments of a tool call as recorded in `gen_ai.tool.args`
///
/// Strings are assumed to already hold JSON and are stored as they are.
fn tool_args_text(args: &Value) -> String {
    match args {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Open an `execute_tool` span
pub fn start_tool_span(
    run: &RunContext,
    name: &str,
    description: Option<&str>,
    args: Option<&Value>,
    call_id: Option<&str>,
) -> ActiveSpan {
    let mut span = run.start_span(format!("{} {}", operation::EXECUTE_TOOL, name), SpanKind::Internal);
    span.set_attributes([
        (gen_ai::OPERATION_NAME, operation::EXECUTE_TOOL),
        (gen_ai::TOOL_NAME, name),
    ]);

    if let Some(description) = description {
        span.set_attribute(gen_ai::TOOL_DESCRIPTION, description);
    }
    if let Some(args) = args {
        span.set_attribute(gen_ai::TOOL_ARGS, tool_args_text(args));
    }
    if let Some(call_id) = call_id {
        span.set_attribute(gen_ai::TOOL_CALL_ID, call_id);
    }
    span
}

/// Record the output of a tool
///
/// Output that is, or serializes to, valid JSON is stored as canonical JSON. Plain text is
/// stored as text, and marks the span as failed when it carries [`TOOL_ERROR_MARKER`].
/// A missing output is recorded as `{}`. Values that cannot be serialized at all fall back
/// to their `Debug` rendering.
pub fn set_tool_output<T: Serialize + Debug + ?Sized>(span: &mut ActiveSpan, output: &T) {
    let mut status = SpanStatus::ok();

    let (text, kind) = match serde_json::to_value(output) {
        Ok(Value::String(s)) => match serde_json::from_str::<Value>(&s) {
            Ok(parsed) => (parsed.to_string(), output_type::JSON),
            Err(_) => {
                if s.contains(TOOL_ERROR_MARKER) {
                    status = SpanStatus::error(s.clone());
                }
                (s, output_type::TEXT)
            }
        },
        Ok(Value::Null) => ("{}".to_string(), output_type::JSON),
        Ok(other) => (other.to_string(), output_type::JSON),
        Err(e) => {
            debug!("Tool output is not serializable: {}", e);
            (format!("{:?}", output), output_type::JSON)
        }
    };

    span.set_attribute(gen_ai::OUTPUT, text);
    span.set_attribute(gen_ai::OUTPUT_TYPE, kind);
    span.set_status(status);
}

/// Text of a message content that may be a string or structured
pub(crate) fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
