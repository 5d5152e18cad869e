use super::context::Context;
use super::Callback;
use crate::tracer::attributes::{gen_ai, operation, output_type};
use crate::tracer::ActiveSpan;
use serde_json::{Map, Value};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Prints LLM calls and tool executions as they complete
pub struct ConsolePrintSpan {
    out: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for ConsolePrintSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsolePrintSpan").finish_non_exhaustive()
    }
}

impl Default for ConsolePrintSpan {
    fn default() -> Self {
        Self::new(Box::new(io::stdout()))
    }
}

impl ConsolePrintSpan {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out: Mutex::new(out) }
    }

    fn print(&self, panel: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(panel.as_bytes()).and_then(|_| out.flush()) {
            warn!("Failed to print span: {}", e);
        }
    }
}

fn str_attr<'s>(span: &'s ActiveSpan, key: &str) -> Option<&'s str> {
    span.attribute(key).and_then(Value::as_str)
}

/// Pretty-print `raw` when it holds JSON, otherwise return it unchanged
fn pretty(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| raw.to_string())
}

fn section(panel: &mut String, title: &str, body: &str) {
    panel.push_str(&format!("│ {}\n", title));
    for line in body.lines() {
        panel.push_str(&format!("│   {}\n", line));
    }
}

fn output_section(panel: &mut String, span: &ActiveSpan) {
    if let Some(output) = str_attr(span, gen_ai::OUTPUT).filter(|o| !o.is_empty()) {
        let body = if str_attr(span, gen_ai::OUTPUT_TYPE) == Some(output_type::JSON) {
            pretty(output)
        } else {
            output.to_string()
        };
        section(panel, "OUTPUT", &body);
    }
}

fn framed(title: &str, body: String) -> String {
    format!("╭─ {}\n{}╰─\n", title, body)
}

/// Panel for a `call_llm` span: input messages, output and usage
pub fn llm_panel(span: &ActiveSpan) -> Option<String> {
    if str_attr(span, gen_ai::OPERATION_NAME) != Some(operation::CALL_LLM) {
        return None;
    }

    let mut body = String::new();
    if let Some(messages) = str_attr(span, gen_ai::INPUT_MESSAGES) {
        section(&mut body, "INPUT", &pretty(messages));
    }
    output_section(&mut body, span);

    let usage: Map<String, Value> = span
        .attributes()
        .iter()
        .filter_map(|(k, v)| k.strip_prefix("gen_ai.usage.").map(|short| (short.to_string(), v.clone())))
        .collect();
    if !usage.is_empty() {
        section(&mut body, "USAGE", &Value::Object(usage).to_string());
    }

    let model = str_attr(span, gen_ai::REQUEST_MODEL).unwrap_or("unknown");
    Some(framed(&format!("CALL_LLM: {}", model), body))
}

/// Panel for an `execute_tool` span: arguments and output
pub fn tool_panel(span: &ActiveSpan) -> Option<String> {
    if str_attr(span, gen_ai::OPERATION_NAME) != Some(operation::EXECUTE_TOOL) {
        return None;
    }

    let mut body = String::new();
    section(&mut body, "INPUT", &pretty(str_attr(span, gen_ai::TOOL_ARGS).unwrap_or("{}")));
    output_section(&mut body, span);

    let tool = str_attr(span, gen_ai::TOOL_NAME).unwrap_or("unknown");
    Some(framed(&format!("EXECUTE_TOOL: {}", tool), body))
}

impl Callback for ConsolePrintSpan {
    fn after_llm_call<'a>(&self, context: Context<'a>) -> Context<'a> {
        if let Some(panel) = llm_panel(&context.current_span) {
            self.print(&panel);
        }
        context
    }

    fn after_tool_execution<'a>(&self, context: Context<'a>) -> Context<'a> {
        if let Some(panel) = tool_panel(&context.current_span) {
            self.print(&panel);
        }
        context
    }
}
