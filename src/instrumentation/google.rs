use super::common::{set_llm_output, set_tool_output, start_llm_span, start_tool_span, LlmOutput, ToolCallRecord, Usage};
use super::{SpanGeneration, UNKNOWN_MODEL, UNKNOWN_TOOL};
use crate::engine::native::google::{Event, LlmRequest, LlmResponse, ToolCall, ToolResponse};
use crate::engine::{EngineKind, NativeEvent};
use crate::tracer::{ActiveSpan, ChatRecord, RunContext};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleSpans;

impl SpanGeneration for GoogleSpans {
    type Request = LlmRequest;
    type Response = LlmResponse;
    type ToolCall = ToolCall;
    type ToolResult = ToolResponse;

    const ENGINE: EngineKind = EngineKind::Google;

    fn event(native: &NativeEvent) -> Option<&Event> {
        match native {
            NativeEvent::Google(event) => Some(event),
            _ => None,
        }
    }

    /// Only the system instruction and the first part of the first content are recorded
    fn llm_input(&self, run: &RunContext, request: &LlmRequest) -> Option<ActiveSpan> {
        let mut messages = Vec::new();
        if let Some(config) = &request.config {
            messages.push(ChatRecord::system(
                config.system_instruction.as_deref().unwrap_or("No instructions"),
            ));
        }
        if let Some(content) = request.contents.first() {
            if let Some(part) = content.parts.first() {
                let role = content.role.as_deref().unwrap_or("user");
                let text = part.text.as_deref().unwrap_or("No content");
                messages.push(ChatRecord::from_native(role, text));
            }
        }

        let model = request
            .model
            .as_deref()
            .or(run.model_id())
            .unwrap_or(UNKNOWN_MODEL)
            .to_string();
        Some(start_llm_span(run, &model, &messages))
    }

    fn llm_output(&self, span: &mut ActiveSpan, response: &LlmResponse) {
        let parts = response.content.as_ref().map(|c| c.parts.as_slice()).unwrap_or_default();

        let output = match parts.first() {
            None => LlmOutput::default(),
            Some(first) => match first.text.as_deref().filter(|t| !t.is_empty()) {
                Some(text) => LlmOutput::Text(text.to_string()),
                None => LlmOutput::ToolCalls(
                    parts
                        .iter()
                        .filter_map(|p| p.function_call.as_ref())
                        .map(|call| {
                            let args = call
                                .args
                                .as_ref()
                                .map(Value::to_string)
                                .unwrap_or_else(|| "{}".to_string());
                            ToolCallRecord::new(call.name.as_deref().unwrap_or(UNKNOWN_TOOL), Value::String(args))
                        })
                        .collect(),
                ),
            },
        };

        let usage = response
            .usage_metadata
            .as_ref()
            .map(|u| Usage::or_zero(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();
        set_llm_output(span, output, Some(usage));
    }

    fn tool_input(&self, run: &RunContext, call: &ToolCall) -> Option<ActiveSpan> {
        let name = match call.name.as_str() {
            "" => UNKNOWN_TOOL,
            name => name,
        };
        Some(start_tool_span(
            run,
            name,
            call.description.as_deref(),
            Some(&call.args),
            call.function_call_id.as_deref(),
        ))
    }

    fn tool_output(&self, span: &mut ActiveSpan, result: &ToolResponse) {
        set_tool_output(span, &result.tool_response);
    }
}
