use super::common::{set_llm_output, set_tool_output, start_llm_span, start_tool_span, LlmOutput, ToolCallRecord, Usage};
use super::{SpanGeneration, UNKNOWN_MODEL, UNKNOWN_TOOL};
use crate::engine::native::tinyagent::{CompletionRequest, Event, ModelResponse, ToolRequest, ToolResult};
use crate::engine::{EngineKind, NativeEvent};
use crate::tracer::{ActiveSpan, ChatRecord, RunContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct TinyAgentSpans;

impl SpanGeneration for TinyAgentSpans {
    type Request = CompletionRequest;
    type Response = ModelResponse;
    type ToolCall = ToolRequest;
    type ToolResult = ToolResult;

    const ENGINE: EngineKind = EngineKind::TinyAgent;

    fn event(native: &NativeEvent) -> Option<&Event> {
        match native {
            NativeEvent::TinyAgent(event) => Some(event),
            _ => None,
        }
    }

    fn llm_input(&self, run: &RunContext, request: &CompletionRequest) -> Option<ActiveSpan> {
        let messages: Vec<ChatRecord> = request
            .messages
            .iter()
            .map(|m| ChatRecord::from_native(&m.role, m.content.clone().unwrap_or_default()))
            .collect();
        let model = request
            .model
            .as_deref()
            .or(run.model_id())
            .unwrap_or(UNKNOWN_MODEL)
            .to_string();
        Some(start_llm_span(run, &model, &messages))
    }

    fn llm_output(&self, span: &mut ActiveSpan, response: &ModelResponse) {
        let Some(message) = response.choices.first().and_then(|c| c.message.as_ref()) else {
            return;
        };

        let calls: Vec<ToolCallRecord> = message
            .tool_calls
            .iter()
            .filter_map(|call| call.function.as_ref())
            .map(|function| {
                ToolCallRecord::new(
                    function.name.as_deref().unwrap_or(UNKNOWN_TOOL),
                    function.arguments.clone(),
                )
            })
            .collect();
        let output = if calls.is_empty() {
            LlmOutput::Text(message.content.clone().unwrap_or_default())
        } else {
            LlmOutput::ToolCalls(calls)
        };

        let usage = response
            .usage
            .as_ref()
            .map(|u| Usage::or_zero(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();
        set_llm_output(span, output, Some(usage));
    }

    fn tool_input(&self, run: &RunContext, call: &ToolRequest) -> Option<ActiveSpan> {
        Some(start_tool_span(
            run,
            call.name.as_deref().unwrap_or(UNKNOWN_TOOL),
            None,
            Some(&call.arguments),
            None,
        ))
    }

    fn tool_output(&self, span: &mut ActiveSpan, result: &ToolResult) {
        set_tool_output(span, &result.output);
    }
}
