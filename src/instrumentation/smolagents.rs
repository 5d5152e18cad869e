use super::common::{set_llm_output, set_tool_output, start_llm_span, start_tool_span, LlmOutput, ToolCallRecord, Usage};
use super::{SpanGeneration, UNKNOWN_MODEL, UNKNOWN_TOOL};
use crate::engine::native::smolagents::{Event, ModelRequest, ModelResponse, ToolCall, ToolResult};
use crate::engine::{EngineKind, NativeEvent};
use crate::tracer::{ActiveSpan, ChatRecord, RunContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct SmolagentsSpans;

impl SpanGeneration for SmolagentsSpans {
    type Request = ModelRequest;
    type Response = ModelResponse;
    type ToolCall = ToolCall;
    type ToolResult = ToolResult;

    const ENGINE: EngineKind = EngineKind::Smolagents;

    fn event(native: &NativeEvent) -> Option<&Event> {
        match native {
            NativeEvent::Smolagents(event) => Some(event),
            _ => None,
        }
    }

    /// Messages without content parts are skipped
    fn llm_input(&self, run: &RunContext, request: &ModelRequest) -> Option<ActiveSpan> {
        let messages: Vec<ChatRecord> = request
            .messages
            .iter()
            .filter_map(|m| {
                let part = m.content.first()?;
                Some(ChatRecord::from_native(&m.role, part.text.clone().unwrap_or_default()))
            })
            .collect();
        let model = run.model_id().unwrap_or(UNKNOWN_MODEL).to_string();
        Some(start_llm_span(run, &model, &messages))
    }

    fn llm_output(&self, span: &mut ActiveSpan, response: &ModelResponse) {
        let output = match &response.content {
            Some(content) => LlmOutput::Text(content.clone()),
            None if !response.tool_calls.is_empty() => LlmOutput::ToolCalls(
                response
                    .tool_calls
                    .iter()
                    .map(|call| {
                        ToolCallRecord::new(
                            call.function.name.as_deref().unwrap_or(UNKNOWN_TOOL),
                            call.function.arguments.clone(),
                        )
                    })
                    .collect(),
            ),
            None => LlmOutput::default(),
        };

        let usage = response
            .raw
            .as_ref()
            .and_then(|raw| raw.usage.as_ref())
            .map(|u| Usage::or_zero(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();
        set_llm_output(span, output, Some(usage));
    }

    fn tool_input(&self, run: &RunContext, call: &ToolCall) -> Option<ActiveSpan> {
        let name = if call.name.is_empty() { UNKNOWN_TOOL } else { call.name.as_str() };
        Some(start_tool_span(
            run,
            name,
            call.description.as_deref(),
            Some(&call.arguments),
            None,
        ))
    }

    fn tool_output(&self, span: &mut ActiveSpan, result: &ToolResult) {
        set_tool_output(span, &result.output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::native::smolagents::{ChatMessage, ContentPart, RawResponse, ToolCallEntry};
    use crate::engine::native::{CompletionUsage, FunctionRef};
    use crate::instrumentation::test_support::run;
    use crate::tracer::attributes::gen_ai;
    use serde_json::json;

    fn text_part(text: &str) -> ContentPart {
        ContentPart { part_type: Some("text".to_string()), text: Some(text.to_string()) }
    }

    #[test]
    fn test_llm_input_skips_empty_messages() {
        let request = ModelRequest {
            messages: vec![
                ChatMessage { role: "system".to_string(), content: vec![text_part("You are helpful.")] },
                ChatMessage { role: "tool-call".to_string(), content: vec![] },
                ChatMessage { role: "user".to_string(), content: vec![text_part("hi"), text_part("ignored")] },
            ],
        };

        let span = SmolagentsSpans.llm_input(&run(Some("gpt-4o")), &request).unwrap();

        assert_eq!(
            span.attribute(gen_ai::INPUT_MESSAGES),
            Some(&json!(r#"[{"role":"system","content":"You are helpful."},{"role":"user","content":"hi"}]"#))
        );
    }

    #[test]
    fn test_llm_output_tool_calls() {
        let run = run(None);
        let mut span = run.start_span("call_llm", crate::tracer::SpanKind::Client);
        let response = ModelResponse {
            content: None,
            tool_calls: vec![ToolCallEntry {
                function: FunctionRef { name: Some("final_answer".to_string()), arguments: json!({"answer": "Paris"}) },
            }],
            raw: Some(RawResponse { usage: Some(CompletionUsage { prompt_tokens: Some(100), completion_tokens: Some(8) }) }),
        };

        SmolagentsSpans.llm_output(&mut span, &response);

        assert_eq!(
            span.attribute(gen_ai::OUTPUT),
            Some(&json!(r#"[{"tool.name":"final_answer","tool.args":{"answer":"Paris"}}]"#))
        );
        assert_eq!(span.attribute(gen_ai::USAGE_INPUT_TOKENS), Some(&json!(100)));
        assert_eq!(span.attribute(gen_ai::USAGE_OUTPUT_TOKENS), Some(&json!(8)));
    }

    #[test]
    fn test_llm_output_defaults() {
        let run = run(None);
        let mut span = run.start_span("call_llm", crate::tracer::SpanKind::Client);
        SmolagentsSpans.llm_output(&mut span, &ModelResponse::default());

        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("")));
        assert_eq!(span.attribute(gen_ai::USAGE_INPUT_TOKENS), Some(&json!(0)));
    }

    #[test]
    fn test_tool_span() {
        let run = run(None);
        let call = ToolCall { name: "web_search".to_string(), description: None, arguments: json!({"query": "x"}) };

        let mut span = SmolagentsSpans.tool_input(&run, &call).unwrap();
        SmolagentsSpans.tool_output(&mut span, &ToolResult { output: json!(["a", "b"]) });

        assert_eq!(span.attribute(gen_ai::TOOL_ARGS), Some(&json!("{\"query\":\"x\"}")));
        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("[\"a\",\"b\"]")));
        assert_eq!(span.attribute(gen_ai::OUTPUT_TYPE), Some(&json!("json")));
    }
}
