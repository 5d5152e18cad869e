use super::common::{
    content_text, set_llm_output, set_tool_output, start_llm_span, start_tool_span, LlmOutput, ToolCallRecord, Usage,
};
use super::{SpanGeneration, UNKNOWN_MODEL, UNKNOWN_TOOL};
use crate::engine::native::agno::{Event, FunctionCall, ModelRequest, ModelResponse};
use crate::engine::{EngineKind, NativeEvent};
use crate::tracer::{ActiveSpan, ChatRecord, RunContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct AgnoSpans;

impl SpanGeneration for AgnoSpans {
    type Request = ModelRequest;
    type Response = ModelResponse;
    type ToolCall = FunctionCall;
    type ToolResult = FunctionCall;

    const ENGINE: EngineKind = EngineKind::Agno;

    fn event(native: &NativeEvent) -> Option<&Event> {
        match native {
            NativeEvent::Agno(event) => Some(event),
            _ => None,
        }
    }

    fn llm_input(&self, run: &RunContext, request: &ModelRequest) -> Option<ActiveSpan> {
        let messages: Vec<ChatRecord> = request
            .messages
            .iter()
            .map(|m| ChatRecord::from_native(&m.role, content_text(&m.content).unwrap_or_default()))
            .collect();
        let model = run.model_id().unwrap_or(UNKNOWN_MODEL).to_string();
        Some(start_llm_span(run, &model, &messages))
    }

    fn llm_output(&self, span: &mut ActiveSpan, response: &ModelResponse) {
        let Some(message) = &response.assistant_message else {
            return;
        };

        let output = if !message.tool_calls.is_empty() {
            LlmOutput::ToolCalls(
                message
                    .tool_calls
                    .iter()
                    .map(|call| {
                        let name = call.function.name.as_deref().unwrap_or(UNKNOWN_TOOL);
                        ToolCallRecord::new(name, call.function.arguments.clone())
                    })
                    .collect(),
            )
        } else {
            LlmOutput::Text(message.content.clone().unwrap_or_default())
        };

        let usage = match &message.metrics {
            Some(metrics) => Usage::or_zero(metrics.input_tokens, metrics.output_tokens),
            None => Usage::default(),
        };
        set_llm_output(span, output, Some(usage));
    }

    fn tool_input(&self, run: &RunContext, call: &FunctionCall) -> Option<ActiveSpan> {
        let name = match call.function.name.as_str() {
            "" => UNKNOWN_TOOL,
            name => name,
        };
        Some(start_tool_span(
            run,
            name,
            call.function.description.as_deref(),
            call.arguments.as_ref(),
            call.call_id.as_deref(),
        ))
    }

    fn tool_output(&self, span: &mut ActiveSpan, result: &FunctionCall) {
        set_tool_output(span, &result.result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::native::agno::{AssistantMessage, Function, Message, MessageMetrics, ToolCallEntry};
    use crate::engine::native::FunctionRef;
    use crate::instrumentation::test_support::run;
    use crate::tracer::attributes::gen_ai;
    use serde_json::json;

    #[test]
    fn test_llm_input_uses_run_model() {
        let run = run(Some("gpt-4.1-nano"));
        let request = ModelRequest {
            messages: vec![
                Message { role: "system".to_string(), content: json!("Be brief.") },
                Message { role: "user".to_string(), content: json!("Capital of France?") },
            ],
        };

        let span = AgnoSpans.llm_input(&run, &request).unwrap();

        assert_eq!(span.name(), "call_llm gpt-4.1-nano");
        assert_eq!(
            span.attribute(gen_ai::INPUT_MESSAGES),
            Some(&json!(r#"[{"role":"system","content":"Be brief."},{"role":"user","content":"Capital of France?"}]"#))
        );
    }

    #[test]
    fn test_llm_input_without_model() {
        let span = AgnoSpans.llm_input(&run(None), &ModelRequest::default()).unwrap();
        assert_eq!(span.attribute(gen_ai::REQUEST_MODEL), Some(&json!("unknown")));
        assert_eq!(span.attribute(gen_ai::INPUT_MESSAGES), Some(&json!("[]")));
    }

    #[test]
    fn test_llm_output_tool_calls_with_metrics() {
        let run = run(None);
        let mut span = AgnoSpans.llm_input(&run, &ModelRequest::default()).unwrap();
        let response = ModelResponse {
            assistant_message: Some(AssistantMessage {
                content: Some("ignored".to_string()),
                tool_calls: vec![ToolCallEntry {
                    function: FunctionRef { name: None, arguments: json!("{\"q\":\"x\"}") },
                }],
                metrics: Some(MessageMetrics { input_tokens: Some(12), output_tokens: None }),
            }),
        };

        AgnoSpans.llm_output(&mut span, &response);

        assert_eq!(
            span.attribute(gen_ai::OUTPUT),
            Some(&json!(r#"[{"tool.name":"unknown","tool.args":"{\"q\":\"x\"}"}]"#))
        );
        assert_eq!(span.attribute(gen_ai::USAGE_INPUT_TOKENS), Some(&json!(12)));
        assert_eq!(span.attribute(gen_ai::USAGE_OUTPUT_TOKENS), Some(&json!(0)));
    }

    #[test]
    fn test_llm_output_without_assistant_message() {
        let run = run(None);
        let mut span = AgnoSpans.llm_input(&run, &ModelRequest::default()).unwrap();
        AgnoSpans.llm_output(&mut span, &ModelResponse::default());

        assert!(span.attribute(gen_ai::OUTPUT).is_none());
        assert!(span.attribute(gen_ai::USAGE_INPUT_TOKENS).is_none());
    }

    #[test]
    fn test_llm_output_text_without_metrics() {
        let run = run(None);
        let mut span = AgnoSpans.llm_input(&run, &ModelRequest::default()).unwrap();
        let response = ModelResponse {
            assistant_message: Some(AssistantMessage { content: Some("Paris".to_string()), ..Default::default() }),
        };

        AgnoSpans.llm_output(&mut span, &response);

        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("Paris")));
        assert_eq!(span.attribute(gen_ai::USAGE_INPUT_TOKENS), Some(&json!(0)));
    }

    #[test]
    fn test_tool_span() {
        let run = run(None);
        let call = FunctionCall {
            function: Function { name: "search".to_string(), description: Some("Web search".to_string()) },
            arguments: Some(json!({"q": "paris"})),
            call_id: Some("call_1".to_string()),
            result: json!("Paris is the capital"),
        };

        let mut span = AgnoSpans.tool_input(&run, &call).unwrap();
        AgnoSpans.tool_output(&mut span, &call);

        assert_eq!(span.name(), "execute_tool search");
        assert_eq!(span.attribute(gen_ai::TOOL_ARGS), Some(&json!("{\"q\":\"paris\"}")));
        assert_eq!(span.attribute(gen_ai::TOOL_CALL_ID), Some(&json!("call_1")));
        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("Paris is the capital")));
        assert_eq!(span.attribute(gen_ai::OUTPUT_TYPE), Some(&json!("text")));
    }
}
