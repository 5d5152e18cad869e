use super::common::{set_llm_output, set_tool_output, start_llm_span, start_tool_span, LlmOutput, ToolCallRecord, Usage};
use super::{SpanGeneration, UNKNOWN_MODEL, UNKNOWN_TOOL};
use crate::engine::native::openai::{Event, ModelRequest, ModelResponse, OutputItem, ToolCall, ToolResult};
use crate::engine::{EngineKind, NativeEvent};
use crate::tracer::{ActiveSpan, ChatRecord, RunContext};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiSpans;

impl SpanGeneration for OpenAiSpans {
    type Request = ModelRequest;
    type Response = ModelResponse;
    type ToolCall = ToolCall;
    type ToolResult = ToolResult;

    const ENGINE: EngineKind = EngineKind::OpenAi;

    fn event(native: &NativeEvent) -> Option<&Event> {
        match native {
            NativeEvent::OpenAi(event) => Some(event),
            _ => None,
        }
    }

    /// Records the system instructions and the first input item
    fn llm_input(&self, run: &RunContext, request: &ModelRequest) -> Option<ActiveSpan> {
        let first = match request.input.first() {
            Some(item) => ChatRecord::from_native(&item.role, item.content.clone().unwrap_or_default()),
            None => ChatRecord::user("No input"),
        };
        let messages = [
            ChatRecord::system(request.system_instructions.clone().unwrap_or_default()),
            first,
        ];

        let model = run.model_id().unwrap_or(UNKNOWN_MODEL).to_string();
        Some(start_llm_span(run, &model, &messages))
    }

    fn llm_output(&self, span: &mut ActiveSpan, response: &ModelResponse) {
        let Some(item) = response.output.first() else {
            return;
        };

        let output = match item {
            OutputItem::FunctionCall { name, arguments } => {
                let name = if name.is_empty() { UNKNOWN_TOOL } else { name.as_str() };
                LlmOutput::ToolCalls(vec![ToolCallRecord::new(name, Value::String(arguments.clone()))])
            }
            OutputItem::Message { content } => {
                LlmOutput::Text(content.first().map(|t| t.text.clone()).unwrap_or_default())
            }
            OutputItem::Other => LlmOutput::default(),
        };

        let usage = response
            .usage
            .as_ref()
            .map(|u| Usage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();
        set_llm_output(span, output, Some(usage));
    }

    fn tool_input(&self, run: &RunContext, call: &ToolCall) -> Option<ActiveSpan> {
        let name = if call.name.is_empty() { UNKNOWN_TOOL } else { call.name.as_str() };
        Some(start_tool_span(
            run,
            name,
            call.description.as_deref(),
            Some(&Value::String(call.arguments.clone())),
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
    use crate::engine::native::openai::{OutputText, Usage as NativeUsage};
    use crate::engine::native::RoleMessage;
    use crate::instrumentation::test_support::run;
    use crate::tracer::attributes::gen_ai;
    use serde_json::json;

    #[test]
    fn test_llm_input_without_input() {
        let span = OpenAiSpans.llm_input(&run(Some("gpt-4.1-mini")), &ModelRequest::default()).unwrap();
        assert_eq!(
            span.attribute(gen_ai::INPUT_MESSAGES),
            Some(&json!(r#"[{"role":"system","content":""},{"role":"user","content":"No input"}]"#))
        );
    }

    #[test]
    fn test_llm_input_first_item_only() {
        let request = ModelRequest {
            system_instructions: Some("Be brief.".to_string()),
            input: vec![RoleMessage::new("user", "Capital of France?"), RoleMessage::new("assistant", "Paris")],
        };

        let span = OpenAiSpans.llm_input(&run(Some("gpt-4.1-mini")), &request).unwrap();

        assert_eq!(span.name(), "call_llm gpt-4.1-mini");
        assert_eq!(
            span.attribute(gen_ai::INPUT_MESSAGES),
            Some(&json!(r#"[{"role":"system","content":"Be brief."},{"role":"user","content":"Capital of France?"}]"#))
        );
    }

    #[test]
    fn test_llm_output_function_call() {
        let run = run(None);
        let mut span = run.start_span("call_llm", crate::tracer::SpanKind::Client);
        let response = ModelResponse {
            output: vec![OutputItem::FunctionCall {
                name: "get_weather".to_string(),
                arguments: "{\"city\":\"Paris\"}".to_string(),
            }],
            usage: Some(NativeUsage { input_tokens: 11, output_tokens: 4 }),
        };

        OpenAiSpans.llm_output(&mut span, &response);

        assert_eq!(
            span.attribute(gen_ai::OUTPUT),
            Some(&json!(r#"[{"tool.name":"get_weather","tool.args":"{\"city\":\"Paris\"}"}]"#))
        );
        assert_eq!(span.attribute(gen_ai::USAGE_INPUT_TOKENS), Some(&json!(11)));
        assert_eq!(span.attribute(gen_ai::USAGE_OUTPUT_TOKENS), Some(&json!(4)));
    }

    #[test]
    fn test_llm_output_message_and_other() {
        let run = run(None);

        let mut span = run.start_span("call_llm", crate::tracer::SpanKind::Client);
        OpenAiSpans.llm_output(
            &mut span,
            &ModelResponse {
                output: vec![OutputItem::Message { content: vec![OutputText { text: "Paris".to_string() }] }],
                usage: None,
            },
        );
        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("Paris")));
        assert_eq!(span.attribute(gen_ai::USAGE_INPUT_TOKENS), Some(&json!(0)));

        let mut other = run.start_span("call_llm", crate::tracer::SpanKind::Client);
        OpenAiSpans.llm_output(&mut other, &ModelResponse { output: vec![OutputItem::Other], usage: None });
        assert_eq!(other.attribute(gen_ai::OUTPUT), Some(&json!("")));
    }

    #[test]
    fn test_llm_output_empty_leaves_span() {
        let run = run(None);
        let mut span = run.start_span("call_llm", crate::tracer::SpanKind::Client);
        OpenAiSpans.llm_output(&mut span, &ModelResponse::default());
        assert!(span.attribute(gen_ai::OUTPUT).is_none());
    }

    #[test]
    fn test_tool_span() {
        let run = run(None);
        let call = ToolCall {
            name: "get_weather".to_string(),
            description: Some("Current weather".to_string()),
            arguments: "{\"city\":\"Paris\"}".to_string(),
        };

        let mut span = OpenAiSpans.tool_input(&run, &call).unwrap();
        OpenAiSpans.tool_output(&mut span, &ToolResult { output: json!("sunny, 24C") });

        assert_eq!(span.attribute(gen_ai::TOOL_ARGS), Some(&json!("{\"city\":\"Paris\"}")));
        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("sunny, 24C")));
        assert_eq!(span.attribute(gen_ai::OUTPUT_TYPE), Some(&json!("text")));
    }
}
