use super::common::{set_llm_output, set_tool_output, start_llm_span, start_tool_span, LlmOutput, ToolCallRecord, Usage};
use super::{SpanGeneration, UNKNOWN_MODEL, UNKNOWN_TOOL};
use crate::engine::native::llama_index::{AgentOutput, Event, ModelRequest, ToolCall, ToolOutput};
use crate::engine::{EngineKind, NativeEvent};
use crate::tracer::{ActiveSpan, ChatRecord, RunContext};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct LlamaIndexSpans;

impl SpanGeneration for LlamaIndexSpans {
    type Request = ModelRequest;
    type Response = AgentOutput;
    type ToolCall = ToolCall;
    type ToolResult = ToolOutput;

    const ENGINE: EngineKind = EngineKind::LlamaIndex;

    fn event(native: &NativeEvent) -> Option<&Event> {
        match native {
            NativeEvent::LlamaIndex(event) => Some(event),
            _ => None,
        }
    }

    fn llm_input(&self, run: &RunContext, request: &ModelRequest) -> Option<ActiveSpan> {
        if request.messages.is_empty() {
            return None;
        }
        let messages: Vec<ChatRecord> = request
            .messages
            .iter()
            .map(|m| ChatRecord::from_native(&m.role, m.content.as_deref().unwrap_or("No content")))
            .collect();
        let model = run.model_id().unwrap_or(UNKNOWN_MODEL).to_string();
        Some(start_llm_span(run, &model, &messages))
    }

    /// Missing usage in the raw response counts as zero tokens
    fn llm_output(&self, span: &mut ActiveSpan, response: &AgentOutput) {
        let output = if response.tool_calls.is_empty() {
            LlmOutput::Text(
                response
                    .response
                    .as_ref()
                    .and_then(|r| r.content.clone())
                    .unwrap_or_default(),
            )
        } else {
            LlmOutput::ToolCalls(
                response
                    .tool_calls
                    .iter()
                    .map(|call| {
                        ToolCallRecord::new(
                            call.tool_name.as_deref().unwrap_or(UNKNOWN_TOOL),
                            call.tool_kwargs.clone().unwrap_or_else(|| Value::Object(Default::default())),
                        )
                    })
                    .collect(),
            )
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
        let name = match call.metadata.name.as_str() {
            "" => UNKNOWN_TOOL,
            name => name,
        };
        Some(start_tool_span(
            run,
            name,
            call.metadata.description.as_deref(),
            Some(&call.kwargs),
            None,
        ))
    }

    /// MCP tools wrap their text in `raw_output.content[0].text`
    fn tool_output(&self, span: &mut ActiveSpan, result: &ToolOutput) {
        if result.raw_output.is_null() {
            set_tool_output(span, &result.content);
            return;
        }

        match result.raw_output.pointer("/content/0/text") {
            Some(Value::String(text)) => set_tool_output(span, text.as_str()),
            _ => set_tool_output(span, &result.raw_output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::native::llama_index::{RawResponse, ToolMetadata, ToolSelection};
    use crate::engine::native::{CompletionUsage, RoleMessage};
    use crate::instrumentation::test_support::run;
    use crate::tracer::attributes::gen_ai;
    use serde_json::json;

    #[test]
    fn test_llm_input_requires_messages() {
        let run = run(Some("gpt-4o"));
        assert!(LlamaIndexSpans.llm_input(&run, &ModelRequest::default()).is_none());

        let request = ModelRequest {
            messages: vec![
                RoleMessage::new("user", "hi"),
                RoleMessage { role: "assistant".to_string(), content: None },
            ],
        };
        let span = LlamaIndexSpans.llm_input(&run, &request).unwrap();
        assert_eq!(
            span.attribute(gen_ai::INPUT_MESSAGES),
            Some(&json!(r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"No content"}]"#))
        );
    }

    #[test]
    fn test_llm_output_without_usage_records_zero() {
        let run = run(None);
        let mut span = LlamaIndexSpans
            .llm_input(&run, &ModelRequest { messages: vec![RoleMessage::new("user", "hi")] })
            .unwrap();
        let response = AgentOutput {
            response: Some(RoleMessage::new("assistant", "Hello")),
            ..Default::default()
        };

        LlamaIndexSpans.llm_output(&mut span, &response);

        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("Hello")));
        assert_eq!(span.attribute(gen_ai::USAGE_INPUT_TOKENS), Some(&json!(0)));
        assert_eq!(span.attribute(gen_ai::USAGE_OUTPUT_TOKENS), Some(&json!(0)));
    }

    #[test]
    fn test_llm_output_tool_calls_override_text() {
        let run = run(None);
        let mut span = run.start_span("call_llm", crate::tracer::SpanKind::Client);
        let response = AgentOutput {
            response: Some(RoleMessage::new("assistant", "thinking")),
            tool_calls: vec![ToolSelection { tool_name: Some("multiply".to_string()), tool_kwargs: None }],
            raw: Some(RawResponse {
                usage: Some(CompletionUsage { prompt_tokens: Some(30), completion_tokens: None }),
            }),
        };

        LlamaIndexSpans.llm_output(&mut span, &response);

        assert_eq!(
            span.attribute(gen_ai::OUTPUT),
            Some(&json!(r#"[{"tool.name":"multiply","tool.args":{}}]"#))
        );
        assert_eq!(span.attribute(gen_ai::USAGE_INPUT_TOKENS), Some(&json!(30)));
        assert_eq!(span.attribute(gen_ai::USAGE_OUTPUT_TOKENS), Some(&json!(0)));
    }

    #[test]
    fn test_tool_output_prefers_mcp_text() {
        let run = run(None);
        let call = ToolCall {
            metadata: ToolMetadata { name: "read_file".to_string(), description: Some("Read a file".to_string()) },
            kwargs: json!({"path": "/tmp/a"}),
        };

        let mut span = LlamaIndexSpans.tool_input(&run, &call).unwrap();
        LlamaIndexSpans.tool_output(
            &mut span,
            &ToolOutput {
                content: json!("ignored"),
                raw_output: json!({"content": [{"type": "text", "text": "file body"}]}),
            },
        );

        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("file body")));
        assert_eq!(span.attribute(gen_ai::TOOL_DESCRIPTION), Some(&json!("Read a file")));
    }

    #[test]
    fn test_tool_output_fallbacks() {
        let run = run(None);
        let mut span = LlamaIndexSpans.tool_input(&run, &ToolCall::default()).unwrap();
        assert_eq!(span.name(), "execute_tool unknown");
        assert_eq!(span.attribute(gen_ai::TOOL_ARGS), Some(&json!("{}")));

        LlamaIndexSpans.tool_output(&mut span, &ToolOutput { content: json!("42"), raw_output: Value::Null });
        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("42")));
        assert_eq!(span.attribute(gen_ai::OUTPUT_TYPE), Some(&json!("json")));

        LlamaIndexSpans.tool_output(&mut span, &ToolOutput { content: Value::Null, raw_output: json!({"x": 1}) });
        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("{\"x\":1}")));
    }
}
