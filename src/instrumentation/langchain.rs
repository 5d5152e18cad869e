use super::common::{
    content_text, set_llm_output, set_tool_output, start_llm_span, start_tool_span, LlmOutput, ToolCallRecord, Usage,
};
use super::{SpanGeneration, UNKNOWN_MODEL, UNKNOWN_TOOL};
use crate::engine::native::langchain::{ChatModelStart, Event, LlmResult, ToolEnd, ToolStart};
use crate::engine::{EngineKind, NativeEvent};
use crate::tracer::{ActiveSpan, ChatRecord, RunContext};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct LangchainSpans;

impl SpanGeneration for LangchainSpans {
    type Request = ChatModelStart;
    type Response = LlmResult;
    type ToolCall = ToolStart;
    type ToolResult = ToolEnd;

    const ENGINE: EngineKind = EngineKind::Langchain;

    fn event(native: &NativeEvent) -> Option<&Event> {
        match native {
            NativeEvent::Langchain(event) => Some(event),
            _ => None,
        }
    }

    /// LangChain batches prompts; only the first batch is recorded
    fn llm_input(&self, run: &RunContext, request: &ChatModelStart) -> Option<ActiveSpan> {
        let batch = request.messages.first().filter(|b| !b.is_empty())?;
        let messages: Vec<ChatRecord> = batch
            .iter()
            .map(|m| ChatRecord::from_native(&m.message_type, content_text(&m.content).unwrap_or_default()))
            .collect();

        let model = request
            .invocation_params
            .model
            .as_deref()
            .or(run.model_id())
            .unwrap_or(UNKNOWN_MODEL)
            .to_string();
        Some(start_llm_span(run, &model, &messages))
    }

    fn llm_output(&self, span: &mut ActiveSpan, response: &LlmResult) {
        let Some(generation) = response.generations.first().and_then(|g| g.first()) else {
            return;
        };

        let tool_calls = generation.message.as_ref().map(|m| m.tool_calls.as_slice()).unwrap_or_default();
        let output = if !generation.text.is_empty() {
            LlmOutput::Text(generation.text.clone())
        } else if !tool_calls.is_empty() {
            LlmOutput::ToolCalls(
                tool_calls
                    .iter()
                    .map(|call| {
                        ToolCallRecord::new(
                            call.name.as_deref().unwrap_or(UNKNOWN_TOOL),
                            call.args.clone().unwrap_or_else(|| Value::Object(Default::default())),
                        )
                    })
                    .collect(),
            )
        } else {
            LlmOutput::default()
        };

        let usage = response
            .llm_output
            .as_ref()
            .and_then(|o| o.token_usage.as_ref())
            .map(|u| Usage::or_zero(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();
        set_llm_output(span, output, Some(usage));
    }

    fn tool_input(&self, run: &RunContext, call: &ToolStart) -> Option<ActiveSpan> {
        Some(start_tool_span(
            run,
            call.serialized.name.as_deref().unwrap_or(UNKNOWN_TOOL),
            call.serialized.description.as_deref(),
            call.inputs.as_ref(),
            None,
        ))
    }

    /// Empty tool output leaves the span without an output attribute
    fn tool_output(&self, span: &mut ActiveSpan, result: &ToolEnd) {
        match &result.output.content {
            Value::Null => {}
            Value::String(s) if s.is_empty() => {}
            content => set_tool_output(span, content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::native::langchain::{
        AiMessage, BaseMessage, Generation, InvocationParams, LlmOutput as NativeLlmOutput, SerializedTool, ToolCall,
        ToolMessage,
    };
    use crate::engine::native::CompletionUsage;
    use crate::instrumentation::test_support::run;
    use crate::tracer::attributes::gen_ai;
    use serde_json::json;

    fn message(message_type: &str, content: &str) -> BaseMessage {
        BaseMessage { message_type: message_type.to_string(), content: json!(content) }
    }

    #[test]
    fn test_llm_input_maps_roles() {
        let run = run(None);
        let request = ChatModelStart {
            invocation_params: InvocationParams { model: Some("gpt-4o-mini".to_string()) },
            messages: vec![vec![message("system", "Be brief."), message("human", "hi")]],
        };

        let span = LangchainSpans.llm_input(&run, &request).unwrap();

        assert_eq!(span.name(), "call_llm gpt-4o-mini");
        assert_eq!(
            span.attribute(gen_ai::INPUT_MESSAGES),
            Some(&json!(r#"[{"role":"system","content":"Be brief."},{"role":"user","content":"hi"}]"#))
        );
    }

    #[test]
    fn test_llm_input_without_messages() {
        let run = run(None);
        assert!(LangchainSpans.llm_input(&run, &ChatModelStart::default()).is_none());

        let empty_batch = ChatModelStart { messages: vec![vec![]], ..Default::default() };
        assert!(LangchainSpans.llm_input(&run, &empty_batch).is_none());
        assert!(run.claim_first_llm_call());
    }

    #[test]
    fn test_llm_output_empty_generations() {
        let run = run(None);
        let mut span = run.start_span("call_llm", crate::tracer::SpanKind::Client);
        LangchainSpans.llm_output(&mut span, &LlmResult::default());

        assert!(span.attribute(gen_ai::OUTPUT).is_none());
        assert!(span.attribute(gen_ai::USAGE_INPUT_TOKENS).is_none());
    }

    #[test]
    fn test_llm_output_tool_calls() {
        let run = run(None);
        let mut span = run.start_span("call_llm", crate::tracer::SpanKind::Client);
        let response = LlmResult {
            generations: vec![vec![Generation {
                text: String::new(),
                message: Some(AiMessage {
                    tool_calls: vec![ToolCall { name: Some("search".to_string()), args: Some(json!({"q": "x"})) }],
                }),
            }]],
            llm_output: Some(NativeLlmOutput {
                token_usage: Some(CompletionUsage { prompt_tokens: Some(9), completion_tokens: Some(3) }),
            }),
        };

        LangchainSpans.llm_output(&mut span, &response);

        assert_eq!(
            span.attribute(gen_ai::OUTPUT),
            Some(&json!(r#"[{"tool.name":"search","tool.args":{"q":"x"}}]"#))
        );
        assert_eq!(span.attribute(gen_ai::USAGE_INPUT_TOKENS), Some(&json!(9)));
        assert_eq!(span.attribute(gen_ai::USAGE_OUTPUT_TOKENS), Some(&json!(3)));
    }

    #[test]
    fn test_llm_output_text_without_usage() {
        let run = run(None);
        let mut span = run.start_span("call_llm", crate::tracer::SpanKind::Client);
        let response = LlmResult {
            generations: vec![vec![Generation { text: "Madrid".to_string(), message: None }]],
            llm_output: None,
        };

        LangchainSpans.llm_output(&mut span, &response);

        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("Madrid")));
        assert_eq!(span.attribute(gen_ai::USAGE_OUTPUT_TOKENS), Some(&json!(0)));
    }

    #[test]
    fn test_tool_output_skips_empty_content() {
        let run = run(None);
        let start = ToolStart {
            serialized: SerializedTool { name: Some("search".to_string()), description: None },
            inputs: Some(json!({"q": "x"})),
        };

        let mut span = LangchainSpans.tool_input(&run, &start).unwrap();
        LangchainSpans.tool_output(&mut span, &ToolEnd { output: ToolMessage { content: json!("") } });
        assert!(span.attribute(gen_ai::OUTPUT).is_none());

        LangchainSpans.tool_output(&mut span, &ToolEnd { output: ToolMessage { content: json!("found it") } });
        assert_eq!(span.attribute(gen_ai::OUTPUT), Some(&json!("found it")));
    }

    #[test]
    fn test_tool_input_without_name() {
        let span = LangchainSpans.tool_input(&run(None), &ToolStart::default()).unwrap();
        assert_eq!(span.name(), "execute_tool unknown");
        assert!(span.attribute(gen_ai::TOOL_ARGS).is_none());
    }
}
