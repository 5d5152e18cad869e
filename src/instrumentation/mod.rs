//! Engine instrumentation
//!
//! An [`Instrumentor`] installs wrappers into the four hook slots of a [`NativeAgent`].
//! Each wrapper turns the engine's native event into a span, runs the callback pipeline
//! over it and then forwards the event to whatever hook the slot held before. Uninstalling
//! puts the prior hooks back exactly as they were.
//!
//! Span construction differs per engine and lives in one adapter per engine, each
//! implementing [`SpanGeneration`] over that engine's payload types.

pub mod agno;
pub mod common;
pub mod evidence;
pub mod google;
pub mod langchain;
pub mod llama_index;
pub mod openai;
pub mod smolagents;
pub mod tinyagent;

pub use common::{set_tool_output, LlmOutput, ToolCallRecord, Usage};
pub use evidence::{format_evidence, Interaction, InteractionKind, MAX_EVIDENCE_LENGTH};

use crate::callbacks::{CallbackPipeline, Context};
use crate::engine::{EngineEvent, EngineKind, HookPoint, Invocation, NativeAgent, NativeEvent, NativeHook};
use crate::tracer::{ActiveSpan, AgentSpan, RunContext};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Model name used when neither the payload nor the run knows it
pub const UNKNOWN_MODEL: &str = "unknown";

/// Tool name used when the payload does not carry one
pub const UNKNOWN_TOOL: &str = "unknown";

/// Builds spans from one engine's native payloads
///
/// Implementations never panic on missing fields. When a payload carries nothing worth
/// recording, the `*_input` methods return `None` and the `*_output` methods leave the span
/// untouched.
pub trait SpanGeneration: Send + Sync + 'static {
    type Request: 'static;
    type Response: 'static;
    type ToolCall: 'static;
    type ToolResult: 'static;

    const ENGINE: EngineKind;

    /// This engine's event inside `native`, if it is one
    fn event(
        native: &NativeEvent,
    ) -> Option<&EngineEvent<Self::Request, Self::Response, Self::ToolCall, Self::ToolResult>>;

    fn llm_input(&self, run: &RunContext, request: &Self::Request) -> Option<ActiveSpan>;

    fn llm_output(&self, span: &mut ActiveSpan, response: &Self::Response);

    fn tool_input(&self, run: &RunContext, call: &Self::ToolCall) -> Option<ActiveSpan>;

    fn tool_output(&self, span: &mut ActiveSpan, result: &Self::ToolResult);

    /// Summarize a finished span for evaluation
    fn extract_interaction(&self, span: &AgentSpan) -> (InteractionKind, Interaction) {
        evidence::extract_interaction(span)
    }
}

fn llm_key(invocation: &Invocation) -> String {
    format!("llm:{}", invocation.id())
}

fn tool_key(invocation: &Invocation) -> String {
    format!("tool:{}", invocation.id())
}

/// Turn one native event into span work for its run
fn handle_event<G: SpanGeneration>(
    generation: &G,
    pipeline: &CallbackPipeline,
    invocation: &Invocation,
    native: &NativeEvent,
) {
    let Some(event) = G::event(native) else {
        return;
    };
    let run = invocation.run();

    match event {
        EngineEvent::ModelRequest(request) => {
            if let Some(span) = generation.llm_input(run, request) {
                let context = pipeline.before_llm_call(Context::new(span, run.clone(), native));
                run.park_span(llm_key(invocation), context.current_span);
            }
        }
        EngineEvent::ModelResponse(response) => match run.take_parked_span(&llm_key(invocation)) {
            Some(mut span) => {
                generation.llm_output(&mut span, response);
                pipeline.after_llm_call(Context::new(span, run.clone(), native));
            }
            None => debug!("No open LLM span for invocation {}", invocation.id()),
        },
        EngineEvent::ToolCall(call) => {
            if let Some(span) = generation.tool_input(run, call) {
                let context = pipeline.before_tool_execution(Context::new(span, run.clone(), native));
                run.park_span(tool_key(invocation), context.current_span);
            }
        }
        EngineEvent::ToolResult(result) => match run.take_parked_span(&tool_key(invocation)) {
            Some(mut span) => {
                generation.tool_output(&mut span, result);
                pipeline.after_tool_execution(Context::new(span, run.clone(), native));
            }
            None => debug!("No open tool span for invocation {}", invocation.id()),
        },
    }
}

fn wrap_hook<G: SpanGeneration + Clone>(
    generation: &G,
    prior: Option<NativeHook>,
    pipeline: Arc<CallbackPipeline>,
) -> NativeHook {
    let generation = generation.clone();
    Arc::new(move |invocation: &Invocation, event: &NativeEvent| {
        handle_event(&generation, &pipeline, invocation, event);
        prior.as_ref().and_then(|hook| hook(invocation, event))
    })
}

/// One span adapter per supported engine
#[derive(Debug, Clone, Copy)]
pub enum EngineAdapter {
    Agno(agno::AgnoSpans),
    Google(google::GoogleSpans),
    Langchain(langchain::LangchainSpans),
    LlamaIndex(llama_index::LlamaIndexSpans),
    OpenAi(openai::OpenAiSpans),
    Smolagents(smolagents::SmolagentsSpans),
    TinyAgent(tinyagent::TinyAgentSpans),
}

impl EngineAdapter {
    pub fn for_engine(kind: EngineKind) -> Self {
        match kind {
            EngineKind::Agno => EngineAdapter::Agno(agno::AgnoSpans),
            EngineKind::Google => EngineAdapter::Google(google::GoogleSpans),
            EngineKind::Langchain => EngineAdapter::Langchain(langchain::LangchainSpans),
            EngineKind::LlamaIndex => EngineAdapter::LlamaIndex(llama_index::LlamaIndexSpans),
            EngineKind::OpenAi => EngineAdapter::OpenAi(openai::OpenAiSpans),
            EngineKind::Smolagents => EngineAdapter::Smolagents(smolagents::SmolagentsSpans),
            EngineKind::TinyAgent => EngineAdapter::TinyAgent(tinyagent::TinyAgentSpans),
        }
    }

    pub fn engine(&self) -> EngineKind {
        match self {
            EngineAdapter::Agno(_) => agno::AgnoSpans::ENGINE,
            EngineAdapter::Google(_) => google::GoogleSpans::ENGINE,
            EngineAdapter::Langchain(_) => langchain::LangchainSpans::ENGINE,
            EngineAdapter::LlamaIndex(_) => llama_index::LlamaIndexSpans::ENGINE,
            EngineAdapter::OpenAi(_) => openai::OpenAiSpans::ENGINE,
            EngineAdapter::Smolagents(_) => smolagents::SmolagentsSpans::ENGINE,
            EngineAdapter::TinyAgent(_) => tinyagent::TinyAgentSpans::ENGINE,
        }
    }

    /// Hook that records spans and then defers to `prior`
    pub fn wrap(&self, prior: Option<NativeHook>, pipeline: Arc<CallbackPipeline>) -> NativeHook {
        match self {
            EngineAdapter::Agno(g) => wrap_hook(g, prior, pipeline),
            EngineAdapter::Google(g) => wrap_hook(g, prior, pipeline),
            EngineAdapter::Langchain(g) => wrap_hook(g, prior, pipeline),
            EngineAdapter::LlamaIndex(g) => wrap_hook(g, prior, pipeline),
            EngineAdapter::OpenAi(g) => wrap_hook(g, prior, pipeline),
            EngineAdapter::Smolagents(g) => wrap_hook(g, prior, pipeline),
            EngineAdapter::TinyAgent(g) => wrap_hook(g, prior, pipeline),
        }
    }

    pub fn extract_interaction(&self, span: &AgentSpan) -> (InteractionKind, Interaction) {
        match self {
            EngineAdapter::Agno(g) => g.extract_interaction(span),
            EngineAdapter::Google(g) => g.extract_interaction(span),
            EngineAdapter::Langchain(g) => g.extract_interaction(span),
            EngineAdapter::LlamaIndex(g) => g.extract_interaction(span),
            EngineAdapter::OpenAi(g) => g.extract_interaction(span),
            EngineAdapter::Smolagents(g) => g.extract_interaction(span),
            EngineAdapter::TinyAgent(g) => g.extract_interaction(span),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    NotInstalled,
    Installed,
}

/// Installs and removes span-recording hooks on agents of one engine
pub struct Instrumentor {
    adapter: EngineAdapter,
    state: InstallState,
    captured: HashMap<HookPoint, Option<NativeHook>>,
}

impl std::fmt::Debug for Instrumentor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumentor")
            .field("engine", &self.adapter.engine())
            .field("state", &self.state)
            .finish()
    }
}

impl Instrumentor {
    pub fn for_engine(kind: EngineKind) -> Self {
        Self {
            adapter: EngineAdapter::for_engine(kind),
            state: InstallState::NotInstalled,
            captured: HashMap::new(),
        }
    }

    pub fn engine(&self) -> EngineKind {
        self.adapter.engine()
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    pub fn adapter(&self) -> &EngineAdapter {
        &self.adapter
    }

    /// Wrap every hook slot of `agent`
    ///
    /// Does nothing when already installed, or when `agent` belongs to another engine.
    ///
    /// # Arguments
    ///
    /// * `agent` - The agent whose hook slots are wrapped
    /// * `pipeline` - Callbacks run on every span the wrappers produce
    pub fn instrument(&mut self, agent: &NativeAgent, pipeline: Arc<CallbackPipeline>) {
        if self.state == InstallState::Installed {
            debug!("{} instrumentation already installed", self.engine());
            return;
        }
        if agent.kind() != self.engine() {
            warn!(
                "Not instrumenting a {} agent with the {} instrumentor",
                agent.kind(),
                self.engine()
            );
            return;
        }

        for point in HookPoint::ALL {
            let prior = agent.hooks().get(point);
            let wrapper = self.adapter.wrap(prior.clone(), Arc::clone(&pipeline));
            agent.hooks().replace(point, Some(wrapper));
            self.captured.insert(point, prior);
        }

        self.state = InstallState::Installed;
        debug!("{} instrumentation installed", self.engine());
    }

    /// Put back the hooks that were in place before [`Instrumentor::instrument`]
    ///
    /// Does nothing when not installed.
    pub fn uninstall(&mut self, agent: &NativeAgent) {
        if self.state == InstallState::NotInstalled {
            return;
        }

        for (point, prior) in self.captured.drain() {
            agent.hooks().replace(point, prior);
        }

        self.state = InstallState::NotInstalled;
        debug!("{} instrumentation removed", self.engine());
    }

    pub fn extract_interaction(&self, span: &AgentSpan) -> (InteractionKind, Interaction) {
        self.adapter.extract_interaction(span)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::native::openai as native_openai;
    use crate::engine::{EngineDriver, EngineSession};
    use crate::error::Result;
    use crate::tracer::attributes::gen_ai;
    use crate::tracer::{MemorySink, SpanExporter};
    use async_trait::async_trait;
    use serde_json::Value;

    struct IdleDriver;

    #[async_trait]
    impl EngineDriver for IdleDriver {
        async fn run(&self, _prompt: &str, _session: EngineSession) -> Result<String> {
            Ok(String::new())
        }
    }

    fn agent(kind: EngineKind) -> NativeAgent {
        NativeAgent::new(kind, Arc::new(IdleDriver))
    }

    fn pipeline() -> Arc<CallbackPipeline> {
        Arc::new(CallbackPipeline::new(Vec::new()))
    }

    fn marker_hook(value: i64) -> NativeHook {
        Arc::new(move |_: &Invocation, _: &NativeEvent| Some(Value::from(value)))
    }

    #[test]
    fn test_uninstall_before_instrument_is_noop() {
        for kind in EngineKind::ALL {
            let agent = agent(kind);
            let original = marker_hook(1);
            agent.hooks().replace(HookPoint::AfterModel, Some(original.clone()));

            let mut instrumentor = Instrumentor::for_engine(kind);
            instrumentor.uninstall(&agent);

            assert_eq!(instrumentor.state(), InstallState::NotInstalled);
            assert!(Arc::ptr_eq(&agent.hooks().get(HookPoint::AfterModel).unwrap(), &original));
            assert!(agent.hooks().get(HookPoint::BeforeModel).is_none());
        }
    }

    #[test]
    fn test_uninstall_restores_prior_slots() {
        for kind in EngineKind::ALL {
            let agent = agent(kind);
            let original = marker_hook(7);
            agent.hooks().replace(HookPoint::BeforeTool, Some(original.clone()));

            let mut instrumentor = Instrumentor::for_engine(kind);
            instrumentor.instrument(&agent, pipeline());
            assert_eq!(instrumentor.state(), InstallState::Installed);
            for point in HookPoint::ALL {
                assert!(agent.hooks().is_set(point));
            }
            assert!(!Arc::ptr_eq(&agent.hooks().get(HookPoint::BeforeTool).unwrap(), &original));

            instrumentor.uninstall(&agent);
            assert_eq!(instrumentor.state(), InstallState::NotInstalled);
            assert!(Arc::ptr_eq(&agent.hooks().get(HookPoint::BeforeTool).unwrap(), &original));
            assert!(agent.hooks().get(HookPoint::BeforeModel).is_none());
            assert!(agent.hooks().get(HookPoint::AfterModel).is_none());
            assert!(agent.hooks().get(HookPoint::AfterTool).is_none());

            instrumentor.uninstall(&agent);
            assert!(Arc::ptr_eq(&agent.hooks().get(HookPoint::BeforeTool).unwrap(), &original));
        }
    }

    #[test]
    fn test_instrument_twice_keeps_first_capture() {
        let agent = agent(EngineKind::OpenAi);
        let mut instrumentor = Instrumentor::for_engine(EngineKind::OpenAi);

        instrumentor.instrument(&agent, pipeline());
        let wrapper = agent.hooks().get(HookPoint::BeforeModel).unwrap();
        instrumentor.instrument(&agent, pipeline());

        assert!(Arc::ptr_eq(&agent.hooks().get(HookPoint::BeforeModel).unwrap(), &wrapper));
        instrumentor.uninstall(&agent);
        assert!(agent.hooks().get(HookPoint::BeforeModel).is_none());
    }

    #[test]
    fn test_instrument_ignores_other_engine() {
        let agent = agent(EngineKind::Google);
        let mut instrumentor = Instrumentor::for_engine(EngineKind::OpenAi);

        instrumentor.instrument(&agent, pipeline());

        assert_eq!(instrumentor.state(), InstallState::NotInstalled);
        assert!(agent.hooks().get(HookPoint::BeforeModel).is_none());
    }

    #[test]
    fn test_wrapper_records_span_and_forwards() {
        let agent = agent(EngineKind::OpenAi);
        agent.hooks().replace(HookPoint::AfterModel, Some(marker_hook(42)));
        let mut instrumentor = Instrumentor::for_engine(EngineKind::OpenAi);
        instrumentor.instrument(&agent, pipeline());

        let sink = Arc::new(MemorySink::new());
        let exporter = Arc::new(SpanExporter::new(vec![sink.clone()]));
        let run = exporter.begin_run(Some("gpt-4.1-mini".to_string()));
        let session = agent.session(run.clone());
        let invocation = session.invocation();

        let request = NativeEvent::OpenAi(EngineEvent::ModelRequest(native_openai::ModelRequest::default()));
        let response = NativeEvent::OpenAi(EngineEvent::ModelResponse(native_openai::ModelResponse {
            output: vec![native_openai::OutputItem::Message {
                content: vec![native_openai::OutputText { text: "Paris".to_string() }],
            }],
            usage: None,
        }));

        assert_eq!(session.fire(&invocation, &request), None);
        assert_eq!(run.span_count(), 0);
        assert_eq!(session.fire(&invocation, &response), Some(Value::from(42)));

        let spans = sink.spans();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].is_llm_call());
        assert_eq!(spans[0].str_attribute(gen_ai::OUTPUT), Some("Paris"));
        assert_eq!(spans[0].str_attribute(gen_ai::REQUEST_MODEL), Some("gpt-4.1-mini"));
        assert_eq!(run.span_count(), 1);
    }

    fn empty_events(kind: EngineKind) -> [NativeEvent; 4] {
        macro_rules! empty {
            ($variant:ident) => {
                [
                    NativeEvent::$variant(EngineEvent::ModelRequest(Default::default())),
                    NativeEvent::$variant(EngineEvent::ModelResponse(Default::default())),
                    NativeEvent::$variant(EngineEvent::ToolCall(Default::default())),
                    NativeEvent::$variant(EngineEvent::ToolResult(Default::default())),
                ]
            };
        }
        match kind {
            EngineKind::Agno => empty!(Agno),
            EngineKind::Google => empty!(Google),
            EngineKind::Langchain => empty!(Langchain),
            EngineKind::LlamaIndex => empty!(LlamaIndex),
            EngineKind::OpenAi => empty!(OpenAi),
            EngineKind::Smolagents => empty!(Smolagents),
            EngineKind::TinyAgent => empty!(TinyAgent),
        }
    }

    #[test]
    fn test_empty_payloads_are_recorded_for_every_engine() {
        for kind in EngineKind::ALL {
            let agent = agent(kind);
            let mut instrumentor = Instrumentor::for_engine(kind);
            instrumentor.instrument(&agent, pipeline());

            let sink = Arc::new(MemorySink::new());
            let exporter = Arc::new(SpanExporter::new(vec![sink.clone()]));
            let run = exporter.begin_run(None);
            let session = agent.session(run.clone());

            let [request, response, call, result] = empty_events(kind);
            let model_call = session.invocation();
            session.fire(&model_call, &request);
            session.fire(&model_call, &response);
            let tool_call = session.invocation();
            session.fire(&tool_call, &call);
            session.fire(&tool_call, &result);

            let spans = sink.spans();
            let tool = spans.iter().find(|s| s.is_tool_execution());
            assert!(tool.is_some(), "{} recorded no tool span", kind);
            assert_eq!(tool.and_then(|s| s.str_attribute(gen_ai::TOOL_NAME)), Some(UNKNOWN_TOOL));

            // LlamaIndex opens no LLM span for a request without messages
            let llm_calls = spans.iter().filter(|s| s.is_llm_call()).count();
            let expected = if kind == EngineKind::LlamaIndex { 0 } else { 1 };
            assert_eq!(llm_calls, expected, "{}", kind);
            assert_eq!(run.span_count(), spans.len());

            let (_, interaction) = instrumentor.extract_interaction(tool.unwrap());
            assert_eq!(interaction["tool_name"], UNKNOWN_TOOL);
        }
    }

    #[test]
    fn test_response_without_request_records_nothing() {
        let agent = agent(EngineKind::OpenAi);
        let mut instrumentor = Instrumentor::for_engine(EngineKind::OpenAi);
        instrumentor.instrument(&agent, pipeline());

        let run = test_support::run(None);
        let session = agent.session(run.clone());
        let response = NativeEvent::OpenAi(EngineEvent::ModelResponse(Default::default()));
        session.fire(&session.invocation(), &response);

        assert_eq!(run.span_count(), 0);
    }
}
