//! Instrumented agent runs
//!
//! [`InstrumentedAgent`] wraps a [`NativeAgent`], installs span-recording hooks on it and
//! turns each call to [`InstrumentedAgent::run`] into one run with its own trace. Runs may
//! overlap on the same agent; every span lands in the trace of the run that produced it.

use crate::callbacks::{default_callbacks, CallbackPipeline};
use crate::config::{AgentConfig, TracingConfig};
use crate::engine::{EngineKind, NativeAgent};
use crate::error::{AgentRunError, AgentweaveError, Result};
use crate::instrumentation::{InstallState, Instrumentor};
use crate::tracer::attributes::{gen_ai, operation, output_type};
use crate::tracer::run::RunGuard;
use crate::tracer::{
    AgentTrace, JsonlSink, PricingTable, Resource, RunId, SpanExporter, SpanSink, SpanStatus,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

const NO_DESCRIPTION: &str = "No description.";

/// An engine agent whose runs are traced
///
/// # Examples
///
/// ```ignore
/// use agentweave::prelude::*;
///
/// let agent = InstrumentedAgent::new(AgentConfig::new("gpt-4.1-mini"), native_agent, TracingConfig::from_env()?)?;
/// let trace = agent.run("What is the capital of France?").await?;
/// println!("{} tokens", trace.tokens().total());
/// ```
pub struct InstrumentedAgent {
    config: AgentConfig,
    agent: NativeAgent,
    pipeline: Arc<CallbackPipeline>,
    exporter: Arc<SpanExporter>,
    instrumentor: Mutex<Instrumentor>,
}

impl std::fmt::Debug for InstrumentedAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentedAgent")
            .field("config", &self.config)
            .field("engine", &self.agent.kind())
            .field("callbacks", &self.pipeline.len())
            .finish_non_exhaustive()
    }
}

impl InstrumentedAgent {
    /// Wrap `agent` and install the instrumentation for its engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Name, model and callbacks of the agent
    /// * `agent` - The engine agent to observe
    /// * `tracing` - Where spans are reported
    pub fn new(config: AgentConfig, agent: NativeAgent, tracing: TracingConfig) -> Result<Self> {
        let callbacks = match &config.callbacks {
            Some(callbacks) => callbacks.clone(),
            None => default_callbacks(
                PricingTable::load_or_default(tracing.pricing_file.as_deref()),
                tracing.console,
            ),
        };
        let pipeline = Arc::new(CallbackPipeline::new(callbacks));

        let mut sinks: Vec<Arc<dyn SpanSink>> = Vec::new();
        if let Some(dir) = &tracing.output_dir {
            let sink = JsonlSink::in_dir(dir)?;
            debug!("Writing spans to {}", dir.join(JsonlSink::FILE_NAME).display());
            sinks.push(Arc::new(sink));
        }

        let mut instrumentor = Instrumentor::for_engine(agent.kind());
        instrumentor.instrument(&agent, Arc::clone(&pipeline));

        Ok(Self {
            config,
            agent,
            pipeline,
            exporter: Arc::new(SpanExporter::new(sinks)),
            instrumentor: Mutex::new(instrumentor),
        })
    }

    /// Also export spans to `extra`
    pub fn with_sinks(mut self, extra: Vec<Arc<dyn SpanSink>>) -> Self {
        let mut sinks = self.exporter.sinks().to_vec();
        sinks.extend(extra);
        self.exporter = Arc::new(SpanExporter::new(sinks));
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn engine(&self) -> EngineKind {
        self.agent.kind()
    }

    pub fn native_agent(&self) -> &NativeAgent {
        &self.agent
    }

    fn instrumentor(&self) -> MutexGuard<'_, Instrumentor> {
        self.instrumentor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn instrumentor_state(&self) -> InstallState {
        self.instrumentor().state()
    }

    /// Markdown summary of `trace` for evaluation
    pub fn evidence(&self, trace: &AgentTrace) -> String {
        crate::instrumentation::format_evidence(trace, &self.instrumentor())
    }

    /// Runs currently in flight on this agent
    pub fn running_runs(&self) -> Vec<RunId> {
        self.exporter.running_runs()
    }

    /// Run the agent on `prompt` and return the trace of that run.
    ///
    /// On failure the error carries the spans finished before the engine gave up, sealed
    /// like any other trace.
    pub async fn run(&self, prompt: &str) -> std::result::Result<AgentTrace, AgentRunError> {
        let run = self.exporter.begin_run(self.config.model_id.clone());
        let _guard = RunGuard::new(run.clone());

        let mut root = run.start_root_span(format!("{} [{}]", operation::INVOKE_AGENT, self.config.name));
        root.set_attribute(gen_ai::OPERATION_NAME, operation::INVOKE_AGENT);
        root.set_attribute(gen_ai::AGENT_NAME, self.config.name.as_str());
        root.set_attribute(
            gen_ai::AGENT_DESCRIPTION,
            self.config.description.as_deref().unwrap_or(NO_DESCRIPTION),
        );
        if let Some(model) = &self.config.model_id {
            root.set_attribute(gen_ai::REQUEST_MODEL, model.as_str());
        }
        root.set_attribute(gen_ai::REQUEST_ID, run.run_id().to_string());
        root.set_resource(Resource::with_service_name(self.config.name.as_str()));

        let session = self
            .agent
            .session(run.clone())
            .with_instructions(self.config.instructions.clone());
        let outcome = self.agent.driver().run(prompt, session).await;

        match outcome {
            Ok(output) => {
                root.set_attribute(gen_ai::OUTPUT, output.as_str());
                root.set_attribute(gen_ai::OUTPUT_TYPE, output_type::TEXT);
                root.set_status(SpanStatus::ok());
                run.record(root.end());
                let trace = run.finalize(Some(output));
                info!("Run {} completed with {} spans", run.run_id(), trace.len());
                Ok(trace)
            }
            Err(e) => {
                root.set_status(SpanStatus::error(e.to_string()));
                run.record(root.end());
                let trace = run.finalize(None);
                info!("Run {} failed after {} spans: {}", run.run_id(), trace.len(), e);
                Err(AgentRunError::new(trace, e))
            }
        }
    }

    /// Blocking variant of [`InstrumentedAgent::run`] on a fresh current-thread runtime.
    ///
    /// Must not be called from inside a tokio runtime.
    pub fn run_blocking(&self, prompt: &str) -> std::result::Result<AgentTrace, AgentRunError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AgentRunError::new(AgentTrace::default(), AgentweaveError::IoError(e)))?;
        runtime.block_on(self.run(prompt))
    }

    /// Remove the hooks from the engine agent. Calling it again does nothing.
    pub fn exit(&self) {
        self.instrumentor().uninstall(&self.agent);
    }
}
