//! Span export backbone
//!
//! One [`SpanExporter`] is shared by every run of an agent. It forwards each finished
//! span to the configured [`SpanSink`]s and keeps a registry of the runs currently in
//! flight. The exporter itself holds no trace: each run collects its own spans in its
//! [`RunContext`].

use super::run::{RunContext, RunId};
use super::span::AgentSpan;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Destination for finished spans
pub trait SpanSink: Send + Sync {
    /// Receive one finished span
    ///
    /// Called once per span, in completion order. Errors are logged by the exporter and
    /// never reach the agent run.
    fn export(&self, span: &AgentSpan) -> Result<()>;

    fn name(&self) -> &str {
        "sink"
    }
}

/// Type alias for span callback functions
pub type SpanCallback = Arc<dyn Fn(&AgentSpan) + Send + Sync>;

/// Shared exporter and registry of running runs
pub struct SpanExporter {
    sinks: Vec<Arc<dyn SpanSink>>,
    on_export_callback: Option<SpanCallback>,
    running: Mutex<HashMap<RunId, RunContext>>,
}

impl SpanExporter {
    /// Create a new exporter
    ///
    /// # Arguments
    ///
    /// * `sinks` - Destinations every finished span is forwarded to, in order
    pub fn new(sinks: Vec<Arc<dyn SpanSink>>) -> Self {
        Self {
            sinks,
            on_export_callback: None,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Call `callback` with every exported span, before the sinks see it
    pub fn with_callback(mut self, callback: SpanCallback) -> Self {
        self.on_export_callback = Some(callback);
        self
    }

    pub fn sinks(&self) -> &[Arc<dyn SpanSink>] {
        &self.sinks
    }

    fn running(&self) -> MutexGuard<'_, HashMap<RunId, RunContext>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new run
    ///
    /// # Arguments
    ///
    /// * `model_id` - Model the run's agent talks to, if known
    pub fn begin_run(self: &Arc<Self>, model_id: Option<String>) -> RunContext {
        let run = RunContext::new(Arc::clone(self), model_id);
        self.running().insert(run.run_id(), run.clone());
        info!("Run {} started (trace {})", run.run_id(), run.trace_id());
        run
    }

    /// Remove a run from the registry
    pub fn finish_run(&self, run_id: RunId) {
        if self.running().remove(&run_id).is_some() {
            info!("Run {} finished", run_id);
        }
    }

    /// Identifiers of the runs currently in flight
    pub fn running_runs(&self) -> Vec<RunId> {
        self.running().keys().copied().collect()
    }

    pub fn running_run(&self, run_id: RunId) -> Option<RunContext> {
        self.running().get(&run_id).cloned()
    }

    /// Forward a finished span to every sink
    pub fn export(&self, span: &AgentSpan) {
        if let Some(callback) = &self.on_export_callback {
            callback(span);
        }

        for sink in &self.sinks {
            if let Err(e) = sink.export(span) {
                warn!("Sink {} failed to export span '{}': {}", sink.name(), span.name, e);
            } else {
                debug!("Exported span '{}' to {}", span.name, sink.name());
            }
        }
    }
}

impl Default for SpanExporter {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentweaveError;
    use crate::tracer::sinks::MemorySink;
    use crate::tracer::span::SpanKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSink;

    impl SpanSink for FailingSink {
        fn export(&self, _span: &AgentSpan) -> Result<()> {
            Err(AgentweaveError::SinkError("unreachable collector".to_string()))
        }
    }

    #[test]
    fn test_export_reaches_every_sink() {
        let first = Arc::new(MemorySink::new());
        let second = Arc::new(MemorySink::new());
        let exporter = Arc::new(SpanExporter::new(vec![first.clone(), second.clone()]));

        let run = exporter.begin_run(None);
        run.record(run.start_span("call_llm", SpanKind::Client).end());

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_failing_sink_does_not_stop_others() {
        let memory = Arc::new(MemorySink::new());
        let exporter = Arc::new(SpanExporter::new(vec![Arc::new(FailingSink), memory.clone()]));

        let run = exporter.begin_run(None);
        run.record(run.start_span("execute_tool", SpanKind::Internal).end());

        assert_eq!(memory.len(), 1);
        assert_eq!(run.span_count(), 1);
    }

    #[test]
    fn test_callback_sees_each_span() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let exporter = Arc::new(SpanExporter::new(Vec::new()).with_callback(Arc::new(move |_span| {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        let run = exporter.begin_run(None);
        run.record(run.start_span("a", SpanKind::Internal).end());
        run.record(run.start_span("b", SpanKind::Internal).end());

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_registry_tracks_concurrent_runs() {
        let exporter = Arc::new(SpanExporter::default());
        let a = exporter.begin_run(None);
        let b = exporter.begin_run(None);

        let mut running = exporter.running_runs();
        running.sort_by_key(|id| id.to_string());
        let mut expected = vec![a.run_id(), b.run_id()];
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(running, expected);

        assert!(exporter.running_run(a.run_id()).unwrap().same_run(&a));

        a.finalize(None);
        assert_eq!(exporter.running_runs(), vec![b.run_id()]);
        assert!(exporter.running_run(a.run_id()).is_none());
    }
}
