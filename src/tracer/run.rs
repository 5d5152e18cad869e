//! Per-run state
//!
//! Every call to run an agent gets its own [`RunContext`]. The context is handed to the
//! engine through each [`crate::engine::Invocation`], so hooks always know which run a
//! span belongs to without consulting any global state. Spans from one run are never
//! appended to another run's [`RunTrace`].

use super::attributes::RUN_ID;
use super::exporter::SpanExporter;
use super::span::{ActiveSpan, AgentSpan, SpanContext, SpanId, SpanKind, TraceId};
use super::trace::AgentTrace;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifier of one agent run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Registered, root span not opened yet
    Started,
    /// Root span open, spans are being appended
    Collecting,
    /// Trace sealed, further spans are rejected
    Finalized,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct TraceState {
    state: RunState,
    trace: AgentTrace,
}

/// The in-flight trace of one run
pub struct RunTrace {
    run_id: RunId,
    inner: Mutex<TraceState>,
}

impl RunTrace {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            inner: Mutex::new(TraceState {
                state: RunState::Started,
                trace: AgentTrace::new(),
            }),
        }
    }

    pub fn state(&self) -> RunState {
        lock(&self.inner).state
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mark_collecting(&self) {
        let mut inner = lock(&self.inner);
        if inner.state == RunState::Started {
            inner.state = RunState::Collecting;
        }
    }

    /// Append a finished span, returning whether it was accepted
    ///
    /// Spans stamped with another run's id, and spans arriving after the trace was
    /// sealed, are dropped.
    pub fn append(&self, span: AgentSpan) -> bool {
        let expected = self.run_id.to_string();
        if span.run_id() != Some(expected.as_str()) {
            warn!(
                "Dropping span '{}' from run {:?}: does not belong to run {}",
                span.name,
                span.run_id(),
                self.run_id
            );
            return false;
        }

        let mut inner = lock(&self.inner);
        if inner.state == RunState::Finalized {
            warn!("Dropping span '{}': run {} is already finalized", span.name, self.run_id);
            return false;
        }
        inner.trace.spans.push(span);
        true
    }

    /// Seal the trace and hand it out
    ///
    /// Sealing twice yields an empty trace the second time.
    pub fn seal(&self, final_output: Option<String>) -> AgentTrace {
        let mut inner = lock(&self.inner);
        inner.state = RunState::Finalized;
        let mut trace = std::mem::take(&mut inner.trace);
        trace.final_output = final_output;
        trace
    }
}

struct RunInner {
    run_id: RunId,
    root: SpanContext,
    model_id: Option<String>,
    trace: RunTrace,
    exporter: Arc<SpanExporter>,
    open_spans: Mutex<HashMap<String, ActiveSpan>>,
    awaiting_first_llm_call: AtomicBool,
}

/// Shared handle to one run's state
///
/// Cloning is cheap; all clones refer to the same run.
#[derive(Clone)]
pub struct RunContext {
    inner: Arc<RunInner>,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.inner.run_id)
            .field("trace_id", &self.inner.root.trace_id)
            .field("state", &self.state())
            .finish()
    }
}

impl RunContext {
    pub(crate) fn new(exporter: Arc<SpanExporter>, model_id: Option<String>) -> Self {
        let run_id = RunId::new();
        Self {
            inner: Arc::new(RunInner {
                run_id,
                root: SpanContext::new(TraceId::random(), SpanId::random()),
                model_id,
                trace: RunTrace::new(run_id),
                exporter,
                open_spans: Mutex::new(HashMap::new()),
                awaiting_first_llm_call: AtomicBool::new(true),
            }),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.inner.run_id
    }

    pub fn trace_id(&self) -> TraceId {
        self.inner.root.trace_id
    }

    /// Context of the run's `invoke_agent` span, parent of every other span
    pub fn root_context(&self) -> &SpanContext {
        &self.inner.root
    }

    pub fn model_id(&self) -> Option<&str> {
        self.inner.model_id.as_deref()
    }

    pub fn state(&self) -> RunState {
        self.inner.trace.state()
    }

    pub fn exporter(&self) -> &Arc<SpanExporter> {
        &self.inner.exporter
    }

    /// Number of spans collected so far
    pub fn span_count(&self) -> usize {
        self.inner.trace.len()
    }

    pub fn same_run(&self, other: &RunContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn stamp(&self, mut span: ActiveSpan) -> ActiveSpan {
        span.set_attribute(RUN_ID, self.inner.run_id.to_string());
        span
    }

    /// Open the root span and start collecting
    pub fn start_root_span(&self, name: impl Into<String>) -> ActiveSpan {
        self.inner.trace.mark_collecting();
        let span = ActiveSpan::with_context(name, SpanKind::Internal, self.inner.root.clone(), None);
        self.stamp(span)
    }

    /// Open a span below the root span
    pub fn start_span(&self, name: impl Into<String>, kind: SpanKind) -> ActiveSpan {
        let span = ActiveSpan::new(name, kind, self.trace_id(), Some(self.inner.root.clone()));
        self.stamp(span)
    }

    /// Returns `true` exactly once per run, for its first LLM call
    pub fn claim_first_llm_call(&self) -> bool {
        self.inner.awaiting_first_llm_call.swap(false, Ordering::SeqCst)
    }

    /// Park a span between its before-event and its after-event
    pub fn park_span(&self, key: impl Into<String>, span: ActiveSpan) {
        let key = key.into();
        if let Some(previous) = lock(&self.inner.open_spans).insert(key.clone(), span) {
            warn!("Discarding unfinished span '{}' replaced under key {}", previous.name(), key);
        }
    }

    pub fn take_parked_span(&self, key: &str) -> Option<ActiveSpan> {
        lock(&self.inner.open_spans).remove(key)
    }

    /// Append a finished span to this run's trace and export it
    pub fn record(&self, span: AgentSpan) {
        if self.inner.trace.append(span.clone()) {
            self.inner.exporter.export(&span);
        }
    }

    /// Seal the trace, deregister the run and return the collected spans
    pub fn finalize(&self, final_output: Option<String>) -> AgentTrace {
        let unfinished: Vec<String> = lock(&self.inner.open_spans)
            .drain()
            .map(|(key, _)| key)
            .collect();
        if !unfinished.is_empty() {
            warn!("Run {} finished with unterminated spans: {:?}", self.inner.run_id, unfinished);
        }

        let trace = self.inner.trace.seal(final_output);
        self.inner.exporter.finish_run(self.inner.run_id);
        debug!("Run {} finalized with {} spans", self.inner.run_id, trace.len());
        trace
    }
}

/// Deregisters a run that is dropped before it was finalized
pub(crate) struct RunGuard {
    run: RunContext,
}

impl RunGuard {
    pub(crate) fn new(run: RunContext) -> Self {
        Self { run }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.run.state() != RunState::Finalized {
            warn!("Run {} abandoned before completion", self.run.run_id());
            self.run.inner.trace.seal(None);
            self.run.inner.exporter.finish_run(self.run.run_id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::attributes::gen_ai;

    fn exporter() -> Arc<SpanExporter> {
        Arc::new(SpanExporter::new(Vec::new()))
    }

    #[test]
    fn test_run_lifecycle() {
        let exporter = exporter();
        let run = exporter.begin_run(Some("gpt-4.1-mini".to_string()));
        assert_eq!(run.state(), RunState::Started);
        assert_eq!(exporter.running_runs(), vec![run.run_id()]);

        let root = run.start_root_span("invoke_agent [test]");
        assert_eq!(run.state(), RunState::Collecting);
        assert_eq!(root.context(), run.root_context());
        assert!(root.parent().is_none());

        let child = run.start_span("call_llm gpt-4.1-mini", SpanKind::Client);
        assert_eq!(child.parent(), Some(run.root_context()));
        assert_eq!(child.context().trace_id, run.trace_id());
        run.record(child.end());
        run.record(root.end());

        let trace = run.finalize(Some("done".to_string()));
        assert_eq!(run.state(), RunState::Finalized);
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.final_output.as_deref(), Some("done"));
        assert_eq!(trace.run_id(), Some(run.run_id().to_string().as_str()));
        assert!(exporter.running_runs().is_empty());
    }

    #[test]
    fn test_append_rejects_foreign_span() {
        let exporter = exporter();
        let first = exporter.begin_run(None);
        let second = exporter.begin_run(None);

        let span = second.start_span("execute_tool search", SpanKind::Internal).end();
        first.record(span);

        assert_eq!(first.span_count(), 0);
    }

    #[test]
    fn test_append_rejects_after_finalize() {
        let run = exporter().begin_run(None);
        let span = run.start_span("late", SpanKind::Internal);
        run.finalize(None);

        run.record(span.end());
        assert_eq!(run.span_count(), 0);
    }

    #[test]
    fn test_unstamped_span_is_rejected() {
        let trace = RunTrace::new(RunId::new());
        let span = ActiveSpan::new("x", SpanKind::Internal, TraceId::random(), None).end();
        assert!(!trace.append(span));
        assert!(trace.is_empty());
    }

    #[test]
    fn test_first_llm_call_claimed_once() {
        let run = exporter().begin_run(None);
        assert!(run.claim_first_llm_call());
        assert!(!run.claim_first_llm_call());

        let other = run.exporter().begin_run(None);
        assert!(other.claim_first_llm_call());
    }

    #[test]
    fn test_parked_spans() {
        let run = exporter().begin_run(None);
        let mut span = run.start_span("call_llm", SpanKind::Client);
        span.set_attribute(gen_ai::OUTPUT, "pending");
        run.park_span("llm:1", span);

        assert!(run.take_parked_span("llm:2").is_none());
        let span = run.take_parked_span("llm:1").unwrap();
        assert_eq!(span.attribute(gen_ai::OUTPUT).and_then(|v| v.as_str()), Some("pending"));
        assert!(run.take_parked_span("llm:1").is_none());
    }

    #[test]
    fn test_guard_deregisters_abandoned_run() {
        let exporter = exporter();
        let run = exporter.begin_run(None);
        {
            let _guard = RunGuard::new(run.clone());
            assert_eq!(exporter.running_runs().len(), 1);
        }
        assert!(exporter.running_runs().is_empty());
        assert_eq!(run.state(), RunState::Finalized);
    }

    #[test]
    fn test_guard_is_quiet_after_finalize() {
        let exporter = exporter();
        let run = exporter.begin_run(None);
        let guard = RunGuard::new(run.clone());
        run.finalize(None);
        let other = exporter.begin_run(None);
        drop(guard);

        assert_eq!(exporter.running_runs(), vec![other.run_id()]);
    }
}
