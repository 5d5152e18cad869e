//! Tracer system for agent runs
//!
//! The tracer records what an agent did during one run as a sequence of spans, in a
//! format that does not depend on the engine the agent was built with.
//!
//! # Architecture
//!
//! - **ActiveSpan / AgentSpan**: a span while it records, and the frozen span once ended
//! - **RunContext**: per-run handle carrying the run id, root span and in-flight trace
//! - **SpanExporter**: backbone shared by all runs, forwarding spans to sinks
//! - **SpanSink**: export destination (`MemorySink`, `JsonlSink`, `NullSink`)
//! - **AgentTrace**: the sealed result of a run, with token, cost and duration summaries
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use agentweave::tracer::{MemorySink, SpanExporter, SpanKind};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let exporter = Arc::new(SpanExporter::new(vec![sink.clone()]));
//!
//! let run = exporter.begin_run(Some("gpt-4.1-mini".to_string()));
//! let root = run.start_root_span("invoke_agent [demo]");
//! run.record(run.start_span("call_llm gpt-4.1-mini", SpanKind::Client).end());
//! run.record(root.end());
//!
//! let trace = run.finalize(None);
//! assert_eq!(trace.spans.len(), 2);
//! ```
//!
//! # Run isolation
//!
//! Every span is stamped with the id of the run that created it. A run's trace only
//! accepts spans carrying its own id, so concurrent runs on the same agent never see
//! each other's spans.

pub mod attributes;
pub mod cost;
pub mod exporter;
pub mod messages;
pub mod run;
pub mod sinks;
pub mod span;
pub mod trace;

pub use cost::{compute_cost_info, CallCost, ModelPrice, PricingTable};
pub use exporter::{SpanCallback, SpanExporter, SpanSink};
pub use messages::{ChatRecord, ConversationMessage, MessageRole};
pub use run::{RunContext, RunId, RunState, RunTrace};
pub use sinks::{JsonlSink, MemorySink, NullSink};
pub use span::{
    ActiveSpan, AgentSpan, Attributes, Resource, SpanContext, SpanEvent, SpanId, SpanKind,
    SpanLink, SpanStatus, StatusCode, TraceFlags, TraceId, TraceState,
};
pub use trace::{AgentTrace, CostInfo, TokenInfo};
