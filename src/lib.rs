//! Framework-agnostic agent instrumentation
//!
//! `agentweave` observes agents built on heterogeneous engines through the engines' own
//! callback slots and records every run as a trace of spans in a single, vendor-neutral
//! format: one `invoke_agent` root span per run, with `call_llm` and `execute_tool`
//! spans below it.

pub mod agent;
pub mod callbacks;
pub mod config;
pub mod engine;
pub mod error;
pub mod instrumentation;
pub mod logging;
pub mod tracer;

pub use agent::InstrumentedAgent;
pub use error::{AgentRunError, AgentweaveError, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::agent::InstrumentedAgent;
    pub use crate::callbacks::{Callback, Context};
    pub use crate::config::{AgentConfig, TracingConfig};
    pub use crate::engine::{
        EngineDriver, EngineEvent, EngineKind, EngineSession, HookPoint, NativeAgent, NativeEvent, Script,
        ScriptedEngine,
    };
    pub use crate::error::{AgentRunError, AgentweaveError, Result};
    pub use crate::instrumentation::{format_evidence, InstallState, Instrumentor};
    pub use crate::tracer::{AgentSpan, AgentTrace, MemorySink, PricingTable, SpanSink};
}
