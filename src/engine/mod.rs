//! Engine surface
//!
//! An engine is an agent framework that drives the LLM/tool loop on its own and reports
//! what it does through four callback slots. This module models that surface: the slots
//! ([`HookSlots`]), the per-call context the engine passes to its hooks ([`Invocation`]),
//! the engine's native payloads ([`NativeEvent`]) and the driver that runs the loop
//! ([`EngineDriver`]).

pub mod native;
pub mod scripted;

pub use native::EngineEvent;
pub use scripted::{Script, ScriptStep, ScriptedEngine};

use crate::error::{AgentweaveError, Result};
use crate::tracer::RunContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Supported agent frameworks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Agno,
    Google,
    Langchain,
    LlamaIndex,
    OpenAi,
    Smolagents,
    TinyAgent,
}

impl EngineKind {
    pub const ALL: [EngineKind; 7] = [
        EngineKind::Agno,
        EngineKind::Google,
        EngineKind::Langchain,
        EngineKind::LlamaIndex,
        EngineKind::OpenAi,
        EngineKind::Smolagents,
        EngineKind::TinyAgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Agno => "agno",
            EngineKind::Google => "google",
            EngineKind::Langchain => "langchain",
            EngineKind::LlamaIndex => "llama_index",
            EngineKind::OpenAi => "openai",
            EngineKind::Smolagents => "smolagents",
            EngineKind::TinyAgent => "tinyagent",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = AgentweaveError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        EngineKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = EngineKind::ALL.iter().map(EngineKind::as_str).collect();
                AgentweaveError::UnsupportedEngine(format!("{} (expected one of {})", s, valid.join(", ")))
            })
    }
}

/// Native callback slots every engine exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    BeforeModel,
    AfterModel,
    BeforeTool,
    AfterTool,
}

impl HookPoint {
    pub const ALL: [HookPoint; 4] = [
        HookPoint::BeforeModel,
        HookPoint::AfterModel,
        HookPoint::BeforeTool,
        HookPoint::AfterTool,
    ];

    fn index(self) -> usize {
        match self {
            HookPoint::BeforeModel => 0,
            HookPoint::AfterModel => 1,
            HookPoint::BeforeTool => 2,
            HookPoint::AfterTool => 3,
        }
    }
}

/// One engine's native event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "engine", content = "event", rename_all = "snake_case")]
pub enum NativeEvent {
    Agno(native::agno::Event),
    Google(native::google::Event),
    Langchain(native::langchain::Event),
    LlamaIndex(native::llama_index::Event),
    OpenAi(native::openai::Event),
    Smolagents(native::smolagents::Event),
    TinyAgent(native::tinyagent::Event),
}

fn point_of<A, B, C, D>(event: &EngineEvent<A, B, C, D>) -> HookPoint {
    match event {
        EngineEvent::ModelRequest(_) => HookPoint::BeforeModel,
        EngineEvent::ModelResponse(_) => HookPoint::AfterModel,
        EngineEvent::ToolCall(_) => HookPoint::BeforeTool,
        EngineEvent::ToolResult(_) => HookPoint::AfterTool,
    }
}

impl NativeEvent {
    pub fn engine(&self) -> EngineKind {
        match self {
            NativeEvent::Agno(_) => EngineKind::Agno,
            NativeEvent::Google(_) => EngineKind::Google,
            NativeEvent::Langchain(_) => EngineKind::Langchain,
            NativeEvent::LlamaIndex(_) => EngineKind::LlamaIndex,
            NativeEvent::OpenAi(_) => EngineKind::OpenAi,
            NativeEvent::Smolagents(_) => EngineKind::Smolagents,
            NativeEvent::TinyAgent(_) => EngineKind::TinyAgent,
        }
    }

    /// Slot this event is reported through
    pub fn hook_point(&self) -> HookPoint {
        match self {
            NativeEvent::Agno(e) => point_of(e),
            NativeEvent::Google(e) => point_of(e),
            NativeEvent::Langchain(e) => point_of(e),
            NativeEvent::LlamaIndex(e) => point_of(e),
            NativeEvent::OpenAi(e) => point_of(e),
            NativeEvent::Smolagents(e) => point_of(e),
            NativeEvent::TinyAgent(e) => point_of(e),
        }
    }
}

/// Per-call context an engine passes to its hooks
///
/// Carries the run the call belongs to, so hooks shared between runs can tell them apart.
#[derive(Debug, Clone)]
pub struct Invocation {
    id: String,
    run: RunContext,
}

impl Invocation {
    pub fn new(id: impl Into<String>, run: RunContext) -> Self {
        Self { id: id.into(), run }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn run(&self) -> &RunContext {
        &self.run
    }
}

/// A hook installed in one of the engine's slots
///
/// A returned value replaces what the engine would otherwise have used at that point.
pub type NativeHook = Arc<dyn Fn(&Invocation, &NativeEvent) -> Option<Value> + Send + Sync>;

/// The four callback slots of an engine agent
#[derive(Default)]
pub struct HookSlots {
    slots: RwLock<[Option<NativeHook>; 4]>,
}

impl fmt::Debug for HookSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let installed: Vec<HookPoint> = HookPoint::ALL
            .into_iter()
            .filter(|p| slots[p.index()].is_some())
            .collect();
        f.debug_struct("HookSlots").field("installed", &installed).finish()
    }
}

impl HookSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, point: HookPoint) -> Option<NativeHook> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)[point.index()].clone()
    }

    pub fn is_set(&self, point: HookPoint) -> bool {
        self.get(point).is_some()
    }

    /// Put `hook` into the slot, returning what was there before
    pub fn replace(&self, point: HookPoint, hook: Option<NativeHook>) -> Option<NativeHook> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut slots[point.index()], hook)
    }

    /// Call the hook in `point`, if any
    pub fn fire(&self, point: HookPoint, invocation: &Invocation, event: &NativeEvent) -> Option<Value> {
        let hook = self.get(point)?;
        hook(invocation, event)
    }
}

/// Runs the engine's own agent loop for one prompt
#[async_trait]
pub trait EngineDriver: Send + Sync {
    /// Drive the agent to completion, reporting model and tool calls through `session`
    ///
    /// Returns the agent's final output.
    async fn run(&self, prompt: &str, session: EngineSession) -> Result<String>;
}

/// An agent built with one engine
#[derive(Clone)]
pub struct NativeAgent {
    kind: EngineKind,
    hooks: Arc<HookSlots>,
    driver: Arc<dyn EngineDriver>,
}

impl fmt::Debug for NativeAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeAgent")
            .field("kind", &self.kind)
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl NativeAgent {
    pub fn new(kind: EngineKind, driver: Arc<dyn EngineDriver>) -> Self {
        Self {
            kind,
            hooks: Arc::new(HookSlots::new()),
            driver,
        }
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub fn hooks(&self) -> &Arc<HookSlots> {
        &self.hooks
    }

    pub fn driver(&self) -> &Arc<dyn EngineDriver> {
        &self.driver
    }

    /// Session handed to the driver for one run
    pub fn session(&self, run: RunContext) -> EngineSession {
        EngineSession {
            kind: self.kind,
            hooks: Arc::clone(&self.hooks),
            run,
            instructions: None,
            next_invocation: AtomicU64::new(1),
        }
    }
}

/// A driver's view of one run
pub struct EngineSession {
    kind: EngineKind,
    hooks: Arc<HookSlots>,
    run: RunContext,
    instructions: Option<String>,
    next_invocation: AtomicU64,
}

impl EngineSession {
    pub fn engine(&self) -> EngineKind {
        self.kind
    }

    pub fn run(&self) -> &RunContext {
        &self.run
    }

    pub fn model_id(&self) -> Option<&str> {
        self.run.model_id()
    }

    /// System instructions the engine should run the agent with
    pub fn with_instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Mint the context for one model or tool call
    ///
    /// Pass the same invocation to the before-hook and the after-hook of a call.
    pub fn invocation(&self) -> Invocation {
        let n = self.next_invocation.fetch_add(1, Ordering::SeqCst);
        Invocation::new(format!("{}-{}", self.run.run_id(), n), self.run.clone())
    }

    /// Report an event through the slot it belongs to
    pub fn fire(&self, invocation: &Invocation, event: &NativeEvent) -> Option<Value> {
        if event.engine() != self.kind {
            warn!("Ignoring {} event on a {} agent", event.engine(), self.kind);
            return None;
        }
        self.hooks.fire(event.hook_point(), invocation, event)
    }
}
