//! Span data model
//!
//! A span is recorded in two phases. While the unit of work is in flight it is an
//! [`ActiveSpan`], whose attributes and status can still change. Calling
//! [`ActiveSpan::end`] consumes it and yields an [`AgentSpan`]: the end time is set
//! exactly once and the attributes are frozen from then on.

use super::attributes::{gen_ai, operation, RUN_ID};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Span attributes, keyed by the names in [`super::attributes`]
pub type Attributes = Map<String, Value>;

/// Current wall-clock time in nanoseconds since the Unix epoch
pub fn now_nanos() -> u64 {
    Utc::now().timestamp_nanos_opt().map(|nanos| nanos.max(0) as u64).unwrap_or(0)
}

/// 128-bit trace identifier, serialized as lowercase hex
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TraceId(u128);

impl TraceId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().as_u128())
    }

    pub fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl From<TraceId> for String {
    fn from(id: TraceId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for TraceId {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        u128::from_str_radix(&value, 16).map(Self)
    }
}

/// 64-bit span identifier, serialized as lowercase hex
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SpanId(u64);

impl SpanId {
    pub fn random() -> Self {
        Self(((Uuid::new_v4().as_u128() >> 64) as u64).max(1))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<SpanId> for String {
    fn from(id: SpanId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for SpanId {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        u64::from_str_radix(&value, 16).map(Self)
    }
}

/// Role of a span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    #[default]
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFlags {
    pub value: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceState {
    pub entries: BTreeMap<String, String>,
}

/// Globally unique position of a span: the trace it belongs to and its own id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    #[serde(default)]
    pub is_remote: bool,
    #[serde(default)]
    pub trace_flags: TraceFlags,
    #[serde(default)]
    pub trace_state: TraceState,
}

impl SpanContext {
    pub fn new(trace_id: TraceId, span_id: SpanId) -> Self {
        Self {
            trace_id,
            span_id,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCode {
    #[default]
    Unset,
    Ok,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStatus {
    pub status_code: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SpanStatus {
    pub fn ok() -> Self {
        Self {
            status_code: StatusCode::Ok,
            description: None,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::Error,
            description: Some(description.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status_code == StatusCode::Error
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanLink {
    pub context: SpanContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub attributes: Attributes,
    #[serde(default)]
    pub schema_url: String,
}

impl Resource {
    pub fn with_service_name(name: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert("service.name".to_string(), Value::String(name.into()));
        Self {
            attributes,
            schema_url: String::new(),
        }
    }
}

/// A span that is still recording
#[derive(Debug)]
pub struct ActiveSpan {
    name: String,
    kind: SpanKind,
    parent: Option<SpanContext>,
    start_time: u64,
    context: SpanContext,
    attributes: Attributes,
    status: SpanStatus,
    links: Vec<SpanLink>,
    events: Vec<SpanEvent>,
    resource: Resource,
}

impl ActiveSpan {
    /// Start a span now, inside `trace_id`, below `parent`
    pub fn new(
        name: impl Into<String>,
        kind: SpanKind,
        trace_id: TraceId,
        parent: Option<SpanContext>,
    ) -> Self {
        Self::with_context(name, kind, SpanContext::new(trace_id, SpanId::random()), parent)
    }

    pub(crate) fn with_context(
        name: impl Into<String>,
        kind: SpanKind,
        context: SpanContext,
        parent: Option<SpanContext>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            parent,
            start_time: now_nanos(),
            context,
            attributes: Attributes::new(),
            status: SpanStatus::default(),
            links: Vec::new(),
            events: Vec::new(),
            resource: Resource::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    pub fn parent(&self) -> Option<&SpanContext> {
        self.parent.as_ref()
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn status(&self) -> &SpanStatus {
        &self.status
    }

    pub fn run_id(&self) -> Option<&str> {
        self.attributes.get(RUN_ID).and_then(Value::as_str)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(previous) = self.attributes.get(&key) {
            debug!("Overwriting span attribute {} (was {})", key, previous);
        }
        self.attributes.insert(key, value);
    }

    pub fn set_attributes<K, V>(&mut self, attributes: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in attributes {
            self.set_attribute(key, value);
        }
    }

    pub fn set_status(&mut self, status: SpanStatus) {
        self.status = status;
    }

    pub fn set_resource(&mut self, resource: Resource) {
        self.resource = resource;
    }

    pub fn add_link(&mut self, link: SpanLink) {
        self.links.push(link);
    }

    pub fn add_event(&mut self, name: impl Into<String>, attributes: Option<Attributes>) {
        self.events.push(SpanEvent {
            name: name.into(),
            timestamp: now_nanos(),
            attributes,
        });
    }

    /// Finish the span at the current time
    pub fn end(self) -> AgentSpan {
        let end_time = now_nanos().max(self.start_time);
        self.end_at(end_time)
    }

    pub(crate) fn end_at(self, end_time: u64) -> AgentSpan {
        AgentSpan {
            name: self.name,
            kind: self.kind,
            parent: self.parent,
            start_time: self.start_time,
            end_time,
            status: self.status,
            context: self.context,
            attributes: self.attributes,
            links: self.links,
            events: self.events,
            resource: self.resource,
        }
    }
}

/// A finished span, as exported and stored in an [`super::AgentTrace`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpan {
    pub name: String,
    pub kind: SpanKind,
    pub parent: Option<SpanContext>,
    pub start_time: u64,
    pub end_time: u64,
    pub status: SpanStatus,
    pub context: SpanContext,
    pub attributes: Attributes,
    #[serde(default)]
    pub links: Vec<SpanLink>,
    #[serde(default)]
    pub events: Vec<SpanEvent>,
    #[serde(default)]
    pub resource: Resource,
}

impl AgentSpan {
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn str_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.str_attribute(gen_ai::OPERATION_NAME)
    }

    /// Identifier of the run that created this span
    pub fn run_id(&self) -> Option<&str> {
        self.str_attribute(RUN_ID)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.end_time.saturating_sub(self.start_time))
    }

    /// Whether this is the top-level `invoke_agent` span of a run
    pub fn is_agent_invocation(&self) -> bool {
        self.kind == SpanKind::Internal && self.operation_name() == Some(operation::INVOKE_AGENT)
    }

    /// Whether this span records a call to an LLM
    pub fn is_llm_call(&self) -> bool {
        self.kind == SpanKind::Client && self.operation_name() == Some(operation::CALL_LLM)
    }

    /// Whether this span records the execution of a tool
    pub fn is_tool_execution(&self) -> bool {
        self.kind == SpanKind::Internal && self.operation_name() == Some(operation::EXECUTE_TOOL)
    }
}
