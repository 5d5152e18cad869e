use crate::engine::{EngineKind, NativeEvent};
use crate::tracer::{ActiveSpan, RunContext};
use serde_json::Value;
use std::collections::HashMap;

/// State handed from callback to callback for one hook invocation
///
/// `current_span` follows the semantic conventions for generative AI, so callbacks can
/// read the same attributes whatever the engine. `shared` is scratch space for passing
/// values between callbacks of the same chain; it is discarded afterwards.
#[derive(Debug)]
pub struct Context<'a> {
    pub current_span: ActiveSpan,
    pub run: RunContext,
    pub engine: EngineKind,
    /// The engine's payload for this hook invocation
    pub event: &'a NativeEvent,
    pub shared: HashMap<String, Value>,
}

impl<'a> Context<'a> {
    pub fn new(current_span: ActiveSpan, run: RunContext, event: &'a NativeEvent) -> Self {
        Self {
            current_span,
            run,
            engine: event.engine(),
            event,
            shared: HashMap::new(),
        }
    }
}
