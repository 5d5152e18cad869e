//! Callbacks run around every LLM call and tool execution
//!
//! A [`Callback`] receives the [`Context`] of a hook invocation, can read or enrich the
//! current span, and hands the context on. The [`CallbackPipeline`] runs the registered
//! callbacks in order and, on after-events, always finishes with [`SpanEndCallback`].
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use agentweave::callbacks::{Callback, Context};
//!
//! struct CountTools;
//!
//! impl Callback for CountTools {
//!     fn after_tool_execution<'a>(&self, context: Context<'a>) -> Context<'a> {
//!         tracing::info!("tool finished in run {}", context.run.run_id());
//!         context
//!     }
//! }
//! ```

pub mod context;
pub mod span_cost;
pub mod span_end;
pub mod span_print;

pub use context::Context;
pub use span_cost::AddCostInfo;
pub use span_end::SpanEndCallback;
pub use span_print::ConsolePrintSpan;

use crate::tracer::{AgentSpan, PricingTable};
use std::sync::Arc;

/// Hooks around LLM calls and tool executions
///
/// Every method defaults to passing the context through unchanged.
pub trait Callback: Send + Sync {
    /// Called when an LLM call starts
    fn before_llm_call<'a>(&self, context: Context<'a>) -> Context<'a> {
        context
    }

    /// Called when an LLM call has completed
    fn after_llm_call<'a>(&self, context: Context<'a>) -> Context<'a> {
        context
    }

    /// Called when a tool execution starts
    fn before_tool_execution<'a>(&self, context: Context<'a>) -> Context<'a> {
        context
    }

    /// Called when a tool execution has completed
    fn after_tool_execution<'a>(&self, context: Context<'a>) -> Context<'a> {
        context
    }
}

/// Callbacks used when none are configured
///
/// # Arguments
///
/// * `pricing` - Prices used for cost attributes
/// * `console` - Whether to print each span to stdout
pub fn default_callbacks(pricing: PricingTable, console: bool) -> Vec<Arc<dyn Callback>> {
    let mut callbacks: Vec<Arc<dyn Callback>> = vec![Arc::new(AddCostInfo::new(pricing))];
    if console {
        callbacks.push(Arc::new(ConsolePrintSpan::default()));
    }
    callbacks
}

/// Ordered callbacks followed by the span-ending step
#[derive(Clone)]
pub struct CallbackPipeline {
    callbacks: Vec<Arc<dyn Callback>>,
    span_end: SpanEndCallback,
}

impl CallbackPipeline {
    pub fn new(callbacks: Vec<Arc<dyn Callback>>) -> Self {
        Self {
            callbacks,
            span_end: SpanEndCallback::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn before_llm_call<'a>(&self, context: Context<'a>) -> Context<'a> {
        self.callbacks.iter().fold(context, |ctx, cb| cb.before_llm_call(ctx))
    }

    /// Run every callback, then end the span and record it
    pub fn after_llm_call(&self, context: Context<'_>) -> AgentSpan {
        let context = self.callbacks.iter().fold(context, |ctx, cb| cb.after_llm_call(ctx));
        self.span_end.end_span(context)
    }

    pub fn before_tool_execution<'a>(&self, context: Context<'a>) -> Context<'a> {
        self.callbacks
            .iter()
            .fold(context, |ctx, cb| cb.before_tool_execution(ctx))
    }

    /// Run every callback, then end the span and record it
    pub fn after_tool_execution(&self, context: Context<'_>) -> AgentSpan {
        let context = self
            .callbacks
            .iter()
            .fold(context, |ctx, cb| cb.after_tool_execution(ctx));
        self.span_end.end_span(context)
    }
}
