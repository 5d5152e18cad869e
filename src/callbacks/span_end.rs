use super::context::Context;
use crate::tracer::AgentSpan;
use tracing::debug;

/// Ends the current span and records it in its run
///
/// Always the last step of an after-event chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpanEndCallback;

impl SpanEndCallback {
    pub fn new() -> Self {
        Self
    }

    /// End `context.current_span`, append it to the run's trace and export it
    pub fn end_span(&self, context: Context<'_>) -> AgentSpan {
        let Context {
            current_span, run, ..
        } = context;

        let span = current_span.end();
        debug!("Span '{}' ended for run {}", span.name, run.run_id());
        run.record(span.clone());
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::native::openai;
    use crate::engine::{EngineEvent, NativeEvent};
    use crate::tracer::{MemorySink, SpanExporter, SpanKind};
    use std::sync::Arc;

    #[test]
    fn test_end_span_records_and_exports() {
        let sink = Arc::new(MemorySink::new());
        let exporter = Arc::new(SpanExporter::new(vec![sink.clone()]));
        let run = exporter.begin_run(None);
        let event = NativeEvent::OpenAi(EngineEvent::ToolResult(openai::ToolResult::default()));

        let context = Context::new(run.start_span("execute_tool search", SpanKind::Internal), run.clone(), &event);
        let span = SpanEndCallback::new().end_span(context);

        assert!(span.end_time >= span.start_time);
        assert_eq!(run.span_count(), 1);
        assert_eq!(sink.spans(), vec![span]);
    }
}
