use super::context::Context;
use super::Callback;
use crate::tracer::attributes::gen_ai;
use crate::tracer::{compute_cost_info, ActiveSpan, PricingTable};
use serde_json::Value;
use std::sync::Arc;

/// Adds `gen_ai.usage.input_cost` and `gen_ai.usage.output_cost` to LLM call spans
#[derive(Debug, Clone)]
pub struct AddCostInfo {
    pricing: Arc<PricingTable>,
}

impl Default for AddCostInfo {
    fn default() -> Self {
        Self::new(PricingTable::default())
    }
}

impl AddCostInfo {
    pub fn new(pricing: PricingTable) -> Self {
        Self {
            pricing: Arc::new(pricing),
        }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Compute the cost of the call recorded in `span` and store it there
    ///
    /// Leaves the span untouched when it carries no token counts.
    pub fn add_cost_info(&self, span: &mut ActiveSpan) {
        let tokens = |key| span.attribute(key).and_then(Value::as_u64);
        let input_tokens = tokens(gen_ai::USAGE_INPUT_TOKENS);
        let output_tokens = tokens(gen_ai::USAGE_OUTPUT_TOKENS);
        let model = span
            .attribute(gen_ai::REQUEST_MODEL)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if let Some(cost) = compute_cost_info(&self.pricing, &model, input_tokens, output_tokens) {
            span.set_attributes([
                (gen_ai::USAGE_INPUT_COST, cost.input_cost),
                (gen_ai::USAGE_OUTPUT_COST, cost.output_cost),
            ]);
        }
    }
}

impl Callback for AddCostInfo {
    fn after_llm_call<'a>(&self, mut context: Context<'a>) -> Context<'a> {
        self.add_cost_info(&mut context.current_span);
        context
    }
}
