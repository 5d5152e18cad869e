//! Model pricing and per-call cost computation

use crate::error::{AgentweaveError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Dollar price per token for one model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input: f64,
    pub output: f64,
}

impl ModelPrice {
    pub fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

/// Dollar cost of one LLM call
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CallCost {
    pub input_cost: f64,
    pub output_cost: f64,
}

const DEFAULT_PRICES: &[(&str, f64, f64)] = &[
    ("gpt-4.1", 2.0e-6, 8.0e-6),
    ("gpt-4.1-mini", 0.4e-6, 1.6e-6),
    ("gpt-4.1-nano", 0.1e-6, 0.4e-6),
    ("gpt-4o", 2.5e-6, 10.0e-6),
    ("gpt-4o-mini", 0.15e-6, 0.6e-6),
    ("o3", 2.0e-6, 8.0e-6),
    ("o4-mini", 1.1e-6, 4.4e-6),
    ("claude-3-5-haiku-latest", 0.8e-6, 4.0e-6),
    ("claude-3-7-sonnet-latest", 3.0e-6, 15.0e-6),
    ("claude-sonnet-4", 3.0e-6, 15.0e-6),
    ("gemini-2.0-flash", 0.1e-6, 0.4e-6),
    ("gemini-2.5-flash", 0.3e-6, 2.5e-6),
    ("gemini-2.5-pro", 1.25e-6, 10.0e-6),
    ("mistral-small-latest", 0.1e-6, 0.3e-6),
];

// provider prefix, bare id, optional release date
static MODEL_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^/]+/)?(?P<id>.+?)(?:-\d{4}-\d{2}-\d{2})?$").expect("model id pattern is valid")
});

/// Per-model token prices
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    prices: HashMap<String, ModelPrice>,
}

impl Default for PricingTable {
    fn default() -> Self {
        let prices = DEFAULT_PRICES
            .iter()
            .map(|(model, input, output)| (model.to_string(), ModelPrice::new(*input, *output)))
            .collect();
        Self { prices }
    }
}

impl PricingTable {
    /// A table with no prices at all
    pub fn empty() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    /// Built-in prices overridden by the entries of a JSON file
    ///
    /// The file maps model ids to `{"input": f64, "output": f64}` objects.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let overrides: HashMap<String, ModelPrice> = serde_json::from_str(&raw).map_err(|e| {
            AgentweaveError::ConfigError(format!("pricing file {}: {}", path.display(), e))
        })?;

        debug!("Loaded {} model prices from {}", overrides.len(), path.display());
        let mut table = Self::default();
        table.prices.extend(overrides);
        Ok(table)
    }

    /// Load from `path` when given, falling back to the built-in prices on error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::from_file(path).unwrap_or_else(|e| {
                warn!("Using built-in model prices: {}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn insert(&mut self, model: impl Into<String>, price: ModelPrice) {
        self.prices.insert(model.into(), price);
    }

    pub fn with_price(mut self, model: impl Into<String>, price: ModelPrice) -> Self {
        self.insert(model, price);
        self
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Price of `model`, trying the exact id first and then the id without its provider
    /// prefix and date suffix
    pub fn price(&self, model: &str) -> Option<ModelPrice> {
        if let Some(price) = self.prices.get(model) {
            return Some(*price);
        }

        let normalized = MODEL_ID_PATTERN
            .captures(model)
            .and_then(|caps| caps.name("id"))
            .map(|m| m.as_str())?;
        self.prices.get(normalized).copied()
    }
}

/// Cost of one call, or `None` when neither token count is known
///
/// A missing count costs nothing on its side. Unknown models cost nothing at all.
pub fn compute_cost_info(
    table: &PricingTable,
    model: &str,
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
) -> Option<CallCost> {
    if input_tokens.is_none() && output_tokens.is_none() {
        return None;
    }

    let price = table.price(model).unwrap_or_else(|| {
        debug!("No price known for model {}", model);
        ModelPrice::default()
    });

    Some(CallCost {
        input_cost: input_tokens.unwrap_or(0) as f64 * price.input,
        output_cost: output_tokens.unwrap_or(0) as f64 * price.output,
    })
}
