//! Agent and tracing configuration

use crate::callbacks::Callback;
use crate::error::{AgentweaveError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_AGENT_NAME: &str = "agentweave";

/// Configuration of the agent being instrumented
#[derive(Clone)]
pub struct AgentConfig {
    pub name: String,
    pub description: Option<String>,
    pub model_id: Option<String>,
    pub instructions: Option<String>,
    /// Callbacks to run on every span, in order. `None` selects the defaults.
    pub callbacks: Option<Vec<Arc<dyn Callback>>>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_AGENT_NAME.to_string(),
            description: None,
            model_id: None,
            instructions: None,
            callbacks: None,
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("model_id", &self.model_id)
            .field("instructions", &self.instructions)
            .field("callbacks", &self.callbacks.as_ref().map(Vec::len))
            .finish()
    }
}

impl AgentConfig {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: Some(model_id.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_callbacks(mut self, callbacks: Vec<Arc<dyn Callback>>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }
}

/// How spans are reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Print a panel for every LLM call and tool execution
    pub console: bool,
    /// Directory to append spans to as JSON lines
    pub output_dir: Option<PathBuf>,
    /// JSON file overriding the built-in model prices
    pub pricing_file: Option<PathBuf>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            console: true,
            output_dir: None,
            pricing_file: None,
        }
    }
}

impl TracingConfig {
    pub const CONSOLE_VAR: &'static str = "AGENTWEAVE_CONSOLE";
    pub const TRACE_DIR_VAR: &'static str = "AGENTWEAVE_TRACE_DIR";
    pub const PRICING_FILE_VAR: &'static str = "AGENTWEAVE_PRICING_FILE";

    /// Quiet configuration: no console output, no files
    pub fn silent() -> Self {
        Self {
            console: false,
            ..Default::default()
        }
    }

    /// Read the configuration from the environment, loading `.env` first if present
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(Self::CONSOLE_VAR) {
            config.console = parse_flag(Self::CONSOLE_VAR, &value)?;
        }
        config.output_dir = lookup(Self::TRACE_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        config.pricing_file = lookup(Self::PRICING_FILE_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_pricing_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pricing_file = Some(path.into());
        self
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AgentweaveError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
