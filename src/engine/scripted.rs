//! Deterministic engine driver
//!
//! [`ScriptedEngine`] stands in for a real framework: it replays a script of model and
//! tool calls through the agent's hook slots, exactly as the framework would report
//! them, without talking to any model.

use super::{EngineDriver, EngineSession, NativeEvent};
use crate::error::{AgentweaveError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One step of a script
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// A model call: request before, response after
    Model { request: NativeEvent, response: NativeEvent },
    /// A tool execution: call before, result after
    Tool { call: NativeEvent, result: NativeEvent },
    /// The engine fails at this point
    Fail(String),
}

/// Steps to replay for one prompt, and the answer to give at the end
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
    pub final_output: String,
}

impl Script {
    pub fn new(final_output: impl Into<String>) -> Self {
        Self {
            steps: Vec::new(),
            final_output: final_output.into(),
        }
    }

    pub fn model(mut self, request: NativeEvent, response: NativeEvent) -> Self {
        self.steps.push(ScriptStep::Model { request, response });
        self
    }

    pub fn tool(mut self, call: NativeEvent, result: NativeEvent) -> Self {
        self.steps.push(ScriptStep::Tool { call, result });
        self
    }

    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::Fail(message.into()));
        self
    }
}

type ScriptFn = Arc<dyn Fn(&str) -> Script + Send + Sync>;

/// Replays a prompt-dependent [`Script`]
#[derive(Clone)]
pub struct ScriptedEngine {
    script: ScriptFn,
    step_delay: Option<Duration>,
}

impl ScriptedEngine {
    /// Build the script for each prompt with `script`
    pub fn new(script: impl Fn(&str) -> Script + Send + Sync + 'static) -> Self {
        Self {
            script: Arc::new(script),
            step_delay: None,
        }
    }

    /// Replay the same script whatever the prompt
    pub fn fixed(script: Script) -> Self {
        Self::new(move |_| script.clone())
    }

    /// Sleep between the before-event and the after-event of every step
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = Some(delay);
        self
    }

    async fn pause(&self) {
        if let Some(delay) = self.step_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl EngineDriver for ScriptedEngine {
    async fn run(&self, prompt: &str, session: EngineSession) -> Result<String> {
        let script = (self.script)(prompt);
        debug!("Replaying {} steps for run {}", script.steps.len(), session.run().run_id());

        for step in &script.steps {
            match step {
                ScriptStep::Model { request, response } | ScriptStep::Tool { call: request, result: response } => {
                    let invocation = session.invocation();
                    session.fire(&invocation, request);
                    self.pause().await;
                    session.fire(&invocation, response);
                }
                ScriptStep::Fail(message) => {
                    return Err(AgentweaveError::EngineError(message.clone()));
                }
            }
        }

        Ok(script.final_output)
    }
}
