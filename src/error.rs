//! Error types and result aliases for the agentweave library.
//!
//! This module defines the core error type [`AgentweaveError`], the [`Result`] type alias
//! used throughout the library, and [`AgentRunError`], which carries the partial trace
//! of a run that failed.

use crate::tracer::AgentTrace;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentweaveError {
    #[error("Engine error: {0}")]
    EngineError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Unsupported engine: {0}")]
    UnsupportedEngine(String),

    #[error("Span sink error: {0}")]
    SinkError(String),
}

pub type Result<T> = std::result::Result<T, AgentweaveError>;

/// Error returned by a failed agent run.
///
/// The spans that were finalized before the failure are kept in [`AgentRunError::trace`],
/// already sealed and tagged with the failed run's identifier.
#[derive(Error, Debug)]
#[error("Agent run failed: {source}")]
pub struct AgentRunError {
    trace: AgentTrace,
    #[source]
    source: AgentweaveError,
}

impl AgentRunError {
    pub fn new(trace: AgentTrace, source: AgentweaveError) -> Self {
        Self { trace, source }
    }

    /// The sealed partial trace of the failed run
    pub fn trace(&self) -> &AgentTrace {
        &self.trace
    }

    pub fn into_trace(self) -> AgentTrace {
        self.trace
    }

    pub fn cause(&self) -> &AgentweaveError {
        &self.source
    }
}
