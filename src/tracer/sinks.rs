//! Built-in span sinks

use super::exporter::SpanSink;
use super::span::AgentSpan;
use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Keeps every exported span in memory
#[derive(Default)]
pub struct MemorySink {
    spans: Mutex<Vec<AgentSpan>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<AgentSpan> {
        self.spans.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Exported spans stamped with `run_id`
    pub fn spans_for_run(&self, run_id: &str) -> Vec<AgentSpan> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|span| span.run_id() == Some(run_id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.spans.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.spans.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl SpanSink for MemorySink {
    fn export(&self, span: &AgentSpan) -> Result<()> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Writes each span as one JSON object per line
pub struct JsonlSink {
    writer: Mutex<Box<dyn Write + Send>>,
    path: Option<PathBuf>,
}

impl JsonlSink {
    pub const FILE_NAME: &'static str = "spans.jsonl";

    /// Append to the file at `path`, creating it if needed
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!("Writing spans to {}", path.display());
        Ok(Self {
            writer: Mutex::new(Box::new(BufWriter::new(file))),
            path: Some(path.to_path_buf()),
        })
    }

    /// Append to [`JsonlSink::FILE_NAME`] inside `dir`, creating the directory if needed
    pub fn in_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Self::create(dir.join(Self::FILE_NAME))
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl SpanSink for JsonlSink {
    fn export(&self, span: &AgentSpan) -> Result<()> {
        let line = serde_json::to_string(span)?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

/// Discards every span
///
/// Useful when only the returned [`super::AgentTrace`] matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl SpanSink for NullSink {
    fn export(&self, _span: &AgentSpan) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}
