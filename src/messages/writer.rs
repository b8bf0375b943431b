//! Message emission
//!
//! `MessageSink` is the narrow interface between the run and its output
//! channel. The production sink writes JSON lines to stdout; tests swap in
//! `VecSink` to capture what a run emitted.

use super::types::Message;
use crate::error::{Error, Result};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Destination for emitted messages
pub trait MessageSink: Send {
    /// Hand one message to the output channel
    fn emit(&mut self, message: &Message) -> Result<()>;
}

/// Sink writing one JSON object per line to any writer
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Create a sink over a writer
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the sink, returning the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> MessageSink for JsonLinesSink<W> {
    fn emit(&mut self, message: &Message) -> Result<()> {
        let line = serde_json::to_string(message)?;
        writeln!(self.out, "{line}").map_err(|e| Error::Output {
            message: format!("Failed to write message: {e}"),
        })?;
        self.out.flush().map_err(|e| Error::Output {
            message: format!("Failed to flush output: {e}"),
        })?;
        Ok(())
    }
}

/// Sink writing to the process's standard output
pub fn stdout_sink() -> JsonLinesSink<std::io::Stdout> {
    JsonLinesSink::new(std::io::stdout())
}

/// In-memory capture sink
///
/// Cloning yields another handle to the same buffer, so a test can keep
/// one handle while the run context owns the other.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    messages: Arc<Mutex<Vec<Message>>>,
}

impl VecSink {
    /// Create an empty capture sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages, in emission order
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// The captured state messages, in emission order
    pub fn states(&self) -> Vec<Message> {
        self.messages()
            .into_iter()
            .filter(Message::is_state)
            .collect()
    }

    /// The captured record messages, in emission order
    pub fn records(&self) -> Vec<Message> {
        self.messages()
            .into_iter()
            .filter(Message::is_record)
            .collect()
    }
}

impl MessageSink for VecSink {
    fn emit(&mut self, message: &Message) -> Result<()> {
        self.messages
            .lock()
            .map_err(|_| Error::output("capture sink lock poisoned"))?
            .push(message.clone());
        Ok(())
    }
}
