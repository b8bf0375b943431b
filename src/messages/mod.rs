//! Output message protocol
//!
//! Everything the tap produces goes to a single stream-oriented channel as
//! one JSON object per line: RECORD messages carry extracted rows, SCHEMA
//! messages describe them, and STATE messages carry the progress document
//! a downstream consumer hands back as the next run's input state.

mod types;
mod writer;

pub use types::Message;
pub use writer::{stdout_sink, JsonLinesSink, MessageSink, VecSink};
