//! State types for tracking sync progress
//!
//! These types are serialized to JSON, emitted as STATE messages, and
//! re-ingested as the input state of the next run.

use crate::types::JsonValue;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete persisted state for a run
///
/// Serializes as `{"<stream_id>": {"bookmarks": {...}, "offsets": {...}}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    /// Per-stream progress, keyed by stream identifier
    #[serde(flatten)]
    pub streams: HashMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.streams.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.streams.entry(stream.to_string()).or_default()
    }

    /// Get a bookmark value, absent if never set
    pub fn get_bookmark(&self, stream: &str, marker: &str) -> Option<&JsonValue> {
        self.streams.get(stream)?.bookmarks.get(marker)
    }

    /// Set a bookmark value, overwriting any previous one
    pub fn set_bookmark(&mut self, stream: &str, marker: &str, value: impl Into<BookmarkValue>) {
        self.get_stream_mut(stream)
            .bookmarks
            .insert(marker.to_string(), value.into().into_json());
    }

    /// Get an offset value, absent if the stream has no offsets or the
    /// marker is unset
    pub fn get_offset(&self, stream: &str, marker: &str) -> Option<&JsonValue> {
        self.streams.get(stream)?.offsets.get(marker)
    }

    /// Set an offset value, creating the namespace if absent
    pub fn set_offset(&mut self, stream: &str, marker: &str, value: impl Into<JsonValue>) {
        self.get_stream_mut(stream)
            .offsets
            .insert(marker.to_string(), value.into());
    }

    /// Remove the entire offset namespace for a stream, leaving its
    /// bookmarks untouched
    pub fn clear_offsets(&mut self, stream: &str) {
        if let Some(stream_state) = self.streams.get_mut(stream) {
            stream_state.offsets.clear();
        }
    }
}

/// Progress for a single stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamState {
    /// Across-run high-water marks
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub bookmarks: HashMap<String, JsonValue>,

    /// Within-run pagination cursors
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub offsets: HashMap<String, JsonValue>,
}

/// A value being written to a bookmark
///
/// Structured date inputs normalize to their canonical string form before
/// storage, so the persisted document stays plain JSON text. Accessors that
/// need a structured value parse on read.
#[derive(Debug, Clone)]
pub enum BookmarkValue {
    /// A calendar date, stored as `YYYY-MM-DD`
    Date(NaiveDate),
    /// A full timestamp, stored as RFC 3339
    Timestamp(DateTime<Utc>),
    /// Any other JSON value, stored as-is
    Json(JsonValue),
}

impl BookmarkValue {
    /// The stored representation of this value
    pub fn into_json(self) -> JsonValue {
        match self {
            Self::Date(date) => JsonValue::String(date.format("%Y-%m-%d").to_string()),
            Self::Timestamp(ts) => JsonValue::String(ts.to_rfc3339()),
            Self::Json(value) => value,
        }
    }
}

impl From<NaiveDate> for BookmarkValue {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<Utc>> for BookmarkValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<&str> for BookmarkValue {
    fn from(value: &str) -> Self {
        Self::Json(JsonValue::String(value.to_string()))
    }
}

impl From<String> for BookmarkValue {
    fn from(value: String) -> Self {
        Self::Json(JsonValue::String(value))
    }
}

impl From<JsonValue> for BookmarkValue {
    fn from(value: JsonValue) -> Self {
        Self::Json(value)
    }
}
