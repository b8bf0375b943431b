//! Message types
//!
//! Each message is a JSON object tagged by a `type` field with
//! SCREAMING-CASE values, so downstream consumers can route lines without
//! schema knowledge.

use crate::state::State;
use crate::types::JsonValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message emitted during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// An extracted record
    #[serde(rename = "RECORD")]
    Record {
        /// Stream the record belongs to
        stream: String,
        /// The record payload
        record: JsonValue,
        /// When the record was extracted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_extracted: Option<DateTime<Utc>>,
    },

    /// Schema for a stream's records
    #[serde(rename = "SCHEMA")]
    Schema {
        /// Stream the schema describes
        stream: String,
        /// JSON schema
        schema: JsonValue,
        /// Primary key fields
        #[serde(default)]
        key_properties: Vec<String>,
    },

    /// The full progress document
    #[serde(rename = "STATE")]
    State {
        /// State payload
        value: State,
    },
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, record: JsonValue) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Some(Utc::now()),
        }
    }

    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: JsonValue,
        key_properties: Vec<String>,
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties,
        }
    }

    /// Create a state message
    pub fn state(value: State) -> Self {
        Self::State { value }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}
