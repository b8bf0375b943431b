//! Tap configuration
//!
//! The config document is a JSON mapping supplied once per invocation. It
//! carries the extraction window (`start_date`, optional `end_date`), the
//! API connection settings, and the declarative stream table that drives
//! discovery and the generic REST streams.
//!
//! `start_date` is intentionally optional at parse time: its absence only
//! surfaces when a stream first bootstraps its bookmark.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a tap run, immutable once constructed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Start of the extraction window (ISO-8601). Required for incremental
    /// streams, validated at first bookmark bootstrap rather than here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// End of the extraction window (ISO-8601). Defaults to the run's
    /// creation timestamp when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// API key, sent as a bearer token when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for API requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// User agent override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Client-side rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Declarative stream definitions
    #[serde(default)]
    pub streams: Vec<StreamDef>,

    /// Any additional keys, kept so the config remains a full mapping
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            api_key: None,
            base_url: None,
            user_agent: None,
            request_timeout_seconds: default_timeout_seconds(),
            requests_per_second: default_requests_per_second(),
            streams: Vec::new(),
            extra: JsonObject::new(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_requests_per_second() -> u32 {
    10
}

impl TapConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("Failed to read config file {}: {e}", path.display()),
        })?;
        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config {
            message: format!("Failed to parse config JSON: {e}"),
        })
    }

    /// The required start of the extraction window.
    ///
    /// Fails with `MissingConfigField` when absent; callers hit this the
    /// first time a stream bootstraps its bookmark, not at startup.
    pub fn start_date(&self) -> Result<&str> {
        self.start_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::missing_field("start_date"))
    }

    /// Look up an arbitrary config key
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.extra.get(key)
    }

    /// Find a stream definition by id
    pub fn stream(&self, stream_id: &str) -> Option<&StreamDef> {
        self.streams.iter().find(|s| s.stream_id == stream_id)
    }
}

/// Declarative definition of one extractable stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDef {
    /// Unique stream identifier
    pub stream_id: String,

    /// API endpoint path
    pub path: String,

    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Field used as the incremental bookmark; full-table when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Envelope key holding the record array; the response body itself
    /// is expected to be an array when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_key: Option<String>,

    /// Page size requested from the API
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Whether the stream must run regardless of catalog selection
    #[serde(default)]
    pub automatic: bool,

    /// JSON schema advertised at discovery
    #[serde(default = "default_schema")]
    pub schema: JsonValue,
}

fn default_page_size() -> u32 {
    100
}

fn default_schema() -> JsonValue {
    serde_json::json!({ "type": "object" })
}
