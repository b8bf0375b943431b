//! Catalog types
//!
//! Metadata follows the breadcrumb convention: the root scope (an empty
//! breadcrumb) carries stream-level properties such as `selected`,
//! `inclusion`, and `replication-key`; field scopes are
//! `["properties", <field>]`.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A collection of stream descriptors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| crate::error::Error::Catalog {
            message: format!("Failed to read catalog file {}: {e}", path.display()),
        })?;
        Self::from_json(&contents)
    }

    /// Parse a catalog from a JSON string
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::error::Error::Catalog {
            message: format!("Failed to parse catalog JSON: {e}"),
        })
    }

    /// Find an entry by stream id
    pub fn get_stream(&self, stream_id: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.stream_id == stream_id)
    }
}

/// Descriptor for one stream in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique stream identifier
    pub stream_id: String,

    /// JSON schema for the stream's records
    #[serde(default)]
    pub schema: JsonValue,

    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Explicit selection flag
    #[serde(default)]
    pub selected: bool,

    /// Metadata entries keyed by breadcrumb
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl CatalogEntry {
    /// Whether this stream was explicitly selected, either via the
    /// stream-level flag or `selected: true` at the root metadata scope
    pub fn is_selected(&self) -> bool {
        if self.selected {
            return true;
        }
        self.metadata_map()
            .root("selected")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Build the breadcrumb-keyed metadata lookup for this entry
    pub fn metadata_map(&self) -> MetadataMap {
        MetadataMap::from_entries(&self.metadata)
    }
}

/// One metadata entry, scoped by breadcrumb
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Scope path: empty for the stream root, `["properties", <field>]`
    /// for a field
    #[serde(default)]
    pub breadcrumb: Vec<String>,

    /// Properties at this scope
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

impl MetadataEntry {
    /// Create a root-scope entry
    pub fn root(metadata: HashMap<String, JsonValue>) -> Self {
        Self {
            breadcrumb: Vec::new(),
            metadata,
        }
    }
}

/// Lookup table over metadata entries, keyed by (breadcrumb, property)
///
/// Lookups on scopes or properties that were never written return `None`
/// rather than failing; an absent entry is the normal "no metadata" case.
#[derive(Debug, Clone, Default)]
pub struct MetadataMap {
    entries: HashMap<Vec<String>, HashMap<String, JsonValue>>,
}

impl MetadataMap {
    /// Build the map from a list of entries. Later entries for the same
    /// breadcrumb win.
    pub fn from_entries(entries: &[MetadataEntry]) -> Self {
        let mut map: HashMap<Vec<String>, HashMap<String, JsonValue>> = HashMap::new();
        for entry in entries {
            map.entry(entry.breadcrumb.clone())
                .or_default()
                .extend(entry.metadata.clone());
        }
        Self { entries: map }
    }

    /// Look up a property at a scope, `None` on any miss
    pub fn get(&self, breadcrumb: &[impl AsRef<str>], key: &str) -> Option<&JsonValue> {
        let breadcrumb: Vec<String> = breadcrumb
            .iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        self.entries.get(&breadcrumb)?.get(key)
    }

    /// Look up a string property at a scope
    pub fn get_str(&self, breadcrumb: &[impl AsRef<str>], key: &str) -> Option<&str> {
        self.get(breadcrumb, key).and_then(JsonValue::as_str)
    }

    /// Look up a property at the root (stream-level) scope
    pub fn root(&self, key: &str) -> Option<&JsonValue> {
        let root: Vec<String> = Vec::new();
        self.entries.get(&root)?.get(key)
    }

    /// Look up a string property at the root scope
    pub fn root_str(&self, key: &str) -> Option<&str> {
        self.root(key).and_then(JsonValue::as_str)
    }
}
