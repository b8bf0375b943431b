//! Sync orchestration
//!
//! A `Tap` owns the set of streams a connector knows about. Discovery
//! turns that set into a catalog; sync walks the catalog-selected streams
//! sequentially, threading one `RunContext` through all of them.

mod rest;

pub use rest::RestStream;

use crate::catalog::{Catalog, CatalogEntry, MetadataEntry};
use crate::config::TapConfig;
use crate::context::RunContext;
use crate::error::Result;
use crate::types::{JsonValue, ReplicationMethod};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};


/// One extractable stream
#[async_trait]
pub trait Stream: Send + Sync {
    /// Unique stream identifier
    fn stream_id(&self) -> &str;

    /// JSON schema advertised at discovery
    fn schema(&self) -> JsonValue;

    /// Primary key fields
    fn key_properties(&self) -> Vec<String>;

    /// Field used as the incremental bookmark, if any
    fn replication_key(&self) -> Option<&str> {
        None
    }

    /// Whether this stream runs regardless of explicit selection
    fn automatic(&self) -> bool {
        false
    }

    /// Extract the stream's records, checkpointing through the context.
    /// Returns the number of records emitted.
    async fn sync(&self, ctx: &mut RunContext) -> Result<usize>;
}

/// A connector: the full set of known streams
pub struct Tap {
    streams: Vec<Box<dyn Stream>>,
}

impl Tap {
    /// Create a tap over an explicit stream set
    pub fn new(streams: Vec<Box<dyn Stream>>) -> Self {
        Self { streams }
    }

    /// Build a tap from the declarative stream table in config
    pub fn from_config(config: &TapConfig) -> Self {
        let streams = config
            .streams
            .iter()
            .cloned()
            .map(|def| Box::new(RestStream::new(def)) as Box<dyn Stream>)
            .collect();
        Self { streams }
    }

    /// The known streams
    pub fn streams(&self) -> &[Box<dyn Stream>] {
        &self.streams
    }

    /// Produce the catalog of available streams
    pub fn discover(&self) -> Catalog {
        let streams = self
            .streams
            .iter()
            .map(|stream| {
                let mut root: HashMap<String, JsonValue> = HashMap::new();
                let inclusion = if stream.automatic() {
                    "automatic"
                } else {
                    "available"
                };
                root.insert("inclusion".to_string(), json!(inclusion));
                let method = if stream.replication_key().is_some() {
                    ReplicationMethod::Incremental
                } else {
                    ReplicationMethod::FullTable
                };
                root.insert("forced-replication-method".to_string(), json!(method));
                if let Some(key) = stream.replication_key() {
                    root.insert("replication-key".to_string(), json!(key));
                }

                CatalogEntry {
                    stream_id: stream.stream_id().to_string(),
                    schema: stream.schema(),
                    key_properties: stream.key_properties(),
                    selected: false,
                    metadata: vec![MetadataEntry::root(root)],
                }
            })
            .collect();

        Catalog { streams }
    }

    /// Sync every active stream, sequentially, checkpointing state after
    /// each one
    pub async fn sync(&self, ctx: &mut RunContext) -> Result<SyncStats> {
        let started = Instant::now();
        let mut stats = SyncStats::default();

        for stream in &self.streams {
            let stream_id = stream.stream_id();
            if !ctx.is_selected(stream_id) {
                debug!(stream = stream_id, "Stream not selected, skipping");
                stats.streams_skipped += 1;
                continue;
            }

            info!(stream = stream_id, "Syncing stream");
            ctx.write_schema(stream_id, stream.schema(), stream.key_properties())?;

            let records = stream.sync(ctx).await?;
            stats.records_synced += records;
            stats.streams_synced += 1;

            ctx.write_state()?;
            info!(stream = stream_id, records, "Stream complete");
        }

        stats.duration_ms = started.elapsed().as_millis() as u64;
        Ok(stats)
    }
}

/// Statistics from a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Streams that ran
    pub streams_synced: usize,
    /// Streams skipped as unselected
    pub streams_skipped: usize,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}
