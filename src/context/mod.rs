//! The per-run context
//!
//! `RunContext` is the collection of global objects a run needs: the
//! config, the mutable state shared among streams, the HTTP client, the
//! catalog-derived stream selection, and a scratch cache for data shared
//! between streams. One context is constructed per invocation, owned by
//! the run driver, and passed by reference to every stream.

use crate::catalog::Catalog;
use crate::config::TapConfig;
use crate::datetime;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::messages::{stdout_sink, Message, MessageSink};
use crate::state::{BookmarkValue, State};
use crate::types::{JsonValue, ValueMap};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info};

/// Shared run context for discovery and sync
pub struct RunContext {
    /// Immutable run configuration
    pub config: TapConfig,

    /// Mutable state shared among streams, flushed via `write_state`
    pub state: State,

    /// Scratch cache for ad hoc sharing of fetched data between streams.
    /// Lives and dies with this context; never persisted.
    pub cache: ValueMap,

    client: HttpClient,
    catalog: Option<Catalog>,
    selected_stream_ids: Option<HashSet<String>>,
    now: DateTime<Utc>,
    end_date: DateTime<Utc>,
    sink: Box<dyn MessageSink>,
}

impl RunContext {
    /// Create a context emitting messages to stdout
    pub fn new(config: TapConfig, state: State) -> Result<Self> {
        Self::with_sink(config, state, Box::new(stdout_sink()))
    }

    /// Create a context with an explicit output sink
    pub fn with_sink(
        config: TapConfig,
        state: State,
        sink: Box<dyn MessageSink>,
    ) -> Result<Self> {
        let now = Utc::now();
        let end_date = match config.end_date.as_deref() {
            Some(raw) => datetime::parse_timestamp(raw)?,
            None => now,
        };
        let client = HttpClient::from_config(&config)?;

        Ok(Self {
            config,
            state,
            cache: ValueMap::new(),
            client,
            catalog: None,
            selected_stream_ids: None,
            now,
            end_date,
            sink,
        })
    }

    /// The invocation timestamp, captured once at construction
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// End of the extraction window: `config.end_date` when supplied,
    /// otherwise the invocation timestamp. Stable for the whole run.
    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    /// The HTTP client streams use to talk to the remote API
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    // ========================================================================
    // Catalog & stream selection
    // ========================================================================

    /// Assign the catalog for a sync run, deriving the selected-stream set.
    ///
    /// A stream is active when it is explicitly selected, or when its root
    /// metadata scope marks `inclusion` as `"automatic"`. Assigned once per
    /// run, before any stream syncs.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        let selected: HashSet<String> = catalog
            .streams
            .iter()
            .filter(|entry| {
                entry.is_selected()
                    || entry.metadata_map().root_str("inclusion") == Some("automatic")
            })
            .map(|entry| entry.stream_id.clone())
            .collect();

        info!(streams = selected.len(), "Derived selected-stream set");
        self.selected_stream_ids = Some(selected);
        self.catalog = Some(catalog);
    }

    /// The assigned catalog, `None` during discovery
    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    /// Identifiers of the streams active for this run, `None` until a
    /// catalog is assigned
    pub fn selected_stream_ids(&self) -> Option<&HashSet<String>> {
        self.selected_stream_ids.as_ref()
    }

    /// Whether a stream is active for this run. Without a catalog no
    /// stream is active.
    pub fn is_selected(&self, stream_id: &str) -> bool {
        self.selected_stream_ids
            .as_ref()
            .is_some_and(|ids| ids.contains(stream_id))
    }

    // ========================================================================
    // Bookmarks
    // ========================================================================

    /// Read the bookmark at `(stream, marker)`, absent if never set
    pub fn get_bookmark(&self, stream: &str, marker: &str) -> Option<&JsonValue> {
        self.state.get_bookmark(stream, marker)
    }

    /// Write the bookmark at `(stream, marker)`, overwriting any previous
    /// value. Date-typed inputs are stored in their canonical string form.
    pub fn set_bookmark(&mut self, stream: &str, marker: &str, value: impl Into<BookmarkValue>) {
        self.state.set_bookmark(stream, marker, value);
    }

    // ========================================================================
    // Offsets
    // ========================================================================

    /// Read the offset at `(stream, marker)`; a stream that never had an
    /// offset written reads as absent, not as an error
    pub fn get_offset(&self, stream: &str, marker: &str) -> Option<&JsonValue> {
        self.state.get_offset(stream, marker)
    }

    /// Write the offset at `(stream, marker)`
    pub fn set_offset(&mut self, stream: &str, marker: &str, value: impl Into<JsonValue>) {
        self.state.set_offset(stream, marker, value);
    }

    /// Drop every offset for a stream, once its page-walk has completed
    /// and the in-progress cursor is no longer meaningful. Bookmarks are
    /// untouched.
    pub fn clear_offsets(&mut self, stream: &str) {
        self.state.clear_offsets(stream);
    }

    // ========================================================================
    // Start-date bootstrap
    // ========================================================================

    /// Establish where a stream's incremental window starts.
    ///
    /// Reads the bookmark at `(stream, marker)`; when unset, seeds it from
    /// `config.start_date` and flushes that initialization immediately, so
    /// a crash right after bootstrap resumes from the seeded value. Returns
    /// the effective value parsed to a timestamp. The bookmark is the
    /// resumption point: first run and every later run go through here.
    pub fn update_start_date_bookmark(
        &mut self,
        stream: &str,
        marker: &str,
    ) -> Result<DateTime<Utc>> {
        let raw = match self.state.get_bookmark(stream, marker).cloned() {
            Some(JsonValue::String(s)) if !s.is_empty() => s,
            None | Some(JsonValue::Null) | Some(JsonValue::String(_)) => {
                self.bootstrap_bookmark(stream, marker)?
            }
            Some(other) => {
                return Err(Error::date_parse(
                    other.to_string(),
                    "stored bookmark is not a string",
                ))
            }
        };

        datetime::parse_timestamp(&raw)
    }

    fn bootstrap_bookmark(&mut self, stream: &str, marker: &str) -> Result<String> {
        let start = self.config.start_date()?.to_string();
        self.state.set_bookmark(stream, marker, start.as_str());
        self.write_state()?;
        info!(stream, marker, start_date = %start, "Bootstrapped bookmark");
        Ok(start)
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Flush the current state document to the output channel.
    ///
    /// A pure hand-off: no batching, throttling, or deduplication. Callers
    /// checkpoint at safe points, typically after each page and after each
    /// stream completes.
    pub fn write_state(&mut self) -> Result<()> {
        debug!("Emitting state");
        self.sink.emit(&Message::state(self.state.clone()))
    }

    /// Emit a schema message for a stream
    pub fn write_schema(
        &mut self,
        stream: &str,
        schema: JsonValue,
        key_properties: Vec<String>,
    ) -> Result<()> {
        self.sink.emit(&Message::schema(stream, schema, key_properties))
    }

    /// Emit one extracted record
    pub fn write_record(&mut self, stream: &str, record: JsonValue) -> Result<()> {
        self.sink.emit(&Message::record(stream, record))
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("state", &self.state)
            .field("selected_stream_ids", &self.selected_stream_ids)
            .field("now", &self.now)
            .field("end_date", &self.end_date)
            .finish_non_exhaustive()
    }
}
