//! # tapflow
//!
//! A Rust-native framework for incremental REST API extraction with
//! durable, resumable state.
//!
//! A tap pulls records from a remote API and emits them as JSON-lines
//! messages (RECORD / SCHEMA / STATE) on stdout. Progress lives in a
//! state document of per-stream bookmarks (across-run high-water marks)
//! and offsets (within-run pagination cursors), so an interrupted run
//! resumes where it left off.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tapflow::{Catalog, RunContext, State, Tap, TapConfig};
//!
//! #[tokio::main]
//! async fn main() -> tapflow::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let catalog = Catalog::from_file("catalog.json")?;
//!
//!     let tap = Tap::from_config(&config);
//!     let mut ctx = RunContext::new(config, State::new())?;
//!     ctx.set_catalog(catalog);
//!
//!     let stats = tap.sync(&mut ctx).await?;
//!     eprintln!("synced {} records", stats.records_synced);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           Tap                               │
//! │   discover() → Catalog        sync(ctx) → SyncStats         │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┴───────────────────────────────┐
//! │                        RunContext                           │
//! │  config · state (bookmarks/offsets) · client · selection ·  │
//! │  cache · message sink                                       │
//! └──────────┬───────────────────┬──────────────────┬───────────┘
//!            │                   │                  │
//!        HTTP client      State document      Message output
//!     (retry, backoff,   (resume markers)    (RECORD/SCHEMA/
//!      rate limiting)                          STATE lines)
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the framework
pub mod error;

/// Common types and type aliases
pub mod types;

/// Timestamp parsing helpers
pub mod datetime;

/// Tap configuration
pub mod config;

/// Persisted sync progress (bookmarks and offsets)
pub mod state;

/// Catalog of available streams and their metadata
pub mod catalog;

/// The per-run shared context
pub mod context;

/// HTTP client with retry and rate limiting
pub mod http;

/// Output message protocol (RECORD / SCHEMA / STATE)
pub mod messages;

/// Stream trait, sync driver, and the generic REST stream
pub mod sync;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use catalog::Catalog;
pub use config::TapConfig;
pub use context::RunContext;
pub use error::{Error, Result};
pub use messages::Message;
pub use state::State;
pub use sync::{RestStream, Stream, SyncStats, Tap};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
