//! Persisted sync progress
//!
//! The state document is what makes runs resumable. It is keyed by stream
//! identifier, and each stream carries two independent namespaces:
//!
//! - `bookmarks` - high-water marks that survive across runs
//! - `offsets`   - pagination cursors for resuming within a run
//!
//! Offsets are cleared when a stream finishes a full page-walk; bookmarks
//! are never touched by that clearing.

mod types;

pub use types::{BookmarkValue, State, StreamState};
