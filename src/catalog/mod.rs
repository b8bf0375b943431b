//! Catalog of available streams
//!
//! The catalog describes every stream the tap can extract, with a JSON
//! schema and metadata entries keyed by breadcrumb (scope path). Assigning
//! a catalog to the run context is what determines which streams are
//! active for the run.

mod types;

pub use types::{Catalog, CatalogEntry, MetadataEntry, MetadataMap};
