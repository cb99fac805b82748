//! Catalog pipelines and domain logic.
//!
//! This crate ties the classifier, the remote fetcher and the catalog store
//! together into the end-to-end runs used by the CLI:
//! - [`classify::run_classify`] — registry dump → new component refs
//! - [`enrich::run_fetch`] — component refs → enriched catalog + docs
//! - [`index::run_index`] — enriched catalogs → search-index batches

pub mod announce;
pub mod classify;
pub mod docs;
pub mod enrich;
pub mod html;
pub mod index;
pub mod merge;

pub use classify::{ClassifyOutcome, RegistryDump, run_classify};
pub use docs::{PreformattedRenderer, ReadmeRenderer};
pub use enrich::{
    FetchOutcome, FetchProgress, FetchRequest, FetchSummary, SilentFetchProgress, Slice,
    run_fetch,
};
pub use index::{IndexSummary, SearchRecord, run_index};
pub use merge::merge;
