//! Search-index records built from the enriched catalogs.
//!
//! Publishing is done by an external tool; this module only prepares the
//! records and writes them as numbered batch files.

use std::path::{Path, PathBuf};

use chrono::DateTime;
use serde::Serialize;
use tracing::{info, instrument, warn};

use partscatalog_shared::{
    CatalogEntry, CatalogError, Category, EnrichedComponent, Platforms, Result,
};
use partscatalog_storage::CatalogStore;

use crate::html::encode_entities;

/// One search-index record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub name: String,
    pub repo: String,
    pub github_user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_name: Option<String>,
    /// HTML-encoded, for browsing.
    pub description: String,
    /// Encoded twice, for highlighted search results.
    #[serde(rename = "description_encoded")]
    pub description_encoded: String,
    pub keywords: Vec<String>,
    /// Unix milliseconds; absent when the stored timestamp is unreadable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
    pub downloads: u64,
    pub latest_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Platforms>,
    #[serde(rename = "type")]
    pub category: Category,
}

impl SearchRecord {
    pub fn new(component: &EnrichedComponent, category: Category) -> Self {
        let description = encode_entities(&component.description);
        let description_encoded = encode_entities(&description);

        Self {
            name: component.name.clone(),
            repo: component.repo.clone(),
            github_user: component.github_user.clone(),
            github_name: component.github_name.clone(),
            description,
            description_encoded,
            keywords: split_keywords(&component.keywords),
            modified: DateTime::parse_from_rfc3339(&component.modified)
                .ok()
                .map(|dt| dt.timestamp_millis()),
            stars: component.stars,
            downloads: component.downloads,
            latest_version: component.latest_version.clone(),
            platforms: component.platforms.clone(),
            category,
        }
    }
}

fn split_keywords(keywords: &str) -> Vec<String> {
    keywords
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

/// Records for every enriched entry of one category. Fallback entries are
/// skipped.
pub fn category_records(entries: &[CatalogEntry], category: Category) -> Vec<SearchRecord> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            CatalogEntry::Enriched(component) => Some(SearchRecord::new(component, category)),
            CatalogEntry::Ref(component) => {
                warn!(name = %component.name, %category, "not enriched, left out of the index");
                None
            }
        })
        .collect()
}

/// Write `records` as `batch-0001.json`, `batch-0002.json`, ... under `out_dir`.
pub fn write_batches(
    records: &[SearchRecord],
    chunk_size: usize,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if chunk_size == 0 {
        return Err(CatalogError::validation("chunk size must be at least 1"));
    }
    std::fs::create_dir_all(out_dir).map_err(|e| CatalogError::io(out_dir, e))?;

    records
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, chunk)| {
            let path = out_dir.join(format!("batch-{:04}.json", i + 1));
            let json = serde_json::to_string(chunk)
                .map_err(|e| CatalogError::Storage(format!("JSON serialization failed: {e}")))?;
            std::fs::write(&path, json).map_err(|e| CatalogError::io(&path, e))?;
            Ok(path)
        })
        .collect()
}

/// Summary of an index export.
#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub records: usize,
    pub batches: Vec<PathBuf>,
}

/// Build the records of both categories (web first) and write them in batches.
#[instrument(skip_all, fields(out_dir = %out_dir.display(), chunk_size = chunk_size))]
pub fn run_index(store: &CatalogStore, out_dir: &Path, chunk_size: usize) -> Result<IndexSummary> {
    let mut records = Vec::new();
    for category in [Category::Web, Category::Native] {
        let entries = store.load_enriched(category)?;
        records.extend(category_records(&entries, category));
    }

    let batches = write_batches(&records, chunk_size, out_dir)?;
    info!(records = records.len(), batches = batches.len(), "wrote index batches");

    Ok(IndexSummary {
        records: records.len(),
        batches,
    })
}
