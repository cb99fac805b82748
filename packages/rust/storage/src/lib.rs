//! JSON file storage for the component catalogs.
//!
//! The [`CatalogStore`] owns a catalog directory laid out as:
//! ```text
//! <root>/
//! ├── components/
//! │   ├── react-web.json      (classified refs, category A)
//! │   ├── react-native.json   (classified refs, category B)
//! │   └── rejected.json       (rejection list)
//! └── data/
//!     ├── react-web.json      (enriched catalog, category A)
//!     ├── react-native.json   (enriched catalog, category B)
//!     └── docs.json           (rendered readmes)
//! ```
//!
//! **Access rules:**
//! - A missing file reads as an empty collection.
//! - Every write is serialized in memory first, written to a temp file next
//!   to the target and renamed over it, so readers never see a partial file.

mod audit;

use std::path::{Path, PathBuf};

use partscatalog_shared::{
    CatalogEntry, CatalogError, Category, ComponentRef, DocStore, RejectedEntry, RejectionSet,
    Result,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

pub use audit::{Violation, audit};

const COMPONENTS_DIR: &str = "components";
const DATA_DIR: &str = "data";
const REJECTED_FILE: &str = "rejected.json";
const DOCS_FILE: &str = "docs.json";

/// How a JSON file is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Two-space indented; for the hand-maintained lists.
    Pretty,
    /// Single line; for the large generated catalogs.
    Compact,
}

/// Handle to a catalog directory.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    root: PathBuf,
}

impl CatalogStore {
    /// Use `root` as the catalog directory. Nothing is created until a write.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the classified-refs list for a category.
    pub fn components_path(&self, category: Category) -> PathBuf {
        self.root
            .join(COMPONENTS_DIR)
            .join(format!("{}.json", category.file_stem()))
    }

    /// Path of the rejection list.
    pub fn rejected_path(&self) -> PathBuf {
        self.root.join(COMPONENTS_DIR).join(REJECTED_FILE)
    }

    /// Path of the enriched catalog for a category.
    pub fn enriched_path(&self, category: Category) -> PathBuf {
        self.root
            .join(DATA_DIR)
            .join(format!("{}.json", category.file_stem()))
    }

    /// Path of the documentation mapping.
    pub fn docs_path(&self) -> PathBuf {
        self.root.join(DATA_DIR).join(DOCS_FILE)
    }

    // -----------------------------------------------------------------------
    // Classified refs
    // -----------------------------------------------------------------------

    pub fn load_components(&self, category: Category) -> Result<Vec<ComponentRef>> {
        read_json_or_default(&self.components_path(category))
    }

    pub fn save_components(&self, category: Category, components: &[ComponentRef]) -> Result<()> {
        write_json_atomic(&self.components_path(category), components, Layout::Pretty)?;
        info!(%category, count = components.len(), "saved component list");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Rejection list
    // -----------------------------------------------------------------------

    pub fn load_rejected(&self) -> Result<RejectionSet> {
        let entries: Vec<RejectedEntry> = read_json_or_default(&self.rejected_path())?;
        Ok(RejectionSet::from(entries))
    }

    // -----------------------------------------------------------------------
    // Enriched catalogs
    // -----------------------------------------------------------------------

    pub fn load_enriched(&self, category: Category) -> Result<Vec<CatalogEntry>> {
        read_json_or_default(&self.enriched_path(category))
    }

    pub fn save_enriched(&self, category: Category, entries: &[CatalogEntry]) -> Result<()> {
        write_json_atomic(&self.enriched_path(category), entries, Layout::Compact)?;
        info!(%category, count = entries.len(), "saved enriched catalog");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Documentation
    // -----------------------------------------------------------------------

    pub fn load_docs(&self) -> Result<DocStore> {
        read_json_or_default(&self.docs_path())
    }

    pub fn save_docs(&self, docs: &DocStore) -> Result<()> {
        write_json_atomic(&self.docs_path(), docs, Layout::Pretty)?;
        debug!(count = docs.len(), "saved docs");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read a JSON file, treating a missing file as `T::default()`.
fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "file not found, starting empty");
            return Ok(T::default());
        }
        Err(e) => return Err(CatalogError::io(path, e)),
    };

    serde_json::from_str(&content)
        .map_err(|e| CatalogError::parse(format!("invalid JSON in {}: {e}", path.display())))
}

/// Serialize `data` fully, then write it to a temp file and rename it into place.
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, data: &T, layout: Layout) -> Result<()> {
    let json = match layout {
        Layout::Pretty => serde_json::to_string_pretty(data),
        Layout::Compact => serde_json::to_string(data),
    }
    .map_err(|e| CatalogError::Storage(format!("JSON serialization failed: {e}")))?;

    let parent = path
        .parent()
        .ok_or_else(|| CatalogError::Storage(format!("no parent directory: {}", path.display())))?;
    std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CatalogError::Storage(format!("bad file name: {}", path.display())))?;
    let temp = parent.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, json).map_err(|e| CatalogError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| CatalogError::io(path, e))?;

    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}
