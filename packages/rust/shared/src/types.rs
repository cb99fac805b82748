//! Core domain types for the parts catalog.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The two mutually exclusive component categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// General-purpose web components.
    Web,
    /// Native mobile components.
    Native,
}

impl Category {
    /// Both categories, in classification priority order (specialized first).
    pub const PRIORITY: [Category; 2] = [Category::Native, Category::Web];

    /// Label used when tagging search-index records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Native => "native",
        }
    }

    /// File stem of the catalog files for this category.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Web => "react-web",
            Self::Native => "react-native",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = crate::CatalogError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "web" | "react-web" => Ok(Self::Web),
            "native" | "react-native" => Ok(Self::Native),
            other => Err(crate::CatalogError::validation(format!(
                "unknown category '{other}': expected 'web' or 'native'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog records
// ---------------------------------------------------------------------------

/// Minimal classified component: a name and the repository it lives in.
///
/// Unknown fields are rejected so a damaged enriched record fails to load
/// instead of being read back as a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentRef {
    /// Registry package name (unique key).
    pub name: String,
    /// `owner/project` shorthand of the forge repository.
    pub repo: String,
    /// Description as published when the component was classified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hand-written description that replaces the published one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_description: Option<String>,
}

/// Whether `repo` has the `owner/project` form.
pub fn is_short_repo(repo: &str) -> bool {
    matches!(
        repo.split_once('/'),
        Some((owner, project)) if !owner.is_empty() && !project.is_empty() && !project.contains('/')
    )
}

impl ComponentRef {
    /// Forge owner and project, split from `repo`.
    pub fn repo_parts(&self) -> (&str, &str) {
        self.repo.split_once('/').unwrap_or((self.repo.as_str(), ""))
    }
}

/// Platform flags of a native component. Only `true` flags are serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platforms {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub android: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ios: bool,
}

/// A component with metadata gathered from the registry, forge and stats sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedComponent {
    pub name: String,
    pub repo: String,
    pub github_user: String,
    /// Omitted when equal to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_name: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Comma-joined keyword list of the latest version.
    #[serde(default)]
    pub keywords: String,
    /// ISO 8601 timestamp of the last registry modification.
    pub modified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
    pub downloads: u64,
    pub latest_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Platforms>,
}

/// One element of a persisted enriched catalog.
///
/// Fallback records (components whose enrichment failed) are stored as plain
/// [`ComponentRef`]s next to the enriched ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Enriched(EnrichedComponent),
    Ref(ComponentRef),
}

impl CatalogEntry {
    /// The unique key of this entry.
    pub fn name(&self) -> &str {
        match self {
            Self::Enriched(c) => &c.name,
            Self::Ref(c) => &c.name,
        }
    }
}

impl From<EnrichedComponent> for CatalogEntry {
    fn from(c: EnrichedComponent) -> Self {
        Self::Enriched(c)
    }
}

impl From<ComponentRef> for CatalogEntry {
    fn from(c: ComponentRef) -> Self {
        Self::Ref(c)
    }
}

/// Rendered documentation HTML keyed by component name.
pub type DocStore = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// RejectionSet
// ---------------------------------------------------------------------------

/// An entry of the maintained rejection list (`{"name": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedEntry {
    pub name: String,
}

/// Names that must never appear in any catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionSet {
    names: HashSet<String>,
}

impl RejectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl From<Vec<RejectedEntry>> for RejectionSet {
    fn from(entries: Vec<RejectedEntry>) -> Self {
        entries.into_iter().map(|e| e.name).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for RejectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Keyword grammar
// ---------------------------------------------------------------------------

/// One branch of a keyword grammar.
///
/// In configuration files a branch is either a string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Branch {
    /// A single term; finding it is enough.
    Term(String),
    /// A group of terms that must all be found for the same candidate.
    AllOf(Vec<String>),
}

impl Branch {
    pub fn term(term: impl Into<String>) -> Self {
        Self::Term(term.into())
    }

    pub fn all_of<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllOf(terms.into_iter().map(Into::into).collect())
    }
}

/// Ordered list of OR branches; e.g. `["foo", ["bar", "baz"]]` reads
/// `foo || (bar && baz)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grammar(pub Vec<Branch>);

impl Grammar {
    pub fn new(branches: Vec<Branch>) -> Self {
        Self(branches)
    }

    pub fn branches(&self) -> &[Branch] {
        &self.0
    }

    /// Default grammar for general-purpose (web) components.
    pub fn default_web() -> Self {
        Self(vec![
            Branch::term("react-component"),
            Branch::all_of(["react", "component"]),
        ])
    }

    /// Default grammar for native components.
    pub fn default_native() -> Self {
        Self(vec![
            Branch::term("react-native"),
            Branch::term("react-native-component"),
            Branch::all_of(["react-native", "component"]),
            Branch::all_of(["react-native", "react-component"]),
            Branch::all_of(["react", "native"]),
        ])
    }
}

// ---------------------------------------------------------------------------
// Registry documents
// ---------------------------------------------------------------------------

/// Readme marker the registry stores when a package has no readme.
pub const MISSING_README_MARKER: &str = "ERROR: No README data found!";

/// A package document as served by the registry (and stored in dumps).
///
/// Fields that do not have the expected shape are read as absent instead of
/// failing the whole document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryPackage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub time: RegistryTime,
    #[serde(default)]
    pub repository: Option<Value>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub versions: BTreeMap<String, Value>,
    #[serde(default, rename = "dist-tags", deserialize_with = "lenient_string_map")]
    pub dist_tags: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub readme: Option<String>,
    #[serde(default, rename = "readmeFilename", deserialize_with = "lenient_string")]
    pub readme_filename: Option<String>,
}

/// The `time` object of a registry document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryTime {
    #[serde(default, deserialize_with = "lenient_string")]
    pub created: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub modified: Option<String>,
}

/// Dependency kinds scanned when classifying by dependency names.
const DEPENDENCY_KINDS: [&str; 3] = ["dependencies", "peerDependencies", "devDependencies"];

impl RegistryPackage {
    /// URL of the declared VCS repository (`repository.url`).
    pub fn repository_url(&self) -> Option<&str> {
        self.repository.as_ref()?.get("url")?.as_str()
    }

    /// Parsed `time.modified`, if present and well-formed.
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.time.modified.as_deref()?)
    }

    /// Parsed `time.created`, if present and well-formed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.time.created.as_deref()?)
    }

    /// The `latest` dist-tag.
    pub fn latest_version(&self) -> Option<&str> {
        self.dist_tags.get("latest").map(String::as_str)
    }

    /// Keywords declared by the latest version record.
    pub fn latest_keywords(&self) -> Vec<String> {
        self.latest_version()
            .and_then(|v| self.versions.get(v))
            .and_then(|record| record.get("keywords"))
            .map(string_list)
            .unwrap_or_default()
    }

    /// Dependency name lists of every published version, one list per
    /// version and dependency kind.
    pub fn dependency_lists(&self) -> Vec<Vec<String>> {
        let mut lists = Vec::new();
        for record in self.versions.values() {
            for kind in DEPENDENCY_KINDS {
                if let Some(Value::Object(deps)) = record.get(kind) {
                    lists.push(deps.keys().cloned().collect());
                }
            }
        }
        lists
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Collect the string items of a JSON array, ignoring everything else.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|i| i.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(string_list(&Value::deserialize(d)?))
}

fn lenient_object<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, Value>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    })
}

fn lenient_string_map<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    })
}

fn lenient_time<'de, D: Deserializer<'de>>(d: D) -> Result<RegistryTime, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
