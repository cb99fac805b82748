//! Enrichment: fetch metadata for every component of a category, concurrently.
//!
//! Each component is an independent unit of work. All units are started at
//! once and joined; a unit whose lookups fail yields its original
//! [`ComponentRef`] instead of an [`EnrichedComponent`]. After the join the
//! results are merged into the stored catalog and written together with the
//! rendered docs.

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use partscatalog_fetcher::{Fetcher, LanguageBreakdown};
use partscatalog_shared::{
    CatalogEntry, CatalogError, Category, ComponentRef, DocStore, EnrichedComponent, Platforms,
    RegistryPackage, Result,
};
use partscatalog_storage::CatalogStore;

use crate::docs::{ReadmeRenderer, readme_source};
use crate::merge::merge;

// ---------------------------------------------------------------------------
// Slice
// ---------------------------------------------------------------------------

/// A 1-based window over a component list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    index: usize,
    size: usize,
}

impl Slice {
    /// Window `index` (starting at 1) of `size` items.
    pub fn new(index: usize, size: usize) -> Result<Self> {
        if index == 0 {
            return Err(CatalogError::validation("slice index starts at 1"));
        }
        if size == 0 {
            return Err(CatalogError::validation("slice size must be at least 1"));
        }
        Ok(Self { index, size })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The items in `[(index - 1) * size, index * size)`, clamped to `items`.
    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.index - 1).saturating_mul(self.size).min(items.len());
        let end = start.saturating_add(self.size).min(items.len());
        &items[start..end]
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of enriching one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Enriched(EnrichedComponent),
    /// Enrichment failed; the reference is kept as-is.
    Fallback(ComponentRef),
}

impl FetchOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Enriched(c) => &c.name,
            Self::Fallback(c) => &c.name,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

impl From<FetchOutcome> for CatalogEntry {
    fn from(outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Enriched(c) => CatalogEntry::Enriched(c),
            FetchOutcome::Fallback(c) => CatalogEntry::Ref(c),
        }
    }
}

/// Summary of a fetch run.
#[derive(Debug, Clone)]
pub struct FetchSummary {
    pub category: Category,
    /// Components in the category list.
    pub total: usize,
    /// Components processed in this run (the slice).
    pub processed: usize,
    pub enriched: usize,
    /// Names that fell back to their reference.
    pub fallbacks: Vec<String>,
    /// Entries in the enriched catalog after the merge.
    pub catalog_size: usize,
}

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Progress callback for enrichment.
pub trait FetchProgress: Send + Sync {
    /// Called once the number of components to process is known.
    fn started(&self, total: usize);
    /// Called once per component, success or fallback.
    fn item_done(&self, outcome: &FetchOutcome);
    /// Called after the catalog has been written.
    fn finished(&self, summary: &FetchSummary);
}

/// No-op fetch progress.
pub struct SilentFetchProgress;

impl FetchProgress for SilentFetchProgress {
    fn started(&self, _total: usize) {}
    fn item_done(&self, _outcome: &FetchOutcome) {}
    fn finished(&self, _summary: &FetchSummary) {}
}

// ---------------------------------------------------------------------------
// Deriving records
// ---------------------------------------------------------------------------

/// Lookup results for one component, as far as they succeeded.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub stars: Option<u64>,
    pub downloads: u64,
    /// Only looked up for native components.
    pub languages: Option<LanguageBreakdown>,
}

/// Build the enriched record of `component` from its registry document and
/// the other lookups.
///
/// Fails when the registry document lacks `dist-tags.latest` or
/// `time.modified`.
pub fn derive_component(
    component: &ComponentRef,
    pkg: &RegistryPackage,
    lookups: &Lookups,
) -> Result<EnrichedComponent> {
    let name = component.name.as_str();
    let latest_version = pkg
        .latest_version()
        .ok_or_else(|| CatalogError::parse(format!("{name}: registry record has no latest version")))?
        .to_string();
    let modified = pkg
        .time
        .modified
        .clone()
        .ok_or_else(|| CatalogError::parse(format!("{name}: registry record has no modified time")))?;

    let (github_user, github_name) = component.repo_parts();
    let keywords = pkg.latest_keywords().join(", ");

    let fetched = pkg.description.as_deref().unwrap_or_default().trim().to_string();
    if lookups.stars.is_none() {
        warn!(%name, "component has no stars");
    }
    if fetched.is_empty() {
        warn!(%name, "component has no description");
    }

    let description = match &component.custom_description {
        Some(custom) => {
            if component.description.as_deref() != Some(fetched.as_str()) {
                warn!(%name, new_description = %fetched, "published description changed, keeping custom description");
            }
            custom.trim().to_string()
        }
        None => fetched,
    };

    let platforms = lookups
        .languages
        .as_ref()
        .and_then(|languages| detect_platforms(languages, &keywords));

    Ok(EnrichedComponent {
        name: name.to_string(),
        repo: component.repo.clone(),
        github_user: github_user.to_string(),
        github_name: (github_name != name).then(|| github_name.to_string()),
        description: punctuate(description),
        keywords,
        modified,
        stars: lookups.stars,
        downloads: lookups.downloads,
        latest_version,
        platforms,
    })
}

/// End a non-empty description with a period unless it already ends with
/// `.`, `?` or `!`. Descriptions with characters above U+00FF are left alone.
pub fn punctuate(description: String) -> String {
    let ends_with_mark = description.ends_with(['.', '?', '!']);
    let wide = description.chars().any(|c| u32::from(c) > 0xFF);

    if description.is_empty() || ends_with_mark || wide {
        description
    } else {
        description + "."
    }
}

/// Platform flags from the language breakdown of a repository.
///
/// Java code means Android and Objective-C code means iOS. Only when one of
/// those is found do `android`/`ios` keywords add the other flag.
pub fn detect_platforms(languages: &LanguageBreakdown, keywords: &str) -> Option<Platforms> {
    let has = |language: &str| languages.get(language).is_some_and(|bytes| *bytes > 0);

    let mut platforms = Platforms {
        android: has("Java"),
        ios: has("Objective-C"),
    };
    if !platforms.android && !platforms.ios {
        return None;
    }

    let keywords = keywords.to_lowercase();
    platforms.android |= keywords.contains("android");
    platforms.ios |= keywords.contains("ios");
    Some(platforms)
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// An enriched record and the readme markdown of its package.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub component: EnrichedComponent,
    pub readme: String,
}

/// Enrich one component.
///
/// The registry lookup must succeed. A failed forge lookup leaves the star
/// count unknown, a failed language lookup leaves the platforms unset and a
/// failed download-statistics lookup counts as zero downloads.
pub async fn enrich_one(
    fetcher: &Fetcher,
    category: Category,
    component: &ComponentRef,
    today: NaiveDate,
) -> Result<Enrichment> {
    let name = component.name.as_str();

    let languages = async {
        match category {
            Category::Native => Some(fetcher.languages(&component.repo).await),
            Category::Web => None,
        }
    };
    let (pkg, repo, languages) = tokio::join!(
        fetcher.registry_package(name),
        fetcher.repository(&component.repo),
        languages
    );
    let pkg = pkg?;

    let stars = match repo {
        Ok(repo) => repo.stargazers_count,
        Err(e) => {
            warn!(%name, error = %e, "repository lookup failed, stars unknown");
            None
        }
    };
    let languages = match languages {
        Some(Ok(languages)) => Some(languages),
        Some(Err(e)) => {
            warn!(%name, error = %e, "language lookup failed, platforms unknown");
            None
        }
        None => None,
    };

    let downloads = match pkg.created_at() {
        Some(created) => fetcher
            .downloads(name, created.date_naive(), today)
            .await
            .unwrap_or_else(|e| {
                warn!(%name, error = %e, "download statistics unavailable");
                0
            }),
        None => {
            warn!(%name, "registry record has no creation time, downloads unknown");
            0
        }
    };

    let lookups = Lookups {
        stars,
        downloads,
        languages,
    };
    let enriched = derive_component(component, &pkg, &lookups)?;

    Ok(Enrichment {
        component: enriched,
        readme: readme_source(component, &pkg),
    })
}

/// Enrich every component concurrently and wait for all of them.
///
/// Returns one outcome per input (in input order) and the rendered docs of
/// the successfully enriched ones.
#[instrument(skip_all, fields(%category, count = components.len()))]
pub async fn enrich_all(
    fetcher: &Fetcher,
    category: Category,
    components: &[ComponentRef],
    renderer: &dyn ReadmeRenderer,
    progress: &dyn FetchProgress,
) -> (Vec<FetchOutcome>, DocStore) {
    let today = Utc::now().date_naive();

    let tasks = components.iter().map(|component| async move {
        let item = match enrich_one(fetcher, category, component, today).await {
            Ok(enrichment) => {
                let html = renderer.render(component, &enrichment.readme);
                (FetchOutcome::Enriched(enrichment.component), Some(html))
            }
            Err(e) => {
                warn!(name = %component.name, error = %e, "enrichment failed, keeping reference");
                (FetchOutcome::Fallback(component.clone()), None)
            }
        };
        progress.item_done(&item.0);
        item
    });

    let mut docs = DocStore::new();
    let outcomes = join_all(tasks)
        .await
        .into_iter()
        .map(|(outcome, html)| {
            if let Some(html) = html {
                docs.insert(outcome.name().to_string(), html);
            }
            outcome
        })
        .collect();

    (outcomes, docs)
}

// ---------------------------------------------------------------------------
// Fetch run
// ---------------------------------------------------------------------------

/// What to fetch.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest {
    pub category: Category,
    /// Restrict this run to one window of the component list.
    pub slice: Option<Slice>,
}

/// Enrich the components of a category and merge them into the stored
/// enriched catalog.
///
/// Nothing is written until every component has finished; then the merged
/// catalog and the docs are each written atomically.
#[instrument(skip_all, fields(category = %request.category))]
pub async fn run_fetch(
    store: &CatalogStore,
    fetcher: &Fetcher,
    request: &FetchRequest,
    renderer: &dyn ReadmeRenderer,
    progress: &dyn FetchProgress,
) -> Result<FetchSummary> {
    let category = request.category;

    let components = store.load_components(category)?;
    let old = store.load_enriched(category)?;
    let rejected = store.load_rejected()?;
    let mut docs = store.load_docs()?;

    let selected = match request.slice {
        Some(slice) => slice.apply(&components),
        None => &components[..],
    };
    info!(
        total = components.len(),
        selected = selected.len(),
        slice = ?request.slice.map(|s| s.index()),
        "fetching component metadata"
    );
    progress.started(selected.len());

    let (outcomes, new_docs) = enrich_all(fetcher, category, selected, renderer, progress).await;

    let fallbacks: Vec<String> = outcomes
        .iter()
        .filter(|o| o.is_fallback())
        .map(|o| o.name().to_string())
        .collect();
    let enriched = outcomes.len() - fallbacks.len();
    debug!(enriched, fallbacks = fallbacks.len(), "all components finished");

    let merged = merge(old, outcomes.into_iter().map(CatalogEntry::from).collect(), &rejected);
    docs.extend(new_docs);

    store.save_enriched(category, &merged)?;
    store.save_docs(&docs)?;

    let summary = FetchSummary {
        category,
        total: components.len(),
        processed: selected.len(),
        enriched,
        fallbacks,
        catalog_size: merged.len(),
    };
    info!(
        enriched = summary.enriched,
        fallbacks = summary.fallbacks.len(),
        catalog_size = summary.catalog_size,
        "fetch complete"
    );
    progress.finished(&summary);

    Ok(summary)
}
