//! Classification pipeline: registry dump → new component refs per category.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use partscatalog_classifier::{Classifier, is_forge_hosted, short_repo};
use partscatalog_shared::{
    CatalogError, Category, ComponentRef, RegistryPackage, Result, is_short_repo,
};
use partscatalog_storage::CatalogStore;

use crate::announce::announcement;

/// A raw registry dump: package name → package document.
pub type RegistryDump = Map<String, Value>;

/// Newly accepted components of one classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyOutcome {
    pub web: Vec<ComponentRef>,
    pub native: Vec<ComponentRef>,
}

impl ClassifyOutcome {
    fn list_mut(&mut self, category: Category) -> &mut Vec<ComponentRef> {
        match category {
            Category::Web => &mut self.web,
            Category::Native => &mut self.native,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.web.is_empty() && self.native.is_empty()
    }

    /// Announcement lines, native components first.
    pub fn announcements(&self) -> Vec<String> {
        self.native
            .iter()
            .chain(&self.web)
            .map(announcement)
            .collect()
    }
}

/// Cutoff used when no `since` date is configured.
pub fn default_since() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Start of the given day, as a cutoff.
pub fn since_date(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Read a registry dump from disk.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_dump(path: &Path) -> Result<RegistryDump> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    let dump: RegistryDump = serde_json::from_str(&content)
        .map_err(|e| CatalogError::parse(format!("invalid registry dump {}: {e}", path.display())))?;
    info!(packages = dump.len(), "loaded registry dump");
    Ok(dump)
}

/// Classify every eligible record of `dump`.
///
/// A record is eligible when it is an object with a name, was modified at or
/// after `since`, declares a forge-hosted repository and its name is not in
/// `known`. Accepted names are added to `known`.
pub fn classify_candidates(
    dump: &RegistryDump,
    known: &mut HashSet<String>,
    classifier: &Classifier,
    since: DateTime<Utc>,
) -> ClassifyOutcome {
    let mut outcome = ClassifyOutcome::default();

    for (key, value) in dump {
        let Some(candidate) = eligible_candidate(value, known, since) else {
            continue;
        };
        let Some(category) = classifier.classify(&candidate.pkg) else {
            continue;
        };
        if !is_short_repo(&candidate.repo) {
            debug!(%key, repo = %candidate.repo, "unrecognized repository shorthand, skipping");
            continue;
        }

        known.insert(candidate.name.clone());
        outcome.list_mut(category).push(ComponentRef {
            name: candidate.name,
            repo: candidate.repo,
            description: candidate.pkg.description.clone(),
            custom_description: None,
        });
    }

    outcome
}

struct Candidate {
    name: String,
    repo: String,
    pkg: RegistryPackage,
}

fn eligible_candidate(
    value: &Value,
    known: &HashSet<String>,
    since: DateTime<Utc>,
) -> Option<Candidate> {
    if !value.is_object() {
        return None;
    }
    let pkg = RegistryPackage::deserialize(value).ok()?;

    let name = pkg.name.clone().filter(|n| !n.is_empty())?;
    if known.contains(&name) {
        return None;
    }
    if pkg.modified_at()? < since {
        return None;
    }
    let url = pkg.repository_url().filter(|u| is_forge_hosted(u))?;
    let repo = short_repo(url);

    Some(Candidate { name, repo, pkg })
}

/// Run classification against the stored catalogs and append the results.
///
/// Both component lists are rewritten as the previous entries followed by
/// the newly accepted ones.
#[instrument(skip_all, fields(since = %since))]
pub fn run_classify(
    store: &CatalogStore,
    dump: &RegistryDump,
    classifier: &Classifier,
    since: DateTime<Utc>,
) -> Result<ClassifyOutcome> {
    let mut web = store.load_components(Category::Web)?;
    let mut native = store.load_components(Category::Native)?;
    let rejected = store.load_rejected()?;

    let mut known: HashSet<String> = web
        .iter()
        .chain(&native)
        .map(|c| c.name.clone())
        .chain(rejected.iter().map(String::from))
        .collect();

    let outcome = classify_candidates(dump, &mut known, classifier, since);
    info!(
        web = outcome.web.len(),
        native = outcome.native.len(),
        "classified new components"
    );

    web.extend(outcome.web.iter().cloned());
    native.extend(outcome.native.iter().cloned());
    store.save_components(Category::Web, &web)?;
    store.save_components(Category::Native, &native)?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn record(name: &str, keywords: &[&str], modified: &str, url: &str) -> Value {
        json!({
            "name": name,
            "description": format!("The {name} package"),
            "keywords": keywords,
            "time": {"created": "2015-01-01T00:00:00.000Z", "modified": modified},
            "repository": {"type": "git", "url": url}
        })
    }

    fn dump(records: Vec<Value>) -> RegistryDump {
        records
            .into_iter()
            .map(|r| (r["name"].as_str().unwrap_or("bad").to_string(), r))
            .collect()
    }

    fn sample_dump() -> RegistryDump {
        let mut d = dump(vec![
            record(
                "react-native-camera",
                &["react-native", "camera"],
                "2016-02-01T00:00:00.000Z",
                "git+https://github.com/acme/camera.git",
            ),
            record(
                "react-table",
                &["react-component"],
                "2016-03-01T00:00:00.000Z",
                "git@github.com:acme/table.git",
            ),
            record(
                "old-component",
                &["react-component"],
                "2009-06-01T00:00:00.000Z",
                "https://github.com/acme/old",
            ),
            record(
                "gitlab-component",
                &["react-component"],
                "2016-03-01T00:00:00.000Z",
                "https://gitlab.com/acme/thing.git",
            ),
            record(
                "lodash-thing",
                &["utility"],
                "2016-03-01T00:00:00.000Z",
                "https://github.com/acme/lodash-thing",
            ),
        ]);
        d.insert("garbage".into(), json!("not an object"));
        d
    }

    #[test]
    fn classifies_eligible_records() {
        let mut known = HashSet::new();
        let outcome =
            classify_candidates(&sample_dump(), &mut known, &Classifier::default(), default_since());

        assert_eq!(outcome.native.len(), 1);
        assert_eq!(outcome.native[0].repo, "acme/camera");
        assert_eq!(outcome.web.len(), 1);
        assert_eq!(outcome.web[0].name, "react-table");
        assert_eq!(outcome.web[0].repo, "acme/table");
        assert!(known.contains("react-table"));
    }

    #[test]
    fn known_names_are_skipped() {
        let mut known: HashSet<String> = ["react-table".to_string()].into_iter().collect();
        let outcome =
            classify_candidates(&sample_dump(), &mut known, &Classifier::default(), default_since());
        assert!(outcome.web.is_empty());
        assert_eq!(outcome.native.len(), 1);
    }

    #[test]
    fn since_cutoff_filters_old_records() {
        let mut known = HashSet::new();
        let since = since_date(NaiveDate::from_ymd_opt(2016, 2, 15).unwrap());
        let outcome = classify_candidates(&sample_dump(), &mut known, &Classifier::default(), since);
        assert!(outcome.native.is_empty());
        assert_eq!(outcome.web.len(), 1);
    }

    #[test]
    fn records_without_modified_time_are_skipped() {
        let d = dump(vec![json!({
            "name": "react-undated",
            "keywords": ["react-component"],
            "repository": {"url": "https://github.com/acme/undated"}
        })]);
        let outcome =
            classify_candidates(&d, &mut HashSet::new(), &Classifier::default(), default_since());
        assert!(outcome.is_empty());
    }

    #[test]
    fn classification_is_deterministic() {
        let d = sample_dump();
        let first = classify_candidates(&d, &mut HashSet::new(), &Classifier::default(), default_since());
        let second = classify_candidates(&d, &mut HashSet::new(), &Classifier::default(), default_since());
        assert_eq!(first, second);
    }

    #[test]
    fn announcements_list_native_first() {
        let outcome =
            classify_candidates(&sample_dump(), &mut HashSet::new(), &Classifier::default(), default_since());
        let lines = outcome.announcements();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("🆕 react-native-camera:"));
        assert!(lines[1].ends_with("https://github.com/acme/table"));
    }

    #[test]
    fn run_classify_appends_and_is_repeatable() {
        let tmp = std::env::temp_dir().join(format!("pc-classify-test-{}", Uuid::now_v7()));
        let store = CatalogStore::open(&tmp);
        store
            .save_components(
                Category::Web,
                &[ComponentRef {
                    name: "existing".into(),
                    repo: "acme/existing".into(),
                    description: None,
                    custom_description: None,
                }],
            )
            .unwrap();
        std::fs::write(
            store.rejected_path(),
            r#"[{"name": "react-native-camera"}]"#,
        )
        .unwrap();

        let d = sample_dump();
        let first = run_classify(&store, &d, &Classifier::default(), default_since()).unwrap();
        assert!(first.native.is_empty(), "rejected names are never added");
        assert_eq!(first.web.len(), 1);

        let web = store.load_components(Category::Web).unwrap();
        let names: Vec<&str> = web.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["existing", "react-table"]);

        let second = run_classify(&store, &d, &Classifier::default(), default_since()).unwrap();
        assert!(second.is_empty());
        assert_eq!(store.load_components(Category::Web).unwrap().len(), 2);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_dump_reports_bad_json() {
        let tmp = std::env::temp_dir().join(format!("pc-dump-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("npm.json");
        std::fs::write(&path, "{ nope").unwrap();

        assert!(matches!(load_dump(&path), Err(CatalogError::Parse { .. })));
        assert!(matches!(
            load_dump(&tmp.join("missing.json")),
            Err(CatalogError::Io { .. })
        ));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
