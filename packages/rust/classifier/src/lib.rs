//! Keyword-based component classification.
//!
//! This crate provides:
//! - [`matcher`] — boolean keyword grammar matching with per-candidate
//!   partial AND-matching
//! - [`Classifier`] — decides whether a registry package is a native
//!   component, a web component, or neither
//! - [`repo`] — forge URL detection and `owner/project` normalization

pub mod matcher;
pub mod repo;

use partscatalog_shared::{Category, Grammar, RegistryPackage};
use tracing::trace;

pub use matcher::{Haystack, PartialMatches, matches};
pub use repo::{FORGE_HOST, is_forge_hosted, short_repo};

/// Holds one grammar per category and applies them in priority order.
#[derive(Debug, Clone)]
pub struct Classifier {
    web: Grammar,
    native: Grammar,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Grammar::default_web(), Grammar::default_native())
    }
}

impl Classifier {
    pub fn new(web: Grammar, native: Grammar) -> Self {
        Self { web, native }
    }

    /// Build a classifier from optional overrides, falling back to the
    /// default grammar of each category.
    pub fn with_overrides(web: Option<Grammar>, native: Option<Grammar>) -> Self {
        Self::new(
            web.unwrap_or_else(Grammar::default_web),
            native.unwrap_or_else(Grammar::default_native),
        )
    }

    pub fn grammar(&self, category: Category) -> &Grammar {
        match category {
            Category::Web => &self.web,
            Category::Native => &self.native,
        }
    }

    /// Classify a registry package.
    ///
    /// Fields are checked in order (keywords, name, description, readme, then
    /// the dependency names of every version); within each field the native
    /// grammar is tried before the web grammar. The first success wins.
    pub fn classify(&self, pkg: &RegistryPackage) -> Option<Category> {
        let texts = [
            pkg.name.as_deref(),
            pkg.description.as_deref(),
            pkg.readme.as_deref(),
        ];
        let dependency_lists = pkg.dependency_lists();

        let mut fields = std::iter::once(Haystack::list(&pkg.keywords))
            .chain(
                texts
                    .into_iter()
                    .flatten()
                    .filter(|t| !t.is_empty())
                    .map(Haystack::text),
            )
            .chain(dependency_lists.iter().map(|deps| Haystack::list(deps)));

        // One scratch set per category, dropped with this candidate.
        let mut scratch = [PartialMatches::new(), PartialMatches::new()];

        let category = fields.find_map(|field| {
            Category::PRIORITY
                .iter()
                .zip(scratch.iter_mut())
                .find_map(|(category, partial)| {
                    matches(&field, self.grammar(*category), partial).then_some(*category)
                })
        });

        trace!(name = ?pkg.name, ?category, "classified package");
        category
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partscatalog_shared::Branch;

    fn package(json: serde_json::Value) -> RegistryPackage {
        serde_json::from_value(json).expect("valid package json")
    }

    #[test]
    fn native_keywords_win_over_web() {
        let pkg = package(serde_json::json!({
            "name": "react-native-button",
            "keywords": ["react-component", "react-native"]
        }));
        assert_eq!(Classifier::default().classify(&pkg), Some(Category::Native));
    }

    #[test]
    fn web_component_by_keyword() {
        let pkg = package(serde_json::json!({
            "name": "fancy-table",
            "keywords": ["react-component", "table"]
        }));
        assert_eq!(Classifier::default().classify(&pkg), Some(Category::Web));
    }

    #[test]
    fn earlier_field_decides_category() {
        // The description says native, but the name already matches web.
        let pkg = package(serde_json::json!({
            "name": "my-react-component",
            "description": "Works with react-native too"
        }));
        assert_eq!(Classifier::default().classify(&pkg), Some(Category::Web));
    }

    #[test]
    fn and_group_completed_across_fields() {
        let classifier = Classifier::new(
            Grammar::new(vec![Branch::term("never-matches")]),
            Grammar::new(vec![Branch::all_of(["react", "native"])]),
        );
        let pkg = package(serde_json::json!({
            "name": "camera-kit",
            "keywords": ["react"],
            "description": "Camera for native apps"
        }));
        assert_eq!(classifier.classify(&pkg), Some(Category::Native));
    }

    #[test]
    fn readme_is_searched() {
        let pkg = package(serde_json::json!({
            "name": "widgets",
            "readme": "# Widgets\nA React Component library."
        }));
        // "react component" is not a substring match for "react-component",
        // but the AND-group [react, component] matches the lowercased text.
        assert_eq!(Classifier::default().classify(&pkg), Some(Category::Web));
    }

    #[test]
    fn dependency_names_are_searched() {
        let pkg = package(serde_json::json!({
            "name": "maps",
            "versions": {
                "1.0.0": {"peerDependencies": {"react-native": ">=0.20"}}
            }
        }));
        assert_eq!(Classifier::default().classify(&pkg), Some(Category::Native));
    }

    #[test]
    fn unrelated_package_is_skipped() {
        let pkg = package(serde_json::json!({
            "name": "left-pad",
            "description": "String padding",
            "keywords": ["string", "pad"]
        }));
        assert_eq!(Classifier::default().classify(&pkg), None);
    }

    #[test]
    fn classification_is_deterministic() {
        let pkg = package(serde_json::json!({
            "name": "x",
            "keywords": ["react"],
            "description": "native bridge"
        }));
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(&pkg), classifier.classify(&pkg));
    }

    #[test]
    fn overrides_replace_only_given_grammar() {
        let classifier =
            Classifier::with_overrides(Some(Grammar::new(vec![Branch::term("vue")])), None);
        assert_eq!(classifier.grammar(Category::Native), &Grammar::default_native());
        assert_eq!(classifier.grammar(Category::Web).branches().len(), 1);
    }
}
