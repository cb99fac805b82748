//! Boolean keyword grammar matching.
//!
//! A grammar branch is either a single term or a group of terms that must all
//! be present. Group terms may be found in different fields of the same
//! candidate: every term found is remembered in a [`PartialMatches`] scratch
//! set that lives exactly as long as the candidate is being classified.

use std::borrow::Cow;
use std::collections::HashSet;

use partscatalog_shared::{Branch, Grammar};

/// Terms of AND-groups already seen for one candidate and one grammar.
#[derive(Debug, Default)]
pub struct PartialMatches {
    found: HashSet<String>,
}

impl PartialMatches {
    pub fn new() -> Self {
        Self::default()
    }

    fn mark(&mut self, term: &str) {
        if !self.found.contains(term) {
            self.found.insert(term.to_string());
        }
    }

    /// Whether `term` has been seen in any field checked so far.
    pub fn contains(&self, term: &str) -> bool {
        self.found.contains(term)
    }
}

/// A field of a candidate that terms are searched in.
#[derive(Debug, Clone)]
pub enum Haystack<'a> {
    /// A list of names (keywords, dependency names); exact, case-sensitive
    /// membership.
    List(&'a [String]),
    /// Free text, stored lowercase; case-insensitive substring search.
    Text(Cow<'a, str>),
}

impl<'a> Haystack<'a> {
    /// Wrap free text, lowercasing it only when needed.
    pub fn text(text: &'a str) -> Self {
        if text.chars().any(char::is_uppercase) {
            Self::Text(Cow::Owned(text.to_lowercase()))
        } else {
            Self::Text(Cow::Borrowed(text))
        }
    }

    pub fn list(items: &'a [String]) -> Self {
        Self::List(items)
    }

    /// Whether `term` occurs in this field.
    pub fn contains(&self, term: &str) -> bool {
        match self {
            Self::List(items) => items.iter().any(|item| item == term),
            Self::Text(text) => text.contains(term.to_lowercase().as_str()),
        }
    }
}

/// Test `haystack` against `grammar`.
///
/// Returns true when a single-term branch is found, or when every term of a
/// group has been found across this and earlier calls sharing `partial`.
pub fn matches(haystack: &Haystack<'_>, grammar: &Grammar, partial: &mut PartialMatches) -> bool {
    grammar.branches().iter().any(|branch| match branch {
        Branch::Term(term) => haystack.contains(term),
        Branch::AllOf(terms) => group_complete(haystack, terms, partial),
    })
}

/// Record every group term present in `haystack`, then report whether the
/// whole group has been seen. An empty group never matches.
fn group_complete(haystack: &Haystack<'_>, terms: &[String], partial: &mut PartialMatches) -> bool {
    let mut complete = !terms.is_empty();
    for term in terms {
        if haystack.contains(term) {
            partial.mark(term);
        }
        complete = complete && partial.contains(term);
    }
    complete
}
