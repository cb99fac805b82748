//! Catalog invariant checks.

use std::collections::HashMap;

use partscatalog_shared::{Category, ComponentRef, RejectionSet, is_short_repo};

/// A broken catalog invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A record without a name.
    EmptyName { category: Category },
    /// A repo that is not `owner/project`.
    MalformedRepo { name: String, repo: String },
    /// The same name listed twice (in one category or in both).
    Duplicate {
        name: String,
        first: Category,
        second: Category,
    },
    /// A rejected name that is still listed.
    Rejected { name: String, category: Category },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName { category } => write!(f, "{category}: record without a name"),
            Self::MalformedRepo { name, repo } => {
                write!(f, "{name}: repo '{repo}' is not owner/project")
            }
            Self::Duplicate {
                name,
                first,
                second,
            } => write!(f, "{name}: listed in {first} and {second}"),
            Self::Rejected { name, category } => {
                write!(f, "{name}: rejected but listed in {category}")
            }
        }
    }
}

/// Check both component lists against the catalog invariants.
pub fn audit(web: &[ComponentRef], native: &[ComponentRef], rejected: &RejectionSet) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut seen: HashMap<&str, Category> = HashMap::new();

    let lists = [(Category::Web, web), (Category::Native, native)];
    for (category, components) in lists {
        for component in components {
            let name = component.name.as_str();

            if name.is_empty() {
                violations.push(Violation::EmptyName { category });
                continue;
            }
            if !is_short_repo(&component.repo) {
                violations.push(Violation::MalformedRepo {
                    name: name.to_string(),
                    repo: component.repo.clone(),
                });
            }
            if rejected.contains(name) {
                violations.push(Violation::Rejected {
                    name: name.to_string(),
                    category,
                });
            }
            if let Some(first) = seen.insert(name, category) {
                violations.push(Violation::Duplicate {
                    name: name.to_string(),
                    first,
                    second: category,
                });
            }
        }
    }

    violations
}
