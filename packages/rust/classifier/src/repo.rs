//! Forge repository URL helpers.

use regex::Regex;
use std::sync::LazyLock;

/// Host of the only supported forge.
pub const FORGE_HOST: &str = "github.com";

/// Matches the protocol prefix (`git+https://`, `git://`, ...).
static PROTOCOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*://").expect("protocol regex")
});

/// Matches a `.git` suffix with an optional `#branch`.
static GIT_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.git(#.+)?$").expect("git suffix regex")
});

/// Matches the forge host, including the `user@github.com:` ssh form.
static FORGE_HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+@)?github\.com[/:]").expect("forge host regex")
});

/// Whether a repository URL points at the supported forge.
pub fn is_forge_hosted(url: &str) -> bool {
    url.contains(FORGE_HOST)
}

/// Turn a repository URL into its `owner/project` shorthand.
///
/// `git+https://github.com/foo/bar.git` becomes `foo/bar`. The result is not
/// validated; see [`partscatalog_shared::is_short_repo`].
pub fn short_repo(url: &str) -> String {
    let without_protocol = PROTOCOL_RE.replace(url, "");
    let without_suffix = GIT_SUFFIX_RE.replace(&without_protocol, "");
    let without_host = FORGE_HOST_RE.replace(&without_suffix, "");
    without_host.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_git_plus_https() {
        assert_eq!(short_repo("git+https://github.com/foo/bar.git"), "foo/bar");
    }

    #[test]
    fn normalizes_plain_http() {
        assert_eq!(
            short_repo("http://github.com/madebyform/react-parts"),
            "madebyform/react-parts"
        );
    }

    #[test]
    fn normalizes_ssh_clone_url() {
        assert_eq!(short_repo("git@github.com:foo/bar.git"), "foo/bar");
    }

    #[test]
    fn strips_branch_suffix() {
        assert_eq!(short_repo("git://github.com/foo/bar.git#v1.2.0"), "foo/bar");
    }

    #[test]
    fn detects_forge_urls() {
        assert!(is_forge_hosted("git+https://github.com/foo/bar.git"));
        assert!(!is_forge_hosted("https://gitlab.com/foo/bar.git"));
    }
}
