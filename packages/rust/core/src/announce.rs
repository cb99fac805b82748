//! Short announcements for newly classified components.

use partscatalog_shared::ComponentRef;

/// Maximum length of a post.
const POST_BUDGET: usize = 140;

/// Characters reserved for the shortened repository link.
const LINK_RESERVE: usize = 29;

/// Placeholder counted in the prefix length; replaced by the description.
const DESCRIPTION_SLOT: &str = "<DSC>";

/// One-line announcement: `🆕 name: description https://github.com/owner/project`.
///
/// Descriptions that do not fit the post budget are cut and end with `…`;
/// ones that fit lose a trailing period.
pub fn announcement(component: &ComponentRef) -> String {
    let template = format!("🆕 {}: {DESCRIPTION_SLOT}", component.name);
    // Post length is counted in UTF-16 units; the emoji takes two.
    let max_len = POST_BUDGET
        .saturating_sub(LINK_RESERVE)
        .saturating_sub(template.encode_utf16().count());

    let description = component.description.as_deref().unwrap_or_default();
    let description = if description.chars().count() > max_len {
        let cut: String = description.chars().take(max_len.saturating_sub(1)).collect();
        format!("{cut}…")
    } else {
        description.strip_suffix('.').unwrap_or(description).to_string()
    };

    format!(
        "{} https://github.com/{}",
        template.replace(DESCRIPTION_SLOT, &description),
        component.repo
    )
}

/// Closing line of a classification run.
pub fn completion_line(web: usize, native: usize) -> String {
    format!("Completed with {web} web components and {native} native components")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, description: &str) -> ComponentRef {
        ComponentRef {
            name: name.into(),
            repo: format!("acme/{name}"),
            description: Some(description.into()),
            custom_description: None,
        }
    }

    #[test]
    fn short_description_loses_trailing_period() {
        let text = announcement(&component("react-button", "A button."));
        assert_eq!(
            text,
            "🆕 react-button: A button https://github.com/acme/react-button"
        );
    }

    #[test]
    fn long_description_is_truncated() {
        let long = "x".repeat(200);
        let text = announcement(&component("grid", &long));

        // 140 - 29 - utf16_len("🆕 grid: <DSC>")
        let max_len = 140 - 29 - 14;
        let description = text
            .strip_prefix("🆕 grid: ")
            .and_then(|t| t.strip_suffix(" https://github.com/acme/grid"))
            .unwrap();
        assert_eq!(description.chars().count(), max_len);
        assert!(description.ends_with('…'));
    }

    #[test]
    fn missing_description_is_empty() {
        let mut c = component("table", "");
        c.description = None;
        assert_eq!(announcement(&c), "🆕 table:  https://github.com/acme/table");
    }

    #[test]
    fn completion_line_counts() {
        assert_eq!(
            completion_line(3, 1),
            "Completed with 3 web components and 1 native components"
        );
    }
}
