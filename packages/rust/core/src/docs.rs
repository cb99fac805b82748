//! Readme selection and rendering for the documentation store.

use partscatalog_shared::{ComponentRef, MISSING_README_MARKER, RegistryPackage};

use crate::html::escape_html;

/// Turns a readme (markdown) into the HTML stored in the [`DocStore`].
///
/// [`DocStore`]: partscatalog_shared::DocStore
pub trait ReadmeRenderer: Send + Sync {
    fn render(&self, component: &ComponentRef, markdown: &str) -> String;
}

/// Renderer that shows the markdown source verbatim in a `<pre>` block.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreformattedRenderer;

impl ReadmeRenderer for PreformattedRenderer {
    fn render(&self, _component: &ComponentRef, markdown: &str) -> String {
        format!("<pre class=\"readme\">{}</pre>", escape_html(markdown))
    }
}

/// The markdown to render for a component.
///
/// The registry readme is used when it comes from a `.md` file and is not
/// the registry's missing-readme marker; otherwise a notice pointing at the
/// repository is used instead.
pub fn readme_source(component: &ComponentRef, pkg: &RegistryPackage) -> String {
    let is_markdown = pkg
        .readme_filename
        .as_deref()
        .is_some_and(|f| f.ends_with(".md"));

    match pkg.readme.as_deref() {
        Some(readme) if is_markdown && readme != MISSING_README_MARKER => readme.to_string(),
        _ => missing_readme_notice(&component.repo),
    }
}

/// Notice shown when a component has no usable readme.
pub fn missing_readme_notice(repo: &str) -> String {
    let home = format!("https://github.com/{repo}");
    format!(
        "No documentation is available for this component. You may find it on \
         [GitHub]({home}).  \nIf the repository doesn't have a README file, \
         consider helping the community by [writing one]({home}/new/master?readme=1)."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component() -> ComponentRef {
        ComponentRef {
            name: "react-button".into(),
            repo: "acme/button".into(),
            description: None,
            custom_description: None,
        }
    }

    fn package(readme: Option<&str>, filename: Option<&str>) -> RegistryPackage {
        RegistryPackage {
            readme: readme.map(String::from),
            readme_filename: filename.map(String::from),
            ..RegistryPackage::default()
        }
    }

    #[test]
    fn markdown_readme_is_used() {
        let pkg = package(Some("# Button"), Some("README.md"));
        assert_eq!(readme_source(&component(), &pkg), "# Button");
    }

    #[test]
    fn non_markdown_readme_gets_notice() {
        let pkg = package(Some("Button\n======"), Some("README.rst"));
        let source = readme_source(&component(), &pkg);
        assert!(source.starts_with("No documentation is available"));
        assert!(source.contains("https://github.com/acme/button/new/master?readme=1"));
    }

    #[test]
    fn missing_marker_gets_notice() {
        let pkg = package(Some(MISSING_README_MARKER), Some("README.md"));
        assert_eq!(
            readme_source(&component(), &pkg),
            missing_readme_notice("acme/button")
        );
    }

    #[test]
    fn preformatted_renderer_escapes() {
        let html = PreformattedRenderer.render(&component(), "<b>bold</b> & more");
        assert_eq!(
            html,
            "<pre class=\"readme\">&lt;b&gt;bold&lt;/b&gt; &amp; more</pre>"
        );
    }
}
