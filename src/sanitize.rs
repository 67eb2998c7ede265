//! Final HTML cleaning.
//!
//! Starts from ammonia's default allowlist and adds exactly the tags and
//! attributes the renderer emits. Everything else is removed.

use ammonia::Builder;

use crate::config::SanitizeConfig;
use crate::error::EnvironmentError;

/// Tags the renderer emits beyond ammonia's defaults.
const RENDERER_TAGS: &[&str] = &["div", "span", "u", "del", "input"];

/// Attributes the renderer emits, per tag.
const RENDERER_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("div", &["class", "data-quiz", "data-slide"]),
    ("span", &["class"]),
    ("pre", &["class"]),
    ("code", &["class"]),
    ("input", &["type", "checked", "disabled"]),
    ("ol", &["start"]),
    ("th", &["align"]),
    ("td", &["align"]),
];

/// Tags ammonia removes along with their content; allowing them is a
/// configuration conflict.
const STRIPPED_TAGS: &[&str] = &["script", "style"];

/// Supplies the cleaning environment for one render.
pub trait DocumentProvider: Send + Sync {
    fn sanitizer(&self) -> Result<Sanitizer<'_>, EnvironmentError>;
}

pub struct Sanitizer<'a> {
    builder: Builder<'a>,
}

impl Sanitizer<'_> {
    pub fn clean(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

/// Renderer allowlist plus operator-configured additions.
#[derive(Debug, Clone, Default)]
pub struct AllowlistProvider {
    extra_tags: Vec<String>,
    extra_generic_attributes: Vec<String>,
}

impl AllowlistProvider {
    pub fn new(config: &SanitizeConfig) -> Self {
        Self {
            extra_tags: config.extra_tags.clone(),
            extra_generic_attributes: config.extra_generic_attributes.clone(),
        }
    }
}

impl DocumentProvider for AllowlistProvider {
    fn sanitizer(&self) -> Result<Sanitizer<'_>, EnvironmentError> {
        if let Some(tag) = self
            .extra_tags
            .iter()
            .find(|tag| STRIPPED_TAGS.contains(&tag.to_ascii_lowercase().as_str()))
        {
            return Err(EnvironmentError::StrippedTag(tag.clone()));
        }
        if let Some(attribute) = self.extra_generic_attributes.iter().find(|attribute| {
            let attribute = attribute.to_ascii_lowercase();
            attribute.starts_with("on") || attribute == "style" || attribute == "rel"
        }) {
            return Err(EnvironmentError::ForbiddenAttribute(attribute.clone()));
        }

        let mut builder = Builder::default();
        builder
            .add_tags(RENDERER_TAGS)
            .add_tags(&self.extra_tags)
            .add_generic_attributes(&self.extra_generic_attributes);
        for (tag, attributes) in RENDERER_ATTRIBUTES {
            builder.add_tag_attributes(*tag, *attributes);
        }
        Ok(Sanitizer { builder })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn clean(html: &str) -> String {
        AllowlistProvider::default().sanitizer().unwrap().clean(html)
    }

    #[test]
    fn keeps_placeholders() {
        let html = r#"<div class="quiz-placeholder" data-quiz="eyJ9"></div>"#;
        assert_eq!(clean(html), html);
    }

    #[test]
    fn keeps_highlight_markup() {
        let html = r#"<pre><code class="language-rust"><span class="hl-source hl-rust">fn</span></code></pre>"#;
        assert_eq!(clean(html), html);
    }

    #[test]
    fn keeps_underline_and_task_checkbox() {
        let html = r#"<li><input type="checkbox" disabled="" checked=""> <u>x</u></li>"#;
        assert_eq!(clean(html), html);
    }

    #[rstest]
    #[case("<script>alert(1)</script>ok", "ok")]
    #[case(r#"<img src="x.png" onerror="alert(1)">"#, r#"<img src="x.png">"#)]
    #[case(r#"<iframe src="https://evil"></iframe>ok"#, "ok")]
    #[case(r#"<p style="background:url(https://evil)">t</p>"#, "<p>t</p>")]
    #[case(r#"<div data-other="1" id="x">t</div>"#, "<div>t</div>")]
    #[case(r#"<a href="javascript:alert(1)">t</a>"#, r#"<a rel="noopener noreferrer">t</a>"#)]
    fn strips_unsafe(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean(input), expected);
    }

    #[test]
    fn idempotent() {
        let once = clean(r#"<p>a &amp; b <a href="https://x.org" title="t">l</a></p><div class="error">e</div>"#);
        assert_eq!(clean(&once), once);
    }

    #[test]
    fn extra_tags_from_config() {
        let provider = AllowlistProvider::new(&SanitizeConfig {
            extra_tags: vec!["section".to_string()],
            extra_generic_attributes: vec!["id".to_string()],
        });
        let sanitizer = provider.sanitizer().unwrap();
        assert_eq!(
            sanitizer.clean(r#"<section id="s">t</section>"#),
            r#"<section id="s">t</section>"#
        );
    }

    #[rstest]
    #[case(vec!["Script"], vec![])]
    #[case(vec![], vec!["onclick"])]
    #[case(vec![], vec!["style"])]
    fn conflicting_allowlist_is_an_environment_error(
        #[case] tags: Vec<&str>,
        #[case] attributes: Vec<&str>,
    ) {
        let provider = AllowlistProvider::new(&SanitizeConfig {
            extra_tags: tags.into_iter().map(String::from).collect(),
            extra_generic_attributes: attributes.into_iter().map(String::from).collect(),
        });
        assert!(provider.sanitizer().is_err());
    }
}
