//! Code highlighting behind a once-initialized shared handle.

use std::fmt;
use std::sync::{Arc, LazyLock, OnceLock};

use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::error::HighlightError;

/// Prefix of every class the highlighter emits.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

pub trait Highlighter: Send + Sync {
    /// Highlighted, HTML-escaped markup for `code`. Unknown languages are
    /// rendered as plain text rather than failing.
    fn highlight(&self, code: &str, lang: &str) -> Result<String, HighlightError>;
}

pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
}

impl SyntectHighlighter {
    /// Loads the bundled syntax definitions. Slow; do it once.
    pub fn load() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
        }
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> Result<String, HighlightError> {
        let syntax = self
            .syntaxes
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

type Init = dyn Fn() -> Box<dyn Highlighter> + Send + Sync;

/// Lazily built highlighter shared between concurrent renders. The first
/// caller runs the initializer; everyone else arriving meanwhile waits for
/// that same instance.
pub struct SharedHighlighter {
    cell: OnceLock<Box<dyn Highlighter>>,
    init: Box<Init>,
}

impl SharedHighlighter {
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> Box<dyn Highlighter> + Send + Sync + 'static,
    {
        Self {
            cell: OnceLock::new(),
            init: Box::new(init),
        }
    }

    pub fn syntect() -> Self {
        Self::new(|| Box::new(SyntectHighlighter::load()))
    }

    pub fn get(&self) -> &dyn Highlighter {
        self.cell
            .get_or_init(|| {
                log::debug!("initializing highlighter");
                (self.init)()
            })
            .as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Drop the built instance; the next `get` initializes again.
    pub fn reset(&mut self) {
        self.cell.take();
    }
}

impl fmt::Debug for SharedHighlighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHighlighter")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

static SHARED: LazyLock<Arc<SharedHighlighter>> =
    LazyLock::new(|| Arc::new(SharedHighlighter::syntect()));

/// The process-wide syntect highlighter.
pub fn shared() -> Arc<SharedHighlighter> {
    Arc::clone(&SHARED)
}

/// Stylesheet for the classes emitted by [`SyntectHighlighter`].
pub fn highlight_css(theme: &str) -> Result<String, HighlightError> {
    let themes = ThemeSet::load_defaults();
    let theme = themes
        .themes
        .get(theme)
        .ok_or_else(|| HighlightError::UnknownTheme(theme.to_string()))?;
    Ok(css_for_theme_with_class_style(theme, CLASS_STYLE)?)
}
