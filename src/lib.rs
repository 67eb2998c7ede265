mod block;
mod config;
mod error;
mod html;
mod parser;
mod underline;

pub mod highlight;
pub mod payload;
pub mod quiz;
pub mod sanitize;
pub mod scanner;
pub mod slide;

pub use block::{Block, List, ListItem, Span};
pub use config::{
    Config, HighlightConfig, MarkdownConfig, PayloadConfig, QuizConfig, SanitizeConfig,
    SlideConfig,
};
pub use error::{ConfigError, EnvironmentError, HighlightError, PayloadError, RenderError};
pub use highlight::{Highlighter, SharedHighlighter};
pub use quiz::Quiz;
pub use sanitize::{AllowlistProvider, DocumentProvider, Sanitizer};
pub use slide::{Slide, SlideDeck};

use std::sync::{Arc, LazyLock};

use html::HtmlOptions;
use scanner::{BlockKind, Segment};

/// Parse note content into blocks using default config.
pub fn parse(content: &str) -> Vec<Block> {
    parse_with_config(content, &Config::compiled_default())
}

/// Parse note content into blocks: ordinary Markdown interleaved with quiz
/// and slide blocks, in source order.
pub fn parse_with_config(content: &str, config: &Config) -> Vec<Block> {
    let content = if config.markdown.strip_frontmatter {
        parser::strip_frontmatter(content)
    } else {
        content
    };

    let mut blocks = Vec::new();
    for segment in scanner::scan(content) {
        match segment {
            Segment::Markdown(markdown) => {
                blocks.extend(parser::parse(markdown, &config.markdown));
            }
            Segment::Custom {
                kind: BlockKind::Quiz,
                header,
                body,
            } => blocks.push(Block::Quiz(quiz::parse(
                header,
                body,
                &config.quiz.default_title,
            ))),
            Segment::Custom {
                kind: BlockKind::Slide,
                header,
                body,
            } => blocks.push(Block::Slides(slide::parse(
                header,
                body,
                &config.slide.default_title,
            ))),
        }
    }
    blocks
}

/// Renders note content to sanitized HTML. Safe to share between threads.
#[derive(Debug)]
pub struct Renderer {
    config: Config,
    highlighter: Arc<SharedHighlighter>,
    provider: AllowlistProvider,
}

impl Renderer {
    /// A renderer using the process-wide highlighter.
    pub fn new(config: Config) -> Self {
        let provider = AllowlistProvider::new(&config.sanitize);
        Self {
            config,
            highlighter: highlight::shared(),
            provider,
        }
    }

    pub fn with_highlighter(mut self, highlighter: Arc<SharedHighlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render with the allowlist from this renderer's config.
    pub fn render(&self, content: &str) -> Result<String, RenderError> {
        self.render_with(content, &self.provider)
    }

    /// Render, cleaning the output with the sanitizer `provider` supplies.
    /// Only a sanitizer that can't be built fails the render; bad blocks are
    /// rendered inline.
    pub fn render_with(
        &self,
        content: &str,
        provider: &dyn DocumentProvider,
    ) -> Result<String, RenderError> {
        if content.is_empty() {
            return Ok(String::new());
        }
        let sanitizer = provider.sanitizer()?;

        let blocks = parse_with_config(content, &self.config);
        let options = HtmlOptions {
            highlighter: self
                .config
                .highlight
                .enabled
                .then_some(self.highlighter.as_ref()),
            breaks: self.config.markdown.breaks,
            max_payload_bytes: self.config.payload.max_bytes,
        };
        let raw = html::blocks_to_html(&blocks, &options);
        Ok(sanitizer.clean(&raw))
    }
}

static DEFAULT_RENDERER: LazyLock<Renderer> =
    LazyLock::new(|| Renderer::new(Config::compiled_default()));

/// Render note content to sanitized HTML using default config.
pub fn render(content: &str) -> Result<String, RenderError> {
    DEFAULT_RENDERER.render(content)
}
