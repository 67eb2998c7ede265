use pulldown_cmark::Alignment;

use crate::quiz::Quiz;
use crate::slide::SlideDeck;

/// Inline text spans with formatting
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Text(String),
    /// Backslash-escaped text; never part of an inline extension marker
    Escaped(String),
    Bold(Vec<Span>),
    Italic(Vec<Span>),
    Strikethrough(Vec<Span>),
    /// `++text++`
    Underline(Vec<Span>),
    Code(String),
    Link {
        url: String,
        title: String,
        content: Vec<Span>,
    },
    Image {
        url: String,
        title: String,
        alt: String,
    },
    /// Inline raw HTML, left for the sanitizer to judge
    Html(String),
    SoftBreak,
    LineBreak,
}

/// A single list item. Tight items keep their text in `content`; anything
/// block-level (paragraphs of loose lists, nested lists, code) goes to `blocks`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<Span>,
    pub blocks: Vec<Block>,
    /// For task lists: None = not a task, Some(false) = unchecked, Some(true) = checked
    pub checked: Option<bool>,
}

/// A list (ordered or unordered)
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub ordered: bool,
    /// First number of an ordered list
    pub start: Option<u64>,
    pub items: Vec<ListItem>,
}

/// Block-level elements of a rendered note
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Span>,
    },
    Paragraph {
        content: Vec<Span>,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    List(List),
    Table {
        alignments: Vec<Alignment>,
        headers: Vec<Vec<Span>>,
        rows: Vec<Vec<Vec<Span>>>,
    },
    BlockQuote(Vec<Block>),
    Html(String),
    Rule,
    Quiz(Quiz),
    Slides(SlideDeck),
}
