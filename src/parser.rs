use pulldown_cmark::{Alignment, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::block::{Block, List, ListItem, Span};
use crate::config::MarkdownConfig;
use crate::underline;

/// Strip YAML frontmatter from the beginning of markdown content
pub fn strip_frontmatter(markdown: &str) -> &str {
    let Some(rest) = markdown
        .strip_prefix("---\n")
        .or_else(|| markdown.strip_prefix("---\r\n"))
    else {
        return markdown;
    };
    // Find the closing ---
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if matches!(line.trim_end(), "---" | "...") {
            return rest[offset..].trim_start_matches(['\r', '\n']);
        }
    }
    markdown
}

/// Parse ordinary markdown text into a list of blocks
pub fn parse(markdown: &str, config: &MarkdownConfig) -> Vec<Block> {
    let mut options = Options::empty();
    if config.tables {
        options.insert(Options::ENABLE_TABLES);
    }
    if config.strikethrough {
        options.insert(Options::ENABLE_STRIKETHROUGH);
    }
    if config.tasklists {
        options.insert(Options::ENABLE_TASKLISTS);
    }
    let parser = Parser::new_ext(markdown, options);
    let mut blocks = Vec::new();
    let mut state = ParseState::default();

    for (event, range) in parser.into_offset_iter() {
        match event {
            // The base engine starts a new text node at each escaped
            // character, so an escaped `+` leads its node
            Event::Text(text)
                if !state.in_code_block
                    && text.starts_with('+')
                    && markdown[..range.start].ends_with('\\') =>
            {
                state.push_escaped("+".to_string());
                if text.len() > 1 {
                    state.push_text(text[1..].to_string());
                }
            }
            event => process_event(event, &mut state, &mut blocks),
        }
    }

    underline::apply_to_blocks(&mut blocks);
    blocks
}

#[derive(Default)]
struct ParseState {
    // Current inline content being built
    spans: Vec<Span>,
    // Stack for nested formatting (bold, italic, links...)
    format_stack: Vec<Format>,
    // Nested span buffers for formatting
    span_stack: Vec<Vec<Span>>,

    // Current heading level (if in a heading)
    heading_level: Option<u8>,

    // Code block state
    in_code_block: bool,
    code_language: Option<String>,
    code_content: String,

    // Image alt text collects here instead of in `spans`
    image: Option<ImageBuilder>,

    html_block: Option<String>,

    // Block quotes, lists and list items currently open
    containers: Vec<Container>,

    table: Option<TableBuilder>,
}

enum Format {
    Bold,
    Italic,
    Strikethrough,
    Link { url: String, title: String },
}

struct ImageBuilder {
    url: String,
    title: String,
    alt: String,
}

enum Container {
    BlockQuote(Vec<Block>),
    List(ListBuilder),
    Item(ItemBuilder),
}

struct ListBuilder {
    ordered: bool,
    start: Option<u64>,
    items: Vec<ListItem>,
}

#[derive(Default)]
struct ItemBuilder {
    content: Vec<Span>,
    blocks: Vec<Block>,
    checked: Option<bool>,
}

struct TableBuilder {
    alignments: Vec<Alignment>,
    headers: Vec<Vec<Span>>,
    rows: Vec<Vec<Vec<Span>>>,
    current_row: Vec<Vec<Span>>,
}

impl ParseState {
    /// Add a finished block to the innermost open container.
    fn push_block(&mut self, block: Block, blocks: &mut Vec<Block>) {
        match self.containers.last_mut() {
            Some(Container::BlockQuote(children)) => children.push(block),
            Some(Container::Item(item)) => item.blocks.push(block),
            Some(Container::List(_)) | None => blocks.push(block),
        }
    }

    /// Tight list items carry their text without a paragraph; move it into
    /// the item before a block starts or the item ends.
    fn flush_item_text(&mut self) {
        if !self.span_stack.is_empty() || self.spans.is_empty() {
            return;
        }
        if let Some(Container::Item(item)) = self.containers.last_mut() {
            let content = std::mem::take(&mut self.spans);
            if item.content.is_empty() && item.blocks.is_empty() {
                item.content = content;
            } else {
                item.blocks.push(Block::Paragraph { content });
            }
        }
    }

    fn open_format(&mut self, format: Format) {
        self.format_stack.push(format);
        self.span_stack.push(std::mem::take(&mut self.spans));
    }

    fn close_format(&mut self) {
        let inner = std::mem::take(&mut self.spans);
        let (Some(format), Some(mut parent)) = (self.format_stack.pop(), self.span_stack.pop())
        else {
            self.spans = inner;
            return;
        };
        parent.push(match format {
            Format::Bold => Span::Bold(inner),
            Format::Italic => Span::Italic(inner),
            Format::Strikethrough => Span::Strikethrough(inner),
            Format::Link { url, title } => Span::Link {
                url,
                title,
                content: inner,
            },
        });
        self.spans = parent;
    }

    fn push_escaped(&mut self, text: String) {
        if let Some(image) = self.image.as_mut() {
            image.alt.push_str(&text);
        } else {
            self.spans.push(Span::Escaped(text));
        }
    }

    fn push_text(&mut self, text: String) {
        if let Some(image) = self.image.as_mut() {
            image.alt.push_str(&text);
        } else {
            self.spans.push(Span::Text(text));
        }
    }
}

fn process_event(event: Event, state: &mut ParseState, blocks: &mut Vec<Block>) {
    match event {
        // Headings
        Event::Start(Tag::Heading { level, .. }) => {
            state.flush_item_text();
            state.heading_level = Some(heading_level_to_u8(level));
        }
        Event::End(TagEnd::Heading(_)) => {
            if let Some(level) = state.heading_level.take() {
                let content = std::mem::take(&mut state.spans);
                state.push_block(Block::Heading { level, content }, blocks);
            }
        }

        // Paragraphs
        Event::Start(Tag::Paragraph) => state.flush_item_text(),
        Event::End(TagEnd::Paragraph) => {
            let content = std::mem::take(&mut state.spans);
            if !content.is_empty() {
                state.push_block(Block::Paragraph { content }, blocks);
            }
        }

        // Text content
        Event::Text(text) => {
            if state.in_code_block {
                state.code_content.push_str(&text);
            } else {
                state.push_text(text.into_string());
            }
        }

        // Inline code
        Event::Code(code) => {
            if let Some(image) = state.image.as_mut() {
                image.alt.push_str(&code);
            } else {
                state.spans.push(Span::Code(code.into_string()));
            }
        }

        Event::InlineHtml(html) => state.spans.push(Span::Html(html.into_string())),
        Event::Html(html) => match state.html_block.as_mut() {
            Some(buffer) => buffer.push_str(&html),
            None => state.spans.push(Span::Html(html.into_string())),
        },
        Event::Start(Tag::HtmlBlock) => {
            state.flush_item_text();
            state.html_block = Some(String::new());
        }
        Event::End(TagEnd::HtmlBlock) => {
            if let Some(html) = state.html_block.take() {
                state.push_block(Block::Html(html), blocks);
            }
        }

        // Formatting inside image alt text is flattened to plain text
        Event::Start(Tag::Strong) if state.image.is_none() => state.open_format(Format::Bold),
        Event::Start(Tag::Emphasis) if state.image.is_none() => {
            state.open_format(Format::Italic)
        }
        Event::Start(Tag::Strikethrough) if state.image.is_none() => {
            state.open_format(Format::Strikethrough)
        }
        Event::Start(Tag::Link {
            dest_url, title, ..
        }) if state.image.is_none() => state.open_format(Format::Link {
            url: dest_url.into_string(),
            title: title.into_string(),
        }),
        Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough | TagEnd::Link)
            if state.image.is_none() =>
        {
            state.close_format();
        }

        // Images
        Event::Start(Tag::Image {
            dest_url, title, ..
        }) => {
            state.image = Some(ImageBuilder {
                url: dest_url.into_string(),
                title: title.into_string(),
                alt: String::new(),
            });
        }
        Event::End(TagEnd::Image) => {
            if let Some(ImageBuilder { url, title, alt }) = state.image.take() {
                state.spans.push(Span::Image { url, title, alt });
            }
        }

        // Code blocks
        Event::Start(Tag::CodeBlock(kind)) => {
            state.flush_item_text();
            state.in_code_block = true;
            state.code_language = match kind {
                pulldown_cmark::CodeBlockKind::Fenced(info) => info
                    .split_whitespace()
                    .next()
                    .map(str::to_string),
                pulldown_cmark::CodeBlockKind::Indented => None,
            };
            state.code_content.clear();
        }
        Event::End(TagEnd::CodeBlock) => {
            state.in_code_block = false;
            let content = std::mem::take(&mut state.code_content);
            let language = state.code_language.take();
            state.push_block(Block::CodeBlock { language, content }, blocks);
        }

        // Block quotes
        Event::Start(Tag::BlockQuote(_)) => {
            state.flush_item_text();
            state.containers.push(Container::BlockQuote(Vec::new()));
        }
        Event::End(TagEnd::BlockQuote(_)) => {
            if let Some(Container::BlockQuote(children)) = state.containers.pop() {
                state.push_block(Block::BlockQuote(children), blocks);
            }
        }

        // Lists
        Event::Start(Tag::List(first_item)) => {
            state.flush_item_text();
            state.containers.push(Container::List(ListBuilder {
                ordered: first_item.is_some(),
                start: first_item,
                items: Vec::new(),
            }));
        }
        Event::End(TagEnd::List(_)) => {
            if let Some(Container::List(list_builder)) = state.containers.pop() {
                let list = List {
                    ordered: list_builder.ordered,
                    start: list_builder.start,
                    items: list_builder.items,
                };
                state.push_block(Block::List(list), blocks);
            }
        }

        Event::Start(Tag::Item) => {
            state.containers.push(Container::Item(ItemBuilder::default()));
        }
        Event::End(TagEnd::Item) => {
            // Collect any remaining spans
            state.flush_item_text();
            if let Some(Container::Item(item)) = state.containers.pop() {
                if let Some(Container::List(list)) = state.containers.last_mut() {
                    list.items.push(ListItem {
                        content: item.content,
                        blocks: item.blocks,
                        checked: item.checked,
                    });
                }
            }
        }

        // Task list checkboxes
        Event::TaskListMarker(checked) => {
            let item = state.containers.iter_mut().rev().find_map(|c| match c {
                Container::Item(item) => Some(item),
                _ => None,
            });
            if let Some(item) = item {
                item.checked = Some(checked);
            }
        }

        // Tables
        Event::Start(Tag::Table(alignments)) => {
            state.flush_item_text();
            state.table = Some(TableBuilder {
                alignments,
                headers: Vec::new(),
                rows: Vec::new(),
                current_row: Vec::new(),
            });
        }
        Event::End(TagEnd::Table) => {
            if let Some(table) = state.table.take() {
                state.push_block(
                    Block::Table {
                        alignments: table.alignments,
                        headers: table.headers,
                        rows: table.rows,
                    },
                    blocks,
                );
            }
        }

        Event::Start(Tag::TableHead | Tag::TableRow) => {
            if let Some(table) = state.table.as_mut() {
                table.current_row.clear();
            }
        }
        Event::End(TagEnd::TableHead) => {
            if let Some(table) = state.table.as_mut() {
                table.headers = std::mem::take(&mut table.current_row);
            }
        }
        Event::End(TagEnd::TableRow) => {
            if let Some(table) = state.table.as_mut() {
                let row = std::mem::take(&mut table.current_row);
                table.rows.push(row);
            }
        }

        Event::Start(Tag::TableCell) => {
            state.spans.clear();
        }
        Event::End(TagEnd::TableCell) => {
            let cell_content = std::mem::take(&mut state.spans);
            if let Some(table) = state.table.as_mut() {
                table.current_row.push(cell_content);
            }
        }

        // Horizontal rule
        Event::Rule => {
            state.flush_item_text();
            state.push_block(Block::Rule, blocks);
        }

        // Soft/hard breaks
        Event::SoftBreak => {
            if let Some(image) = state.image.as_mut() {
                image.alt.push(' ');
            } else {
                state.spans.push(Span::SoftBreak);
            }
        }
        Event::HardBreak => {
            state.spans.push(Span::LineBreak);
        }

        // Ignore other events
        _ => {}
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
