use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::Alignment;
use serde::Serialize;

use crate::block::{Block, List, Span};
use crate::highlight::SharedHighlighter;
use crate::payload;
use crate::quiz::Quiz;
use crate::slide::{Slide, SlideDeck};

pub struct HtmlOptions<'a> {
    /// `None` renders code unstyled
    pub highlighter: Option<&'a SharedHighlighter>,
    /// Soft line breaks become `<br>`
    pub breaks: bool,
    pub max_payload_bytes: usize,
}

/// Convert blocks to (unsanitized) HTML
pub fn blocks_to_html(blocks: &[Block], options: &HtmlOptions) -> String {
    let mut out = String::new();
    for block in blocks {
        emit_block(block, options, &mut out);
    }
    out
}

fn emit_block(block: &Block, options: &HtmlOptions, out: &mut String) {
    match block {
        Block::Heading { level, content } => {
            out.push_str(&format!("<h{level}>"));
            spans_to_html(content, options, out);
            out.push_str(&format!("</h{level}>\n"));
        }
        Block::Paragraph { content } => {
            out.push_str("<p>");
            spans_to_html(content, options, out);
            out.push_str("</p>\n");
        }
        Block::CodeBlock { language, content } => {
            emit_code_block(language.as_deref(), content, options, out);
        }
        Block::List(list) => list_to_html(list, options, out),
        Block::Table {
            alignments,
            headers,
            rows,
        } => table_to_html(alignments, headers, rows, options, out),
        Block::BlockQuote(children) => {
            out.push_str("<blockquote>\n");
            for child in children {
                emit_block(child, options, out);
            }
            out.push_str("</blockquote>\n");
        }
        Block::Html(html) => out.push_str(html),
        Block::Rule => out.push_str("<hr>\n"),
        Block::Quiz(quiz) => emit_quiz(quiz, options, out),
        Block::Slides(deck) => emit_slides(deck, options, out),
    }
}

fn emit_code_block(language: Option<&str>, content: &str, options: &HtmlOptions, out: &mut String) {
    match language {
        Some(lang) => out.push_str(&format!(
            "<pre><code class=\"language-{}\">",
            encode_double_quoted_attribute(lang)
        )),
        None => out.push_str("<pre><code>"),
    }
    out.push_str(&highlight_code(content, language.unwrap_or("text"), options));
    out.push_str("</code></pre>\n");
}

/// Highlighted markup, or the escaped source if highlighting is off or fails.
fn highlight_code(code: &str, lang: &str, options: &HtmlOptions) -> String {
    let Some(highlighter) = options.highlighter else {
        return encode_text(code).into_owned();
    };
    match highlighter.get().highlight(code, lang) {
        Ok(html) => html,
        Err(e) => {
            log::warn!("highlighting {lang:?} failed, rendering plain code: {e}");
            encode_text(code).into_owned()
        }
    }
}

fn emit_quiz(quiz: &Quiz, options: &HtmlOptions, out: &mut String) {
    emit_placeholder("quiz", quiz, options, out);
}

fn emit_slides(deck: &SlideDeck, options: &HtmlOptions, out: &mut String) {
    let mut deck = deck.clone();
    if options.highlighter.is_some() {
        for slide in &mut deck.slides {
            if let Slide::Code { text, lang, html } = slide {
                *html = Some(highlight_code(text, lang, options));
            }
        }
    }
    emit_placeholder("slide", &deck, options, out);
}

/// `<div class="{kind}-placeholder" data-{kind}="...">`, or an inline error
/// in its place when the token can't be encoded.
fn emit_placeholder<T: Serialize>(kind: &str, token: &T, options: &HtmlOptions, out: &mut String) {
    match payload::encode(token, options.max_payload_bytes) {
        Ok(data) => {
            out.push_str(&format!(
                "<div class=\"{kind}-placeholder\" data-{kind}=\"{data}\"></div>\n"
            ));
        }
        Err(e) => {
            log::warn!("failed to encode {kind} payload: {e}");
            out.push_str(&format!(
                "<div class=\"error\">Failed to encode {kind}: {}</div>\n",
                encode_text(&e.to_string())
            ));
        }
    }
}

fn list_to_html(list: &List, options: &HtmlOptions, out: &mut String) {
    let tag = if list.ordered { "ol" } else { "ul" };
    match list.start {
        Some(start) if list.ordered && start != 1 => {
            out.push_str(&format!("<ol start=\"{start}\">\n"));
        }
        _ => out.push_str(&format!("<{tag}>\n")),
    }
    for item in &list.items {
        out.push_str("<li>");
        if let Some(checked) = item.checked {
            out.push_str(if checked {
                "<input type=\"checkbox\" disabled=\"\" checked=\"\"> "
            } else {
                "<input type=\"checkbox\" disabled=\"\"> "
            });
        }
        spans_to_html(&item.content, options, out);
        if !item.blocks.is_empty() {
            if !item.content.is_empty() {
                out.push('\n');
            }
            for block in &item.blocks {
                emit_block(block, options, out);
            }
        }
        out.push_str("</li>\n");
    }
    out.push_str(&format!("</{tag}>\n"));
}

fn table_to_html(
    alignments: &[Alignment],
    headers: &[Vec<Span>],
    rows: &[Vec<Vec<Span>>],
    options: &HtmlOptions,
    out: &mut String,
) {
    out.push_str("<table>\n<thead>\n<tr>\n");
    for (i, cell) in headers.iter().enumerate() {
        table_cell("th", alignments.get(i), cell, options, out);
    }
    out.push_str("</tr>\n</thead>\n");
    if !rows.is_empty() {
        out.push_str("<tbody>\n");
        for row in rows {
            out.push_str("<tr>\n");
            for (i, cell) in row.iter().enumerate() {
                table_cell("td", alignments.get(i), cell, options, out);
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n");
    }
    out.push_str("</table>\n");
}

fn table_cell(
    tag: &str,
    alignment: Option<&Alignment>,
    content: &[Span],
    options: &HtmlOptions,
    out: &mut String,
) {
    match alignment {
        Some(Alignment::Left) => out.push_str(&format!("<{tag} align=\"left\">")),
        Some(Alignment::Center) => out.push_str(&format!("<{tag} align=\"center\">")),
        Some(Alignment::Right) => out.push_str(&format!("<{tag} align=\"right\">")),
        Some(Alignment::None) | None => out.push_str(&format!("<{tag}>")),
    }
    spans_to_html(content, options, out);
    out.push_str(&format!("</{tag}>\n"));
}

fn spans_to_html(spans: &[Span], options: &HtmlOptions, out: &mut String) {
    for span in spans {
        span_to_html(span, options, out);
    }
}

fn wrap(tag: &str, inner: &[Span], options: &HtmlOptions, out: &mut String) {
    out.push_str(&format!("<{tag}>"));
    spans_to_html(inner, options, out);
    out.push_str(&format!("</{tag}>"));
}

fn span_to_html(span: &Span, options: &HtmlOptions, out: &mut String) {
    match span {
        Span::Text(text) | Span::Escaped(text) => out.push_str(&encode_text(text)),
        Span::Bold(inner) => wrap("strong", inner, options, out),
        Span::Italic(inner) => wrap("em", inner, options, out),
        Span::Strikethrough(inner) => wrap("del", inner, options, out),
        Span::Underline(inner) => wrap("u", inner, options, out),
        Span::Code(code) => {
            out.push_str("<code>");
            out.push_str(&encode_text(code));
            out.push_str("</code>");
        }
        Span::Link {
            url,
            title,
            content,
        } => {
            out.push_str(&format!("<a href=\"{}\"", encode_double_quoted_attribute(url)));
            if !title.is_empty() {
                out.push_str(&format!(" title=\"{}\"", encode_double_quoted_attribute(title)));
            }
            out.push('>');
            spans_to_html(content, options, out);
            out.push_str("</a>");
        }
        Span::Image { url, title, alt } => {
            out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\"",
                encode_double_quoted_attribute(url),
                encode_double_quoted_attribute(alt)
            ));
            if !title.is_empty() {
                out.push_str(&format!(" title=\"{}\"", encode_double_quoted_attribute(title)));
            }
            out.push('>');
        }
        Span::Html(html) => out.push_str(html),
        Span::SoftBreak => out.push_str(if options.breaks { "<br>\n" } else { "\n" }),
        Span::LineBreak => out.push_str("<br>\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkdownConfig;
    use crate::error::HighlightError;
    use crate::highlight::Highlighter;
    use crate::parser;
    use pretty_assertions::assert_eq;

    fn plain() -> HtmlOptions<'static> {
        HtmlOptions {
            highlighter: None,
            breaks: true,
            max_payload_bytes: usize::MAX,
        }
    }

    fn to_html(markdown: &str) -> String {
        let blocks = parser::parse(markdown, &MarkdownConfig::default());
        blocks_to_html(&blocks, &plain())
    }

    struct Failing;

    impl Highlighter for Failing {
        fn highlight(&self, _code: &str, lang: &str) -> Result<String, HighlightError> {
            Err(HighlightError::UnknownTheme(lang.to_string()))
        }
    }

    struct Marked;

    impl Highlighter for Marked {
        fn highlight(&self, code: &str, lang: &str) -> Result<String, HighlightError> {
            Ok(format!("<span class=\"hl-{lang}\">{}</span>", encode_text(code)))
        }
    }

    #[test]
    fn heading() {
        assert_eq!(to_html("## Hello"), "<h2>Hello</h2>\n");
    }

    #[test]
    fn paragraph_with_formatting() {
        assert_eq!(
            to_html("**b** *i* ~~s~~ `c` ++u++"),
            "<p><strong>b</strong> <em>i</em> <del>s</del> <code>c</code> <u>u</u></p>\n"
        );
    }

    #[test]
    fn soft_breaks() {
        assert_eq!(to_html("one\ntwo"), "<p>one<br>\ntwo</p>\n");
        let blocks = parser::parse("one\ntwo", &MarkdownConfig::default());
        let options = HtmlOptions {
            breaks: false,
            ..plain()
        };
        assert_eq!(blocks_to_html(&blocks, &options), "<p>one\ntwo</p>\n");
    }

    #[test]
    fn escapes_text() {
        assert_eq!(to_html("a < b & c"), "<p>a &lt; b &amp; c</p>\n");
    }

    #[test]
    fn code_block_without_highlighter() {
        assert_eq!(
            to_html("```rust\nif a < b {}\n```"),
            "<pre><code class=\"language-rust\">if a &lt; b {}\n</code></pre>\n"
        );
    }

    #[test]
    fn code_block_with_highlighter() {
        let shared = SharedHighlighter::new(|| Box::new(Marked));
        let options = HtmlOptions {
            highlighter: Some(&shared),
            ..plain()
        };
        let blocks = parser::parse("```js\nx\n```", &MarkdownConfig::default());
        assert_eq!(
            blocks_to_html(&blocks, &options),
            "<pre><code class=\"language-js\"><span class=\"hl-js\">x\n</span></code></pre>\n"
        );
    }

    #[test]
    fn highlight_failure_falls_back_to_plain_code() {
        let shared = SharedHighlighter::new(|| Box::new(Failing));
        let options = HtmlOptions {
            highlighter: Some(&shared),
            ..plain()
        };
        let blocks = parser::parse("```\n<x>\n```", &MarkdownConfig::default());
        assert_eq!(
            blocks_to_html(&blocks, &options),
            "<pre><code>&lt;x&gt;\n</code></pre>\n"
        );
    }

    #[test]
    fn lists() {
        assert_eq!(
            to_html("3. a\n4. b"),
            "<ol start=\"3\">\n<li>a</li>\n<li>b</li>\n</ol>\n"
        );
        assert_eq!(
            to_html("- [x] done\n- [ ] todo"),
            "<ul>\n<li><input type=\"checkbox\" disabled=\"\" checked=\"\"> done</li>\n\
             <li><input type=\"checkbox\" disabled=\"\"> todo</li>\n</ul>\n"
        );
        assert_eq!(
            to_html("- a\n  - b"),
            "<ul>\n<li>a\n<ul>\n<li>b</li>\n</ul>\n</li>\n</ul>\n"
        );
    }

    #[test]
    fn table() {
        assert_eq!(
            to_html("| A | B |\n|:-:|---|\n| 1 | 2 |"),
            "<table>\n<thead>\n<tr>\n<th align=\"center\">A</th>\n<th>B</th>\n</tr>\n</thead>\n\
             <tbody>\n<tr>\n<td align=\"center\">1</td>\n<td>2</td>\n</tr>\n</tbody>\n</table>\n"
        );
    }

    #[test]
    fn link_and_image_attributes_are_escaped() {
        assert_eq!(
            to_html("[t](http://x?a=1&b=2 \"ti\") ![a\"lt](i.png)"),
            "<p><a href=\"http://x?a=1&amp;b=2\" title=\"ti\">t</a> \
             <img src=\"i.png\" alt=\"a&quot;lt\"></p>\n"
        );
    }

    #[test]
    fn quiz_placeholder() {
        let quiz = crate::quiz::parse("T", "? Q\n- [x] A", "Quiz");
        let html = blocks_to_html(&[Block::Quiz(quiz.clone())], &plain());
        let data = payload::encode(&quiz, usize::MAX).unwrap();
        assert_eq!(
            html,
            format!("<div class=\"quiz-placeholder\" data-quiz=\"{data}\"></div>\n")
        );
    }

    #[test]
    fn encoding_failure_renders_inline_error() {
        let quiz = crate::quiz::parse("T", "? Q", "Quiz");
        let blocks = vec![
            Block::Quiz(quiz),
            Block::Paragraph {
                content: vec![Span::Text("after".to_string())],
            },
        ];
        let options = HtmlOptions {
            max_payload_bytes: 4,
            ..plain()
        };
        let html = blocks_to_html(&blocks, &options);
        assert!(html.starts_with("<div class=\"error\">Failed to encode quiz: payload is "));
        assert!(html.ends_with("<p>after</p>\n"));
    }

    #[test]
    fn slide_code_is_highlighted_into_payload() {
        let shared = SharedHighlighter::new(|| Box::new(Marked));
        let options = HtmlOptions {
            highlighter: Some(&shared),
            ..plain()
        };
        let deck = crate::slide::parse("D", "```js\nx\n```", "P");
        let html = blocks_to_html(&[Block::Slides(deck)], &options);
        let data = html
            .split("data-slide=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        let decoded: SlideDeck = payload::decode(data).unwrap();
        assert_eq!(
            decoded.slides,
            vec![Slide::Code {
                text: "x\n".to_string(),
                lang: "js".to_string(),
                html: Some("<span class=\"hl-js\">x\n</span>".to_string()),
            }]
        );
    }
}
