//! `++text++` underline, applied to the span trees the base engine produced.
//!
//! Markers pair up among sibling spans, so the enclosed content keeps any
//! emphasis, links or code the base engine already parsed. A pair never spans
//! a line break and never crosses into or out of another formatting span.

use crate::block::{Block, Span};

const MARKER: &str = "++";

pub fn apply_to_blocks(blocks: &mut [Block]) {
    for block in blocks {
        match block {
            Block::Heading { content, .. } | Block::Paragraph { content } => {
                *content = apply(std::mem::take(content));
            }
            Block::List(list) => {
                for item in &mut list.items {
                    item.content = apply(std::mem::take(&mut item.content));
                    apply_to_blocks(&mut item.blocks);
                }
            }
            Block::Table { headers, rows, .. } => {
                for cell in headers.iter_mut().chain(rows.iter_mut().flatten()) {
                    *cell = apply(std::mem::take(cell));
                }
            }
            Block::BlockQuote(children) => apply_to_blocks(children),
            Block::CodeBlock { .. }
            | Block::Html(_)
            | Block::Rule
            | Block::Quiz(_)
            | Block::Slides(_) => {}
        }
    }
}

enum Piece {
    Span(Span),
    Marker,
}

/// Wrap every `++...++` pair in `spans` (and, recursively, in their children).
pub fn apply(spans: Vec<Span>) -> Vec<Span> {
    let mut pieces = Vec::new();
    for span in merge_text(spans) {
        match span {
            Span::Text(text) => {
                for (i, part) in text.split(MARKER).enumerate() {
                    if i > 0 {
                        pieces.push(Piece::Marker);
                    }
                    if !part.is_empty() {
                        pieces.push(Piece::Span(Span::Text(part.to_string())));
                    }
                }
            }
            other => pieces.push(Piece::Span(recurse(other))),
        }
    }

    let mut out = Vec::new();
    let mut i = 0;
    while i < pieces.len() {
        match &pieces[i] {
            Piece::Span(span) => out.push(span.clone()),
            Piece::Marker => {
                let close = pieces[i + 1..]
                    .iter()
                    .position(|piece| {
                        matches!(
                            piece,
                            Piece::Marker | Piece::Span(Span::SoftBreak | Span::LineBreak)
                        )
                    })
                    .map(|offset| i + 1 + offset)
                    .filter(|&j| matches!(pieces[j], Piece::Marker));
                if let Some(j) = close {
                    let inner = trim(
                        pieces[i + 1..j]
                            .iter()
                            .filter_map(|piece| match piece {
                                Piece::Span(span) => Some(span.clone()),
                                Piece::Marker => None,
                            })
                            .collect(),
                    );
                    if !inner.is_empty() {
                        out.push(Span::Underline(inner));
                        i = j + 1;
                        continue;
                    }
                }
                // Unmatched or empty: the marker is literal and a later
                // marker may still open a pair
                out.push(Span::Text(MARKER.to_string()));
            }
        }
        i += 1;
    }
    merge_text(out)
}

fn recurse(span: Span) -> Span {
    match span {
        Span::Bold(inner) => Span::Bold(apply(inner)),
        Span::Italic(inner) => Span::Italic(apply(inner)),
        Span::Strikethrough(inner) => Span::Strikethrough(apply(inner)),
        Span::Underline(inner) => Span::Underline(apply(inner)),
        Span::Link {
            url,
            title,
            content,
        } => Span::Link {
            url,
            title,
            content: apply(content),
        },
        other => other,
    }
}

/// Trim whitespace at the edges of the enclosed content.
fn trim(mut spans: Vec<Span>) -> Vec<Span> {
    if let Some(Span::Text(text)) = spans.first_mut() {
        *text = text.trim_start().to_string();
    }
    if let Some(Span::Text(text)) = spans.last_mut() {
        *text = text.trim_end().to_string();
    }
    spans.retain(|span| !matches!(span, Span::Text(text) if text.is_empty()));
    spans
}

fn merge_text(spans: Vec<Span>) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match (out.last_mut(), span) {
            (Some(Span::Text(last)), Span::Text(text)) => last.push_str(&text),
            (_, span) => out.push(span),
        }
    }
    out
}
