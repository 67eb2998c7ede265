//! Slide deck block DSL.
//!
//! Slides are separated by a line containing only `---`. Each slide is either
//! a Markdown image or a fenced code block.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideDeck {
    pub title: String,
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Slide {
    Image {
        url: String,
    },
    Code {
        text: String,
        lang: String,
        /// Highlighted markup, filled in at render time
        #[serde(default, skip_serializing_if = "Option::is_none")]
        html: Option<String>,
    },
}

const SEPARATOR: &str = "---";
const FENCE: &str = "```";
const DEFAULT_LANG: &str = "text";

/// Parse the header text and body of a `:::slide` block.
pub fn parse(header: &str, body: &str, default_title: &str) -> SlideDeck {
    let title = match header.trim() {
        "" => default_title.to_string(),
        title => title.to_string(),
    };

    let slides = split_segments(body)
        .into_iter()
        .filter_map(|segment| {
            let slide = parse_segment(&segment);
            if slide.is_none() {
                log::debug!("dropping slide that is neither image nor code: {segment:?}");
            }
            slide
        })
        .collect();

    SlideDeck { title, slides }
}

/// Split on separator lines, trimming and discarding empty segments.
fn split_segments(body: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    for line in body.lines() {
        if line.trim_end() == SEPARATOR {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|segment| segment.trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn parse_segment(segment: &str) -> Option<Slide> {
    if segment.starts_with("![") {
        return image_url(segment).map(|url| Slide::Image { url });
    }
    if segment.starts_with(FENCE) {
        let run = segment.len() - segment.trim_start_matches('`').len();
        return Some(code_slide(&segment[run..], run));
    }
    None
}

/// `![alt](url "title")` -> `url`
fn image_url(segment: &str) -> Option<String> {
    let after_alt = &segment[segment.find("](")? + 2..];
    let target = &after_alt[..after_alt.find(')')?];
    let url = target.split_whitespace().next()?;
    let url = url
        .strip_prefix('<')
        .and_then(|u| u.strip_suffix('>'))
        .unwrap_or(url);
    Some(url.to_string())
}

/// Body of a fenced slide, starting right after the `run` opening backticks.
/// Only a backtick run at least as long closes it; a missing closing fence
/// runs to the end of the segment.
fn code_slide(rest: &str, run: usize) -> Slide {
    let (info, code) = rest.split_once('\n').unwrap_or((rest, ""));
    let lang = match info.trim() {
        "" => DEFAULT_LANG.to_string(),
        info => info.split_whitespace().next().unwrap_or(DEFAULT_LANG).to_string(),
    };

    let mut text = String::new();
    for line in code.lines() {
        let line_end = line.trim_end();
        if line_end.len() >= run && line_end.bytes().all(|b| b == b'`') {
            break;
        }
        text.push_str(line);
        text.push('\n');
    }

    Slide::Code {
        text,
        lang,
        html: None,
    }
}
