//! Splits a note into ordinary Markdown and custom `:::name` blocks.
//!
//! A custom block opens with a line starting at column 0 with `:::` and the
//! block name, optionally followed by a one-line header, and closes with the
//! first later line containing only `:::`. Without a closing line the opener
//! is left in the Markdown as literal text. Markers inside fenced code or an
//! HTML comment are literal too.

const MARKER: &str = ":::";

/// Custom block types, tried in this order at each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Quiz,
    Slide,
}

impl BlockKind {
    pub const ALL: [BlockKind; 2] = [BlockKind::Quiz, BlockKind::Slide];

    pub fn name(self) -> &'static str {
        match self {
            BlockKind::Quiz => "quiz",
            BlockKind::Slide => "slide",
        }
    }

    /// Header text if `line` opens a block of this kind.
    fn header(self, line: &str) -> Option<&str> {
        let rest = line.strip_prefix(MARKER)?.strip_prefix(self.name())?;
        if rest.is_empty() || rest.starts_with([' ', '\t']) {
            Some(rest.trim())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Markdown(&'a str),
    Custom {
        kind: BlockKind,
        header: &'a str,
        body: &'a str,
    },
}

/// A line of the input with its byte offsets.
#[derive(Clone, Copy)]
struct Line<'a> {
    start: usize,
    /// Offset just past the line terminator
    end: usize,
    text: &'a str,
}

fn lines(input: &str) -> Vec<Line<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    for raw in input.split_inclusive('\n') {
        let end = start + raw.len();
        let text = raw.trim_end_matches('\n').trim_end_matches('\r');
        out.push(Line { start, end, text });
        start = end;
    }
    out
}

/// Split `input` into Markdown spans and custom blocks, in source order.
pub fn scan(input: &str) -> Vec<Segment<'_>> {
    let lines = lines(input);
    let mut segments = Vec::new();
    let mut markdown_start = 0;
    let mut fence = FenceState::default();
    let mut comment = CommentState::default();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if comment.open {
            comment.update(line.text);
            i += 1;
            continue;
        }
        if fence.update(line.text) {
            i += 1;
            continue;
        }

        let Some((kind, header)) = BlockKind::ALL
            .iter()
            .find_map(|kind| kind.header(line.text).map(|header| (*kind, header)))
        else {
            comment.update(line.text);
            i += 1;
            continue;
        };

        let Some(close) = (i + 1..lines.len()).find(|&j| lines[j].text.trim() == MARKER) else {
            // Unterminated: the opener stays literal Markdown
            comment.update(line.text);
            i += 1;
            continue;
        };

        if markdown_start < line.start {
            segments.push(Segment::Markdown(&input[markdown_start..line.start]));
        }
        let body_start = line.end;
        let body_end = if close > i + 1 {
            // Exclude the terminator of the last body line
            let last = lines[close - 1];
            last.start + last.text.len()
        } else {
            body_start
        };
        segments.push(Segment::Custom {
            kind,
            header,
            body: &input[body_start..body_end],
        });

        markdown_start = lines[close].end;
        i = close + 1;
    }

    if markdown_start < input.len() {
        segments.push(Segment::Markdown(&input[markdown_start..]));
    }
    segments
}

/// Tracks fenced code in ordinary Markdown so markers inside it stay literal.
#[derive(Default)]
struct FenceState {
    open: Option<(char, usize)>,
}

impl FenceState {
    /// Feed one line; returns true if the line is part of a fenced code block.
    fn update(&mut self, line: &str) -> bool {
        let indent = line.len() - line.trim_start_matches(' ').len();
        let (fence_char, run) = if indent <= 3 {
            fence_run(&line[indent..])
        } else {
            (' ', 0)
        };

        match self.open {
            Some((open_char, open_run)) => {
                let rest = &line[indent + run..];
                if fence_char == open_char && run >= open_run && rest.trim().is_empty() {
                    self.open = None;
                }
                true
            }
            None if run >= 3 => {
                self.open = Some((fence_char, run));
                true
            }
            None => false,
        }
    }
}

/// Tracks `<!-- ... -->` comments, which the base engine swallows whole.
#[derive(Default)]
struct CommentState {
    open: bool,
}

impl CommentState {
    fn update(&mut self, line: &str) {
        let mut rest = line;
        loop {
            let delimiter = if self.open { "-->" } else { "<!--" };
            let Some(at) = rest.find(delimiter) else {
                break;
            };
            self.open = !self.open;
            rest = &rest[at + delimiter.len()..];
        }
    }
}

/// Leading run of backticks or tildes.
fn fence_run(text: &str) -> (char, usize) {
    match text.chars().next() {
        Some(c @ ('`' | '~')) => (c, text.chars().take_while(|&ch| ch == c).count()),
        _ => (' ', 0),
    }
}
