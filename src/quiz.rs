//! Quiz block DSL.
//!
//! ```text
//! :::quiz Capitals
//! ::time 5m
//! ::ok 2
//! ::error -0.5
//! ? Capital of Italy?
//! - [ ] Milan
//! - [x] Rome
//! :::
//! ```

use serde::{Deserialize, Serialize};

/// A parsed quiz block, serialized as-is into the placeholder payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    /// Raw duration text, passed to the client unvalidated
    pub time: Option<String>,
    pub scoring: Scoring,
    pub questions: Vec<Question>,
}

/// Points awarded per correct, wrong and unanswered question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    pub ok: f64,
    pub error: f64,
    pub null: f64,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            ok: 1.0,
            error: 0.0,
            null: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<QuizOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOption {
    pub text: String,
    pub correct: bool,
}

const QUESTION_PREFIX: &str = "? ";
const OPTION_PREFIX: &str = "- [ ] ";
const CORRECT_OPTION_PREFIX: &str = "- [x] ";

/// Parse the header text and body of a `:::quiz` block.
pub fn parse(header: &str, body: &str, default_title: &str) -> Quiz {
    let title = match header.trim() {
        "" => default_title.to_string(),
        title => title.to_string(),
    };

    let defaults = Scoring::default();
    let scoring = Scoring {
        ok: number_directive(body, "ok").unwrap_or(defaults.ok),
        error: number_directive(body, "error").unwrap_or(defaults.error),
        null: number_directive(body, "null").unwrap_or(defaults.null),
    };

    let mut questions: Vec<Question> = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if let Some(text) = line.strip_prefix(QUESTION_PREFIX) {
            questions.push(Question {
                text: text.trim().to_string(),
                options: Vec::new(),
            });
            continue;
        }

        let option = if let Some(text) = line.strip_prefix(OPTION_PREFIX) {
            Some((text, false))
        } else {
            line.strip_prefix(CORRECT_OPTION_PREFIX)
                .map(|text| (text, true))
        };
        // Options before the first question have nowhere to go
        if let (Some((text, correct)), Some(question)) = (option, questions.last_mut()) {
            question.options.push(QuizOption {
                text: text.trim().to_string(),
                correct,
            });
        }
    }

    Quiz {
        title,
        time: directive(body, "time").map(str::to_string),
        scoring,
        questions,
    }
}

/// Value of the first `::name <value>` line, if any.
fn directive<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    body.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("::")?.strip_prefix(name)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        match rest.trim() {
            "" => None,
            value => Some(value),
        }
    })
}

/// Numeric directive value. The number is the leading run of digits, dots and
/// minus signs; anything that doesn't parse leaves the field at its default.
fn number_directive(body: &str, name: &str) -> Option<f64> {
    let value = directive(body, name)?;
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(value.len());
    value[..end].parse::<f64>().ok()
}
