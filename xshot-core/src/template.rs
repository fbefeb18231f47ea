//! Basename templates: `{number}` and `{datetime}` placeholders in literal
//! text.

use regex::Regex;

use crate::errors::{Result, XshotError};

pub const NUMBER_FIELD: &str = "{number}";
pub const DATETIME_FIELD: &str = "{datetime}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Number,
    DateTime,
}

/// A parsed basename template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> NameTemplate<'a> {
    /// Split `template` into literal runs and placeholders.  Anything that is
    /// not exactly `{number}` or `{datetime}` is literal text.
    pub fn parse(template: &'a str) -> Self {
        let mut segments = Vec::new();
        let mut rest = template;
        while !rest.is_empty() {
            let next = [
                (NUMBER_FIELD, Segment::Number),
                (DATETIME_FIELD, Segment::DateTime),
            ]
            .into_iter()
            .filter_map(|(token, segment)| rest.find(token).map(|at| (at, token.len(), segment)))
            .min_by_key(|(at, _, _)| *at);

            match next {
                Some((at, len, segment)) => {
                    if at > 0 {
                        segments.push(Segment::Literal(&rest[..at]));
                    }
                    segments.push(segment);
                    rest = &rest[at + len..];
                }
                None => {
                    segments.push(Segment::Literal(rest));
                    break;
                }
            }
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    pub fn has_number(&self) -> bool {
        self.segments.contains(&Segment::Number)
    }

    /// Substitute both placeholders, after `prefix`.
    pub fn render(&self, prefix: &str, number: &str, datetime: &str) -> String {
        let mut out = String::from(prefix);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Number => out.push_str(number),
                Segment::DateTime => out.push_str(datetime),
            }
        }
        out
    }

    /// Regex matching names this template produces, with any extension.
    ///
    /// The first `{number}` becomes the `number` capture group; `{datetime}`
    /// matches anything.
    pub fn pattern(&self, prefix: &str) -> Result<Regex> {
        let mut source = String::from("^");
        source.push_str(&regex::escape(prefix));
        let mut captured = false;
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                Segment::Number if !captured => {
                    source.push_str("(?P<number>[0-9]+)");
                    captured = true;
                }
                Segment::Number => source.push_str("[0-9]+"),
                Segment::DateTime => source.push_str(".*"),
            }
        }
        source.push_str(r"\..*$");
        Regex::new(&source).map_err(|e| XshotError::InvalidValue {
            field: "name_format",
            value: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
