//! Anchors locate the start of a legacy region inside the buffer.

use crate::region::{RegionKind, Trailing};
use regex::Regex;
use std::fmt;
use std::ops::Range;

/// How an anchor is searched for.
#[derive(Debug, Clone)]
pub enum AnchorMatcher {
    /// Exact substring.
    Literal(String),
    /// Regular expression, first match wins.
    Pattern(Regex),
}

impl AnchorMatcher {
    /// Find the first match at or after byte `from`, as an absolute range.
    pub fn find(&self, text: &str, from: usize) -> Option<Range<usize>> {
        match self {
            AnchorMatcher::Literal(needle) => text
                .get(from..)?
                .find(needle.as_str())
                .map(|pos| from + pos..from + pos + needle.len()),
            // `find_at` keeps the text before `from` visible to `^`, `\A` and `\b`.
            AnchorMatcher::Pattern(re) => {
                if from > text.len() {
                    return None;
                }
                re.find_at(text, from).map(|m| m.range())
            }
        }
    }

    /// Literal text, if this is a literal anchor.
    pub fn literal(&self) -> Option<&str> {
        match self {
            AnchorMatcher::Literal(text) => Some(text),
            AnchorMatcher::Pattern(_) => None,
        }
    }
}

impl fmt::Display for AnchorMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorMatcher::Literal(text) => write!(f, "literal {text:?}"),
            AnchorMatcher::Pattern(re) => write!(f, "pattern /{}/", re.as_str()),
        }
    }
}

/// One legacy block to remove.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub name: String,
    pub matcher: AnchorMatcher,
    pub kind: RegionKind,
    pub trailing: Trailing,
}

impl Anchor {
    pub fn literal(name: impl Into<String>, text: impl Into<String>, kind: RegionKind) -> Self {
        Self {
            name: name.into(),
            matcher: AnchorMatcher::Literal(text.into()),
            kind,
            trailing: Trailing::for_kind(kind),
        }
    }

    pub fn pattern(name: impl Into<String>, pattern: Regex, kind: RegionKind) -> Self {
        Self {
            name: name.into(),
            matcher: AnchorMatcher::Pattern(pattern),
            kind,
            trailing: Trailing::for_kind(kind),
        }
    }

    #[must_use]
    pub fn with_trailing(mut self, skip: &str) -> Self {
        self.trailing = Trailing::new(self.trailing.terminator, skip);
        self
    }

    /// Suggest the line closest to a literal anchor, for "not found" reports.
    ///
    /// Only lines in `text[from..]` are considered and only matches with a
    /// normalized similarity of at least 0.7 are returned.
    pub fn closest_line(&self, text: &str, from: usize) -> Option<String> {
        let needle = self.matcher.literal()?;
        let window = text.get(from..)?;

        window
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && line.len() <= needle.len() * 4)
            .map(|line| {
                let candidate = truncate_chars(line, needle.chars().count());
                (strsim::normalized_levenshtein(needle, candidate), line)
            })
            .filter(|(score, _)| *score >= 0.7)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, line)| line.to_string())
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
