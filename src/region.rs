use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// What kind of legacy block a region holds.
///
/// The kind only decides the default trailing characters swallowed after
/// the balancing brace; the balancing scan itself is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionKind {
    /// `const name = { ... };`
    ObjectLiteral,
    /// `function name(arg) { ... }`
    FunctionDeclaration,
}

impl RegionKind {
    /// Characters skipped after the region (and after its optional `;`).
    pub fn default_trailing(self) -> &'static str {
        match self {
            RegionKind::ObjectLiteral => "\r\n",
            RegionKind::FunctionDeclaration => "\r\n ",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::ObjectLiteral => write!(f, "object literal"),
            RegionKind::FunctionDeclaration => write!(f, "function declaration"),
        }
    }
}

/// A located span of the source buffer, `[start, end)` in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
    pub kind: RegionKind,
}

impl Region {
    /// Approximate 1-based line numbers of the region's first and last byte.
    pub fn line_range(&self, text: &str) -> (usize, usize) {
        (line_of(text, self.start), line_of(text, self.end))
    }
}

/// 1-based line number of a byte offset (count of `\n` before it, plus one).
pub fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset.min(text.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// How the region boundary is extended past the balancing delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailing {
    /// Optional single statement terminator consumed right after the close.
    pub terminator: Option<u8>,
    /// ASCII bytes skipped (any number, any order) after the terminator.
    pub skip: Vec<u8>,
}

impl Trailing {
    pub fn new(terminator: Option<u8>, skip: &str) -> Self {
        Self {
            terminator,
            skip: skip.bytes().collect(),
        }
    }

    pub fn for_kind(kind: RegionKind) -> Self {
        Self::new(Some(b';'), kind.default_trailing())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("no opening '{delimiter}' at or after byte {from}")]
    MissingOpen { delimiter: char, from: usize },

    #[error("unbalanced region opened at byte {open_at}: reached end of input at depth {depth}")]
    Unbalanced { open_at: usize, depth: usize },
}

/// Find the end of a balanced `open`/`close` region.
///
/// The scan starts at the first `open` byte at or after `from` and counts
/// depth without any awareness of strings or comments. The returned offset
/// points just past the closing delimiter that brings depth back to zero,
/// extended by `trailing`.
///
/// Returns `(open_at, end)`.
pub fn find_region_end(
    text: &str,
    from: usize,
    open: u8,
    close: u8,
    trailing: &Trailing,
) -> Result<(usize, usize), RegionError> {
    let bytes = text.as_bytes();
    let from = from.min(bytes.len());

    let open_at = bytes[from..]
        .iter()
        .position(|&b| b == open)
        .map(|pos| from + pos)
        .ok_or(RegionError::MissingOpen {
            delimiter: open as char,
            from,
        })?;

    let mut depth = 0usize;
    let mut close_at = None;
    for (idx, &b) in bytes.iter().enumerate().skip(open_at) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                close_at = Some(idx);
                break;
            }
        }
    }

    let Some(close_at) = close_at else {
        return Err(RegionError::Unbalanced { open_at, depth });
    };

    let mut end = close_at + 1;
    if let Some(term) = trailing.terminator {
        if bytes.get(end) == Some(&term) {
            end += 1;
        }
    }
    while end < bytes.len() && trailing.skip.contains(&bytes[end]) {
        end += 1;
    }

    Ok((open_at, end))
}

/// Brace-balanced extent starting at `from`, using the kind's trailing rules.
pub fn find_brace_region(
    text: &str,
    from: usize,
    trailing: &Trailing,
) -> Result<(usize, usize), RegionError> {
    find_region_end(text, from, b'{', b'}', trailing)
}
