//! Sequential region removal.
//!
//! Anchors are resolved strictly left to right: each anchor is searched for
//! starting at the end of the previous region, so located regions never
//! overlap. The output is `text[..first.start] + template + kept gaps +
//! text[last.end..]`.

use crate::anchor::Anchor;
use crate::region::{find_brace_region, Region, RegionError};
use serde::Deserialize;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// What happens to text found between two consecutive regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapPolicy {
    /// Keep gaps that contain anything besides whitespace.
    #[default]
    Preserve,
    /// Delete everything from the first region's start to the last region's end.
    Discard,
}

impl fmt::Display for GapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapPolicy::Preserve => write!(f, "preserve"),
            GapPolicy::Discard => write!(f, "discard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapFate {
    /// Whitespace-only, dropped.
    Collapsed,
    /// Kept after the template.
    Kept,
    /// Non-whitespace text deleted under [`GapPolicy::Discard`].
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gap {
    pub span: Range<usize>,
    pub fate: GapFate,
}

/// A region together with the anchor that located it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedRegion {
    pub anchor: String,
    pub region: Region,
    /// Byte offset of the opening brace.
    pub open_at: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StripError {
    #[error("strip plan has no anchors")]
    NoAnchors,

    #[error("{anchor} not found (searched from byte {from}){}", suggestion_suffix(.suggestion))]
    AnchorNotFound {
        anchor: String,
        from: usize,
        suggestion: Option<String>,
    },

    #[error("{anchor}: {source}")]
    Region {
        anchor: String,
        #[source]
        source: RegionError,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(line) => format!("; closest line: {line:?}"),
        None => String::new(),
    }
}

/// Result of a successful strip, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "StripOutcome holds the new text; write it or drop it deliberately"]
pub struct StripOutcome {
    pub text: String,
    pub regions: Vec<LocatedRegion>,
    pub gaps: Vec<Gap>,
}

impl StripOutcome {
    /// Byte span from the first region's start to the last region's end.
    pub fn removed_span(&self) -> Range<usize> {
        match (self.regions.first(), self.regions.last()) {
            (Some(first), Some(last)) => first.region.start..last.region.end,
            _ => 0..0,
        }
    }

    pub fn discarded_gaps(&self) -> impl Iterator<Item = &Gap> {
        self.gaps.iter().filter(|g| g.fate == GapFate::Discarded)
    }
}

/// Locate every anchor's region in order without building output.
pub fn locate(text: &str, anchors: &[Anchor]) -> Result<Vec<LocatedRegion>, StripError> {
    if anchors.is_empty() {
        return Err(StripError::NoAnchors);
    }

    let mut cursor = 0;
    let mut located = Vec::with_capacity(anchors.len());

    for anchor in anchors {
        let found = anchor
            .matcher
            .find(text, cursor)
            .ok_or_else(|| StripError::AnchorNotFound {
                anchor: anchor.name.clone(),
                from: cursor,
                suggestion: anchor.closest_line(text, cursor),
            })?;

        let (open_at, end) =
            find_brace_region(text, found.start, &anchor.trailing).map_err(|source| {
                StripError::Region {
                    anchor: anchor.name.clone(),
                    source,
                }
            })?;

        located.push(LocatedRegion {
            anchor: anchor.name.clone(),
            region: Region {
                start: found.start,
                end,
                kind: anchor.kind,
            },
            open_at,
        });
        cursor = end;
    }

    Ok(located)
}

/// Remove all anchored regions and insert `template` once in their place.
pub fn strip(
    text: &str,
    anchors: &[Anchor],
    template: &str,
    policy: GapPolicy,
) -> Result<StripOutcome, StripError> {
    let regions = locate(text, anchors)?;

    let gaps: Vec<Gap> = regions
        .windows(2)
        .filter(|pair| pair[0].region.end < pair[1].region.start)
        .map(|pair| {
            let span = pair[0].region.end..pair[1].region.start;
            let fate = match (text[span.clone()].trim().is_empty(), policy) {
                (true, _) => GapFate::Collapsed,
                (false, GapPolicy::Preserve) => GapFate::Kept,
                (false, GapPolicy::Discard) => GapFate::Discarded,
            };
            Gap { span, fate }
        })
        .collect();

    // `locate` rejects an empty anchor list, so both ends exist.
    let start = regions.first().map_or(0, |r| r.region.start);
    let end = regions.last().map_or(0, |r| r.region.end);

    let kept: usize = gaps
        .iter()
        .filter(|g| g.fate == GapFate::Kept)
        .map(|g| g.span.len())
        .sum();
    let mut out = String::with_capacity(text.len() - (end - start) + template.len() + kept);
    out.push_str(&text[..start]);
    out.push_str(template);
    for gap in gaps.iter().filter(|g| g.fate == GapFate::Kept) {
        out.push_str(&text[gap.span.clone()]);
    }
    out.push_str(&text[end..]);

    Ok(StripOutcome {
        text: out,
        regions,
        gaps,
    })
}
