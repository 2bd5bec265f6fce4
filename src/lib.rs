//! Legacy Stripper: one-shot removal of brace-delimited legacy script blocks
//!
//! Locates a fixed sequence of anchors (literal text or regex) inside a
//! source file, finds the extent of each block by brace balancing, and
//! replaces the whole run of blocks with a single comment template.
//!
//! # Architecture
//!
//! - [`region`] holds the only real algorithm: a pure depth-counting scan
//!   from an offset to the balancing `}`.
//! - [`strip`] resolves anchors left to right and builds the new buffer.
//! - [`source`] loads the file (UTF-8 with a lossy fallback) and writes the
//!   result back atomically.
//! - [`config`] describes what to strip as a TOML plan; the quiz cleanup
//!   plan is built in.
//!
//! # Example
//!
//! ```
//! use legacy_stripper::{config, strip, GapPolicy};
//!
//! let plan = config::builtin().unwrap();
//! let input = "const quizRegistry = {a: {b: 1}};\n\
//!              let sectionScores = {};\n\
//!              function getContentForSection(id) { return id; }\n\
//!              init();\n";
//!
//! let outcome = strip(input, &plan.anchors, &plan.template, GapPolicy::Preserve).unwrap();
//! assert!(outcome.text.ends_with("init();\n"));
//! assert!(!outcome.text.contains("quizRegistry = {"));
//! ```

pub mod anchor;
pub mod config;
pub mod region;
pub mod source;
pub mod strip;

// Re-exports
pub use anchor::{Anchor, AnchorMatcher};
pub use config::{load_from_path, load_from_str, ConfigError, StripPlan};
pub use region::{find_brace_region, find_region_end, Region, RegionError, RegionKind, Trailing};
pub use source::{DecodeMode, SourceDocument, SourceError};
pub use strip::{locate, strip, Gap, GapFate, GapPolicy, LocatedRegion, StripError, StripOutcome};
