use crate::anchor::Anchor;
use crate::region::RegionKind;
use crate::strip::GapPolicy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlanConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub anchors: Vec<AnchorDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Target {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub gaps: GapPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplateConfig {
    #[serde(default)]
    pub indent: String,
    #[serde(default = "default_true")]
    pub blank_line_after: bool,
    #[serde(default)]
    pub lines: Vec<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            indent: String::new(),
            blank_line_after: true,
            lines: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl TemplateConfig {
    /// Each line indented and newline-terminated, then optionally a blank
    /// line and the indent again so the following code keeps its column.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&self.indent);
            out.push_str(line);
            out.push('\n');
        }
        if self.blank_line_after {
            out.push('\n');
            out.push_str(&self.indent);
        }
        out
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnchorDefinition {
    pub name: String,
    pub kind: RegionKind,
    pub locate: Locate,
    /// Overrides the kind's default trailing characters.
    #[serde(default)]
    pub trailing: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Locate {
    /// Exact substring.
    Literal { text: String },
    /// Regular expression (Rust `regex` syntax).
    Pattern { regex: String },
}

/// A validated plan ready to run.
#[derive(Debug, Clone)]
pub struct StripPlan {
    pub name: String,
    pub description: Option<String>,
    /// Target file from the plan, if it names one.
    pub target: Option<PathBuf>,
    pub gaps: GapPolicy,
    pub template: String,
    pub anchors: Vec<Anchor>,
}

impl PlanConfig {
    /// Validate and compile into a [`StripPlan`], reporting every issue at once.
    pub fn compile(&self) -> Result<StripPlan, ValidationError> {
        let mut issues = Vec::new();
        let mut anchors = Vec::with_capacity(self.anchors.len());
        let mut seen = HashSet::new();

        if self.anchors.is_empty() {
            issues.push(ValidationIssue::EmptyAnchorList);
        }
        if self.template.lines.is_empty() {
            issues.push(ValidationIssue::MissingField {
                anchor: None,
                field: "template.lines",
            });
        }

        for def in &self.anchors {
            let name = def.name.trim();
            if name.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    anchor: None,
                    field: "name",
                });
            } else if !seen.insert(name) {
                issues.push(ValidationIssue::DuplicateName(name.to_string()));
            }

            let anchor = match &def.locate {
                Locate::Literal { text } => {
                    if text.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            anchor: Some(def.name.clone()),
                            field: "locate.text",
                        });
                        continue;
                    }
                    Anchor::literal(name, text.clone(), def.kind)
                }
                Locate::Pattern { regex } => {
                    if regex.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            anchor: Some(def.name.clone()),
                            field: "locate.regex",
                        });
                        continue;
                    }
                    match Regex::new(regex) {
                        Ok(re) => Anchor::pattern(name, re, def.kind),
                        Err(err) => {
                            issues.push(ValidationIssue::InvalidPattern {
                                anchor: def.name.clone(),
                                message: err.to_string(),
                            });
                            continue;
                        }
                    }
                }
            };

            anchors.push(match &def.trailing {
                Some(skip) if !skip.is_ascii() => {
                    issues.push(ValidationIssue::NonAsciiTrailing(def.name.clone()));
                    continue;
                }
                Some(skip) => anchor.with_trailing(skip),
                None => anchor,
            });
        }

        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }

        Ok(StripPlan {
            name: self.meta.name.clone(),
            description: self.meta.description.clone(),
            target: self.target.file.as_ref().map(PathBuf::from),
            gaps: self.target.gaps,
            template: self.template.render(),
            anchors,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyAnchorList,
    MissingField {
        anchor: Option<String>,
        field: &'static str,
    },
    DuplicateName(String),
    InvalidPattern {
        anchor: String,
        message: String,
    },
    NonAsciiTrailing(String),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyAnchorList => write!(f, "strip plan contains no anchors"),
            ValidationIssue::MissingField { anchor, field } => match anchor {
                Some(name) => write!(f, "anchor '{name}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::DuplicateName(name) => {
                write!(f, "anchor name '{name}' is used more than once")
            }
            ValidationIssue::InvalidPattern { anchor, message } => {
                write!(f, "anchor '{anchor}' has an invalid regex: {message}")
            }
            ValidationIssue::NonAsciiTrailing(name) => {
                write!(f, "anchor '{name}' trailing characters must be ASCII")
            }
        }
    }
}
