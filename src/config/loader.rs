use crate::config::schema::{PlanConfig, StripPlan, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The legacy quiz cleanup plan shipped with the binary.
pub const BUILTIN_PLAN: &str = include_str!("../../plans/legacy-cleanup.toml");

/// Failure to turn a plan file into a [`StripPlan`].
///
/// `path` is `None` for plans parsed from a string until
/// [`load_from_path`] fills it in.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(mut self, plan_path: &Path) -> Self {
        if let ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } = &mut self {
            path.get_or_insert_with(|| plan_path.to_path_buf());
        }
        self
    }

    fn plan_path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path.as_path()),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            ConfigError::Io { .. } => "cannot read strip plan",
            ConfigError::Toml { .. } => "strip plan is not valid TOML",
            ConfigError::Validation { .. } => "strip plan rejected",
        };
        match self.plan_path() {
            Some(path) => write!(f, "{what} ({})", path.display())?,
            None => write!(f, "{what}")?,
        }
        match self {
            ConfigError::Io { source, .. } => write!(f, ": {source}"),
            ConfigError::Toml { source, .. } => write!(f, ": {source}"),
            ConfigError::Validation { source, .. } => write!(f, ": {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<StripPlan, ConfigError> {
    let config: PlanConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .compile()
        .map_err(|source| ConfigError::Validation { path: None, source })
}

/// Load a plan file. A relative `target.file` is resolved against the plan's
/// own directory.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<StripPlan, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut plan = load_from_str(&contents).map_err(|error| error.with_path(path))?;

    if let (Some(target), Some(dir)) = (plan.target.as_ref(), path.parent()) {
        if target.is_relative() {
            plan.target = Some(dir.join(target));
        }
    }

    Ok(plan)
}

pub fn builtin() -> Result<StripPlan, ConfigError> {
    load_from_str(BUILTIN_PLAN)
}
