pub mod loader;
pub mod schema;

pub use loader::{builtin, load_from_path, load_from_str, ConfigError, BUILTIN_PLAN};
pub use schema::{
    AnchorDefinition, Locate, Metadata, PlanConfig, StripPlan, Target, TemplateConfig,
    ValidationError, ValidationIssue,
};
