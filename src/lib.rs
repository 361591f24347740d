//! Declarative admin settings pages.
//!
//! A host describes a page, its sections and their fields as one [`Config`]
//! tree. [`SettingsPage`] turns that tree into a normalized model with
//! computed defaults, resolves current values against the stored settings
//! blob, sanitizes and validates submissions, and renders each entity through
//! a template registry.

pub mod config;
mod error;
pub mod host;
pub mod model;
pub mod page;
pub mod sanitize;
pub mod store;
pub mod template;
pub mod value;

pub use config::{Config, ConfigError, MenuPosition, MenuSpec, SectionSpec};
pub use error::Error;
pub use model::{FieldIndex, FieldModel, Normalized, PageModel, SectionModel, Severity};
pub use page::{SettingsPage, SettingsPageBuilder};
pub use sanitize::{SanitizationPipeline, Sanitized, SanitizerRegistry, ValidationError, ValidationKind};
pub use store::{FileStore, MemoryStore, SettingsStore, StoreError};
pub use template::{DirTemplates, Entity, MemoryTemplates, TemplateRegistry, TemplateResolver};
