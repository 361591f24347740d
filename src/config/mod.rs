//! Declarative page configuration and its loading.

mod builder;
mod error;
mod file;
pub(crate) mod resolve;
mod types;

pub use builder::ConfigBuilder;
pub use error::ConfigError;
pub use types::{Config, MenuPosition, MenuSpec, SectionSpec};
