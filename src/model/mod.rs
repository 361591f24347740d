//! Normalized runtime model of a settings page.

mod index;
mod normalize;

pub use index::{flatten_fields, FieldIndex};
pub use normalize::{normalize, Normalized};

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

/// How a notice is presented by the host.
///
/// Names the host does not know deserialize as [`Severity::Error`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
    Success,
    /// Legacy name for a success notice.
    Updated,
    #[default]
    #[serde(other)]
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Updated => "updated",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageModel {
    pub id: String,
    pub title: String,
    /// Registration handle returned by the host's menu; empty until registered.
    pub hook: String,
    pub required_capability: String,
    pub template: String,
    /// Absolute URL of the page, always ending in a single `page=<id>` query component.
    pub url: String,
    #[serde(flatten)]
    pub extra: Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionModel {
    pub slug: String,
    pub id: String,
    pub title: String,
    pub description: String,
    /// Field slugs in declaration order. Bodies live in the [`FieldIndex`].
    pub fields: Vec<String>,
    pub template: String,
    #[serde(flatten)]
    pub extra: Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldModel {
    pub slug: String,
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub title: String,
    pub description: String,
    pub class: String,
    /// Form input name, `<settings_name>[<slug>]` unless overridden.
    pub name: String,
    pub default: Value,
    /// Name of a registered sanitizer; resolved when the pipeline is built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitize_func: Option<String>,
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required_message: Option<String>,
    pub is_required_type: Severity,
    pub is_json: bool,
    pub template: String,
    /// Always mirrors `id`.
    pub label_for: String,
    #[serde(flatten)]
    pub extra: Table,
}
