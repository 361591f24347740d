//! Per-submission sanitization and validation.
//!
//! Every declared field is visited in index order: the raw submitted string
//! goes through the field's sanitizer, then the required and JSON checks.
//! Failures never abort the pass; they are collected as [`ValidationError`]s
//! and the offending value is replaced by a safe fallback.

mod functions;

pub use functions::{
    absint, sanitize_email, sanitize_key, sanitize_text_field, sanitize_textarea_field, sanitize_title,
    strip_tags, Sanitizer, SanitizerRegistry, TEXT_FIELD,
};

use std::collections::HashMap;
use std::sync::Arc;

use html_escape::encode_quoted_attribute;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::host::RequestContext;
use crate::model::{FieldIndex, FieldModel, Severity};
use crate::value::{is_blank, value_to_string};

/// What a [`ValidationError`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    /// A required field sanitized to an empty value.
    Required,
    /// A JSON field holding text that does not parse.
    InvalidJson,
    /// Informational notice, such as the saved confirmation.
    Notice,
}

/// A user-visible message about one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field_slug: String,
    pub kind: ValidationKind,
    pub message: String,
    pub severity: Severity,
}

/// Result of one sanitization pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sanitized {
    /// One entry per declared field, in index order.
    pub values: IndexMap<String, String>,
    /// In index order; a field's required error precedes its JSON error.
    pub errors: Vec<ValidationError>,
}

impl Sanitized {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The values as a settings blob ready for the host to persist.
    pub fn to_table(&self) -> Table {
        self.values
            .iter()
            .map(|(slug, value)| (slug.clone(), Value::String(value.clone())))
            .collect()
    }

    /// Queues every error on the host's notice channel for `settings_name`,
    /// so the next page render shows them.
    pub fn report(&self, settings_name: &str, request: &mut dyn RequestContext) {
        for error in &self.errors {
            request.add_settings_error(settings_name, error.clone());
        }
    }
}

#[derive(Debug)]
struct RequiredRule {
    message: String,
    severity: Severity,
}

#[derive(Debug)]
struct FieldStep {
    slug: String,
    title: String,
    sanitizer: Sanitizer,
    required: Option<RequiredRule>,
    is_json: bool,
    default: String,
}

/// The sanitize entry point handed to the host.
///
/// Sanitizer names are resolved once, when the pipeline is built. Cloning is
/// cheap and every call to [`sanitize`](Self::sanitize) is independent.
#[derive(Debug, Clone)]
pub struct SanitizationPipeline {
    steps: Arc<[FieldStep]>,
}

impl SanitizationPipeline {
    pub fn build(fields: &FieldIndex, registry: &SanitizerRegistry) -> Self {
        let steps = fields
            .entries()
            .map(|(slug, field)| build_step(slug, field, registry))
            .collect();
        Self { steps }
    }

    /// Slugs the pipeline covers, in processing order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.slug.as_str())
    }

    /// Sanitizes and validates a submission.
    ///
    /// Always returns a value for every declared field; slugs in `submitted`
    /// that no field declares are ignored.
    pub fn sanitize(&self, submitted: &HashMap<String, String>) -> Sanitized {
        let mut values = IndexMap::with_capacity(self.steps.len());
        let mut errors = Vec::new();

        for step in self.steps.iter() {
            let raw = submitted.get(&step.slug).map(String::as_str).unwrap_or_default();
            let mut value = step.sanitizer.apply(raw);

            if let Some(rule) = &step.required {
                if is_blank(&value) {
                    errors.push(ValidationError {
                        field_slug: step.slug.clone(),
                        kind: ValidationKind::Required,
                        message: rule.message.clone(),
                        severity: rule.severity,
                    });
                    value = step.default.clone();
                }
            }

            if step.is_json && !is_blank(&value) && serde_json::from_str::<serde_json::Value>(&value).is_err() {
                errors.push(ValidationError {
                    field_slug: step.slug.clone(),
                    kind: ValidationKind::InvalidJson,
                    message: format!("The field {} must have a valid JSON format", step.title),
                    severity: Severity::Error,
                });
                value = String::new();
            }

            values.insert(step.slug.clone(), value);
        }

        for error in &errors {
            tracing::debug!(field = %error.field_slug, kind = ?error.kind, "validation failed");
        }

        Sanitized { values, errors }
    }
}

fn build_step(slug: &str, field: &FieldModel, registry: &SanitizerRegistry) -> FieldStep {
    let required = field.is_required.then(|| RequiredRule {
        message: match &field.is_required_message {
            Some(message) => encode_quoted_attribute(message).into_owned(),
            None => format!("The field {} is required", field.title),
        },
        severity: field.is_required_type,
    });

    FieldStep {
        slug: slug.to_string(),
        title: field.title.clone(),
        sanitizer: resolve_sanitizer(slug, field, registry),
        required,
        is_json: field.is_json,
        default: value_to_string(&field.default),
    }
}

fn resolve_sanitizer(slug: &str, field: &FieldModel, registry: &SanitizerRegistry) -> Sanitizer {
    let Some(name) = &field.sanitize_func else {
        return Sanitizer::text_field();
    };
    match registry.get(name) {
        Some(sanitizer) => sanitizer.clone(),
        None => {
            tracing::warn!(
                field = %slug,
                sanitizer = %name,
                "unknown sanitizer, falling back to {TEXT_FIELD}"
            );
            Sanitizer::text_field()
        }
    }
}
