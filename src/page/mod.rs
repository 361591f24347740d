//! The assembled settings page.
//!
//! A [`SettingsPage`] is built once per request from a [`Config`](crate::Config):
//! it normalizes the declaration, loads the stored blob and resolves the
//! sanitize pipeline. After that the host drives it through the lifecycle
//! hooks, value lookups, rendering and submission sanitizing.

mod builder;
mod lifecycle;
mod render;

pub use builder::SettingsPageBuilder;

use std::collections::HashMap;

use indexmap::IndexMap;
use toml::{Table, Value};

use crate::config::MenuSpec;
use crate::host::RequestContext;
use crate::model::{FieldIndex, FieldModel, Normalized, PageModel, SectionModel};
use crate::sanitize::{SanitizationPipeline, Sanitized};
use crate::template::TemplateResolver;
use crate::value;

#[derive(Debug)]
pub struct SettingsPage {
    model: Normalized,
    defaults: IndexMap<String, Value>,
    settings: Table,
    pipeline: SanitizationPipeline,
    templates: TemplateResolver,
}

impl SettingsPage {
    pub fn settings_name(&self) -> &str {
        &self.model.settings_name
    }

    pub fn model(&self) -> &Normalized {
        &self.model
    }

    pub fn page(&self) -> &PageModel {
        &self.model.page
    }

    pub fn menu(&self) -> &MenuSpec {
        &self.model.menu
    }

    pub fn sections(&self) -> &IndexMap<String, SectionModel> {
        &self.model.sections
    }

    /// Looks a section up by slug, then by its `id`.
    pub fn section(&self, slug_or_id: &str) -> Option<&SectionModel> {
        self.model
            .sections
            .get(slug_or_id)
            .or_else(|| self.model.sections.values().find(|s| s.id == slug_or_id))
    }

    pub fn fields(&self) -> &FieldIndex {
        &self.model.fields
    }

    pub fn field(&self, slug: &str) -> Option<&FieldModel> {
        self.model.fields.get(slug)
    }

    /// Slug to default value for every field.
    pub fn defaults(&self) -> &IndexMap<String, Value> {
        &self.defaults
    }

    /// The blob loaded from the store when the page was built.
    pub fn settings(&self) -> &Table {
        &self.settings
    }

    /// Current value of a field; see [`value::resolve`] for the falsy-value rule.
    pub fn resolve(&self, slug: &str) -> Option<&Value> {
        value::resolve(&self.settings, &self.defaults, slug)
    }

    /// Value a field's input shows: the stored value when present, else its default.
    pub fn display_value(&self, slug: &str) -> Option<&Value> {
        self.field(slug)
            .map(|field| value::display_value(&self.settings, slug, field))
    }

    pub fn pipeline(&self) -> &SanitizationPipeline {
        &self.pipeline
    }

    /// Runs one submission through the sanitize pipeline.
    ///
    /// The result is handed back for the host to persist; the page's own
    /// settings are left as loaded.
    pub fn sanitize(&self, submitted: &HashMap<String, String>) -> Sanitized {
        self.pipeline.sanitize(submitted)
    }

    /// Sanitizes a submission and queues its validation errors on the
    /// request, where the following [`render_page`](Self::render_page) shows
    /// them.
    pub fn submit(&self, request: &mut dyn RequestContext, submitted: &HashMap<String, String>) -> Sanitized {
        let sanitized = self.pipeline.sanitize(submitted);
        sanitized.report(self.settings_name(), request);
        sanitized
    }
}
