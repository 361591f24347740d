use std::fmt;
use std::sync::Arc;

use toml::Table;

use super::SettingsPage;
use crate::config::Config;
use crate::model::normalize;
use crate::sanitize::{SanitizationPipeline, SanitizerRegistry};
use crate::store::SettingsStore;
use crate::template::{TemplateRegistry, TemplateResolver};
use crate::Error;

/// Builder for constructing a [`SettingsPage`].
///
/// Only the configuration is mandatory. Without a store the page starts with
/// no stored settings; without a template registry it uses the built-in views.
///
/// ## Example
///
/// ```no_run
/// use settings_page::{Config, MemoryStore, SettingsPage};
///
/// let store = MemoryStore::new();
/// let page = SettingsPage::builder()
///     .with_config(Config::builder().with_file("settings/general.toml", true).build()?)
///     .with_store(&store)
///     .with_admin_url("https://example.com/wp-admin/")
///     .build()?;
///
/// let client_id = page.resolve("client_id");
/// # Ok::<(), settings_page::Error>(())
/// ```
#[must_use = "builders do nothing until .build() is called"]
pub struct SettingsPageBuilder<'a> {
    config: Option<Config>,
    store: Option<&'a dyn SettingsStore>,
    sanitizers: SanitizerRegistry,
    templates: Option<Arc<dyn TemplateRegistry>>,
    admin_url: String,
}

impl SettingsPage {
    /// Creates a new builder for constructing a `SettingsPage`.
    pub fn builder<'a>() -> SettingsPageBuilder<'a> {
        SettingsPageBuilder {
            config: None,
            store: None,
            sanitizers: SanitizerRegistry::default(),
            templates: None,
            admin_url: String::new(),
        }
    }
}

impl<'a> SettingsPageBuilder<'a> {
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Store the settings blob is loaded from, once, during [`build`](Self::build).
    pub fn with_store(mut self, store: &'a dyn SettingsStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the sanitizer registry that `sanitize_func` names resolve against.
    pub fn with_sanitizers(mut self, sanitizers: SanitizerRegistry) -> Self {
        self.sanitizers = sanitizers;
        self
    }

    pub fn with_templates(mut self, templates: Arc<dyn TemplateRegistry>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Base URL menu positions are relative to.
    pub fn with_admin_url(mut self, admin_url: impl Into<String>) -> Self {
        self.admin_url = admin_url.into();
        self
    }

    /// Normalizes the configuration, loads stored settings and resolves sanitizers.
    ///
    /// Returns an error if no configuration was provided, the configuration
    /// has mistyped values, or the store fails.
    pub fn build(self) -> Result<SettingsPage, Error> {
        let config = self.config.ok_or(Error::MissingConfig)?;
        let model = normalize(&config, &self.admin_url)?;

        let settings = match self.store {
            Some(store) => store.load(&config.settings_name)?,
            None => Table::new(),
        };

        let defaults = model.fields.defaults();
        let pipeline = SanitizationPipeline::build(&model.fields, &self.sanitizers);
        let templates = self.templates.map(TemplateResolver::new).unwrap_or_default();

        Ok(SettingsPage {
            model,
            defaults,
            settings,
            pipeline,
            templates,
        })
    }
}

impl fmt::Debug for SettingsPageBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsPageBuilder")
            .field("config", &self.config)
            .field("has_store", &self.store.is_some())
            .field("sanitizers", &self.sanitizers)
            .field("admin_url", &self.admin_url)
            .finish_non_exhaustive()
    }
}
