use std::path::{Path, PathBuf};

use super::file::load_config_file;
use super::resolve::resolve_references;
use super::{Config, ConfigError};

/// A layer in the loading pipeline.
#[derive(Debug)]
enum ConfigSource {
    File { path: PathBuf, required: bool },
    Inline(String),
}

/// Builder for loading a page [`Config`] from TOML layers.
///
/// Layers are merged in registration order, with later layers overriding
/// earlier ones. Nested tables are merged recursively; other values
/// (including arrays) are replaced entirely. A site-local file can therefore
/// retitle a single field without restating the whole page.
///
/// ## Variable References
///
/// String values can reference other config values using `${path.to.field}` syntax:
///
/// ```toml
/// settings_name = "spotify_api"
///
/// [page]
/// title = "Spotify API Settings"
///
/// [menu]
/// title = "${page.title}"
/// ```
///
/// Use `$$` to escape a literal `$` (e.g., `$${VAR}` becomes `${VAR}`).
///
/// ## Example
///
/// ```no_run
/// use settings_page::Config;
///
/// let config = Config::builder()
///     .with_file("settings/general.toml", true)
///     .with_file("settings/local.toml", false)
///     .build()?;
/// # Ok::<(), settings_page::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigBuilder {
    sources: Vec<ConfigSource>,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parses a single TOML document, with reference resolution.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Self::builder().with_str(source).build()
    }
}

impl ConfigBuilder {
    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(ConfigSource::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Adds an inline TOML document as a layer.
    pub fn with_str(mut self, source: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Inline(source.into()));
        self
    }

    /// Builds the configuration by loading, merging, resolving, and deserializing.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut merged = toml::Table::new();

        for source in self.sources {
            match source {
                ConfigSource::File { path, required } => {
                    if let Some(table) = load_config_file(&path, required)? {
                        tracing::trace!(path = %path.display(), "merging config file");
                        deep_merge(&mut merged, table);
                    }
                }
                ConfigSource::Inline(source) => {
                    let table = toml::from_str(&source).map_err(ConfigError::InlineParseError)?;
                    deep_merge(&mut merged, table);
                }
            }
        }

        // Resolve ${...} references after all sources are merged
        resolve_references(&mut merged)?;

        let value = toml::Value::Table(merged);
        value.try_into().map_err(ConfigError::DeserializeError)
    }
}

fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
