//! Persistence boundary for the settings blob.
//!
//! The page loads its blob once when it is built and never writes it back;
//! the host persists sanitized results through [`SettingsStore::save`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::{Table, Value};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write settings file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Host key-value persistence, keyed by settings name.
pub trait SettingsStore {
    /// The stored blob, or an empty table when nothing is stored.
    fn load(&self, settings_name: &str) -> Result<Table, StoreError>;

    fn save(&mut self, settings_name: &str, values: Table) -> Result<(), StoreError>;
}

/// Blobs kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, settings_name: impl Into<String>, values: Table) -> Self {
        self.blobs.insert(settings_name.into(), values);
        self
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, settings_name: &str) -> Result<Table, StoreError> {
        Ok(self.blobs.get(settings_name).cloned().unwrap_or_default())
    }

    fn save(&mut self, settings_name: &str, values: Table) -> Result<(), StoreError> {
        self.blobs.insert(settings_name.to_string(), values);
        Ok(())
    }
}

/// Blobs stored as tables of one TOML file, one table per settings name.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Table, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => toml::from_str(&contents).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Table::new()),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl SettingsStore for FileStore {
    fn load(&self, settings_name: &str) -> Result<Table, StoreError> {
        let mut document = self.read_document()?;
        match document.remove(settings_name) {
            Some(Value::Table(values)) => Ok(values),
            Some(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    settings_name,
                    "stored settings are not a table, treating as empty"
                );
                Ok(Table::new())
            }
            None => Ok(Table::new()),
        }
    }

    fn save(&mut self, settings_name: &str, values: Table) -> Result<(), StoreError> {
        let mut document = self.read_document()?;
        document.insert(settings_name.to_string(), Value::Table(values));
        let contents = toml::to_string(&document)?;
        std::fs::write(&self.path, contents).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), settings_name, "settings saved");
        Ok(())
    }
}
