use crate::config::ConfigError;
use crate::store::StoreError;
use thiserror::Error;

/// Top-level error type for the settings-page library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("settings store error: {0}")]
    Store(#[from] StoreError),

    #[error("settings page requires a configuration")]
    MissingConfig,
}
