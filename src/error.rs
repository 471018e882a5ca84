//! Top-level error types for sbc-rates.

use std::sync::Arc;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error enum wrapping domain-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or writing the backing setting failed.
    #[error("settings store access failed: {0}")]
    StoreAccess(#[from] SettingsError),

    #[error(transparent)]
    InvalidAddress(#[from] crate::device::InvalidAddress),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config from {path}: {source}")]
    Load {
        path: String,
        source: Arc<std::io::Error>,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings backend errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to open settings database at {path}: {source}")]
    Open {
        path: String,
        source: Arc<redb::Error>,
    },

    #[error("failed to read setting '{key}': {source}")]
    Read {
        key: String,
        source: Arc<redb::Error>,
    },

    #[error("failed to write setting '{key}': {source}")]
    Write {
        key: String,
        source: Arc<redb::Error>,
    },

    #[error("settings backend unavailable: {0}")]
    Unavailable(String),
}

impl SettingsError {
    pub(crate) fn read(key: &str, error: impl Into<redb::Error>) -> Self {
        Self::Read {
            key: key.to_string(),
            source: Arc::new(error.into()),
        }
    }

    pub(crate) fn write(key: &str, error: impl Into<redb::Error>) -> Self {
        Self::Write {
            key: key.to_string(),
            source: Arc::new(error.into()),
        }
    }
}
