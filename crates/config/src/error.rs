//! Error types for the settings store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, validating or persisting settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON or misses required keys
    #[error("config file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The settings file could not be written
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings could not be serialized
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Submitted card template is not valid JSON
    #[error("card template is not valid JSON: {0}")]
    TemplateParse(#[source] serde_json::Error),

    /// Submitted card template is JSON but not a card template
    #[error("card template is invalid: {0}")]
    TemplateShape(String),
}
