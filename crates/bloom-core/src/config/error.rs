//! # Bloom Configuration Errors
//!
//! Defines [`ConfigError`], raised while reading configuration files, parsing
//! them in one of the supported formats, or converting values to and from
//! their typed representation.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Deserialization from '{format}' failed for '{path}': {source}")]
    DeserializationError {
        format: String,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Serialization of value for key '{key}' failed: {source}")]
    SerializationError {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration key '{key}' cannot be set: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Configuration store is not available before the application is built")]
    NotLoaded,
}
