//! Errors raised while loading, overriding or validating configuration

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {}: {source}", .path.display())]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not TOML or does not match the `Config` layout
    #[error("Failed to parse config file {}: {reason}", .path.display())]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to serialize configuration: {0}")]
    SerializeError(String),

    /// A setting, usually a `ROSTER_*` override, could not be parsed
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}
