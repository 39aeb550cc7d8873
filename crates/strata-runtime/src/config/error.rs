//! Configuration error types.

use std::path::PathBuf;

use strata_core::InvalidPluginId;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found at the specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Sources could not be merged or extracted.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    ValidationError { message: String },

    /// Two scopes share a name.
    #[error("Duplicate scope name: {0}")]
    DuplicateScope(String),

    /// A scope names a parent that is not declared before it.
    #[error("Scope '{scope}' refers to unknown parent '{parent}' (parents must be declared first)")]
    UnknownParent { scope: String, parent: String },

    /// A scope declares a malformed plugin id.
    #[error("Scope '{scope}' declares an invalid plugin id: {source}")]
    InvalidPluginId {
        scope: String,
        #[source]
        source: InvalidPluginId,
    },
}

impl ConfigError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
