//! Runtime error types.

use strata_core::{InvalidPluginId, ResolveError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No scope with this name.
    #[error("Scope not found: {0}")]
    UnknownScope(String),

    /// A plugin id given at runtime is malformed.
    #[error("Invalid plugin id: {0}")]
    InvalidPluginId(#[from] InvalidPluginId),

    /// Resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
