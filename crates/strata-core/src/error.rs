//! Unified error types for the Strata core.
//!
//! Every error here is `Clone`: a single-flight resolution hands the same
//! failure value to every caller that was waiting on it, so the value must be
//! shareable without an outer envelope.

use thiserror::Error;

use crate::plugin_id::PluginId;

// =============================================================================
// Identifier Errors
// =============================================================================

/// Errors produced when parsing a [`PluginId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPluginId {
    /// The identifier text was empty.
    #[error("plugin id cannot be empty")]
    Empty,

    /// The identifier contains a character outside the allowed set.
    #[error("plugin id '{id}' contains invalid char '{ch}' (only ASCII alphanumerics, '.', '_' and '-' are allowed)")]
    InvalidChar {
        /// The offending identifier.
        id: String,
        /// The first invalid character.
        ch: char,
    },

    /// The identifier contains more than one namespace separator.
    #[error("plugin id '{0}' contains more than one namespace separator")]
    MultipleSeparators(String),

    /// Namespace or name segment is empty (e.g. `core:` or `:java`).
    #[error("plugin id '{0}' has an empty namespace or name")]
    EmptySegment(String),

    /// A segment begins or ends with `.`.
    #[error("plugin id '{0}' cannot begin or end with '.'")]
    DotBoundary(String),

    /// A segment contains `..`.
    #[error("plugin id '{0}' cannot contain '..'")]
    DoubleDot(String),
}

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors raised by a [`LoadingContext`](crate::LoadingContext) while
/// resolving a named type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The class name is not resolvable in the context or any of its parents.
    #[error("class '{class_name}' not found in {context}")]
    ClassNotFound {
        /// Requested class name.
        class_name: String,
        /// Display name of the context that was asked.
        context: String,
    },
}

// =============================================================================
// Inspection Errors
// =============================================================================

/// Errors raised by an [`Inspector`](crate::Inspector) when a loaded type is
/// structurally invalid as a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    /// The type is abstract or an interface but declares a plugin marker.
    #[error("plugin implementation type '{type_name}' is {kind} and cannot be instantiated")]
    NotInstantiable {
        /// Name of the rejected type.
        type_name: String,
        /// Human-readable kind (`abstract`, `an interface`).
        kind: &'static str,
    },

    /// Rejection from a custom inspector.
    #[error("{0}")]
    Custom(String),
}

impl InspectError {
    /// Creates a custom inspection error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

// =============================================================================
// Resolution Errors
// =============================================================================

/// Failures of plugin resolution.
///
/// "Not found" is not an error: it is an `Ok(None)` from the lookup methods.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// A descriptor exists but names no implementation class.
    #[error("No implementation class specified for plugin '{id}' in {descriptor}.")]
    MissingImplementationClass {
        /// Identifier that was looked up.
        id: PluginId,
        /// Location of the malformed descriptor.
        descriptor: String,
    },

    /// The implementation class named by a descriptor cannot be loaded.
    #[error(
        "Could not find implementation class '{class_name}' for plugin '{id}' specified in {descriptor}."
    )]
    ImplementationClassNotFound {
        /// Identifier that was looked up.
        id: PluginId,
        /// Class name declared by the descriptor.
        class_name: String,
        /// Location of the descriptor.
        descriptor: String,
        /// The original load failure.
        #[source]
        source: LoadError,
    },

    /// The inspector rejected the loaded type.
    #[error(transparent)]
    Inspection(#[from] InspectError),
}

impl ResolveError {
    /// Returns `true` for failures caused by a broken plugin declaration.
    pub fn is_invalid_plugin(&self) -> bool {
        matches!(
            self,
            Self::MissingImplementationClass { .. } | Self::ImplementationClassNotFound { .. }
        )
    }
}

/// Result type for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;
