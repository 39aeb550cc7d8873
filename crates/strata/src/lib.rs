//! # Strata
//!
//! Hierarchical plugin resolution across nested loading scopes.
//!
//! ## Overview
//!
//! Plugins are found by id through descriptors visible in a loading context,
//! or from an already-loaded type. Every scope owns a registry; registries
//! form a tree and a child always lets its ancestors answer first, so a
//! plugin resolved high in the tree is shared by everything below it.
//!
//! ```text
//! root ("core" plugins)
//!  └── build            resolve("java") → core:java from root if present,
//!       └── script      otherwise from build, otherwise from script
//! ```
//!
//! - **PluginId**: `namespace:name`; a bare `name` is tried in the core
//!   namespace first, then literally
//! - **LoadingContext**: resolves type names and descriptor resources
//! - **ScopedRegistry**: per-scope caches with single-flight loading
//! - **StrataRuntime**: builds the scope tree from configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! fn main() -> Result<(), RuntimeError> {
//!     let runtime = StrataRuntime::load()?;
//!     if let Some(plugin) = runtime.resolve("build", "java")? {
//!         info!(plugin = %plugin.display_name(), "resolved");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use strata_core as core;
pub use strata_registry as registry;
pub use strata_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use strata_runtime::{
        ConfigLoader, RuntimeError, RuntimeResult, Scope, StrataConfig, StrataRuntime,
    };

    // Registry
    pub use strata_registry::{ResolvedImplementation, ScopedRegistry};

    // Vocabulary
    pub use strata_core::builtin::CorePlugin;
    pub use strata_core::{
        DefaultInspector, LoadedType, LoadingContext, PluginCategory, PluginId, ResolveError,
        StaticContext, TypeKind, TypeSpec,
    };

    // Logging
    pub use strata_runtime::prelude::*;
}
