//! # Strata Core
//!
//! Vocabulary shared by every Strata crate.
//!
//! ## Building Blocks
//!
//! - **Identifiers**: [`PluginId`], bare (`java`) or qualified (`core:java`)
//! - **Loading contexts**: the [`LoadingContext`] isolation boundary, the
//!   [`LoadedType`] handles it produces and the in-memory [`StaticContext`]
//! - **Descriptors**: [`PluginDescriptor`] resources found by a
//!   [`DescriptorLocator`]
//! - **Inspection**: the [`Inspector`] capability and its
//!   [`DefaultInspector`]
//! - **Built-ins**: link-time [`CORE_PLUGINS`](builtin::CORE_PLUGINS)
//!
//! Resolution and memoization live in `strata-registry`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::{LoadingContext, PluginId, StaticContext, TypeSpec};
//!
//! let ctx = StaticContext::builder("build script")
//!     .class(TypeSpec::class("org.acme.JavaPlugin").extends("Plugin"))
//!     .plugin("core:java", "org.acme.JavaPlugin")
//!     .build();
//!
//! let id: PluginId = "java".parse()?;
//! assert_eq!(id.qualify("core").as_str(), "core:java");
//! ```

pub mod builtin;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod inspect;
pub mod plugin_id;

pub use context::{
    ContextFactory, ContextId, LoadedType, LoadingContext, Resource, StaticContext,
    StaticContextBuilder, TypeKind, TypeSpec, constant_context,
};
pub use descriptor::{
    DEFAULT_DESCRIPTOR_DIR, DescriptorLocator, PluginDescriptor, ResourceDescriptorLocator,
};
pub use error::{InspectError, InvalidPluginId, LoadError, ResolveError, ResolveResult};
pub use inspect::{DefaultInspector, ImplementationDescriptor, Inspector, PluginCategory};
pub use plugin_id::{CORE_NAMESPACE, PluginId};

#[doc(hidden)]
pub use linkme;
