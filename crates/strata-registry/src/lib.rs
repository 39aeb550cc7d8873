//! # Strata Registry
//!
//! Scoped, memoizing plugin resolution.
//!
//! This layer provides:
//! - [`ResolutionCache`]: a thread-safe, single-flight load-or-compute cache
//! - [`ScopedRegistry`]: a tree of registries that resolve plugin types and
//!   plugin ids, each with its own caches
//! - [`ResolvedImplementation`]: the alias-aware result handed to callers
//!
//! Vocabulary types (ids, contexts, inspectors) come from `strata-core`.

pub mod cache;
pub mod registry;

pub use cache::ResolutionCache;
pub use registry::{RegistryBuilder, RegistryStats, ResolvedImplementation, ScopedRegistry};
