//! Loading contexts: isolation boundaries under which types are resolved.
//!
//! A [`LoadingContext`] plays the part a class loader plays on a managed
//! runtime. Two contexts may expose types with identical names that are
//! nevertheless distinct, because a [`LoadedType`] remembers the context that
//! defined it.
//!
//! [`StaticContext`] is the in-memory implementation used by the runtime and
//! by tests. It delegates to its parent first, for both types and resources.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::descriptor::{DEFAULT_DESCRIPTOR_DIR, IMPLEMENTATION_CLASS_KEY, descriptor_path};
use crate::error::LoadError;

// =============================================================================
// Context Identity
// =============================================================================

/// Process-unique identity of a loading context.
///
/// Registries key their caches by `ContextId` rather than by the context
/// itself, so a cache entry never keeps a context alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Types
// =============================================================================

/// Structural kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// A concrete, instantiable type.
    #[default]
    Class,
    /// An abstract type.
    Abstract,
    /// An interface.
    Interface,
}

impl TypeKind {
    /// Returns `true` if values of this kind can be constructed.
    pub fn is_instantiable(self) -> bool {
        matches!(self, Self::Class)
    }
}

/// Declaration of a type to be defined in a [`StaticContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    /// Fully qualified type name.
    pub name: String,

    /// Structural kind.
    #[serde(default)]
    pub kind: TypeKind,

    /// Names of the types this type extends or implements.
    #[serde(default)]
    pub supertypes: Vec<String>,
}

impl TypeSpec {
    /// Declares a concrete class with no supertypes.
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Class,
            supertypes: Vec::new(),
        }
    }

    /// Sets the structural kind.
    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds a supertype.
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }
}

struct TypeDef {
    spec: TypeSpec,
    defined_in: ContextId,
}

/// A type as resolved by some loading context.
///
/// Equality and hashing use the defining context together with the name, so
/// two same-named types from different contexts never compare equal. Cloning
/// is cheap.
#[derive(Clone)]
pub struct LoadedType(Arc<TypeDef>);

impl LoadedType {
    /// Defines `spec` as belonging to the context `defined_in`.
    pub fn define(spec: TypeSpec, defined_in: ContextId) -> Self {
        Self(Arc::new(TypeDef { spec, defined_in }))
    }

    /// Returns the type name.
    pub fn name(&self) -> &str {
        &self.0.spec.name
    }

    /// Returns the structural kind.
    pub fn kind(&self) -> TypeKind {
        self.0.spec.kind
    }

    /// Returns the declared supertypes.
    pub fn supertypes(&self) -> &[String] {
        &self.0.spec.supertypes
    }

    /// Returns `true` if `supertype` is among the declared supertypes.
    pub fn extends(&self, supertype: &str) -> bool {
        self.0.spec.supertypes.iter().any(|s| s == supertype)
    }

    /// Returns the context that defined this type.
    pub fn defining_context(&self) -> ContextId {
        self.0.defined_in
    }
}

impl PartialEq for LoadedType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.defined_in == other.0.defined_in && self.0.spec.name == other.0.spec.name)
    }
}

impl Eq for LoadedType {}

impl Hash for LoadedType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.defined_in.hash(state);
        self.0.spec.name.hash(state);
    }
}

impl fmt::Debug for LoadedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.0.spec.name, self.0.defined_in)
    }
}

impl fmt::Display for LoadedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.spec.name)
    }
}

// =============================================================================
// Resources
// =============================================================================

/// A named blob of metadata visible through a loading context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Where the resource was found, used in diagnostics.
    pub location: String,
    /// Text contents.
    pub contents: String,
}

// =============================================================================
// LoadingContext
// =============================================================================

/// An isolation boundary under which named types and resources are resolved.
///
/// Implementations are externally owned; registries only read from them.
pub trait LoadingContext: Send + Sync + fmt::Debug {
    /// Returns this context's identity.
    fn id(&self) -> ContextId;

    /// Returns a human-readable name for diagnostics.
    fn display_name(&self) -> &str;

    /// Resolves a type by name.
    fn load(&self, class_name: &str) -> Result<LoadedType, LoadError>;

    /// Looks up a metadata resource by path.
    fn resource(&self, path: &str) -> Option<Resource>;
}

/// Produces "the current context" for a registry's scope.
pub type ContextFactory = Arc<dyn Fn() -> Arc<dyn LoadingContext> + Send + Sync>;

/// Returns a factory that always yields `context`.
pub fn constant_context(context: Arc<dyn LoadingContext>) -> ContextFactory {
    Arc::new(move || Arc::clone(&context))
}

// =============================================================================
// StaticContext
// =============================================================================

/// An in-memory loading context with parent-first delegation.
pub struct StaticContext {
    id: ContextId,
    name: String,
    parent: Option<Arc<dyn LoadingContext>>,
    types: HashMap<String, LoadedType>,
    resources: HashMap<String, String>,
}

impl StaticContext {
    /// Starts building a context named `name`.
    pub fn builder(name: impl Into<String>) -> StaticContextBuilder {
        StaticContextBuilder {
            id: ContextId::next(),
            name: name.into(),
            parent: None,
            types: HashMap::new(),
            resources: HashMap::new(),
            descriptor_dir: DEFAULT_DESCRIPTOR_DIR.to_string(),
        }
    }

    /// Returns the parent context, if any.
    pub fn parent(&self) -> Option<&Arc<dyn LoadingContext>> {
        self.parent.as_ref()
    }

    /// Returns the number of types defined locally.
    pub fn local_type_count(&self) -> usize {
        self.types.len()
    }
}

impl LoadingContext for StaticContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn load(&self, class_name: &str) -> Result<LoadedType, LoadError> {
        if let Some(parent) = &self.parent
            && let Ok(found) = parent.load(class_name)
        {
            return Ok(found);
        }

        match self.types.get(class_name) {
            Some(ty) => {
                trace!(class = class_name, context = %self.name, "Loaded type");
                Ok(ty.clone())
            }
            None => Err(LoadError::ClassNotFound {
                class_name: class_name.to_string(),
                context: self.name.clone(),
            }),
        }
    }

    fn resource(&self, path: &str) -> Option<Resource> {
        if let Some(found) = self.parent.as_ref().and_then(|p| p.resource(path)) {
            return Some(found);
        }

        self.resources.get(path).map(|contents| Resource {
            location: format!("{}!/{}", self.name, path),
            contents: contents.clone(),
        })
    }
}

impl fmt::Debug for StaticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.display_name()))
            .field("types", &self.types.len())
            .field("resources", &self.resources.len())
            .finish()
    }
}

/// Builder for [`StaticContext`].
pub struct StaticContextBuilder {
    id: ContextId,
    name: String,
    parent: Option<Arc<dyn LoadingContext>>,
    types: HashMap<String, LoadedType>,
    resources: HashMap<String, String>,
    descriptor_dir: String,
}

impl StaticContextBuilder {
    /// Sets the parent context that is consulted first.
    pub fn parent(mut self, parent: Arc<dyn LoadingContext>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the directory that [`plugin`](Self::plugin) writes descriptors to.
    pub fn descriptor_dir(mut self, dir: impl Into<String>) -> Self {
        self.descriptor_dir = dir.into();
        self
    }

    /// Defines a type in this context.
    pub fn class(mut self, spec: TypeSpec) -> Self {
        let ty = LoadedType::define(spec, self.id);
        self.types.insert(ty.name().to_string(), ty);
        self
    }

    /// Adds a raw resource.
    pub fn resource(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.resources.insert(path.into(), contents.into());
        self
    }

    /// Registers a plugin descriptor for `id` naming `implementation_class`.
    ///
    /// The implementation type itself is not defined; add it with
    /// [`class`](Self::class) or let a parent provide it.
    pub fn plugin(self, id: &str, implementation_class: &str) -> Self {
        let path = descriptor_path(&self.descriptor_dir, id);
        self.resource(
            path,
            format!("{IMPLEMENTATION_CLASS_KEY}={implementation_class}\n"),
        )
    }

    /// Finishes the context.
    pub fn build(self) -> Arc<StaticContext> {
        Arc::new(StaticContext {
            id: self.id,
            name: self.name,
            parent: self.parent,
            types: self.types,
            resources: self.resources,
        })
    }
}
