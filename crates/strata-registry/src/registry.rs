//! Hierarchical, scope-aware plugin registry.
//!
//! A [`ScopedRegistry`] answers two questions:
//!
//! - [`resolve_by_type`](ScopedRegistry::resolve_by_type): what is this
//!   already-loaded type as a plugin? Never consults the parent, because the
//!   type already pins the context it came from.
//! - [`resolve_by_id`](ScopedRegistry::resolve_by_id): which implementation
//!   does this identifier name? The parent answers first; only if it finds
//!   nothing does this registry look in its own current context.
//!
//! Both answers are memoized per registry. Caches are never shared between
//! registries, so a child's types are never visible through its parent.
//!
//! ```text
//!   root (core context) ─── resolve_by_id("java") ──▶ core:java
//!     └── child (script context)
//!           resolve_by_id("java")   → asks root first, gets the same instance
//!           resolve_by_id("acme:x") → root has nothing, resolves locally
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use strata_core::{
    CORE_NAMESPACE, ContextFactory, ContextId, DescriptorLocator, ImplementationDescriptor,
    Inspector, LoadedType, LoadingContext, PluginCategory, PluginId, ResolveError, ResolveResult,
    ResourceDescriptorLocator, constant_context,
};
use tracing::debug;

use crate::cache::ResolutionCache;

/// Cache key of an identifier lookup: the id plus the context it was looked
/// up in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IdLookupKey {
    id: PluginId,
    context: ContextId,
}

type Resolved = Arc<ResolvedImplementation>;

// =============================================================================
// ScopedRegistry
// =============================================================================

struct RegistryInner {
    parent: Option<ScopedRegistry>,
    inspector: Arc<dyn Inspector>,
    locator: Arc<dyn DescriptorLocator>,
    context_factory: ContextFactory,
    core_namespace: Arc<str>,
    by_type: ResolutionCache<LoadedType, Resolved, ResolveError>,
    by_id: ResolutionCache<IdLookupKey, Option<Resolved>, ResolveError>,
}

/// A node in the registry tree.
///
/// Cloning yields another handle to the same registry and caches.
#[derive(Clone)]
pub struct ScopedRegistry {
    inner: Arc<RegistryInner>,
}

impl ScopedRegistry {
    /// Creates a root registry whose current context is always `context`.
    pub fn new(inspector: Arc<dyn Inspector>, context: Arc<dyn LoadingContext>) -> Self {
        Self::builder(inspector, constant_context(context)).build()
    }

    /// Starts building a root registry.
    pub fn builder(inspector: Arc<dyn Inspector>, context_factory: ContextFactory) -> RegistryBuilder {
        RegistryBuilder {
            inspector,
            context_factory,
            locator: None,
            core_namespace: CORE_NAMESPACE.into(),
        }
    }

    /// Creates a child registry that resolves in the contexts produced by
    /// `context_factory`.
    ///
    /// The child shares this registry's inspector, locator and core namespace
    /// and starts with empty caches.
    pub fn create_child(&self, context_factory: ContextFactory) -> ScopedRegistry {
        let inner = &self.inner;
        ScopedRegistry::from_parts(
            Some(self.clone()),
            Arc::clone(&inner.inspector),
            Arc::clone(&inner.locator),
            context_factory,
            Arc::clone(&inner.core_namespace),
        )
    }

    fn from_parts(
        parent: Option<ScopedRegistry>,
        inspector: Arc<dyn Inspector>,
        locator: Arc<dyn DescriptorLocator>,
        context_factory: ContextFactory,
        core_namespace: Arc<str>,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                parent,
                inspector,
                locator,
                context_factory,
                core_namespace,
                by_type: ResolutionCache::new("plugin-types"),
                by_id: ResolutionCache::new("plugin-ids"),
            }),
        }
    }

    /// Inspects an already-loaded type.
    ///
    /// The result carries no plugin id. Inspector failures are returned as
    /// they are.
    pub fn resolve_by_type(&self, ty: &LoadedType) -> ResolveResult<Resolved> {
        let inner = &self.inner;
        inner.by_type.get_or_load(ty, || {
            let descriptor = inner.inspector.inspect(ty)?;
            debug!(ty = %ty, category = ?descriptor.category(), "Resolved plugin type");
            Ok(Arc::new(ResolvedImplementation::new(
                None,
                descriptor,
                Arc::downgrade(inner),
            )))
        })
    }

    /// Resolves an identifier, letting ancestors answer first.
    ///
    /// Returns `Ok(None)` if neither an ancestor nor this registry's current
    /// context has a descriptor for `id`.
    pub fn resolve_by_id(&self, id: &PluginId) -> ResolveResult<Option<Resolved>> {
        if let Some(parent) = &self.inner.parent
            && let Some(found) = parent.resolve_by_id(id)?
        {
            return Ok(Some(found));
        }
        self.inner.lookup_self(id)
    }

    /// Resolves an identifier in `context` using only this registry's caches.
    ///
    /// A bare id is first tried in the core namespace; the literal id is only
    /// tried if that finds nothing.
    pub fn resolve_by_id_in_context(
        &self,
        id: &PluginId,
        context: &dyn LoadingContext,
    ) -> ResolveResult<Option<Resolved>> {
        self.inner.lookup_in(id, context)
    }

    /// Returns the parent registry, if any.
    pub fn parent(&self) -> Option<&ScopedRegistry> {
        self.inner.parent.as_ref()
    }

    /// Returns the namespace bare ids are qualified with.
    pub fn core_namespace(&self) -> &str {
        &self.inner.core_namespace
    }

    /// Returns the number of ancestors.
    pub fn depth(&self) -> usize {
        self.parent().map_or(0, |p| p.depth() + 1)
    }

    /// Returns a snapshot of this registry's cache sizes.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            resolved_types: self.inner.by_type.len(),
            resolved_ids: self.inner.by_id.len(),
            depth: self.depth(),
        }
    }

    /// Returns `true` if both handles refer to the same registry.
    pub fn ptr_eq(&self, other: &ScopedRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ScopedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedRegistry")
            .field("core_namespace", &self.inner.core_namespace)
            .field("depth", &self.depth())
            .field("by_type", &self.inner.by_type)
            .field("by_id", &self.inner.by_id)
            .finish()
    }
}

impl RegistryInner {
    fn lookup_self(self: &Arc<Self>, id: &PluginId) -> ResolveResult<Option<Resolved>> {
        let context = (self.context_factory)();
        self.lookup_in(id, context.as_ref())
    }

    fn lookup_in(
        self: &Arc<Self>,
        id: &PluginId,
        context: &dyn LoadingContext,
    ) -> ResolveResult<Option<Resolved>> {
        if !id.is_qualified() {
            let qualified = id.qualify(&self.core_namespace);
            if let Some(found) = self.lookup_exact(&qualified, context)? {
                return Ok(Some(found));
            }
        }
        self.lookup_exact(id, context)
    }

    fn lookup_exact(
        self: &Arc<Self>,
        id: &PluginId,
        context: &dyn LoadingContext,
    ) -> ResolveResult<Option<Resolved>> {
        let key = IdLookupKey {
            id: id.clone(),
            context: context.id(),
        };
        self.by_id.get_or_load(&key, || self.load_by_id(id, context))
    }

    fn load_by_id(
        self: &Arc<Self>,
        id: &PluginId,
        context: &dyn LoadingContext,
    ) -> ResolveResult<Option<Resolved>> {
        let Some(descriptor) = self.locator.find(context, id.as_str()) else {
            debug!(plugin_id = %id, context = context.display_name(), "No plugin descriptor");
            return Ok(None);
        };

        let Some(class_name) = descriptor.implementation_class() else {
            return Err(ResolveError::MissingImplementationClass {
                id: id.clone(),
                descriptor: descriptor.to_string(),
            });
        };

        let ty = context
            .load(class_name)
            .map_err(|source| ResolveError::ImplementationClassNotFound {
                id: id.clone(),
                class_name: class_name.to_string(),
                descriptor: descriptor.to_string(),
                source,
            })?;

        let inspected = self.inspector.inspect(&ty)?;
        debug!(
            plugin_id = %id,
            context = context.display_name(),
            implementation = %ty,
            "Resolved plugin id"
        );
        Ok(Some(Arc::new(ResolvedImplementation::new(
            Some(id.clone()),
            inspected,
            Arc::downgrade(self),
        ))))
    }
}

/// Builder for a root [`ScopedRegistry`].
pub struct RegistryBuilder {
    inspector: Arc<dyn Inspector>,
    context_factory: ContextFactory,
    locator: Option<Arc<dyn DescriptorLocator>>,
    core_namespace: Arc<str>,
}

impl RegistryBuilder {
    /// Sets the descriptor locator (default: [`ResourceDescriptorLocator`]).
    pub fn locator(mut self, locator: Arc<dyn DescriptorLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Sets the namespace bare ids are qualified with (default: `core`).
    pub fn core_namespace(mut self, namespace: &str) -> Self {
        self.core_namespace = namespace.into();
        self
    }

    /// Builds the registry.
    pub fn build(self) -> ScopedRegistry {
        let locator = self
            .locator
            .unwrap_or_else(|| Arc::new(ResourceDescriptorLocator::new()));
        ScopedRegistry::from_parts(
            None,
            self.inspector,
            locator,
            self.context_factory,
            self.core_namespace,
        )
    }
}

// =============================================================================
// ResolvedImplementation
// =============================================================================

/// A resolved plugin implementation that knows the registry it came from.
///
/// Registries hand out `Arc<ResolvedImplementation>`; repeated resolutions of
/// the same key return the same `Arc`.
pub struct ResolvedImplementation {
    plugin_id: Option<PluginId>,
    descriptor: ImplementationDescriptor,
    registry: Weak<RegistryInner>,
}

impl ResolvedImplementation {
    fn new(
        plugin_id: Option<PluginId>,
        descriptor: ImplementationDescriptor,
        registry: Weak<RegistryInner>,
    ) -> Self {
        Self {
            plugin_id,
            descriptor,
            registry,
        }
    }

    /// The id this implementation was resolved by, if any.
    pub fn plugin_id(&self) -> Option<&PluginId> {
        self.plugin_id.as_ref()
    }

    /// The backing type.
    pub fn as_type(&self) -> &LoadedType {
        self.descriptor.backing_type()
    }

    /// The inspector's descriptor.
    pub fn descriptor(&self) -> &ImplementationDescriptor {
        &self.descriptor
    }

    /// The plugin category.
    pub fn category(&self) -> PluginCategory {
        self.descriptor.category()
    }

    /// Returns `true` for imperative and hybrid plugins.
    pub fn is_imperative(&self) -> bool {
        self.category().is_imperative()
    }

    /// Returns `true` for rule-based and hybrid plugins.
    pub fn has_rules(&self) -> bool {
        self.category().has_rules()
    }

    /// The plugin id if known, otherwise the type name.
    pub fn display_name(&self) -> String {
        match &self.plugin_id {
            Some(id) => id.to_string(),
            None => self.as_type().name().to_string(),
        }
    }

    /// Returns `true` if `id` names this implementation.
    ///
    /// Either `id` is the id this implementation was resolved by, or `id`
    /// resolves in the owning registry's own scope (ancestors are not asked)
    /// to the same backing type. Once the owning registry is dropped only
    /// the first check applies.
    pub fn is_also_known_as(&self, id: &PluginId) -> ResolveResult<bool> {
        if self.plugin_id.as_ref() == Some(id) {
            return Ok(true);
        }
        let Some(registry) = self.registry.upgrade() else {
            return Ok(false);
        };
        Ok(registry
            .lookup_self(id)?
            .is_some_and(|other| other.as_type() == self.as_type()))
    }
}

impl fmt::Debug for ResolvedImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedImplementation")
            .field("plugin_id", &self.plugin_id)
            .field("type", self.as_type())
            .field("category", &self.category())
            .finish()
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Statistics about a single registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of cached type resolutions.
    pub resolved_types: usize,
    /// Number of cached id lookups, including cached absences.
    pub resolved_ids: usize,
    /// Number of ancestors.
    pub depth: usize,
}

impl fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Registry at depth {}: {} type(s), {} id lookup(s) cached",
            self.depth, self.resolved_types, self.resolved_ids
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use strata_core::descriptor::descriptor_path;
    use strata_core::{
        DEFAULT_DESCRIPTOR_DIR, DefaultInspector, InspectError, LoadError, PluginDescriptor,
        StaticContext, TypeKind, TypeSpec,
    };

    fn inspector() -> Arc<dyn Inspector> {
        Arc::new(DefaultInspector::new())
    }

    fn id(s: &str) -> PluginId {
        PluginId::parse(s).unwrap()
    }

    fn plugin_type(name: &str) -> TypeSpec {
        TypeSpec::class(name).extends("Plugin")
    }

    /// Counts lookups and widens the race window.
    #[derive(Default)]
    struct CountingLocator {
        inner: ResourceDescriptorLocator,
        calls: AtomicUsize,
    }

    impl DescriptorLocator for CountingLocator {
        fn find(&self, context: &dyn LoadingContext, id: &str) -> Option<PluginDescriptor> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            self.inner.find(context, id)
        }
    }

    #[test]
    fn test_bare_id_resolves_core_plugin() {
        let ctx = StaticContext::builder("core")
            .class(plugin_type("JavaImpl"))
            .plugin("core:java", "JavaImpl")
            .build();
        let registry = ScopedRegistry::new(inspector(), ctx);

        let java = registry.resolve_by_id(&id("java")).unwrap().unwrap();
        assert_eq!(java.as_type().name(), "JavaImpl");
        assert_eq!(java.plugin_id(), Some(&id("core:java")));
        assert_eq!(java.category(), PluginCategory::Imperative);
        assert!(java.is_imperative());
        assert!(!java.has_rules());
        assert!(java.is_also_known_as(&id("core:java")).unwrap());
    }

    #[test]
    fn test_repeated_lookups_return_identical_instance() {
        let ctx = StaticContext::builder("script")
            .class(plugin_type("ToolImpl"))
            .plugin("acme:tool", "ToolImpl")
            .build();
        let registry = ScopedRegistry::new(inspector(), ctx.clone());

        let first = registry
            .resolve_by_id_in_context(&id("acme:tool"), ctx.as_ref())
            .unwrap()
            .unwrap();
        let second = registry
            .resolve_by_id_in_context(&id("acme:tool"), ctx.as_ref())
            .unwrap()
            .unwrap();
        let via_factory = registry.resolve_by_id(&id("acme:tool")).unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &via_factory));
    }

    #[test]
    fn test_qualified_id_takes_precedence_over_literal() {
        let ctx = StaticContext::builder("script")
            .class(plugin_type("CoreX"))
            .class(plugin_type("UserX"))
            .plugin("core:x", "CoreX")
            .plugin("x", "UserX")
            .build();
        let registry = ScopedRegistry::new(inspector(), ctx);

        let bare = registry.resolve_by_id(&id("x")).unwrap().unwrap();
        assert_eq!(bare.as_type().name(), "CoreX");

        let qualified = registry.resolve_by_id(&id("core:x")).unwrap().unwrap();
        assert!(Arc::ptr_eq(&bare, &qualified));
    }

    #[test]
    fn test_bare_id_falls_back_to_literal() {
        let ctx = StaticContext::builder("script")
            .class(plugin_type("UserX"))
            .plugin("x", "UserX")
            .build();
        let registry = ScopedRegistry::new(inspector(), ctx);

        let found = registry.resolve_by_id(&id("x")).unwrap().unwrap();
        assert_eq!(found.as_type().name(), "UserX");
        assert_eq!(found.plugin_id(), Some(&id("x")));
    }

    #[test]
    fn test_parent_wins_over_child() {
        let parent_ctx = StaticContext::builder("parent")
            .class(plugin_type("ParentFoo"))
            .plugin("foo", "ParentFoo")
            .build();
        let child_ctx = StaticContext::builder("child")
            .class(plugin_type("ChildFoo"))
            .plugin("foo", "ChildFoo")
            .build();
        let parent = ScopedRegistry::new(inspector(), parent_ctx);
        let child = parent.create_child(constant_context(child_ctx));

        let from_child = child.resolve_by_id(&id("foo")).unwrap().unwrap();
        let from_parent = parent.resolve_by_id(&id("foo")).unwrap().unwrap();

        assert_eq!(from_child.as_type().name(), "ParentFoo");
        assert!(Arc::ptr_eq(&from_child, &from_parent));
        assert_eq!(child.stats().resolved_ids, 0);
    }

    #[test]
    fn test_child_falls_back_to_parent() {
        let parent_ctx = StaticContext::builder("parent")
            .class(plugin_type("FooImpl"))
            .plugin("foo", "FooImpl")
            .build();
        let child_ctx = StaticContext::builder("child").build();
        let parent = ScopedRegistry::new(inspector(), parent_ctx);
        let child = parent.create_child(constant_context(child_ctx));

        let found = child.resolve_by_id(&id("foo")).unwrap().unwrap();
        assert_eq!(found.as_type().name(), "FooImpl");
    }

    #[test]
    fn test_child_plugins_stay_in_child_scope() {
        let parent_ctx = StaticContext::builder("parent").build();
        let child_ctx = StaticContext::builder("child")
            .parent(parent_ctx.clone())
            .class(plugin_type("ToolImpl"))
            .plugin("acme:tool", "ToolImpl")
            .build();
        let parent = ScopedRegistry::new(inspector(), parent_ctx);
        let child = parent.create_child(constant_context(child_ctx.clone()));

        let found = child.resolve_by_id(&id("acme:tool")).unwrap().unwrap();
        assert_eq!(found.as_type().defining_context(), child_ctx.id());
        assert!(parent.resolve_by_id(&id("acme:tool")).unwrap().is_none());
    }

    #[test]
    fn test_absent_id_is_stable() {
        let ctx = StaticContext::builder("script").build();
        let registry = ScopedRegistry::new(inspector(), ctx);

        for _ in 0..3 {
            assert!(registry.resolve_by_id(&id("missing")).unwrap().is_none());
        }
    }

    #[test]
    fn test_malformed_descriptor_always_fails() {
        let ctx = StaticContext::builder("script")
            .resource(
                descriptor_path(DEFAULT_DESCRIPTOR_DIR, "acme:broken"),
                "implementation-class=\n",
            )
            .build();
        let locator = Arc::new(CountingLocator::default());
        let registry = ScopedRegistry::builder(inspector(), constant_context(ctx))
            .locator(locator.clone())
            .build();

        for _ in 0..2 {
            let err = registry.resolve_by_id(&id("acme:broken")).unwrap_err();
            assert!(err.is_invalid_plugin());
            assert!(matches!(err, ResolveError::MissingImplementationClass { .. }));
            assert!(err.to_string().contains("acme:broken"));
        }
        assert_eq!(locator.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unloadable_implementation_carries_cause() {
        let ctx = StaticContext::builder("script")
            .plugin("acme:ghost", "GhostImpl")
            .build();
        let registry = ScopedRegistry::new(inspector(), ctx);

        let err = registry.resolve_by_id(&id("acme:ghost")).unwrap_err();
        assert!(err.is_invalid_plugin());
        match &err {
            ResolveError::ImplementationClassNotFound {
                class_name, source, ..
            } => {
                assert_eq!(class_name, "GhostImpl");
                assert!(matches!(source, LoadError::ClassNotFound { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_inspector_rejection_propagates_verbatim() {
        let ctx = StaticContext::builder("script")
            .class(plugin_type("AbstractImpl").kind(TypeKind::Abstract))
            .plugin("acme:abstract", "AbstractImpl")
            .build();
        let registry = ScopedRegistry::new(inspector(), ctx);

        let err = registry.resolve_by_id(&id("acme:abstract")).unwrap_err();
        assert!(!err.is_invalid_plugin());
        assert!(matches!(
            err,
            ResolveError::Inspection(InspectError::NotInstantiable { .. })
        ));
    }

    #[test]
    fn test_alias_symmetry() {
        let ctx = StaticContext::builder("script")
            .class(plugin_type("JavaImpl"))
            .class(plugin_type("OtherImpl"))
            .plugin("core:java", "JavaImpl")
            .plugin("legacy:java-base", "JavaImpl")
            .plugin("acme:other", "OtherImpl")
            .build();
        let registry = ScopedRegistry::new(inspector(), ctx);

        let a = registry.resolve_by_id(&id("core:java")).unwrap().unwrap();
        let b = registry.resolve_by_id(&id("legacy:java-base")).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        assert!(a.is_also_known_as(&id("legacy:java-base")).unwrap());
        assert!(b.is_also_known_as(&id("core:java")).unwrap());
        assert!(b.is_also_known_as(&id("java")).unwrap());
        assert!(!a.is_also_known_as(&id("acme:other")).unwrap());
        assert!(!a.is_also_known_as(&id("acme:missing")).unwrap());
    }

    #[test]
    fn test_alias_check_stays_in_owning_scope() {
        let parent_ctx = StaticContext::builder("parent")
            .class(plugin_type("JavaImpl"))
            .plugin("core:java", "JavaImpl")
            .build();
        let child_ctx = StaticContext::builder("child")
            .parent(parent_ctx.clone())
            .plugin("acme:java", "JavaImpl")
            .build();
        let parent = ScopedRegistry::new(inspector(), parent_ctx);
        let child = parent.create_child(constant_context(child_ctx));

        // Resolved through the parent, so aliases are checked in the parent.
        let java = child.resolve_by_id(&id("java")).unwrap().unwrap();
        assert!(!java.is_also_known_as(&id("acme:java")).unwrap());

        // Resolved locally; the child's context sees the parent's type.
        let local = child.resolve_by_id(&id("acme:java")).unwrap().unwrap();
        assert!(local.is_also_known_as(&id("core:java")).unwrap());
    }

    #[test]
    fn test_alias_check_after_registry_dropped() {
        let ctx = StaticContext::builder("script")
            .class(plugin_type("JavaImpl"))
            .plugin("core:java", "JavaImpl")
            .plugin("acme:java", "JavaImpl")
            .build();
        let registry = ScopedRegistry::new(inspector(), ctx);
        let java = registry.resolve_by_id(&id("core:java")).unwrap().unwrap();
        drop(registry);

        assert!(java.is_also_known_as(&id("core:java")).unwrap());
        assert!(!java.is_also_known_as(&id("acme:java")).unwrap());
    }

    #[test]
    fn test_resolve_by_type_is_per_registry() {
        let ctx = StaticContext::builder("script")
            .class(plugin_type("ToolImpl"))
            .build();
        let ty = ctx.load("ToolImpl").unwrap();
        let parent = ScopedRegistry::new(inspector(), ctx.clone());
        let child = parent.create_child(constant_context(ctx));

        let from_parent = parent.resolve_by_type(&ty).unwrap();
        let again = parent.resolve_by_type(&ty).unwrap();
        let from_child = child.resolve_by_type(&ty).unwrap();

        assert!(Arc::ptr_eq(&from_parent, &again));
        assert!(!Arc::ptr_eq(&from_parent, &from_child));
        assert_eq!(from_parent.as_type(), from_child.as_type());
        assert_eq!(from_parent.plugin_id(), None);
        assert_eq!(from_parent.display_name(), "ToolImpl");
        assert_eq!(child.stats().resolved_types, 1);
    }

    #[test]
    fn test_resolve_by_type_propagates_inspector_failure() {
        let ctx = StaticContext::builder("script")
            .class(plugin_type("Contract").kind(TypeKind::Interface))
            .build();
        let ty = ctx.load("Contract").unwrap();
        let registry = ScopedRegistry::new(inspector(), ctx);

        for _ in 0..2 {
            assert!(matches!(
                registry.resolve_by_type(&ty),
                Err(ResolveError::Inspection(InspectError::NotInstantiable {
                    kind: "an interface",
                    ..
                }))
            ));
        }
        assert_eq!(registry.stats().resolved_types, 0);
    }

    #[test]
    fn test_distinct_contexts_resolve_separately() {
        let build = |name: &str| {
            StaticContext::builder(name)
                .class(plugin_type("ToolImpl"))
                .plugin("acme:tool", "ToolImpl")
                .build()
        };
        let (one, two) = (build("one"), build("two"));
        let registry = ScopedRegistry::new(inspector(), one.clone());

        let a = registry
            .resolve_by_id_in_context(&id("acme:tool"), one.as_ref())
            .unwrap()
            .unwrap();
        let b = registry
            .resolve_by_id_in_context(&id("acme:tool"), two.as_ref())
            .unwrap()
            .unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.as_type(), b.as_type());
    }

    #[test]
    fn test_concurrent_resolution_is_single_flight() {
        const CALLERS: usize = 50;
        let ctx = StaticContext::builder("script")
            .class(plugin_type("ToolImpl"))
            .plugin("acme:tool", "ToolImpl")
            .build();
        let locator = Arc::new(CountingLocator::default());
        let registry = ScopedRegistry::builder(inspector(), constant_context(ctx))
            .locator(locator.clone())
            .build();
        let barrier = Barrier::new(CALLERS);
        let tool = id("acme:tool");

        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        registry.resolve_by_id(&tool).unwrap().unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(locator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), CALLERS);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[test]
    fn test_custom_core_namespace_and_stats() {
        let ctx = StaticContext::builder("builtins")
            .class(plugin_type("JavaImpl"))
            .plugin("builtin:java", "JavaImpl")
            .build();
        let root = ScopedRegistry::builder(inspector(), constant_context(ctx.clone()))
            .core_namespace("builtin")
            .build();
        let child = root.create_child(constant_context(ctx));

        assert_eq!(child.core_namespace(), "builtin");
        assert!(child.parent().unwrap().ptr_eq(&root));
        assert_eq!(child.depth(), 1);

        let java = child.resolve_by_id(&id("java")).unwrap().unwrap();
        assert_eq!(java.plugin_id(), Some(&id("builtin:java")));

        let stats = root.stats();
        assert_eq!(stats.resolved_ids, 1);
        assert_eq!(stats.depth, 0);
        assert_eq!(
            stats.to_string(),
            "Registry at depth 0: 0 type(s), 1 id lookup(s) cached"
        );
    }
}
