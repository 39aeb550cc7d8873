//! Scope tree assembly.
//!
//! A [`StrataRuntime`] turns a [`StrataConfig`] into a tree of loading
//! scopes. Each scope pairs a [`StaticContext`] with the [`ScopedRegistry`]
//! that resolves in it; a child's context delegates to its parent's context
//! and its registry asks the parent's registry first.
//!
//! ```rust,ignore
//! use strata_runtime::StrataRuntime;
//!
//! let runtime = StrataRuntime::builder()
//!     .config_file("strata.toml")
//!     .build()?;
//!
//! if let Some(plugin) = runtime.resolve("build", "java")? {
//!     println!("{} -> {}", plugin.display_name(), plugin.as_type());
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use strata_core::builtin::core_context_with_dir;
use strata_core::{
    DefaultInspector, Inspector, LoadingContext, PluginId, ResourceDescriptorLocator,
    StaticContext, constant_context,
};
use strata_registry::{RegistryStats, ResolvedImplementation, ScopedRegistry};
use tracing::{debug, info};

use crate::config::{
    ConfigLoader, ROOT_SCOPE, RegistryConfig, ScopeConfig, StrataConfig, validate_config,
};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// A loading context together with the registry that resolves in it.
#[derive(Debug, Clone)]
pub struct Scope {
    name: String,
    parent: Option<String>,
    context: Arc<StaticContext>,
    registry: ScopedRegistry,
}

impl Scope {
    /// Returns the scope name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent scope name; `None` for the root.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Returns the scope's loading context.
    pub fn context(&self) -> &Arc<StaticContext> {
        &self.context
    }

    /// Returns the scope's registry.
    pub fn registry(&self) -> &ScopedRegistry {
        &self.registry
    }
}

/// The assembled scope tree.
pub struct StrataRuntime {
    config: StrataConfig,
    root: Scope,
    scopes: HashMap<String, Scope>,
    /// Declaration order, root excluded.
    order: Vec<String>,
}

impl StrataRuntime {
    /// Loads configuration from the default locations, initialises logging
    /// and assembles the scope tree.
    pub fn load() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Assembles the scope tree described by `config`.
    ///
    /// Logging is not touched; use [`load`](Self::load) or
    /// [`logging::init_from_config`] for that.
    pub fn from_config(config: &StrataConfig) -> RuntimeResult<Self> {
        validate_config(config)?;

        let registry_config = &config.registry;
        let root = Self::build_root(registry_config);

        let mut scopes: HashMap<String, Scope> = HashMap::with_capacity(config.scopes.len());
        let mut order = Vec::with_capacity(config.scopes.len());

        for scope_config in &config.scopes {
            let parent = match scope_config.parent.as_deref() {
                None | Some(ROOT_SCOPE) => &root,
                Some(name) => scopes
                    .get(name)
                    .ok_or_else(|| RuntimeError::UnknownScope(name.to_string()))?,
            };
            let scope = Self::build_scope(registry_config, scope_config, parent);
            order.push(scope.name.clone());
            scopes.insert(scope.name.clone(), scope);
        }

        info!(
            core_namespace = %registry_config.core_namespace,
            builtin = registry_config.builtin,
            scopes = order.len(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config: config.clone(),
            root,
            scopes,
            order,
        })
    }

    fn build_root(config: &RegistryConfig) -> Scope {
        let context = if config.builtin {
            core_context_with_dir(&config.core_namespace, &config.descriptor_dir)
        } else {
            StaticContext::builder(format!("{} plugins", config.core_namespace))
                .descriptor_dir(&config.descriptor_dir)
                .build()
        };

        let inspector: Arc<dyn Inspector> = Arc::new(DefaultInspector::with_markers(
            &config.plugin_marker,
            &config.rule_marker,
        ));
        let as_dyn: Arc<dyn LoadingContext> = context.clone();
        let registry = ScopedRegistry::builder(inspector, constant_context(as_dyn))
            .locator(Arc::new(ResourceDescriptorLocator::with_dir(
                &config.descriptor_dir,
            )))
            .core_namespace(&config.core_namespace)
            .build();

        debug!(
            context = %context.display_name(),
            types = context.local_type_count(),
            "Built root scope"
        );

        Scope {
            name: ROOT_SCOPE.to_string(),
            parent: None,
            context,
            registry,
        }
    }

    fn build_scope(registry: &RegistryConfig, config: &ScopeConfig, parent: &Scope) -> Scope {
        let parent_context: Arc<dyn LoadingContext> = parent.context.clone();
        let mut builder = StaticContext::builder(&config.name)
            .parent(parent_context)
            .descriptor_dir(&registry.descriptor_dir);

        for ty in &config.types {
            builder = builder.class(ty.clone());
        }
        for (id, implementation) in &config.plugins {
            builder = builder.plugin(id, implementation);
        }
        let context = builder.build();

        let as_dyn: Arc<dyn LoadingContext> = context.clone();
        let scoped = parent.registry.create_child(constant_context(as_dyn));

        debug!(
            scope = %config.name,
            parent = %parent.name,
            types = config.types.len(),
            plugins = config.plugins.len(),
            "Built scope"
        );

        Scope {
            name: config.name.clone(),
            parent: Some(parent.name.clone()),
            context,
            registry: scoped,
        }
    }

    /// Returns the configuration the runtime was built from.
    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    /// Returns the root scope.
    pub fn root(&self) -> &Scope {
        &self.root
    }

    /// Returns the scope called `name`, including the root.
    pub fn scope(&self, name: &str) -> Option<&Scope> {
        if name == ROOT_SCOPE {
            Some(&self.root)
        } else {
            self.scopes.get(name)
        }
    }

    /// Returns the registry of the scope called `name`.
    pub fn registry(&self, name: &str) -> Option<&ScopedRegistry> {
        self.scope(name).map(Scope::registry)
    }

    /// Returns every scope name in declaration order, root first.
    pub fn scope_names(&self) -> Vec<&str> {
        std::iter::once(self.root.name.as_str())
            .chain(self.order.iter().map(String::as_str))
            .collect()
    }

    /// Parses `id` and resolves it in the registry of `scope`.
    pub fn resolve(
        &self,
        scope: &str,
        id: &str,
    ) -> RuntimeResult<Option<Arc<ResolvedImplementation>>> {
        let registry = self
            .registry(scope)
            .ok_or_else(|| RuntimeError::UnknownScope(scope.to_string()))?;
        let id = PluginId::parse(id)?;
        Ok(registry.resolve_by_id(&id)?)
    }

    /// Returns cache statistics for every scope, root first.
    pub fn stats(&self) -> RuntimeStats {
        let scopes = self
            .scope_names()
            .into_iter()
            .filter_map(|name| {
                self.registry(name)
                    .map(|registry| (name.to_string(), registry.stats()))
            })
            .collect();
        RuntimeStats { scopes }
    }
}

impl fmt::Debug for StrataRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrataRuntime")
            .field("core_namespace", &self.config.registry.core_namespace)
            .field("scopes", &self.scope_names())
            .finish()
    }
}

/// Cache statistics per scope.
#[derive(Debug, Clone, Default)]
pub struct RuntimeStats {
    /// `(scope name, stats)`, root first.
    pub scopes: Vec<(String, RegistryStats)>,
}

impl RuntimeStats {
    /// Returns the stats of one scope.
    pub fn get(&self, scope: &str) -> Option<&RegistryStats> {
        self.scopes
            .iter()
            .find(|(name, _)| name == scope)
            .map(|(_, stats)| stats)
    }
}

impl fmt::Display for RuntimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, stats)) in self.scopes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{name}] {stats}")?;
        }
        Ok(())
    }
}

/// Builder for [`StrataRuntime`] that loads configuration first.
///
/// ```rust,ignore
/// let runtime = StrataRuntime::builder()
///     .config_file("config/strata.toml")
///     .profile("ci")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    init_logging: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            init_logging: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: StrataConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Skips installing the global log subscriber.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Loads configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<StrataRuntime> {
        let config = self.config_loader.load()?;
        if self.init_logging {
            logging::init_from_config(&config.logging);
        }
        StrataRuntime::from_config(&config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use figment::providers::{Format as _, Toml};
    use strata_core::{PluginCategory, TypeSpec};

    fn scope_config(name: &str, parent: Option<&str>) -> ScopeConfig {
        ScopeConfig {
            parent: parent.map(str::to_string),
            ..ScopeConfig::new(name)
        }
    }

    /// build: defines core:java and acme:lint.
    /// script (child of build): defines its own acme:lint and a shadowed core:java.
    fn layered_config() -> StrataConfig {
        let mut build = scope_config("build", None);
        build.types = vec![
            TypeSpec::class("org.acme.JavaPlugin").extends("Plugin"),
            TypeSpec::class("org.acme.LintRules").extends("RuleSource"),
        ];
        build
            .plugins
            .insert("core:java".to_string(), "org.acme.JavaPlugin".to_string());
        build
            .plugins
            .insert("acme:lint".to_string(), "org.acme.LintRules".to_string());

        let mut script = scope_config("script", Some("build"));
        script.types = vec![TypeSpec::class("org.script.Java").extends("Plugin")];
        script
            .plugins
            .insert("core:java".to_string(), "org.script.Java".to_string());
        script
            .plugins
            .insert("script:local".to_string(), "org.script.Java".to_string());

        let mut config = StrataConfig::default();
        config.registry.builtin = false;
        config.scopes = vec![build, script];
        config
    }

    #[test]
    fn test_scope_tree_shape() {
        let runtime = StrataRuntime::from_config(&layered_config()).unwrap();

        assert_eq!(runtime.scope_names(), vec!["root", "build", "script"]);
        assert_eq!(runtime.root().parent(), None);
        assert_eq!(runtime.scope("script").unwrap().parent(), Some("build"));

        let script = runtime.registry("script").unwrap();
        let build = runtime.registry("build").unwrap();
        assert!(script.parent().unwrap().ptr_eq(build));
        assert!(build.parent().unwrap().ptr_eq(runtime.root().registry()));
        assert_eq!(script.depth(), 2);
        assert!(runtime.scope("missing").is_none());
    }

    #[test]
    fn test_resolve_bare_id_through_scopes() {
        let runtime = StrataRuntime::from_config(&layered_config()).unwrap();

        let plugin = runtime.resolve("build", "java").unwrap().unwrap();
        assert_eq!(plugin.plugin_id().unwrap().as_str(), "core:java");
        assert_eq!(plugin.as_type().name(), "org.acme.JavaPlugin");
        assert!(plugin.is_imperative());

        // The parent scope wins over the child's own descriptor.
        let from_child = runtime.resolve("script", "java").unwrap().unwrap();
        assert!(Arc::ptr_eq(&plugin, &from_child));

        let rules = runtime.resolve("script", "acme:lint").unwrap().unwrap();
        assert_eq!(rules.category(), PluginCategory::RuleBased);
    }

    #[test]
    fn test_child_plugins_stay_in_child() {
        let runtime = StrataRuntime::from_config(&layered_config()).unwrap();

        assert!(runtime.resolve("script", "script:local").unwrap().is_some());
        assert!(runtime.resolve("build", "script:local").unwrap().is_none());
        assert!(runtime.resolve("root", "java").unwrap().is_none());
    }

    #[test]
    fn test_resolve_errors() {
        let runtime = StrataRuntime::from_config(&layered_config()).unwrap();

        assert!(matches!(
            runtime.resolve("nowhere", "java"),
            Err(RuntimeError::UnknownScope(name)) if name == "nowhere"
        ));
        assert!(matches!(
            runtime.resolve("build", "bad id"),
            Err(RuntimeError::InvalidPluginId(_))
        ));
    }

    #[test]
    fn test_missing_implementation_class() {
        let mut config = layered_config();
        config.scopes[0]
            .plugins
            .insert("acme:ghost".to_string(), "org.acme.Ghost".to_string());
        let runtime = StrataRuntime::from_config(&config).unwrap();

        match runtime.resolve("build", "acme:ghost") {
            Err(RuntimeError::Resolve(e)) => assert!(e.is_invalid_plugin()),
            other => panic!("expected resolve error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = layered_config();
        config.scopes.reverse();
        assert!(matches!(
            StrataRuntime::from_config(&config),
            Err(RuntimeError::Config(_))
        ));
    }

    #[test]
    fn test_custom_namespace() {
        let mut config = layered_config();
        config.registry.core_namespace = "gradle".to_string();
        config.scopes[0].plugins.insert(
            "gradle:java".to_string(),
            "org.acme.JavaPlugin".to_string(),
        );
        let runtime = StrataRuntime::from_config(&config).unwrap();

        let plugin = runtime.resolve("build", "java").unwrap().unwrap();
        assert_eq!(plugin.plugin_id().unwrap().as_str(), "gradle:java");
        assert_eq!(runtime.registry("build").unwrap().core_namespace(), "gradle");
    }

    #[test]
    fn test_stats_per_scope() {
        let runtime = StrataRuntime::from_config(&layered_config()).unwrap();
        runtime.resolve("build", "acme:lint").unwrap();

        let stats = runtime.stats();
        assert_eq!(stats.scopes.len(), 3);
        assert_eq!(stats.get("build").unwrap().resolved_ids, 1);
        assert_eq!(stats.get("build").unwrap().depth, 1);
        // The root was asked first and cached the absence.
        assert_eq!(stats.get("root").unwrap().resolved_ids, 1);
        assert_eq!(stats.get("script").unwrap().resolved_ids, 0);
        assert!(stats.to_string().starts_with("[root] Registry at depth 0"));
    }

    #[test]
    fn test_builder_loads_scopes_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "layered.toml",
                r#"
                [registry]
                builtin = false
                core_namespace = "core"

                [[scopes]]
                name = "build"

                [[scopes.types]]
                name = "org.acme.JavaPlugin"
                supertypes = ["Plugin"]

                [scopes.plugins]
                "core:java" = "org.acme.JavaPlugin"
                "#,
            )?;

            let config = ConfigLoader::new()
                .without_env()
                .provider(Toml::file("layered.toml"))
                .load()
                .map_err(|e| e.to_string())?;
            let runtime = RuntimeBuilder::new()
                .without_env()
                .without_logging()
                .merge(config)
                .build()
                .map_err(|e| e.to_string())?;

            let plugin = runtime
                .resolve("build", "java")
                .map_err(|e| e.to_string())?
                .ok_or("core:java not resolved")?;
            assert_eq!(plugin.as_type().name(), "org.acme.JavaPlugin");
            Ok(())
        });
    }
}
