//! Built-in core plugins contributed at link time.
//!
//! Any crate linked into the final binary can contribute an entry to
//! [`CORE_PLUGINS`]; [`core_context`] turns the collected entries into the
//! root loading context, registering each one as `<namespace>:<name>`.
//!
//! ```rust,ignore
//! use strata_core::builtin::{CORE_PLUGINS, CorePlugin};
//! use strata_core::linkme::distributed_slice;
//!
//! #[distributed_slice(CORE_PLUGINS)]
//! #[linkme(crate = strata_core::linkme)]
//! static JAVA: CorePlugin = CorePlugin {
//!     name: "java",
//!     implementation: "org.acme.JavaPlugin",
//!     supertypes: &["Plugin"],
//! };
//! ```

use std::sync::Arc;

use linkme::distributed_slice;
use tracing::debug;

use crate::context::{StaticContext, TypeSpec};
use crate::descriptor::DEFAULT_DESCRIPTOR_DIR;

/// Static declaration of a built-in plugin.
#[derive(Debug, Clone, Copy)]
pub struct CorePlugin {
    /// Unqualified plugin name.
    pub name: &'static str,
    /// Implementation type name.
    pub implementation: &'static str,
    /// Supertypes of the implementation type.
    pub supertypes: &'static [&'static str],
}

impl CorePlugin {
    fn type_spec(&self) -> TypeSpec {
        self.supertypes
            .iter()
            .fold(TypeSpec::class(self.implementation), |spec, s| spec.extends(*s))
    }
}

/// All built-in plugins linked into this binary.
#[distributed_slice]
pub static CORE_PLUGINS: [CorePlugin];

/// Builds the root context holding every entry of [`CORE_PLUGINS`].
pub fn core_context(namespace: &str) -> Arc<StaticContext> {
    core_context_with_dir(namespace, DEFAULT_DESCRIPTOR_DIR)
}

/// Like [`core_context`], writing descriptors under `descriptor_dir`.
pub fn core_context_with_dir(namespace: &str, descriptor_dir: &str) -> Arc<StaticContext> {
    let mut builder = StaticContext::builder(format!("{namespace} plugins"))
        .descriptor_dir(descriptor_dir);

    for plugin in CORE_PLUGINS.iter() {
        let id = format!("{namespace}:{}", plugin.name);
        builder = builder
            .class(plugin.type_spec())
            .plugin(&id, plugin.implementation);
    }

    debug!(
        namespace,
        count = CORE_PLUGINS.len(),
        "Built core plugin context"
    );
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LoadingContext;
    use crate::descriptor::{DescriptorLocator, ResourceDescriptorLocator};

    #[distributed_slice(CORE_PLUGINS)]
    static TEST_JAVA: CorePlugin = CorePlugin {
        name: "java",
        implementation: "test.JavaPlugin",
        supertypes: &["Plugin"],
    };

    #[test]
    fn test_core_context_registers_slice_entries() {
        assert!(CORE_PLUGINS.iter().any(|p| p.name == "java"));

        let ctx = core_context("core");
        let descriptor = ResourceDescriptorLocator::new()
            .find(ctx.as_ref(), "core:java")
            .unwrap();
        assert_eq!(descriptor.implementation_class(), Some("test.JavaPlugin"));

        let ty = ctx.load("test.JavaPlugin").unwrap();
        assert!(ty.extends("Plugin"));
        assert_eq!(ty.defining_context(), ctx.id());
    }

    #[test]
    fn test_core_context_custom_namespace() {
        let ctx = core_context("builtin");
        let locator = ResourceDescriptorLocator::new();
        assert!(locator.find(ctx.as_ref(), "builtin:java").is_some());
        assert!(locator.find(ctx.as_ref(), "core:java").is_none());
    }
}
