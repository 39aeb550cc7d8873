//! Plugin inspection: deciding what kind of plugin a loaded type is.

use tracing::trace;

use crate::context::{LoadedType, TypeKind};
use crate::error::InspectError;

/// Marker supertype of imperative plugins.
pub const DEFAULT_PLUGIN_MARKER: &str = "Plugin";

/// Marker supertype of rule-bearing plugins.
pub const DEFAULT_RULE_MARKER: &str = "RuleSource";

// ─── PluginCategory ───────────────────────────────────────────────────────────

/// Functional category of a plugin implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginCategory {
    /// Applies itself imperatively to its target.
    Imperative,
    /// Only contributes rules.
    RuleBased,
    /// Imperative and rule-bearing at once.
    Hybrid,
    /// Not recognisable as a plugin.
    Unknown,
}

impl PluginCategory {
    /// Returns `true` for imperative and hybrid plugins.
    pub fn is_imperative(self) -> bool {
        matches!(self, Self::Imperative | Self::Hybrid)
    }

    /// Returns `true` for rule-based and hybrid plugins.
    pub fn has_rules(self) -> bool {
        matches!(self, Self::RuleBased | Self::Hybrid)
    }
}

// ─── ImplementationDescriptor ─────────────────────────────────────────────────

/// The inspector's verdict about a loaded type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationDescriptor {
    backing_type: LoadedType,
    category: PluginCategory,
}

impl ImplementationDescriptor {
    /// Creates a descriptor.
    pub fn new(backing_type: LoadedType, category: PluginCategory) -> Self {
        Self {
            backing_type,
            category,
        }
    }

    /// The inspected type.
    pub fn backing_type(&self) -> &LoadedType {
        &self.backing_type
    }

    /// The inferred category.
    pub fn category(&self) -> PluginCategory {
        self.category
    }
}

// ─── Inspector ────────────────────────────────────────────────────────────────

/// Determines whether a loaded type is a valid plugin and of which category.
pub trait Inspector: Send + Sync {
    /// Inspects `ty`, failing if it is structurally invalid as a plugin.
    fn inspect(&self, ty: &LoadedType) -> Result<ImplementationDescriptor, InspectError>;
}

/// Inspector that classifies types by marker supertypes.
///
/// Types carrying a marker must be instantiable. Types with no marker are
/// reported as [`PluginCategory::Unknown`] rather than rejected.
#[derive(Debug, Clone)]
pub struct DefaultInspector {
    plugin_marker: String,
    rule_marker: String,
}

impl DefaultInspector {
    /// Creates an inspector with the default markers.
    pub fn new() -> Self {
        Self::with_markers(DEFAULT_PLUGIN_MARKER, DEFAULT_RULE_MARKER)
    }

    /// Creates an inspector with custom markers.
    pub fn with_markers(plugin_marker: impl Into<String>, rule_marker: impl Into<String>) -> Self {
        Self {
            plugin_marker: plugin_marker.into(),
            rule_marker: rule_marker.into(),
        }
    }
}

impl Default for DefaultInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector for DefaultInspector {
    fn inspect(&self, ty: &LoadedType) -> Result<ImplementationDescriptor, InspectError> {
        let category = match (ty.extends(&self.plugin_marker), ty.extends(&self.rule_marker)) {
            (true, true) => PluginCategory::Hybrid,
            (true, false) => PluginCategory::Imperative,
            (false, true) => PluginCategory::RuleBased,
            (false, false) => PluginCategory::Unknown,
        };

        if category != PluginCategory::Unknown && !ty.kind().is_instantiable() {
            return Err(InspectError::NotInstantiable {
                type_name: ty.name().to_string(),
                kind: match ty.kind() {
                    TypeKind::Interface => "an interface",
                    _ => "abstract",
                },
            });
        }

        trace!(ty = %ty, ?category, "Inspected plugin type");
        Ok(ImplementationDescriptor::new(ty.clone(), category))
    }
}
