//! Configuration validation utilities.

use std::collections::HashSet;

use strata_core::PluginId;

use super::error::{ConfigError, ConfigResult};
use super::schema::{ROOT_SCOPE, RegistryConfig, ScopeConfig, StrataConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &StrataConfig) -> ConfigResult<()> {
    validate_registry_config(&config.registry)?;
    validate_scopes(&config.scopes)?;
    Ok(())
}

/// Validates registry-wide settings.
fn validate_registry_config(registry: &RegistryConfig) -> ConfigResult<()> {
    // A namespace must itself be a valid bare id.
    match PluginId::parse(&registry.core_namespace) {
        Ok(id) if !id.is_qualified() => {}
        _ => {
            return Err(ConfigError::validation(format!(
                "Invalid core namespace: '{}'",
                registry.core_namespace
            )));
        }
    }

    if registry.descriptor_dir.trim().is_empty() {
        return Err(ConfigError::validation(
            "Descriptor directory cannot be empty",
        ));
    }

    if registry.plugin_marker.is_empty() || registry.rule_marker.is_empty() {
        return Err(ConfigError::validation("Plugin markers cannot be empty"));
    }

    Ok(())
}

/// Validates scope declarations, in order.
fn validate_scopes(scopes: &[ScopeConfig]) -> ConfigResult<()> {
    let mut seen = HashSet::from([ROOT_SCOPE]);

    for scope in scopes {
        validate_scope(scope)?;

        if let Some(parent) = &scope.parent
            && !seen.contains(parent.as_str())
        {
            return Err(ConfigError::UnknownParent {
                scope: scope.name.clone(),
                parent: parent.clone(),
            });
        }

        if !seen.insert(scope.name.as_str()) {
            return Err(ConfigError::DuplicateScope(scope.name.clone()));
        }
    }

    Ok(())
}

/// Validates a single scope.
fn validate_scope(scope: &ScopeConfig) -> ConfigResult<()> {
    if scope.name.trim().is_empty() {
        return Err(ConfigError::validation("Scope name cannot be empty"));
    }

    if let Some(ty) = scope.types.iter().find(|t| t.name.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Scope '{}' declares a type with an empty name ({ty:?})",
            scope.name
        )));
    }

    for (id, implementation) in &scope.plugins {
        PluginId::parse(id).map_err(|source| ConfigError::InvalidPluginId {
            scope: scope.name.clone(),
            source,
        })?;
        if implementation.trim().is_empty() {
            return Err(ConfigError::validation(format!(
                "Plugin '{id}' in scope '{}' has no implementation class",
                scope.name
            )));
        }
    }

    Ok(())
}
