//! Plugin descriptors and the locator that reads them from a context.
//!
//! A descriptor is a small properties-style resource stored at
//! `<descriptor dir>/<plugin id>.properties`:
//!
//! ```text
//! # core java plugin
//! implementation-class=org.acme.JavaPlugin
//! ```

use std::fmt;

use tracing::trace;

use crate::context::LoadingContext;

/// Directory that descriptors are stored under by default.
pub const DEFAULT_DESCRIPTOR_DIR: &str = "META-INF/strata-plugins";

/// Property naming the implementation class.
pub const IMPLEMENTATION_CLASS_KEY: &str = "implementation-class";

/// Returns the resource path of the descriptor for `id` under `dir`.
pub fn descriptor_path(dir: &str, id: &str) -> String {
    format!("{}/{id}.properties", dir.trim_end_matches('/'))
}

// ─── PluginDescriptor ─────────────────────────────────────────────────────────

/// Parsed contents of a plugin descriptor resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    location: String,
    implementation_class: Option<String>,
}

impl PluginDescriptor {
    /// Parses descriptor text found at `location`.
    ///
    /// Lines are `key=value` or `key: value`; lines starting with `#` or `!`
    /// are comments. Later keys override earlier ones.
    pub fn parse(location: impl Into<String>, contents: &str) -> Self {
        let mut implementation_class = None;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some(split) = line.find(['=', ':']) else {
                continue;
            };
            let (key, value) = (line[..split].trim(), line[split + 1..].trim());
            if key == IMPLEMENTATION_CLASS_KEY {
                implementation_class = Some(value.to_string());
            }
        }

        Self {
            location: location.into(),
            implementation_class,
        }
    }

    /// Returns where this descriptor was read from.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the implementation class name, or `None` if absent or blank.
    pub fn implementation_class(&self) -> Option<&str> {
        self.implementation_class
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

impl fmt::Display for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

// ─── DescriptorLocator ────────────────────────────────────────────────────────

/// Finds the descriptor registered for a plugin id within a context.
pub trait DescriptorLocator: Send + Sync {
    /// Returns the descriptor for `id`, or `None` if nothing is registered.
    fn find(&self, context: &dyn LoadingContext, id: &str) -> Option<PluginDescriptor>;
}

/// Locator that reads descriptor resources from the context itself.
#[derive(Debug, Clone)]
pub struct ResourceDescriptorLocator {
    dir: String,
}

impl ResourceDescriptorLocator {
    /// Creates a locator reading from [`DEFAULT_DESCRIPTOR_DIR`].
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_DESCRIPTOR_DIR)
    }

    /// Creates a locator reading from `dir`.
    pub fn with_dir(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory descriptors are read from.
    pub fn dir(&self) -> &str {
        &self.dir
    }
}

impl Default for ResourceDescriptorLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorLocator for ResourceDescriptorLocator {
    fn find(&self, context: &dyn LoadingContext, id: &str) -> Option<PluginDescriptor> {
        let path = descriptor_path(&self.dir, id);
        let resource = context.resource(&path)?;
        trace!(plugin_id = id, location = %resource.location, "Found plugin descriptor");
        Some(PluginDescriptor::parse(resource.location, &resource.contents))
    }
}
