//! Configuration schema definitions.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strata_core::TypeSpec;
use strata_core::inspect::{DEFAULT_PLUGIN_MARKER, DEFAULT_RULE_MARKER};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StrataConfig {
    /// Registry-wide settings.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Loading scopes, parents before children.
    #[serde(default)]
    pub scopes: Vec<ScopeConfig>,
}

// =============================================================================
// Registry
// =============================================================================

/// Settings shared by every registry in the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Namespace that bare plugin ids are qualified with.
    #[serde(default = "default_core_namespace")]
    pub core_namespace: String,

    /// Resource directory holding plugin descriptors.
    #[serde(default = "default_descriptor_dir")]
    pub descriptor_dir: String,

    /// Supertype marking imperative plugins.
    #[serde(default = "default_plugin_marker")]
    pub plugin_marker: String,

    /// Supertype marking rule-bearing plugins.
    #[serde(default = "default_rule_marker")]
    pub rule_marker: String,

    /// Seed the root context with the linked-in core plugins.
    #[serde(default = "default_builtin")]
    pub builtin: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            core_namespace: default_core_namespace(),
            descriptor_dir: default_descriptor_dir(),
            plugin_marker: default_plugin_marker(),
            rule_marker: default_rule_marker(),
            builtin: default_builtin(),
        }
    }
}

fn default_core_namespace() -> String {
    strata_core::CORE_NAMESPACE.to_string()
}

fn default_descriptor_dir() -> String {
    strata_core::DEFAULT_DESCRIPTOR_DIR.to_string()
}

fn default_plugin_marker() -> String {
    DEFAULT_PLUGIN_MARKER.to_string()
}

fn default_rule_marker() -> String {
    DEFAULT_RULE_MARKER.to_string()
}

fn default_builtin() -> bool {
    true
}

// =============================================================================
// Scopes
// =============================================================================

/// Name of the implicit root scope.
pub const ROOT_SCOPE: &str = "root";

/// One loading scope: a context plus the registry that resolves in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Unique scope name.
    pub name: String,

    /// Parent scope name; [`ROOT_SCOPE`] when absent.
    #[serde(default)]
    pub parent: Option<String>,

    /// Types defined in this scope's context.
    #[serde(default)]
    pub types: Vec<TypeSpec>,

    /// Plugin id to implementation class.
    #[serde(default)]
    pub plugins: BTreeMap<String, String>,
}

impl ScopeConfig {
    /// Creates an empty scope under the root.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            types: Vec::new(),
            plugins: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Resolution outcomes.
    Debug,
    /// Lifecycle messages.
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Returns the lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line, abbreviated.
    #[default]
    Compact,
    /// Single-line, with all span context.
    Full,
    /// Multi-line, human oriented.
    Pretty,
    /// Newline-delimited JSON (requires the `json-log` feature).
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// The file at `file_path`.
    File,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,

    /// Destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file used when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module level overrides, e.g. `strata_registry = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}
