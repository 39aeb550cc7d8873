//! Symbolic plugin identifiers.
//!
//! A [`PluginId`] is either bare (`java`) or namespace-qualified
//! (`core:java`). Bare identifiers are shorthand for plugins in the core
//! namespace; see [`PluginId::qualify`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::InvalidPluginId;

/// Namespace that bare identifiers are qualified with by default.
pub const CORE_NAMESPACE: &str = "core";

/// Separator between namespace and name.
pub const NAMESPACE_SEPARATOR: char = ':';

/// An immutable, possibly namespace-qualified plugin identifier.
///
/// Equality and hashing use the full text form, so `core:java` and `java` are
/// different identifiers. Cloning is cheap.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginId {
    value: Arc<str>,
    /// Byte offset of the separator, if qualified.
    separator: Option<usize>,
}

impl PluginId {
    /// Parses and validates an identifier.
    pub fn parse(value: &str) -> Result<Self, InvalidPluginId> {
        if value.is_empty() {
            return Err(InvalidPluginId::Empty);
        }

        if let Some(ch) = value
            .chars()
            .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ':')))
        {
            return Err(InvalidPluginId::InvalidChar {
                id: value.to_string(),
                ch,
            });
        }

        let separator = value.find(NAMESPACE_SEPARATOR);
        if value.rfind(NAMESPACE_SEPARATOR) != separator {
            return Err(InvalidPluginId::MultipleSeparators(value.to_string()));
        }

        let segments = match separator {
            Some(at) => vec![&value[..at], &value[at + 1..]],
            None => vec![value],
        };
        for segment in segments {
            if segment.is_empty() {
                return Err(InvalidPluginId::EmptySegment(value.to_string()));
            }
            if segment.starts_with('.') || segment.ends_with('.') {
                return Err(InvalidPluginId::DotBoundary(value.to_string()));
            }
            if segment.contains("..") {
                return Err(InvalidPluginId::DoubleDot(value.to_string()));
            }
        }

        Ok(Self {
            value: Arc::from(value),
            separator,
        })
    }

    /// Returns this identifier qualified with `namespace`.
    ///
    /// Already-qualified identifiers are returned unchanged.
    pub fn qualify(&self, namespace: &str) -> Self {
        if self.is_qualified() {
            return self.clone();
        }
        Self {
            value: Arc::from(format!("{namespace}{NAMESPACE_SEPARATOR}{}", self.value)),
            separator: Some(namespace.len()),
        }
    }

    /// Returns `true` if a namespace is present.
    #[inline]
    pub fn is_qualified(&self) -> bool {
        self.separator.is_some()
    }

    /// Returns the namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.separator.map(|at| &self.value[..at])
    }

    /// Returns the name without its namespace.
    pub fn name(&self) -> &str {
        match self.separator {
            Some(at) => &self.value[at + 1..],
            None => &self.value,
        }
    }

    /// Returns `true` if this identifier is qualified with `namespace`.
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace() == Some(namespace)
    }

    /// Returns the full text form.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl PartialEq for PluginId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for PluginId {}

impl Hash for PluginId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Debug for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PluginId({})", self.value)
    }
}

impl FromStr for PluginId {
    type Err = InvalidPluginId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PluginId {
    type Error = InvalidPluginId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PluginId> for String {
    fn from(id: PluginId) -> Self {
        id.value.to_string()
    }
}
