//! ID types for registered structures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Stable, namespaced name of a registry entry (`namespace:path`).
///
/// Once an identity has been published and worlds have been generated
/// against it, it must never be renamed: saved chunks reference structures
/// by this name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity {
    /// Owning namespace (usually a mod id)
    namespace: String,
    /// Path within the namespace
    path: String,
}

impl Identity {
    /// Namespace assumed when a bare path is parsed.
    pub const DEFAULT_NAMESPACE: &'static str = "minecraft";

    /// Creates an identity from its two parts.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, IdentityError> {
        let namespace = namespace.into();
        let path = path.into();

        Self::validate_namespace(&namespace)?;
        if path.is_empty() {
            return Err(IdentityError::EmptyPath);
        }
        if let Some(c) = path.chars().find(|c| !is_path_char(*c)) {
            return Err(IdentityError::InvalidPathChar { path, found: c });
        }

        Ok(Self { namespace, path })
    }

    /// Checks a namespace on its own, before any path is known.
    pub fn validate_namespace(namespace: &str) -> Result<(), IdentityError> {
        if namespace.is_empty() {
            return Err(IdentityError::EmptyNamespace);
        }
        if let Some(c) = namespace.chars().find(|c| !is_namespace_char(*c)) {
            return Err(IdentityError::InvalidNamespaceChar {
                namespace: namespace.to_string(),
                found: c,
            });
        }
        Ok(())
    }

    /// Parses `namespace:path`, or a bare `path` in the default namespace.
    pub fn parse(value: &str) -> Result<Self, IdentityError> {
        match value.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(Self::DEFAULT_NAMESPACE, value),
        }
    }

    /// Returns the namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.to_string()
    }
}

/// Opaque reference handed out by the generic registration facility.
///
/// Handles are dense and assigned in registration order; they key the
/// separation-settings table and the land-conforming list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureHandle(u32);

impl StructureHandle {
    /// Creates a handle from a raw value.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StructureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
