//! # Schema Identity Newtypes
//!
//! Component names and the resource identifiers they compile to. A
//! [`SchemaName`] is what a spec author declares (`OrderItem`); a
//! [`ResourceId`] is where the compiled form lives
//! (`synapse://schemas/OrderItem`). Keeping them as distinct types means a
//! resource URI can never be passed where a declared name is expected.
//!
//! ## Reference Rewriting
//!
//! Dialect references are rewritten by taking the last `/` segment of the
//! pointer as the target name. `#/components/schemas/OrderItem`,
//! `./order.yaml#/OrderItem` and a bare `OrderItem` all resolve to the same
//! resource. Two documents declaring the same final segment therefore
//! collide; the registry reports that as a load error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A declared component schema name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate and wrap a declared name.
    ///
    /// Names must be non-empty and must not contain `/` or `#`: either
    /// character would make the name unreachable through last-segment
    /// reference rewriting.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidName> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidName { name, reason: "name is empty" });
        }
        if name.contains('/') || name.contains('#') {
            return Err(InvalidName {
                name,
                reason: "name must not contain '/' or '#'",
            });
        }
        Ok(Self(name))
    }

    /// The name as declared.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SchemaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A name rejected by [`SchemaName::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid schema name '{name}': {reason}")]
pub struct InvalidName {
    /// The rejected name.
    pub name: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

/// Registry key of a translated schema resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// The full resource URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resource URI prefix scoping one registry.
///
/// Each dialect owns a distinct prefix so that REST and event resources
/// never share an address even when loaded side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace {
    prefix: &'static str,
}

impl Namespace {
    /// Namespace for OpenAPI component schemas.
    pub const REST: Namespace = Namespace {
        prefix: "synapse://schemas/",
    };

    /// Namespace for AsyncAPI component schemas.
    pub const EVENT: Namespace = Namespace {
        prefix: "synapse://asyncapi/",
    };

    /// The URI prefix.
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Resource id of a declared schema.
    pub fn resource_id(&self, name: &SchemaName) -> ResourceId {
        ResourceId(format!("{}{}", self.prefix, name.as_str()))
    }

    /// Inverse of [`Namespace::resource_id`]. `None` for ids minted by a
    /// different namespace.
    pub fn name_of(&self, id: &ResourceId) -> Option<SchemaName> {
        id.as_str()
            .strip_prefix(self.prefix)
            .and_then(|rest| SchemaName::new(rest).ok())
    }

    /// Target name of a dialect reference: its last `/` segment.
    pub fn reference_target(reference: &str) -> Result<SchemaName, InvalidName> {
        let last = reference.rsplit('/').next().unwrap_or(reference);
        SchemaName::new(last)
    }

    /// Rewrite a dialect reference into this namespace.
    pub fn resource_for_reference(&self, reference: &str) -> Result<ResourceId, InvalidName> {
        Ok(self.resource_id(&Self::reference_target(reference)?))
    }
}
