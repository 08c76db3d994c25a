//! # Error Types
//!
//! Two families, split by when they happen:
//!
//! - **Load time** ([`SpecError`]): [`LoadError`] for unreadable or malformed
//!   documents and duplicate names, [`ResolutionError`] for references that
//!   cannot be resolved during compilation. Both are fatal: no validator is
//!   returned.
//! - **Call time** ([`ValidationError`]): per-payload outcomes. They never
//!   affect the registry or other calls.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::identity::{InvalidName, ResourceId, SchemaName};
use crate::node::NodeError;

/// A specification could not be turned into a validator.
#[derive(Error, Debug)]
pub enum SpecError {
    /// A document could not be read, parsed or registered.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A registered schema could not be compiled.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Failure while reading documents and registering their schemas.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not well-formed YAML/JSON.
    #[error("cannot parse {}: {reason}", path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// A section of the document has the wrong shape.
    #[error("malformed document {}: {reason}", path.display())]
    Structure {
        /// Offending document.
        path: PathBuf,
        /// What was expected.
        reason: String,
    },

    /// The REST component directory is absent and the root declares no
    /// inline schemas.
    #[error("no component schemas: {} does not exist", path.display())]
    MissingComponents {
        /// Expected `components/schemas` directory.
        path: PathBuf,
    },

    /// A schema name or reference target is unusable.
    #[error("{}: {source}", path.display())]
    InvalidName {
        /// Document declaring the name or reference.
        path: PathBuf,
        /// Rejected name.
        #[source]
        source: InvalidName,
    },

    /// A schema node is structurally malformed.
    #[error("schema '{name}' in {}: {source}", path.display())]
    InvalidSchema {
        /// Schema being registered.
        name: SchemaName,
        /// Document declaring it.
        path: PathBuf,
        /// Shape problem.
        #[source]
        source: NodeError,
    },

    /// Two declarations share a name within one registry.
    #[error(
        "duplicate schema '{name}': declared in {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateSchema {
        /// Colliding name.
        name: SchemaName,
        /// Where it was first registered.
        first: PathBuf,
        /// Where the collision was found.
        second: PathBuf,
    },
}

/// Failure while compiling registered resources.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// A schema references a name that was never registered.
    #[error("schema '{schema}' references unregistered resource {resource} (via '{reference}')")]
    MissingReference {
        /// Schema containing the reference.
        schema: SchemaName,
        /// Reference as written in the source document.
        reference: String,
        /// Resource the reference was rewritten to.
        resource: ResourceId,
    },

    /// The JSON Schema compiler rejected a translated resource.
    #[error("failed to compile schema '{schema}': {reason}")]
    Compile {
        /// Schema being compiled.
        schema: SchemaName,
        /// Compiler diagnostic.
        reason: String,
    },
}

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating value in the payload.
    pub instance_path: String,
    /// JSON Pointer to the keyword that failed, within the compiled schema.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Non-empty, ordered list of violations from one validation call.
///
/// Order follows the compiled schema, so it is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    /// Wrap a list of violations. `None` when the list is empty.
    pub(crate) fn from_vec(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    /// The headline violation.
    pub fn first(&self) -> &Violation {
        // from_vec guarantees at least one element.
        &self.violations[0]
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// All violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Outcome of a failed validation call.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// No schema with this name was loaded.
    #[error("schema not found: {0}")]
    UnknownSchema(String),

    /// The payload is not well-formed JSON.
    #[error("parsing payload for '{schema}': {source}")]
    Parse {
        /// Schema the payload was meant for.
        schema: SchemaName,
        /// Parser diagnostic.
        #[source]
        source: serde_json::Error,
    },

    /// The payload parsed but broke one or more constraints.
    #[error("schema validation failed for '{schema}': {violations}")]
    ConstraintViolation {
        /// Schema that was violated.
        schema: SchemaName,
        /// What went wrong, in schema order.
        violations: Violations,
    },
}

impl ValidationError {
    /// Short, stable label of the failure kind.
    pub fn kind(&self) -> FailureKind {
        match self {
            ValidationError::UnknownSchema(_) => FailureKind::UnknownSchema,
            ValidationError::Parse { .. } => FailureKind::Parse,
            ValidationError::ConstraintViolation { .. } => FailureKind::ConstraintViolation,
        }
    }
}

/// Failure classification carried in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Requested schema does not exist.
    UnknownSchema,
    /// Payload is not structured data.
    Parse,
    /// Payload broke a constraint.
    ConstraintViolation,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(path: &str, message: &str) -> Violation {
        Violation {
            instance_path: path.to_string(),
            schema_path: "/required".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn violation_display_marks_root() {
        let v = violation("", r#""customerId" is a required property"#);
        assert_eq!(v.to_string(), r#"(root): "customerId" is a required property"#);
    }

    #[test]
    fn violations_join_in_order() {
        let vs = Violations::from_vec(vec![
            violation("", "first"),
            violation("/items/0/sku", "second"),
        ])
        .unwrap();
        assert_eq!(vs.first().message, "first");
        assert_eq!(vs.to_string(), "(root): first; /items/0/sku: second");
    }

    #[test]
    fn empty_violation_list_is_not_a_failure() {
        assert!(Violations::from_vec(Vec::new()).is_none());
    }
}
