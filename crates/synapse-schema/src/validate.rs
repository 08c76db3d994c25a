//! # Validation Facade
//!
//! Looks a schema up by name, parses the payload and runs the compiled
//! validator. Each call is independent: nothing is cached or mutated, so
//! repeated calls with the same input give the same verdict and a
//! [`ContractValidator`] can be shared across threads behind an `Arc`.
//!
//! Failures come back as typed [`ValidationError`]s, in a fixed order of
//! precedence: unknown schema, then malformed payload, then constraint
//! violations.

use serde::Serialize;
use serde_json::Value;

use crate::error::{FailureKind, ValidationError, Violation, Violations};
use crate::registry::CompiledSchemas;

/// Validator over one compiled specification.
#[derive(Debug)]
pub struct ContractValidator {
    schemas: CompiledSchemas,
}

impl ContractValidator {
    /// Wrap a compiled registry.
    pub fn new(schemas: CompiledSchemas) -> Self {
        Self { schemas }
    }

    /// The compiled registry.
    pub fn schemas(&self) -> &CompiledSchemas {
        &self.schemas
    }

    /// Validate raw payload bytes against the named schema.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::UnknownSchema`] if `schema` was never loaded,
    ///   whatever the payload.
    /// - [`ValidationError::Parse`] if the payload is not JSON.
    /// - [`ValidationError::ConstraintViolation`] with every violation in
    ///   schema order.
    pub fn validate(&self, schema: &str, payload: &[u8]) -> Result<(), ValidationError> {
        let compiled = self
            .schemas
            .get(schema)
            .ok_or_else(|| ValidationError::UnknownSchema(schema.to_string()))?;

        let instance: Value = serde_json::from_slice(payload).map_err(|e| ValidationError::Parse {
            schema: compiled.name().clone(),
            source: e,
        })?;

        self.validate_value(schema, &instance)
    }

    /// Validate an already-parsed value against the named schema.
    pub fn validate_value(&self, schema: &str, instance: &Value) -> Result<(), ValidationError> {
        let compiled = self
            .schemas
            .get(schema)
            .ok_or_else(|| ValidationError::UnknownSchema(schema.to_string()))?;

        let violations: Vec<Violation> = compiled
            .validator()
            .iter_errors(instance)
            .map(|err| Violation {
                instance_path: err.instance_path.to_string(),
                schema_path: err.schema_path.to_string(),
                message: err.to_string(),
            })
            .collect();

        match Violations::from_vec(violations) {
            None => Ok(()),
            Some(violations) => Err(ValidationError::ConstraintViolation {
                schema: compiled.name().clone(),
                violations,
            }),
        }
    }

    /// Validate and fold the outcome into a [`ValidationResult`].
    pub fn check(&self, schema: &str, payload: &[u8]) -> ValidationResult {
        ValidationResult::from_outcome(schema, None, self.validate(schema, payload))
    }

    /// Like [`ContractValidator::check`], tagged with the channel the
    /// payload was observed on.
    pub fn check_event(&self, channel: &str, schema: &str, payload: &[u8]) -> ValidationResult {
        ValidationResult::from_outcome(schema, Some(channel), self.validate(schema, payload))
    }
}

/// Outcome of one validation call, ready for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Schema the payload was checked against.
    pub schema: String,
    /// Channel the payload came from, for event validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Whether the payload conformed.
    pub passed: bool,
    /// Failure classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Human-readable diagnostic. On constraint failures this starts with
    /// the first violated constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ValidationResult {
    fn from_outcome(schema: &str, channel: Option<&str>, outcome: Result<(), ValidationError>) -> Self {
        let (failure, diagnostic) = match outcome {
            Ok(()) => (None, None),
            Err(e) => (Some(e.kind()), Some(e.to_string())),
        };
        Self {
            schema: schema.to_string(),
            channel: channel.map(str::to_string),
            passed: failure.is_none(),
            failure,
            diagnostic,
        }
    }
}
