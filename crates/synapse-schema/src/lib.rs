//! # synapse-schema — Contract Schema Compilation & Validation
//!
//! Compiles the component schemas of an OpenAPI or AsyncAPI contract into
//! JSON Schema 2020-12 validators and validates payloads against them by
//! schema name.
//!
//! ## Pipeline
//!
//! 1. [`document`] reads YAML/JSON specification files.
//! 2. [`node::SchemaNode`] gives each component schema a typed shape.
//! 3. [`translate`] rewrites it into a standalone JSON Schema document with
//!    its `$ref`s pointing into the contract's [`identity::Namespace`].
//! 4. [`registry::SchemaRegistry`] collects every schema, then compiles
//!    them all at once into an immutable [`registry::CompiledSchemas`].
//!    References are resolved against the full set, so declaration order
//!    across files does not matter.
//! 5. [`validate::ContractValidator`] looks a schema up by name and
//!    validates payload bytes.
//!
//! [`openapi`] and [`asyncapi`] wire those steps together for each dialect.
//!
//! ## Crate Policy
//!
//! - A loaded validator is immutable and `Send + Sync`; share it with `Arc`.
//! - Unresolved references fail the load. A validator never exists with a
//!   dangling `$ref`.
//! - Nothing is fetched over the network; every reference is local to the
//!   contract.

pub mod asyncapi;
pub mod document;
pub mod error;
pub mod identity;
pub mod node;
pub mod openapi;
pub mod options;
pub mod registry;
pub mod translate;
pub mod validate;

pub use asyncapi::{AsyncApiLoader, AsyncApiValidator, ChannelInfo, OperationInfo};
pub use document::SpecInfo;
pub use error::{
    FailureKind, LoadError, ResolutionError, SpecError, ValidationError, Violation, Violations,
};
pub use identity::{InvalidName, Namespace, ResourceId, SchemaName};
pub use openapi::{OpenApiLoader, OpenApiValidator};
pub use options::EngineOptions;
pub use registry::{CompiledSchema, CompiledSchemas, SchemaRegistry};
pub use validate::{ContractValidator, ValidationResult};
