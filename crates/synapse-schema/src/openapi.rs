//! # OpenAPI Loader
//!
//! Loads a REST contract laid out as a root document plus a component
//! directory:
//!
//! ```text
//! openapi/
//! ├── openapi.yaml
//! └── components/
//!     └── schemas/
//!         ├── _index.yaml      (skipped)
//!         ├── health.yaml      (HealthResponse, ComponentHealth, ...)
//!         └── orders.yaml      (Order, OrderItem, ...)
//! ```
//!
//! Every component file is a mapping of schema name to schema node. All of
//! them, plus any inline `components.schemas` in the root document, land in
//! one registry, so a name declared twice anywhere is a load error. Paths,
//! parameters and responses in the root document are not read.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::document::{component_files, read_document, SpecInfo};
use crate::error::{LoadError, SpecError, ValidationError};
use crate::identity::Namespace;
use crate::options::EngineOptions;
use crate::registry::SchemaRegistry;
use crate::validate::{ContractValidator, ValidationResult};

/// Directory holding component schema files, relative to the root document.
pub const COMPONENT_SCHEMA_DIR: &str = "components/schemas";

/// Builder for [`OpenApiValidator`].
#[derive(Debug, Clone)]
pub struct OpenApiLoader {
    spec_path: PathBuf,
    options: EngineOptions,
}

impl OpenApiLoader {
    /// Loader for the root document at `spec_path`.
    pub fn new(spec_path: impl Into<PathBuf>) -> Self {
        Self {
            spec_path: spec_path.into(),
            options: EngineOptions::default(),
        }
    }

    /// Override engine options.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Read, register and compile.
    ///
    /// # Errors
    ///
    /// [`SpecError::Load`] for unreadable or malformed files, duplicate
    /// names, or a missing component directory when the root has no inline
    /// schemas. [`SpecError::Resolution`] for unresolved references.
    pub fn load(self) -> Result<OpenApiValidator, SpecError> {
        let root = read_document(&self.spec_path)?;
        let info = SpecInfo::from_document(&root, "openapi");
        let mut registry = SchemaRegistry::new(Namespace::REST);

        let inline = root.pointer("/components/schemas").filter(|v| !v.is_null());
        if let Some(section) = inline {
            let count = registry.register_section(section, &self.spec_path)?;
            tracing::debug!(spec = %self.spec_path.display(), count, "registered inline schemas");
        }

        let components_dir = self.components_dir();
        if components_dir.is_dir() {
            for file in component_files(&components_dir)? {
                let doc = read_document(&file)?;
                if doc.is_null() {
                    tracing::warn!(file = %file.display(), "empty component file");
                    continue;
                }
                let count = registry.register_section(&doc, &file)?;
                tracing::debug!(file = %file.display(), count, "registered component file");
            }
        } else if inline.is_none() {
            return Err(LoadError::MissingComponents { path: components_dir }.into());
        }

        let schemas = registry.compile(&self.options)?;
        tracing::info!(
            spec = %self.spec_path.display(),
            schema_count = schemas.len(),
            "loaded OpenAPI contract"
        );

        Ok(OpenApiValidator {
            spec_path: self.spec_path,
            info,
            contract: ContractValidator::new(schemas),
        })
    }

    fn components_dir(&self) -> PathBuf {
        self.spec_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(COMPONENT_SCHEMA_DIR)
    }
}

/// Validates HTTP response bodies against OpenAPI component schemas.
#[derive(Debug)]
pub struct OpenApiValidator {
    spec_path: PathBuf,
    info: SpecInfo,
    contract: ContractValidator,
}

impl OpenApiValidator {
    /// Load with default options.
    pub fn from_spec(spec_path: impl Into<PathBuf>) -> Result<Self, SpecError> {
        OpenApiLoader::new(spec_path).load()
    }

    /// Root document path.
    pub fn spec_path(&self) -> &Path {
        &self.spec_path
    }

    /// Root document header.
    pub fn info(&self) -> &SpecInfo {
        &self.info
    }

    /// The underlying facade.
    pub fn contract(&self) -> &ContractValidator {
        &self.contract
    }

    /// Validate a response body against the named schema.
    pub fn validate_response(&self, schema: &str, body: &[u8]) -> Result<(), ValidationError> {
        self.contract.validate(schema, body)
    }

    /// Validate an already-parsed body.
    pub fn validate_value(&self, schema: &str, body: &Value) -> Result<(), ValidationError> {
        self.contract.validate_value(schema, body)
    }

    /// Validate and fold into a [`ValidationResult`].
    pub fn check(&self, schema: &str, body: &[u8]) -> ValidationResult {
        self.contract.check(schema, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolutionError;
    use std::fs;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(root: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("openapi.yaml"), root).unwrap();
            Self { dir }
        }

        fn component(self, name: &str, body: &str) -> Self {
            let schemas = self.dir.path().join(COMPONENT_SCHEMA_DIR);
            fs::create_dir_all(&schemas).unwrap();
            fs::write(schemas.join(name), body).unwrap();
            self
        }

        fn load(&self) -> Result<OpenApiValidator, SpecError> {
            OpenApiValidator::from_spec(self.dir.path().join("openapi.yaml"))
        }
    }

    const ROOT: &str = "openapi: 3.1.0\ninfo:\n  title: Orders\n  version: 1.0.0\npaths: {}\n";

    #[test]
    fn registers_schemas_across_files() {
        let fixture = Fixture::new(ROOT)
            .component(
                "orders.yaml",
                "Order:\n  type: object\n  required: [items]\n  properties:\n    items:\n      type: array\n      items:\n        $ref: '#/components/schemas/OrderItem'\n",
            )
            .component(
                "items.yaml",
                "OrderItem:\n  type: object\n  required: [sku]\n  properties:\n    sku: { type: string }\n",
            )
            .component("_index.yaml", "Order:\n  $ref: './orders.yaml#/Order'\n");

        let v = fixture.load().unwrap();
        assert_eq!(v.info().title.as_deref(), Some("Orders"));
        assert_eq!(v.contract().schemas().len(), 2);
        v.validate_response("Order", br#"{"items": [{"sku": "A"}]}"#).unwrap();
        let err = v.validate_response("Order", br#"{"items": [{}]}"#).unwrap_err();
        assert!(err.to_string().contains("sku"), "{err}");
    }

    #[test]
    fn duplicate_across_files_is_a_load_error() {
        let fixture = Fixture::new(ROOT)
            .component("a.yaml", "Order:\n  type: object\n")
            .component("b.yaml", "Order:\n  type: string\n");
        let err = fixture.load().unwrap_err();
        assert!(
            matches!(err, SpecError::Load(LoadError::DuplicateSchema { .. })),
            "{err}"
        );
    }

    #[test]
    fn inline_and_file_schemas_share_one_registry() {
        let root = format!("{ROOT}components:\n  schemas:\n    Money:\n      type: number\n");
        let fixture = Fixture::new(&root).component(
            "orders.yaml",
            "Order:\n  type: object\n  properties:\n    total:\n      $ref: '#/components/schemas/Money'\n",
        );
        let v = fixture.load().unwrap();
        v.validate_response("Order", br#"{"total": 10.5}"#).unwrap();
        assert!(v.validate_response("Order", br#"{"total": "ten"}"#).is_err());
    }

    #[test]
    fn missing_component_directory_is_a_load_error() {
        let err = Fixture::new(ROOT).load().unwrap_err();
        assert!(matches!(err, SpecError::Load(LoadError::MissingComponents { .. })));
    }

    #[test]
    fn unresolved_reference_yields_no_validator() {
        let fixture = Fixture::new(ROOT).component(
            "orders.yaml",
            "Order:\n  properties:\n    customer:\n      $ref: '#/components/schemas/Customer'\n",
        );
        let err = fixture.load().unwrap_err();
        match err {
            SpecError::Resolution(ResolutionError::MissingReference { reference, .. }) => {
                assert_eq!(reference, "#/components/schemas/Customer");
            }
            other => panic!("expected MissingReference, got {other}"),
        }
    }

    #[test]
    fn malformed_component_file_is_a_load_error() {
        let fixture = Fixture::new(ROOT).component("orders.yaml", "Order: [unclosed\n");
        let err = fixture.load().unwrap_err();
        assert!(matches!(err, SpecError::Load(LoadError::Parse { .. })), "{err}");
    }

    #[test]
    fn missing_root_document_is_a_load_error() {
        let err = OpenApiValidator::from_spec("/nonexistent/openapi.yaml").unwrap_err();
        assert!(matches!(err, SpecError::Load(LoadError::Read { .. })));
    }
}
