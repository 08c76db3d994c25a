//! # Schema Registry & Compiler
//!
//! Two passes, enforced by types:
//!
//! 1. [`SchemaRegistry`] accepts named schemas, translates each one and
//!    stores it under its [`ResourceId`]. Nothing is resolved here.
//! 2. [`SchemaRegistry::compile`] consumes the registry and produces
//!    [`CompiledSchemas`], which is immutable. References are first checked
//!    by map lookup, then each resource is compiled by `jsonschema` with a
//!    retriever that only serves registered resources.
//!
//! Because every resource is registered before any is compiled, forward
//! references and mutual recursion resolve regardless of declaration order.
//!
//! ## Thread Safety
//!
//! `CompiledSchemas` is `Send + Sync`; validation only reads it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;

use crate::error::{LoadError, ResolutionError};
use crate::identity::{Namespace, ResourceId, SchemaName};
use crate::node::SchemaNode;
use crate::options::EngineOptions;
use crate::translate::translate;

/// Serves registered resources to the compiler. Never touches the network.
#[derive(Clone)]
struct LocalRetriever {
    namespace: Namespace,
    resources: Arc<HashMap<String, Value>>,
}

impl Retrieve for LocalRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.resources.get(uri_str) {
            return Ok(value.clone());
        }

        // URI normalisation may have touched the prefix; fall back to the
        // last segment within this namespace.
        let name = uri_str.rsplit('/').next().unwrap_or(uri_str);
        let alt = format!("{}{name}", self.namespace.prefix());
        self.resources
            .get(&alt)
            .cloned()
            .ok_or_else(|| format!("resource not registered: {uri_str}").into())
    }
}

#[derive(Debug)]
struct Registered {
    id: ResourceId,
    node: SchemaNode,
    schema: Value,
    source: PathBuf,
}

/// First pass: accumulates translated resources.
#[derive(Debug)]
pub struct SchemaRegistry {
    namespace: Namespace,
    entries: BTreeMap<SchemaName, Registered>,
}

impl SchemaRegistry {
    /// Create an empty registry minting ids in `namespace`.
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            entries: BTreeMap::new(),
        }
    }

    /// The namespace resources are registered under.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &SchemaName> {
        self.entries.keys()
    }

    /// Translate `node` and register it under `name`.
    ///
    /// # Errors
    ///
    /// [`LoadError::DuplicateSchema`] if `name` is already registered,
    /// [`LoadError::InvalidName`] if a reference in `node` has no target.
    pub fn register(
        &mut self,
        name: SchemaName,
        node: SchemaNode,
        source: &Path,
    ) -> Result<&ResourceId, LoadError> {
        if let Some(existing) = self.entries.get(&name) {
            return Err(LoadError::DuplicateSchema {
                name,
                first: existing.source.clone(),
                second: source.to_path_buf(),
            });
        }

        let id = self.namespace.resource_id(&name);
        let schema = translate(&node, &id, &self.namespace).map_err(|e| LoadError::InvalidName {
            path: source.to_path_buf(),
            source: e,
        })?;

        tracing::debug!(schema = %name, kind = ?node.kind(), resource = %id, "registered schema");

        let entry = self.entries.entry(name).or_insert(Registered {
            id,
            node,
            schema,
            source: source.to_path_buf(),
        });
        Ok(&entry.id)
    }

    /// Parse and register one raw named schema.
    pub fn register_value(&mut self, name: &str, value: &Value, source: &Path) -> Result<(), LoadError> {
        let name = SchemaName::new(name).map_err(|e| LoadError::InvalidName {
            path: source.to_path_buf(),
            source: e,
        })?;
        let node = SchemaNode::parse(value).map_err(|e| LoadError::InvalidSchema {
            name: name.clone(),
            path: source.to_path_buf(),
            source: e,
        })?;
        self.register(name, node, source)?;
        Ok(())
    }

    /// Register every entry of a `name -> schema` mapping.
    ///
    /// Returns the number of schemas registered.
    pub fn register_section(&mut self, section: &Value, source: &Path) -> Result<usize, LoadError> {
        let map = section.as_object().ok_or_else(|| LoadError::Structure {
            path: source.to_path_buf(),
            reason: "schema section must be a mapping of name to schema".to_string(),
        })?;
        for (name, value) in map {
            self.register_value(name, value, source)?;
        }
        Ok(map.len())
    }

    /// Second pass: resolve and compile every registered resource.
    ///
    /// # Errors
    ///
    /// [`ResolutionError::MissingReference`] for the first reference (in
    /// name order, then declaration order) whose target was never
    /// registered. [`ResolutionError::Compile`] if the compiler rejects a
    /// translated schema.
    pub fn compile(self, options: &EngineOptions) -> Result<CompiledSchemas, ResolutionError> {
        for (name, entry) in &self.entries {
            for reference in entry.node.references() {
                let resource = self
                    .namespace
                    .resource_for_reference(reference)
                    .map_err(|e| ResolutionError::Compile {
                        schema: name.clone(),
                        reason: e.to_string(),
                    })?;
                let registered = self
                    .namespace
                    .name_of(&resource)
                    .is_some_and(|target| self.entries.contains_key(&target));
                if !registered {
                    return Err(ResolutionError::MissingReference {
                        schema: name.clone(),
                        reference: reference.to_string(),
                        resource,
                    });
                }
            }
        }

        let retriever = LocalRetriever {
            namespace: self.namespace,
            resources: Arc::new(
                self.entries
                    .values()
                    .map(|e| (e.id.as_str().to_string(), e.schema.clone()))
                    .collect(),
            ),
        };

        let mut compiled = BTreeMap::new();
        for (name, entry) in self.entries {
            let mut opts = jsonschema::options();
            opts.with_draft(jsonschema::Draft::Draft202012);
            opts.should_validate_formats(options.validate_formats);
            opts.with_retriever(retriever.clone());

            let validator = opts.build(&entry.schema).map_err(|e| ResolutionError::Compile {
                schema: name.clone(),
                reason: e.to_string(),
            })?;

            tracing::debug!(schema = %name, resource = %entry.id, "compiled schema");

            compiled.insert(
                name.clone(),
                CompiledSchema {
                    name,
                    id: entry.id,
                    schema: entry.schema,
                    source: entry.source,
                    validator,
                },
            );
        }

        Ok(CompiledSchemas {
            namespace: self.namespace,
            entries: compiled,
        })
    }
}

/// One compiled resource.
pub struct CompiledSchema {
    name: SchemaName,
    id: ResourceId,
    schema: Value,
    source: PathBuf,
    validator: Validator,
}

impl CompiledSchema {
    /// Declared name.
    pub fn name(&self) -> &SchemaName {
        &self.name
    }

    /// Resource id the schema was registered under.
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Translated Draft 2020-12 form.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Document that declared the schema.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The executable validator.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("source", &self.source)
            .finish()
    }
}

/// Second pass output: every registered schema, compiled. Immutable.
pub struct CompiledSchemas {
    namespace: Namespace,
    entries: BTreeMap<SchemaName, CompiledSchema>,
}

impl CompiledSchemas {
    /// Namespace the resources live in.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Look up a compiled schema by declared name.
    pub fn get(&self, name: &str) -> Option<&CompiledSchema> {
        let name = SchemaName::new(name).ok()?;
        self.entries.get(&name)
    }

    /// Returns true if `name` was compiled.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Translated JSON Schema document for `name`.
    pub fn resource(&self, name: &str) -> Option<&Value> {
        self.get(name).map(CompiledSchema::schema)
    }

    /// Compiled names, sorted.
    pub fn names(&self) -> Vec<&SchemaName> {
        self.entries.keys().collect()
    }

    /// Number of compiled schemas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the registry compiled no schemas.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, compiled)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&SchemaName, &CompiledSchema)> {
        self.entries.iter()
    }
}

impl fmt::Debug for CompiledSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchemas")
            .field("namespace", &self.namespace.prefix())
            .field("schema_count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> PathBuf {
        PathBuf::from("inline.yaml")
    }

    fn registry_with(section: Value) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new(Namespace::EVENT);
        registry.register_section(&section, &source()).unwrap();
        registry
    }

    #[test]
    fn forward_reference_compiles() {
        let registry = registry_with(json!({
            "Order": {
                "type": "object",
                "required": ["item"],
                "properties": { "item": { "$ref": "#/components/schemas/OrderItem" } }
            },
            "OrderItem": {
                "type": "object",
                "required": ["sku"],
                "properties": { "sku": { "type": "string" } }
            }
        }));
        let compiled = registry.compile(&EngineOptions::default()).unwrap();
        assert_eq!(compiled.len(), 2);

        let order = compiled.get("Order").unwrap().validator();
        assert!(order.is_valid(&json!({ "item": { "sku": "A-1" } })));
        assert!(!order.is_valid(&json!({ "item": {} })));
    }

    #[test]
    fn mutual_recursion_compiles() {
        let registry = registry_with(json!({
            "Node": {
                "type": "object",
                "properties": { "children": { "type": "array", "items": { "$ref": "#/components/schemas/Tree" } } }
            },
            "Tree": {
                "type": "object",
                "properties": { "root": { "$ref": "#/components/schemas/Node" } }
            }
        }));
        let compiled = registry.compile(&EngineOptions::default()).unwrap();
        let tree = compiled.get("Tree").unwrap().validator();
        assert!(tree.is_valid(&json!({ "root": { "children": [{ "root": { "children": [] } }] } })));
        assert!(!tree.is_valid(&json!({ "root": { "children": [{ "root": 7 }] } })));
    }

    #[test]
    fn missing_reference_fails_compilation() {
        let registry = registry_with(json!({
            "Order": { "properties": { "customer": { "$ref": "#/components/schemas/Customer" } } }
        }));
        let err = registry.compile(&EngineOptions::default()).unwrap_err();
        match err {
            ResolutionError::MissingReference { schema, resource, .. } => {
                assert_eq!(schema.as_str(), "Order");
                assert_eq!(resource.as_str(), "synapse://asyncapi/Customer");
            }
            other => panic!("expected MissingReference, got {other}"),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = registry_with(json!({ "Order": { "type": "object" } }));
        let err = registry
            .register_section(&json!({ "Order": { "type": "string" } }), Path::new("other.yaml"))
            .unwrap_err();
        match err {
            LoadError::DuplicateSchema { name, first, second } => {
                assert_eq!(name.as_str(), "Order");
                assert_eq!(first, source());
                assert_eq!(second, PathBuf::from("other.yaml"));
            }
            other => panic!("expected DuplicateSchema, got {other}"),
        }
    }

    #[test]
    fn non_mapping_section_is_rejected() {
        let mut registry = SchemaRegistry::new(Namespace::REST);
        let err = registry.register_section(&json!(["Order"]), &source()).unwrap_err();
        assert!(matches!(err, LoadError::Structure { .. }));
    }

    #[test]
    fn malformed_node_names_the_schema() {
        let mut registry = SchemaRegistry::new(Namespace::REST);
        let err = registry
            .register_section(&json!({ "Order": { "properties": [] } }), &source())
            .unwrap_err();
        match err {
            LoadError::InvalidSchema { name, source, .. } => {
                assert_eq!(name.as_str(), "Order");
                assert_eq!(source.pointer, "/properties");
            }
            other => panic!("expected InvalidSchema, got {other}"),
        }
    }

    #[test]
    fn format_assertion_follows_options() {
        let section = json!({ "Stamp": { "type": "string", "format": "date-time" } });

        let lenient = registry_with(section.clone()).compile(&EngineOptions::default()).unwrap();
        assert!(lenient.get("Stamp").unwrap().validator().is_valid(&json!("yesterday")));

        let strict = registry_with(section)
            .compile(&EngineOptions::default().with_format_validation(true))
            .unwrap();
        assert!(!strict.get("Stamp").unwrap().validator().is_valid(&json!("yesterday")));
        assert!(strict
            .get("Stamp")
            .unwrap()
            .validator()
            .is_valid(&json!("2024-01-15T10:30:00.000Z")));
    }

    #[test]
    fn compiled_schemas_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledSchemas>();
    }
}
