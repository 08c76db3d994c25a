//! # AsyncAPI Loader
//!
//! Loads an event contract from a single document. Two things are read:
//!
//! - `components.schemas`: compiled into validators, exactly like the
//!   OpenAPI component files.
//! - `channels` and `operations`: kept as read-only metadata for reports.
//!   They are never validated.
//!
//! Both AsyncAPI 3 (`address`, `messages`, top-level `operations`) and
//! AsyncAPI 2 (`publish`/`subscribe` inside channels) layouts are
//! understood for metadata.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::document::{read_document, scalar_text, SpecInfo};
use crate::error::{LoadError, SpecError, ValidationError};
use crate::identity::Namespace;
use crate::options::EngineOptions;
use crate::registry::SchemaRegistry;
use crate::validate::{ContractValidator, ValidationResult};

/// Channel metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    /// Channel key in the document.
    pub name: String,
    /// Broker address (subject, topic).
    pub address: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Message keys declared on the channel, sorted.
    pub messages: Vec<String>,
}

/// Operation metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationInfo {
    /// Operation key (or `operationId` for AsyncAPI 2).
    pub name: String,
    /// `send`/`receive` (AsyncAPI 3) or `publish`/`subscribe` (AsyncAPI 2).
    pub action: Option<String>,
    /// Channel the operation is bound to.
    pub channel: Option<String>,
}

/// Builder for [`AsyncApiValidator`].
#[derive(Debug, Clone)]
pub struct AsyncApiLoader {
    spec_path: PathBuf,
    options: EngineOptions,
}

impl AsyncApiLoader {
    /// Loader for the document at `spec_path`.
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
    pub fn load(self) -> Result<AsyncApiValidator, SpecError> {
        let doc = read_document(&self.spec_path)?;
        let info = SpecInfo::from_document(&doc, "asyncapi");

        let mut operations = BTreeMap::new();
        let channels = parse_channels(&doc, &self.spec_path, &mut operations)?;
        parse_operations(&doc, &self.spec_path, &mut operations)?;

        let mut registry = SchemaRegistry::new(Namespace::EVENT);
        match doc.pointer("/components/schemas") {
            Some(section) if !section.is_null() => {
                registry.register_section(section, &self.spec_path)?;
            }
            _ => tracing::warn!(spec = %self.spec_path.display(), "no components.schemas section"),
        }

        let schemas = registry.compile(&self.options)?;
        tracing::info!(
            spec = %self.spec_path.display(),
            schema_count = schemas.len(),
            channel_count = channels.len(),
            "loaded AsyncAPI contract"
        );

        Ok(AsyncApiValidator {
            spec_path: self.spec_path,
            info,
            channels,
            operations,
            contract: ContractValidator::new(schemas),
        })
    }
}

fn section<'a>(doc: &'a Value, key: &str, path: &Path) -> Result<Option<&'a Map<String, Value>>, LoadError> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(LoadError::Structure {
            path: path.to_path_buf(),
            reason: format!("'{key}' must be a mapping"),
        }),
    }
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_text)
}

/// Last segment of a `$ref` held in `value`, with JSON Pointer escapes
/// decoded (`#/channels/orders~1ingest` names `orders/ingest`).
fn reference_target(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.get("$ref"))
        .and_then(Value::as_str)
        .and_then(|r| r.rsplit('/').next())
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
}

fn parse_channels(
    doc: &Value,
    path: &Path,
    operations: &mut BTreeMap<String, OperationInfo>,
) -> Result<BTreeMap<String, ChannelInfo>, LoadError> {
    let mut channels = BTreeMap::new();
    let Some(map) = section(doc, "channels", path)? else {
        return Ok(channels);
    };

    for (name, def) in map {
        let Some(def) = def.as_object() else {
            tracing::warn!(channel = %name, "channel definition is not a mapping; skipped");
            continue;
        };

        let mut messages: Vec<String> = def
            .get("messages")
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        messages.sort();

        for action in ["publish", "subscribe"] {
            if let Some(op) = def.get(action).and_then(Value::as_object) {
                let op_name = text(op, "operationId").unwrap_or_else(|| format!("{action} {name}"));
                operations.insert(
                    op_name.clone(),
                    OperationInfo {
                        name: op_name,
                        action: Some(action.to_string()),
                        channel: Some(name.clone()),
                    },
                );
            }
        }

        channels.insert(
            name.clone(),
            ChannelInfo {
                name: name.clone(),
                address: text(def, "address"),
                description: text(def, "description"),
                messages,
            },
        );
    }
    Ok(channels)
}

fn parse_operations(
    doc: &Value,
    path: &Path,
    operations: &mut BTreeMap<String, OperationInfo>,
) -> Result<(), LoadError> {
    let Some(map) = section(doc, "operations", path)? else {
        return Ok(());
    };
    for (name, def) in map {
        let Some(def) = def.as_object() else {
            tracing::warn!(operation = %name, "operation definition is not a mapping; skipped");
            continue;
        };
        operations.insert(
            name.clone(),
            OperationInfo {
                name: name.clone(),
                action: text(def, "action"),
                channel: reference_target(def.get("channel")),
            },
        );
    }
    Ok(())
}

/// Validates event payloads against AsyncAPI component schemas.
#[derive(Debug)]
pub struct AsyncApiValidator {
    spec_path: PathBuf,
    info: SpecInfo,
    channels: BTreeMap<String, ChannelInfo>,
    operations: BTreeMap<String, OperationInfo>,
    contract: ContractValidator,
}

impl AsyncApiValidator {
    /// Load with default options.
    pub fn from_spec(spec_path: impl Into<PathBuf>) -> Result<Self, SpecError> {
        AsyncApiLoader::new(spec_path).load()
    }

    /// Document path.
    pub fn spec_path(&self) -> &Path {
        &self.spec_path
    }

    /// Document header.
    pub fn info(&self) -> &SpecInfo {
        &self.info
    }

    /// Declared channels by name.
    pub fn channels(&self) -> &BTreeMap<String, ChannelInfo> {
        &self.channels
    }

    /// Declared operations by name.
    pub fn operations(&self) -> &BTreeMap<String, OperationInfo> {
        &self.operations
    }

    /// The underlying facade.
    pub fn contract(&self) -> &ContractValidator {
        &self.contract
    }

    /// Validate a message payload against the named schema.
    pub fn validate_message(&self, schema: &str, payload: &[u8]) -> Result<(), ValidationError> {
        self.contract.validate(schema, payload)
    }

    /// Validate and fold into a [`ValidationResult`] tagged with `channel`.
    pub fn check_event(&self, channel: &str, schema: &str, payload: &[u8]) -> ValidationResult {
        self.contract.check_event(channel, schema, payload)
    }
}
