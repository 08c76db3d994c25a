//! # Specification Documents
//!
//! Reading YAML/JSON specification files into `serde_json::Value` trees and
//! extracting the document header. Shared by both dialect loaders.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::LoadError;

/// Read and parse a YAML (or JSON, which is YAML) document.
pub fn read_document(path: &Path) -> Result<Value, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_document(&content, path)
}

/// Parse document text. `path` is only used for diagnostics.
pub fn parse_document(content: &str, path: &Path) -> Result<Value, LoadError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        reason: format!("invalid YAML: {e}"),
    })?;
    yaml_to_json_value(&yaml).map_err(|reason| LoadError::Parse {
        path: path.to_path_buf(),
        reason: format!("YAML-to-JSON conversion failed: {reason}"),
    })
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Specification documents routinely use unquoted numeric mapping keys
/// (`200:` under `responses`), which JSON objects cannot hold directly.
/// Scalar keys are stringified; tags are dropped.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

/// Header of a specification document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpecInfo {
    /// Dialect version (`openapi: 3.1.0`, `asyncapi: 3.0.0`).
    pub dialect_version: Option<String>,
    /// `info.title`.
    pub title: Option<String>,
    /// `info.version`.
    pub version: Option<String>,
}

impl SpecInfo {
    /// Extract the header; `dialect_key` is `openapi` or `asyncapi`.
    pub fn from_document(doc: &Value, dialect_key: &str) -> Self {
        let text = |v: Option<&Value>| v.and_then(scalar_text);
        Self {
            dialect_version: text(doc.get(dialect_key)),
            title: text(doc.pointer("/info/title")),
            version: text(doc.pointer("/info/version")),
        }
    }
}

/// String form of a scalar; YAML happily parses `version: 1.0` as a float.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Schema files in a component directory, sorted by file name.
///
/// Picks `*.yaml`, `*.yml` and `*.json`; skips sub-directories and any file
/// whose name starts with `_` (index files such as `_index.yaml`).
pub fn component_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| LoadError::Read {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LoadError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('_') {
            tracing::debug!(file = %path.display(), "skipping index file");
            continue;
        }
        let is_schema_file = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml" | "json")
        );
        if is_schema_file {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
