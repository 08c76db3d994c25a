//! # Dialect Translation
//!
//! Converts a typed [`SchemaNode`] into a standalone Draft 2020-12 schema.
//! Translation is pure: it reads the node and the namespace and produces a
//! new JSON value.
//!
//! - `$ref` pointers are rewritten to the namespace's resource URIs
//!   (last path segment rule, see [`crate::identity`]).
//! - `properties`, `items`, `additionalProperties`, `not` and the
//!   composition keywords are translated recursively; list order and
//!   property names are preserved.
//! - Everything else is copied through unchanged.
//! - The root carries `$schema` and `$id` so the compiler treats it as a
//!   self-contained resource.

use serde_json::{Map, Value};

use crate::identity::{InvalidName, Namespace, ResourceId};
use crate::node::{Composition, SchemaNode};

/// Draft marker attached to every translated resource root.
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// Translate a named schema into an executable resource rooted at `id`.
///
/// # Errors
///
/// Returns [`InvalidName`] if a reference has no usable last segment
/// (e.g. `#/components/schemas/`).
pub fn translate(node: &SchemaNode, id: &ResourceId, namespace: &Namespace) -> Result<Value, InvalidName> {
    let mut root = translate_node(node, namespace)?;
    root.insert("$schema".to_string(), Value::String(DRAFT_2020_12.to_string()));
    root.insert("$id".to_string(), Value::String(id.as_str().to_string()));
    Ok(Value::Object(root))
}

fn translate_node(node: &SchemaNode, namespace: &Namespace) -> Result<Map<String, Value>, InvalidName> {
    let mut out = node.keywords().clone();

    if let Some(reference) = node.reference() {
        let target = namespace.resource_for_reference(reference)?;
        out.insert("$ref".to_string(), Value::String(target.as_str().to_string()));
    }

    if let Some(props) = node.properties() {
        let mut translated = Map::new();
        for (name, prop) in props {
            translated.insert(name.clone(), Value::Object(translate_node(prop, namespace)?));
        }
        out.insert("properties".to_string(), Value::Object(translated));
    }

    if let Some(items) = node.items() {
        out.insert("items".to_string(), Value::Object(translate_node(items, namespace)?));
    }

    if let Some(extra) = node.additional_properties() {
        out.insert(
            "additionalProperties".to_string(),
            Value::Object(translate_node(extra, namespace)?),
        );
    }

    if let Some(not) = node.not() {
        out.insert("not".to_string(), Value::Object(translate_node(not, namespace)?));
    }

    for composition in Composition::ALL {
        if let Some(members) = node.composition(composition) {
            let translated = members
                .iter()
                .map(|m| translate_node(m, namespace).map(Value::Object))
                .collect::<Result<Vec<_>, _>>()?;
            out.insert(composition.keyword().to_string(), Value::Array(translated));
        }
    }

    Ok(out)
}
