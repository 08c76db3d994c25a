//! # Typed Schema Nodes
//!
//! Specification documents arrive as untyped YAML trees. [`SchemaNode::parse`]
//! checks the shape of every keyword the translator descends into exactly
//! once, so translation and compilation never need to re-inspect types.
//!
//! Structural keywords get typed fields:
//!
//! | Keyword | Shape | Field |
//! |---------|-------|-------|
//! | `$ref` | string | `reference` |
//! | `properties` | mapping of nodes | `properties` |
//! | `items` | node | `items` |
//! | `additionalProperties` | node (booleans pass through) | `additional_properties` |
//! | `not` | node | `not` |
//! | `allOf` / `anyOf` / `oneOf` | sequence of nodes | `compositions` |
//!
//! Every other keyword (`type`, `format`, `enum`, `required`, `pattern`,
//! `minimum`, `description`, vendor extensions, ...) is kept verbatim.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

/// A schema keyword had a shape the translator cannot descend into.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed schema node at {pointer}: {reason}")]
pub struct NodeError {
    /// Location of the offending keyword, relative to the named schema.
    pub pointer: String,
    /// What was expected there.
    pub reason: String,
}

impl NodeError {
    fn new(pointer: &str, reason: impl Into<String>) -> Self {
        Self {
            pointer: if pointer.is_empty() {
                "(root)".to_string()
            } else {
                pointer.to_string()
            },
            reason: reason.into(),
        }
    }
}

/// Composition keyword of a [`SchemaNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Composition {
    /// `allOf`: the payload must satisfy every member.
    AllOf,
    /// `anyOf`: the payload must satisfy at least one member.
    AnyOf,
    /// `oneOf`: the payload must satisfy exactly one member.
    OneOf,
}

impl Composition {
    /// All composition keywords, in output order.
    pub const ALL: [Composition; 3] = [Composition::AllOf, Composition::AnyOf, Composition::OneOf];

    /// The dialect keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Composition::AllOf => "allOf",
            Composition::AnyOf => "anyOf",
            Composition::OneOf => "oneOf",
        }
    }
}

/// Discriminated view of a node, used for inspection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The node points at another named schema.
    Reference,
    /// The node combines sub-schemas.
    Composition,
    /// The node describes an object with named properties.
    Object,
    /// The node describes an array.
    Array,
    /// Scalar constraints only.
    Leaf,
}

/// One schema node in dialect form with its structural keywords typed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaNode {
    reference: Option<String>,
    properties: Option<BTreeMap<String, SchemaNode>>,
    items: Option<Box<SchemaNode>>,
    additional_properties: Option<Box<SchemaNode>>,
    not: Option<Box<SchemaNode>>,
    compositions: BTreeMap<Composition, Vec<SchemaNode>>,
    keywords: Map<String, Value>,
}

impl SchemaNode {
    /// Parse a dialect node, rejecting structural keywords of the wrong shape.
    pub fn parse(value: &Value) -> Result<Self, NodeError> {
        Self::parse_at(value, "")
    }

    fn parse_at(value: &Value, pointer: &str) -> Result<Self, NodeError> {
        let map = value
            .as_object()
            .ok_or_else(|| NodeError::new(pointer, format!("expected a mapping, found {}", kind_of(value))))?;

        let mut node = SchemaNode::default();
        for (key, val) in map {
            let here = format!("{pointer}/{}", escape(key));
            match key.as_str() {
                "$ref" => {
                    let reference = val
                        .as_str()
                        .ok_or_else(|| NodeError::new(&here, "$ref must be a string"))?;
                    node.reference = Some(reference.to_string());
                }
                "properties" => {
                    let props = val
                        .as_object()
                        .ok_or_else(|| NodeError::new(&here, "properties must be a mapping"))?;
                    let mut parsed = BTreeMap::new();
                    for (name, prop) in props {
                        let at = format!("{here}/{}", escape(name));
                        parsed.insert(name.clone(), Self::parse_at(prop, &at)?);
                    }
                    node.properties = Some(parsed);
                }
                "items" => {
                    node.items = Some(Box::new(Self::parse_at(val, &here)?));
                }
                "additionalProperties" if !val.is_boolean() => {
                    node.additional_properties = Some(Box::new(Self::parse_at(val, &here)?));
                }
                "not" => {
                    node.not = Some(Box::new(Self::parse_at(val, &here)?));
                }
                "allOf" | "anyOf" | "oneOf" => {
                    let members = val.as_array().ok_or_else(|| {
                        NodeError::new(&here, format!("{key} must be a sequence"))
                    })?;
                    let parsed = members
                        .iter()
                        .enumerate()
                        .map(|(i, m)| Self::parse_at(m, &format!("{here}/{i}")))
                        .collect::<Result<Vec<_>, _>>()?;
                    let composition = match key.as_str() {
                        "allOf" => Composition::AllOf,
                        "anyOf" => Composition::AnyOf,
                        _ => Composition::OneOf,
                    };
                    node.compositions.insert(composition, parsed);
                }
                _ => {
                    node.keywords.insert(key.clone(), val.clone());
                }
            }
        }
        Ok(node)
    }

    /// The raw dialect reference, if this node is a `$ref`.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Named properties, if declared.
    pub fn properties(&self) -> Option<&BTreeMap<String, SchemaNode>> {
        self.properties.as_ref()
    }

    /// Array element schema, if declared.
    pub fn items(&self) -> Option<&SchemaNode> {
        self.items.as_deref()
    }

    /// Schema for undeclared properties, when given as a node.
    pub fn additional_properties(&self) -> Option<&SchemaNode> {
        self.additional_properties.as_deref()
    }

    /// Negated schema, if declared.
    pub fn not(&self) -> Option<&SchemaNode> {
        self.not.as_deref()
    }

    /// Members of a composition keyword.
    pub fn composition(&self, composition: Composition) -> Option<&[SchemaNode]> {
        self.compositions.get(&composition).map(Vec::as_slice)
    }

    /// Pass-through keywords.
    pub fn keywords(&self) -> &Map<String, Value> {
        &self.keywords
    }

    /// The node's `required` list; non-string entries are ignored.
    pub fn required(&self) -> Vec<&str> {
        self.keywords
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Classify the node.
    pub fn kind(&self) -> NodeKind {
        let declared_type = self.keywords.get("type").and_then(Value::as_str);
        if self.reference.is_some() {
            NodeKind::Reference
        } else if !self.compositions.is_empty() {
            NodeKind::Composition
        } else if self.properties.is_some() || declared_type == Some("object") {
            NodeKind::Object
        } else if self.items.is_some() || declared_type == Some("array") {
            NodeKind::Array
        } else {
            NodeKind::Leaf
        }
    }

    /// Child nodes in translation order.
    pub fn children(&self) -> Vec<&SchemaNode> {
        let mut out = Vec::new();
        if let Some(props) = &self.properties {
            out.extend(props.values());
        }
        if let Some(items) = &self.items {
            out.push(items.as_ref());
        }
        if let Some(extra) = &self.additional_properties {
            out.push(extra.as_ref());
        }
        if let Some(not) = &self.not {
            out.push(not.as_ref());
        }
        for members in self.compositions.values() {
            out.extend(members.iter());
        }
        out
    }

    /// Every dialect reference in this node and its descendants, depth-first.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(reference) = &self.reference {
            out.push(reference);
        }
        for child in self.children() {
            child.collect_references(out);
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// JSON Pointer escaping for a single segment.
fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
