//! Declarative record schema as published by the schema endpoint.
//!
//! Pure data: JSON keys map 1:1 onto field names (camelCase), `type` is the
//! symbolic kind name. Kinds outside the known set are kept verbatim so the
//! synthesizer can reject them with a precise error instead of failing decode.
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<SchemaProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    /// Element fields; only meaningful for `PropertyType::Array`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<SchemaProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    String,
    Number,
    Date,
    Bool,
    Array,
    /// Anything else the producer sent.
    Other(String),
}

impl PropertyType {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::String => "String",
            PropertyType::Number => "Number",
            PropertyType::Date => "Date",
            PropertyType::Bool => "Bool",
            PropertyType::Array => "Array",
            PropertyType::Other(raw) => raw,
        }
    }
}

impl From<String> for PropertyType {
    fn from(raw: String) -> Self {
        // the publishing side's enum converter reads names case-insensitively
        match raw.to_ascii_lowercase().as_str() {
            "string" => PropertyType::String,
            "number" => PropertyType::Number,
            "date" => PropertyType::Date,
            "bool" => PropertyType::Bool,
            "array" => PropertyType::Array,
            _ => PropertyType::Other(raw),
        }
    }
}

impl From<PropertyType> for String {
    fn from(kind: PropertyType) -> Self {
        match kind {
            PropertyType::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SchemaProperty {
    pub fn scalar(name: impl Into<String>, kind: PropertyType) -> Self {
        Self { name: name.into(), kind, properties: Vec::new() }
    }

    pub fn array(name: impl Into<String>, properties: Vec<SchemaProperty>) -> Self {
        Self { name: name.into(), kind: PropertyType::Array, properties }
    }
}

impl Schema {
    pub fn new(name: impl Into<String>, properties: Vec<SchemaProperty>) -> Self {
        Self { name: name.into(), properties }
    }

    /// Depth-first, pre-order walk over every property that synthesis reads.
    pub fn visit(&self) -> Visit<'_> {
        visit(self)
    }

    /// Number of nested array levels below the root (0 for a flat schema).
    pub fn depth(&self) -> usize {
        fn go(props: &[SchemaProperty]) -> usize {
            props
                .iter()
                .filter(|p| p.kind == PropertyType::Array)
                .map(|p| 1 + go(&p.properties))
                .max()
                .unwrap_or(0)
        }
        go(&self.properties)
    }
}

/// Depth-first sequence of the `SchemaProperty`s under `schema`.
///
/// Only Array properties are descended into; `properties` on a scalar is
/// ignored. Each call starts a fresh walk.
pub fn visit(schema: &Schema) -> Visit<'_> {
    Visit { stack: vec![schema.properties.iter()] }
}

pub struct Visit<'a> {
    stack: Vec<std::slice::Iter<'a, SchemaProperty>>,
}

impl<'a> Iterator for Visit<'a> {
    type Item = &'a SchemaProperty;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(prop) => {
                    if prop.kind == PropertyType::Array && !prop.properties.is_empty() {
                        self.stack.push(prop.properties.iter());
                    }
                    return Some(prop);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
