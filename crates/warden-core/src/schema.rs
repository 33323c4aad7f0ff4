//! Field metadata loaded at runtime and applied to untyped JSON documents.
//!
//! A schema file names types and lists their fields:
//!
//! ```json
//! {
//!   "types": {
//!     "User": {
//!       "fields": [
//!         { "name": "username", "groups": ["api"], "dimensions": { "type": ["read", "list"] } },
//!         { "name": "roles", "groups": ["api"], "since": "2" },
//!         { "name": "address", "type": "Address" },
//!         { "name": "password", "key": "-" }
//!       ]
//!     },
//!     "Address": { "fields": [{ "name": "city" }] }
//!   }
//! }
//! ```
//!
//! The whole file is validated on load. A [`Document`] pairs a JSON value with
//! one of the schema's types and renders it like a struct: undeclared input
//! keys are dropped, declared keys missing from the input are skipped, arrays
//! apply the type to each element and `null` stays `null`.

use crate::error::{Result, WardenError};
use crate::tag::{tag, FieldTag, TypeDescriptor};
use crate::walker::{Marshal, Walker};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    types: BTreeMap<String, RawType>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawType {
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    name: String,
    key: Option<String>,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default)]
    dimensions: BTreeMap<String, Vec<String>>,
    since: Option<String>,
    until: Option<String>,
    #[serde(default)]
    omit_empty: bool,
    #[serde(default)]
    embedded: bool,
    #[serde(rename = "type")]
    type_ref: Option<String>,
}

impl RawField {
    fn to_tag(&self) -> FieldTag {
        let mut t = tag(&self.name);
        if let Some(key) = &self.key {
            t = t.key(key);
        }
        for group in &self.groups {
            t = t.groups(group);
        }
        for (dimension, values) in &self.dimensions {
            for value in values {
                t = t.dimension(dimension, value);
            }
        }
        if let Some(since) = &self.since {
            t = t.since(since);
        }
        if let Some(until) = &self.until {
            t = t.until(until);
        }
        if self.omit_empty {
            t = t.omit_empty();
        }
        if self.embedded {
            t = t.embedded();
        }
        t
    }
}

#[derive(Debug)]
struct SchemaType {
    descriptor: TypeDescriptor,
    // Nested type name per field, parallel to `descriptor.fields()`.
    nested: Vec<Option<String>>,
}

/// A validated set of named type descriptors.
#[derive(Debug)]
pub struct Schema {
    types: BTreeMap<String, SchemaType>,
}

impl Schema {
    /// Read and validate a schema file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        std::fs::read_to_string(path)?.parse()
    }

    /// Type names in sorted order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn descriptor(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name).map(|t| &t.descriptor)
    }

    /// Pair `value` with the schema type `type_name`.
    pub fn document<'a>(&'a self, type_name: &str, value: &'a Value) -> Result<Document<'a>> {
        let (name, ty) = self.types.get_key_value(type_name).ok_or_else(|| {
            WardenError::configuration(type_name, "<type>", "no such type in schema")
        })?;
        Ok(Document {
            schema: self,
            name,
            ty,
            value,
        })
    }
}

impl FromStr for Schema {
    type Err = WardenError;

    fn from_str(json: &str) -> Result<Self> {
        let raw: RawSchema = serde_json::from_str(json)?;

        let mut types = BTreeMap::new();
        for (name, raw_type) in &raw.types {
            let tags: Vec<FieldTag> = raw_type.fields.iter().map(RawField::to_tag).collect();
            let descriptor = TypeDescriptor::build(name, &tags)?;

            let mut nested = Vec::with_capacity(raw_type.fields.len());
            for field in &raw_type.fields {
                if let Some(target) = &field.type_ref {
                    if !raw.types.contains_key(target) {
                        return Err(WardenError::configuration(
                            name,
                            &field.name,
                            format!("unknown type {target:?}"),
                        ));
                    }
                }
                nested.push(field.type_ref.clone());
            }

            types.insert(name.clone(), SchemaType { descriptor, nested });
        }

        debug!(types = types.len(), "schema loaded");
        Ok(Self { types })
    }
}

/// A JSON value viewed as an instance of a schema type.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    schema: &'a Schema,
    name: &'a str,
    ty: &'a SchemaType,
    value: &'a Value,
}

impl<'a> Document<'a> {
    fn with_value(&self, value: &'a Value) -> Self {
        Self { value, ..*self }
    }

    fn nested(&self, type_name: &str, value: &'a Value) -> Result<Self> {
        self.schema.document(type_name, value)
    }
}

enum Slot<'a> {
    Typed(Document<'a>),
    Raw(&'a Value),
}

impl Marshal for Slot<'_> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        match self {
            Slot::Typed(doc) => doc.marshal(walker),
            Slot::Raw(value) => value.marshal(walker),
        }
    }
}

impl Marshal for Document<'_> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        match self.value {
            Value::Object(map) => {
                let fields = self.ty.descriptor.fields();
                let mut slots = Vec::with_capacity(fields.len());
                for (field, nested) in fields.iter().zip(&self.ty.nested) {
                    let slot = match (map.get(field.field()), nested) {
                        (None, _) => None,
                        (Some(value), Some(type_name)) => {
                            Some(Slot::Typed(self.nested(type_name, value)?))
                        }
                        (Some(value), None) => Some(Slot::Raw(value)),
                    };
                    slots.push(slot);
                }
                let values = slots
                    .iter()
                    .map(|slot| slot.as_ref().map(|s| s as &dyn Marshal))
                    .collect();
                walker.object_with(&self.ty.descriptor, values, None)
            }
            Value::Array(items) => {
                let docs: Vec<Document<'_>> = items.iter().map(|v| self.with_value(v)).collect();
                walker.sequence(docs.iter())
            }
            Value::Null => Ok(Some(Value::Null)),
            other => Err(walker.unsupported(format!(
                "expected object for type {}, found {}",
                self.name,
                kind(other)
            ))),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
