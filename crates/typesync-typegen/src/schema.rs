//! Schema nodes as they appear in an OpenAPI 3.x document.
//!
//! Nodes are deserialized straight from the document tree. A node is either
//! a `$ref` pointer or an inline schema; references are resolved on demand by
//! the [`Resolver`](crate::resolver::Resolver) and never rewritten in place.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A node in the schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaNode {
    /// `{ "$ref": "#/components/schemas/User" }`
    Reference(Reference),
    /// Any other schema object.
    Schema(Box<Schema>),
    /// OpenAPI 3.1 boolean schema: `true` admits anything, `false` nothing.
    Boolean(bool),
}

/// A `$ref` pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub pointer: String,
}

/// An inline (non-reference) schema object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// `Some(Value::Null)` for `"const": null`, `None` when absent.
    #[serde(
        rename = "const",
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub const_value: Option<Value>,

    /// OpenAPI 3.0 nullability flag.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// `type` is either one name or a list of names (OpenAPI 3.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

/// `additionalProperties: true | false | {schema}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// Union discriminator metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl SchemaNode {
    pub fn reference(pointer: impl Into<String>) -> Self {
        SchemaNode::Reference(Reference {
            pointer: pointer.into(),
        })
    }

    /// The `$ref` pointer, if this node is a reference.
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            SchemaNode::Reference(r) => Some(&r.pointer),
            SchemaNode::Schema(_) | SchemaNode::Boolean(_) => None,
        }
    }

    /// The inline schema, if this node is not a reference.
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaNode::Reference(_) | SchemaNode::Boolean(_) => None,
            SchemaNode::Schema(s) => Some(s),
        }
    }
}

impl From<Schema> for SchemaNode {
    fn from(schema: Schema) -> Self {
        SchemaNode::Schema(Box::new(schema))
    }
}

impl SchemaType {
    /// Every declared type name, `"null"` included.
    pub fn names(&self) -> Vec<&str> {
        match self {
            SchemaType::Single(name) => vec![name.as_str()],
            SchemaType::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().contains(&name)
    }
}

impl Schema {
    /// Declared type names excluding `"null"`.
    pub fn declared_types(&self) -> Vec<&str> {
        self.schema_type
            .as_ref()
            .map(|t| t.names().into_iter().filter(|n| *n != "null").collect())
            .unwrap_or_default()
    }

    /// Whether `name` is among the declared types.
    pub fn declares(&self, name: &str) -> bool {
        self.schema_type.as_ref().is_some_and(|t| t.contains(name))
    }

    /// Whether a type array lists `"null"` (the 3.1 nullability encoding).
    pub fn type_includes_null(&self) -> bool {
        matches!(&self.schema_type, Some(SchemaType::Multiple(names)) if names.iter().any(|n| n == "null"))
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }

    /// The literal a property pins itself to: `const`, or an `enum` with a
    /// single value.
    pub fn literal(&self) -> Option<&Value> {
        if let Some(value) = &self.const_value {
            return Some(value);
        }
        match self.enum_values.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}
