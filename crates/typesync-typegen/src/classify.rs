//! Shape classification.
//!
//! Several schemas legally satisfy more than one shape predicate (an object
//! carrying `oneOf`, an enum declaring `type: string`). [`classify`] checks
//! the predicates in a fixed order and the first match wins:
//!
//! 1. union (`oneOf` / `anyOf`)
//! 2. intersection (`allOf`)
//! 3. object (`type: object` or non-empty `properties`)
//! 4. array
//! 5. enum
//! 6. const
//! 7. primitive
//! 8. unknown

use crate::schema::Schema;
use serde::Serialize;

/// Scalar JSON types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Primitive::String),
            "number" => Some(Primitive::Number),
            "integer" => Some(Primitive::Integer),
            "boolean" => Some(Primitive::Boolean),
            "null" => Some(Primitive::Null),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Integer => "integer",
            Primitive::Boolean => "boolean",
            Primitive::Null => "null",
        }
    }
}

/// The classifier's verdict for a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "types", rename_all = "snake_case")]
pub enum ShapeKind {
    Union,
    Intersection,
    Object,
    Array,
    Enum,
    Const,
    /// One or more scalar types; more than one renders as a union.
    Primitive(Vec<Primitive>),
    Unknown,
}

/// Shape plus the facts computed for every node regardless of shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub kind: ShapeKind,
    pub nullable: bool,
    pub is_const: bool,
    pub has_discriminator: bool,
}

/// Which generator handles a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Object,
    Union,
    Enum,
    PrimitiveArray,
}

impl ShapeKind {
    pub fn generator(&self) -> GeneratorKind {
        match self {
            ShapeKind::Union => GeneratorKind::Union,
            ShapeKind::Intersection | ShapeKind::Object => GeneratorKind::Object,
            ShapeKind::Enum => GeneratorKind::Enum,
            ShapeKind::Array | ShapeKind::Const | ShapeKind::Primitive(_) | ShapeKind::Unknown => {
                GeneratorKind::PrimitiveArray
            }
        }
    }

    /// Shapes declared as interfaces or enums, which cannot carry their own
    /// `| null` and need it applied where they are used.
    pub fn is_nominal(&self) -> bool {
        matches!(
            self,
            ShapeKind::Object | ShapeKind::Intersection | ShapeKind::Enum
        )
    }
}

/// Whether a node admits `null`.
///
/// `nullable: true` and a type array containing `"null"` are two encodings
/// of the same fact; either one yields a single `true`.
pub fn is_nullable(schema: &Schema) -> bool {
    schema.nullable || schema.type_includes_null() || schema.enum_values.iter().any(|v| v.is_null())
}

/// Classify a resolved schema.
pub fn classify(schema: &Schema) -> Classification {
    Classification {
        kind: shape_of(schema),
        nullable: is_nullable(schema),
        is_const: schema.const_value.is_some(),
        has_discriminator: schema.discriminator.is_some(),
    }
}

fn shape_of(schema: &Schema) -> ShapeKind {
    if !schema.one_of.is_empty() || !schema.any_of.is_empty() {
        return ShapeKind::Union;
    }
    if !schema.all_of.is_empty() {
        return ShapeKind::Intersection;
    }
    if schema.declares("object") || !schema.properties.is_empty() {
        return ShapeKind::Object;
    }
    if schema.declares("array") {
        return ShapeKind::Array;
    }
    if schema.enum_values.iter().any(|v| !v.is_null()) {
        return ShapeKind::Enum;
    }
    if schema.const_value.is_some() {
        return ShapeKind::Const;
    }

    let declared = schema
        .schema_type
        .as_ref()
        .map(|t| t.names())
        .unwrap_or_default();
    let mut primitives: Vec<Primitive> = Vec::new();
    for name in &declared {
        match Primitive::from_name(name) {
            Some(p) if !primitives.contains(&p) => primitives.push(p),
            Some(_) => {}
            None => return ShapeKind::Unknown,
        }
    }
    // `["string", "null"]` is a nullable string, not a union with null.
    if primitives.len() > 1 {
        primitives.retain(|p| *p != Primitive::Null);
    }
    if primitives.is_empty() {
        ShapeKind::Unknown
    } else {
        ShapeKind::Primitive(primitives)
    }
}
