//! Primitive, array, const and unknown shapes.

use super::{DeclarationKind, Declaration, GeneratedType, GenerationContext, TypeRef};
use crate::classify::{Classification, Primitive, ShapeKind};
use crate::error::GenerateError;
use crate::naming::compose;
use crate::resolver::child_pointer;
use crate::schema::Schema;
use serde_json::Value;

/// `export type Name = <text>;` with the alias carrying its own `| null`.
pub(super) fn generate(
    ctx: &mut GenerationContext<'_>,
    schema: &Schema,
    decl: &Declaration<'_>,
) -> Result<GeneratedType, GenerateError> {
    let ty = inline(ctx, schema, decl.classification, decl.pointer, decl.raw)?;
    let ty = if decl.classification.nullable {
        ty.or_null()
    } else {
        ty
    };
    let docs = ctx.jsdoc(schema, &[], "");
    let content = format!("{}export type {} = {};", docs, decl.name, ty.text);
    Ok(GeneratedType::new(DeclarationKind::Union, content, decl.pointer).with_dependencies(ty.deps))
}

/// Type text without nullability.
pub(super) fn inline(
    ctx: &mut GenerationContext<'_>,
    schema: &Schema,
    classification: &Classification,
    location: &str,
    hint: &str,
) -> Result<TypeRef, GenerateError> {
    match &classification.kind {
        ShapeKind::Array => {
            let item = match &schema.items {
                Some(items) => ctx.type_of(
                    items,
                    &child_pointer(location, "items"),
                    &compose(&[hint, "Item"]),
                )?,
                None => TypeRef::unknown(),
            };
            Ok(item.array())
        }
        ShapeKind::Const => Ok(TypeRef::plain(literal(
            schema.const_value.as_ref().unwrap_or(&Value::Null),
        ))),
        ShapeKind::Enum => {
            let mut literals: Vec<String> = Vec::new();
            for value in schema.enum_values.iter().filter(|v| !v.is_null()) {
                let text = literal(value);
                if !literals.contains(&text) {
                    literals.push(text);
                }
            }
            Ok(TypeRef::plain(literals.join(" | ")))
        }
        ShapeKind::Primitive(primitives) => {
            let mut texts: Vec<String> = Vec::new();
            for primitive in primitives {
                let text = map_primitive(ctx, *primitive, schema.format.as_deref());
                if !texts.contains(&text) {
                    texts.push(text);
                }
            }
            Ok(TypeRef::plain(texts.join(" | ")))
        }
        ShapeKind::Unknown => {
            tracing::debug!(location, "unrecognized shape rendered as unknown");
            Ok(TypeRef::unknown())
        }
        ShapeKind::Union | ShapeKind::Intersection | ShapeKind::Object => Ok(TypeRef::unknown()),
    }
}

/// A JSON literal is also a TypeScript literal type.
fn literal(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => "unknown".to_string(),
        other => other.to_string(),
    }
}

/// Custom mappings first, then the built-in `(type, format)` table, then the
/// general type.
fn map_primitive(ctx: &GenerationContext<'_>, primitive: Primitive, format: Option<&str>) -> String {
    if let Some(target) = ctx.mapping_for(primitive.as_str(), format) {
        return target.to_string();
    }
    let text = match (primitive, format) {
        (Primitive::String, Some("binary")) => "Blob",
        (Primitive::String, _) => "string",
        (Primitive::Number | Primitive::Integer, _) => "number",
        (Primitive::Boolean, _) => "boolean",
        (Primitive::Null, _) => "null",
    };
    text.to_string()
}
