//! Union generator for `oneOf` / `anyOf`.
//!
//! Inline object-like branches are registered as their own declarations.
//! Their names come from the discriminator literal, then the branch title,
//! then the branch position. Scalar, array and const branches render in
//! place, and a `null` branch only makes the union nullable.

use super::{
    DeclarationKind, Declaration, GeneratedType, GenerationContext, TypeRef, literal_count,
    named_use,
};
use crate::classify::{Classification, ShapeKind, classify};
use crate::error::GenerateError;
use crate::naming::compose;
use crate::resolver::child_pointer;
use crate::schema::{Schema, SchemaNode};
use indexmap::IndexSet;
use serde_json::Value;

fn branches(schema: &Schema) -> (&'static str, &[SchemaNode]) {
    if !schema.one_of.is_empty() {
        ("oneOf", &schema.one_of)
    } else {
        ("anyOf", &schema.any_of)
    }
}

/// Whether an inline branch needs a declaration of its own.
fn needs_declaration(branch: &SchemaNode) -> bool {
    let SchemaNode::Schema(schema) = branch else {
        return false;
    };
    match classify(schema).kind {
        ShapeKind::Object | ShapeKind::Intersection | ShapeKind::Union => true,
        ShapeKind::Enum => literal_count(schema) > 1,
        _ => false,
    }
}

/// Whether a union nested in a property renders in place
/// (`string | null`, `Pet | null`) instead of as a named alias.
pub(super) fn renders_inline(schema: &Schema) -> bool {
    schema.discriminator.is_none() && !branches(schema).1.iter().any(needs_declaration)
}

pub(super) fn inline(
    ctx: &mut GenerationContext<'_>,
    schema: &Schema,
    classification: &Classification,
    location: &str,
    hint: &str,
) -> Result<TypeRef, GenerateError> {
    members(ctx, schema, location, hint, classification.nullable)
}

pub(super) fn generate(
    ctx: &mut GenerationContext<'_>,
    schema: &Schema,
    decl: &Declaration<'_>,
) -> Result<GeneratedType, GenerateError> {
    let ty = members(ctx, schema, decl.pointer, decl.raw, decl.classification.nullable)?;
    let extra: Vec<String> = schema
        .discriminator
        .as_ref()
        .map(|d| vec![format!("@discriminator {}", d.property_name)])
        .unwrap_or_default();
    let docs = ctx.jsdoc(schema, &extra, "");
    let content = format!("{}export type {} = {};", docs, decl.name, ty.text);
    Ok(GeneratedType::new(DeclarationKind::Union, content, decl.pointer).with_dependencies(ty.deps))
}

/// `A | B | ...` over the branches, with `| null` collected once at the end.
fn members(
    ctx: &mut GenerationContext<'_>,
    schema: &Schema,
    pointer: &str,
    union_raw: &str,
    mut nullable: bool,
) -> Result<TypeRef, GenerateError> {
    let (keyword, branches) = branches(schema);
    let branches_pointer = child_pointer(pointer, keyword);
    let discriminator = schema
        .discriminator
        .as_ref()
        .map(|d| d.property_name.as_str());

    let mut members: IndexSet<String> = IndexSet::new();
    let mut deps = IndexSet::new();
    for (i, branch) in branches.iter().enumerate() {
        let location = child_pointer(&branches_pointer, &i.to_string());
        let member = match branch {
            SchemaNode::Reference(r) => ctx.reference_type(&r.pointer, &location)?,
            SchemaNode::Boolean(allowed) => TypeRef::boolean_schema(*allowed),
            SchemaNode::Schema(inline) if needs_declaration(branch) => {
                let raw = branch_name(ctx, inline, discriminator, union_raw, i + 1, &location)?;
                let name = ctx.generate_named(inline, &location, &raw)?;
                named_use(&name, inline)
            }
            SchemaNode::Schema(inline) => {
                let hint = compose(&[union_raw, "Variant", &(i + 1).to_string()]);
                ctx.inline_type(inline, &location, &hint)?
            }
        };
        deps.extend(member.deps);
        match member.text.strip_suffix(" | null") {
            Some(text) => {
                nullable = true;
                members.insert(text.to_string());
            }
            None if member.text == "null" => nullable = true,
            None if member.text == "never" => {}
            None => {
                members.insert(member.text);
            }
        }
    }

    let mut text = if members.is_empty() {
        let empty = if nullable { "null" } else { "never" };
        empty.to_string()
    } else {
        members.into_iter().collect::<Vec<_>>().join(" | ")
    };
    if nullable && text != "null" {
        text.push_str(" | null");
    }
    Ok(TypeRef { text, deps })
}

/// Raw name for an inline branch.
fn branch_name(
    ctx: &mut GenerationContext<'_>,
    branch: &Schema,
    discriminator: Option<&str>,
    union_raw: &str,
    position: usize,
    location: &str,
) -> Result<String, GenerateError> {
    if let Some(literal) = discriminator_literal(ctx, branch, discriminator, location)? {
        return Ok(compose(&[&literal, "Variant"]));
    }
    if let Some(title) = branch.title.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(compose(&[title]));
    }
    Ok(compose(&[union_raw, "Variant", &position.to_string()]))
}

/// The literal a branch pins its discriminator property to. Without a
/// discriminator object, the first property carrying a literal is used.
fn discriminator_literal(
    ctx: &mut GenerationContext<'_>,
    branch: &Schema,
    discriminator: Option<&str>,
    location: &str,
) -> Result<Option<String>, GenerateError> {
    let candidates: Vec<(&String, &SchemaNode)> = match discriminator {
        Some(property) => branch.properties.get_key_value(property).into_iter().collect(),
        None => branch.properties.iter().collect(),
    };
    let properties = child_pointer(location, "properties");
    for (name, node) in candidates {
        let property = ctx
            .resolver
            .schema_of(node, &child_pointer(&properties, name))?;
        if let Some(word) = property.literal().and_then(literal_word) {
            return Ok(Some(word));
        }
    }
    Ok(None)
}

fn literal_word(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::GenerationContext;
    use crate::config::TypegenConfig;
    use crate::filter::Filter;
    use serde_json::{Value, json};

    fn run(root: &Value, name: &str) -> Vec<(String, String)> {
        let mut ctx = GenerationContext::new(root, &TypegenConfig::default(), Filter::default());
        ctx.ensure_named(&format!("#/components/schemas/{}", name), "#/test")
            .unwrap();
        ctx.into_registry()
            .freeze()
            .into_types()
            .into_iter()
            .map(|t| (t.name, t.content))
            .collect()
    }

    fn content_of<'a>(types: &'a [(String, String)], name: &str) -> &'a str {
        &types.iter().find(|(n, _)| n == name).unwrap().1
    }

    #[test]
    fn reference_branches_with_discriminator() {
        let root = json!({ "components": { "schemas": {
            "Cat": {
                "type": "object",
                "required": ["type"],
                "properties": { "type": { "type": "string", "const": "cat" } }
            },
            "Dog": {
                "type": "object",
                "required": ["type"],
                "properties": { "type": { "type": "string", "const": "dog" } }
            },
            "Animal": {
                "oneOf": [
                    { "$ref": "#/components/schemas/Cat" },
                    { "$ref": "#/components/schemas/Dog" }
                ],
                "discriminator": { "propertyName": "type" }
            }
        }}});
        let types = run(&root, "Animal");
        assert_eq!(
            content_of(&types, "Animal"),
            "/** @discriminator type */\nexport type Animal = Cat | Dog;"
        );
        assert_eq!(
            content_of(&types, "Cat"),
            "export interface Cat {\n  type: \"cat\";\n}"
        );
    }

    #[test]
    fn inline_branches_are_named_by_discriminator_literal() {
        let root = json!({ "components": { "schemas": {
            "Shape": {
                "oneOf": [
                    {
                        "type": "object",
                        "properties": {
                            "kind": { "type": "string", "enum": ["circle"] },
                            "radius": { "type": "number" }
                        }
                    },
                    {
                        "type": "object",
                        "properties": {
                            "kind": { "type": "string", "enum": ["square"] },
                            "side": { "type": "number" }
                        }
                    }
                ],
                "discriminator": { "propertyName": "kind" }
            }
        }}});
        let types = run(&root, "Shape");
        let names: Vec<&str> = types.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Shape", "CircleVariant", "SquareVariant"]);
        assert!(content_of(&types, "Shape").ends_with("export type Shape = CircleVariant | SquareVariant;"));
    }

    #[test]
    fn title_then_position_fallbacks() {
        let root = json!({ "components": { "schemas": {
            "Payload": {
                "anyOf": [
                    {
                        "title": "TextPayload",
                        "type": "object",
                        "properties": { "text": { "type": "string" } }
                    },
                    { "type": "object", "properties": { "bytes": { "type": "integer" } } }
                ]
            }
        }}});
        let types = run(&root, "Payload");
        assert_eq!(
            content_of(&types, "Payload"),
            "export type Payload = TextPayload | PayloadVariant2;"
        );
        assert_eq!(
            content_of(&types, "PayloadVariant2"),
            "export interface PayloadVariant2 {\n  bytes?: number;\n}"
        );
    }

    #[test]
    fn scalar_branches_render_in_place() {
        let root = json!({ "components": { "schemas": {
            "Scalar": {
                "oneOf": [
                    { "type": "string" },
                    { "type": "array", "items": { "type": "integer" } },
                    { "const": "auto" }
                ]
            }
        }}});
        let types = run(&root, "Scalar");
        assert_eq!(types.len(), 1);
        assert_eq!(
            content_of(&types, "Scalar"),
            "export type Scalar = string | number[] | \"auto\";"
        );
    }

    #[test]
    fn null_branch_marks_the_union_nullable() {
        let root = json!({ "components": { "schemas": {
            "Pet": {
                "type": "object",
                "nullable": true,
                "properties": { "name": { "type": "string" } }
            },
            "MaybePet": {
                "oneOf": [{ "$ref": "#/components/schemas/Pet" }, { "type": "null" }],
                "nullable": true
            }
        }}});
        let types = run(&root, "MaybePet");
        assert_eq!(content_of(&types, "MaybePet"), "export type MaybePet = Pet | null;");
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn optional_any_of_null_property_stays_in_place() {
        let root = json!({ "components": { "schemas": {
            "Owner": { "type": "object", "properties": { "id": { "type": "string" } } },
            "Item": {
                "type": "object",
                "properties": {
                    "description": { "anyOf": [{ "type": "string" }, { "type": "null" }] },
                    "owner": {
                        "anyOf": [{ "$ref": "#/components/schemas/Owner" }, { "type": "null" }]
                    }
                }
            }
        }}});
        let types = run(&root, "Item");
        let names: Vec<&str> = types.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Item", "Owner"]);
        assert_eq!(
            content_of(&types, "Item"),
            "export interface Item {\n  description?: string | null;\n  owner?: Owner | null;\n}"
        );
    }
}
