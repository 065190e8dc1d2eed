//! Object generator: interfaces, `allOf` composition and record aliases.

use super::{DeclarationKind, Declaration, GeneratedType, GenerationContext, TypeRef, parenthesize};
use crate::classify::{ShapeKind, classify};
use crate::error::GenerateError;
use crate::naming::compose;
use crate::resolver::{canonicalize, child_pointer};
use crate::schema::{AdditionalProperties, Schema, SchemaNode};
use indexmap::{IndexMap, IndexSet};

/// One property of an object body.
#[derive(Debug, Clone)]
pub(crate) struct Field {
    /// Key as written, already converted and quoted if needed.
    pub key: String,
    pub optional: bool,
    pub ty: TypeRef,
    /// JSDoc block, indented for a declaration body.
    pub docs: String,
}

impl Field {
    /// Build a field for property `raw_name` of the object named `owner`.
    pub(crate) fn build(
        ctx: &mut GenerationContext<'_>,
        owner: &str,
        raw_name: &str,
        node: &SchemaNode,
        required: bool,
        location: &str,
    ) -> Result<Self, GenerateError> {
        let ty = ctx.type_of(node, location, &compose(&[owner, raw_name]))?;
        let docs = match node {
            SchemaNode::Schema(schema) => ctx.jsdoc(schema, &[], "  "),
            SchemaNode::Reference(_) | SchemaNode::Boolean(_) => String::new(),
        };
        Ok(Self {
            key: ctx.naming.field_name(raw_name),
            optional: !required,
            ty,
            docs,
        })
    }

    fn marker(&self) -> &'static str {
        if self.optional { "?" } else { "" }
    }

    /// `  /** docs */\n  key?: Type;\n`
    pub(crate) fn render(&self) -> String {
        format!("{}  {}{}: {};\n", self.docs, self.key, self.marker(), self.ty.text)
    }

    fn render_inline(&self) -> String {
        format!("{}{}: {}", self.key, self.marker(), self.ty.text)
    }
}

/// Fields collected from a schema and the inline `allOf` parts merged into it.
#[derive(Debug, Default)]
struct Body {
    fields: IndexMap<String, Field>,
    /// Value type of the index signature, when `additionalProperties` allows one.
    index: Option<TypeRef>,
}

impl Body {
    fn collect(
        &mut self,
        ctx: &mut GenerationContext<'_>,
        schema: &Schema,
        pointer: &str,
        owner: &str,
    ) -> Result<(), GenerateError> {
        let properties = child_pointer(pointer, "properties");
        for (raw_name, node) in &schema.properties {
            let location = child_pointer(&properties, raw_name);
            let field = Field::build(ctx, owner, raw_name, node, schema.is_required(raw_name), &location)?;
            self.fields.insert(raw_name.clone(), field);
        }
        if let Some(value) = record_value(ctx, schema, pointer, owner)? {
            self.index = Some(value);
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.index.is_none()
    }

    fn deps(&self) -> IndexSet<String> {
        let mut deps = IndexSet::new();
        for field in self.fields.values() {
            deps.extend(field.ty.deps.iter().cloned());
        }
        if let Some(index) = &self.index {
            deps.extend(index.deps.iter().cloned());
        }
        deps
    }

    /// Index signature value. With declared fields the value widens to
    /// `unknown` so every field stays assignable to it.
    fn index_text(&self) -> Option<&str> {
        self.index.as_ref().map(|value| {
            if self.fields.is_empty() {
                value.text.as_str()
            } else {
                "unknown"
            }
        })
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for field in self.fields.values() {
            out.push_str(&field.render());
        }
        if let Some(index) = self.index_text() {
            out.push_str(&format!("  [key: string]: {};\n", index));
        }
        out
    }

    fn render_inline(&self) -> String {
        let mut parts: Vec<String> = self.fields.values().map(Field::render_inline).collect();
        if let Some(index) = self.index_text() {
            parts.push(format!("[key: string]: {}", index));
        }
        format!("{{ {} }}", parts.join("; "))
    }
}

/// Value type allowed by `additionalProperties`, if any.
fn record_value(
    ctx: &mut GenerationContext<'_>,
    schema: &Schema,
    pointer: &str,
    owner: &str,
) -> Result<Option<TypeRef>, GenerateError> {
    match &schema.additional_properties {
        None | Some(AdditionalProperties::Allowed(false)) => Ok(None),
        Some(AdditionalProperties::Allowed(true)) => Ok(Some(TypeRef::unknown())),
        Some(AdditionalProperties::Schema(node)) => ctx
            .type_of(
                node,
                &child_pointer(pointer, "additionalProperties"),
                &compose(&[owner, "Value"]),
            )
            .map(Some),
    }
}

/// `Record<string, T>` for an object with nothing but (optional) additional
/// properties.
fn record(
    ctx: &mut GenerationContext<'_>,
    schema: &Schema,
    pointer: &str,
    owner: &str,
) -> Result<TypeRef, GenerateError> {
    let value = match &schema.additional_properties {
        Some(AdditionalProperties::Allowed(false)) => TypeRef::plain("never"),
        _ => record_value(ctx, schema, pointer, owner)?.unwrap_or_else(TypeRef::unknown),
    };
    Ok(TypeRef {
        text: format!("Record<string, {}>", value.text),
        deps: value.deps,
    })
}

/// Whether the schema at `canonical` renders as an object type that an
/// `extends` clause accepts. An `allOf` schema qualifies only when it is
/// itself emitted as an interface, so its bases are checked in turn.
fn extendable(
    ctx: &mut GenerationContext<'_>,
    canonical: &str,
    seen: &mut Vec<String>,
) -> Result<bool, GenerateError> {
    if ctx.is_excluded(canonical) {
        return Ok(false);
    }
    if seen.iter().any(|p| p == canonical) {
        return Ok(true);
    }
    seen.push(canonical.to_string());

    let schema = ctx.resolver.resolve(canonical, canonical)?;
    let classification = classify(&schema);
    if classification.nullable {
        return Ok(false);
    }
    match classification.kind {
        ShapeKind::Object => Ok(true),
        ShapeKind::Intersection => {
            let all_of = child_pointer(canonical, "allOf");
            for (i, entry) in schema.all_of.iter().enumerate() {
                let ok = match entry {
                    SchemaNode::Reference(r) => {
                        let location = child_pointer(&all_of, &i.to_string());
                        let base = canonicalize(&r.pointer, &location)?;
                        extendable(ctx, &base, seen)?
                    }
                    SchemaNode::Schema(part) => mergeable(part),
                    SchemaNode::Boolean(allowed) => *allowed,
                };
                if !ok {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Whether an inline `allOf` entry merges its properties into the body.
fn mergeable(schema: &Schema) -> bool {
    classify(schema).kind == ShapeKind::Object
}

/// Inline object literal for a property position.
pub(super) fn inline(
    ctx: &mut GenerationContext<'_>,
    schema: &Schema,
    location: &str,
    hint: &str,
) -> Result<TypeRef, GenerateError> {
    if schema.properties.is_empty() {
        return record(ctx, schema, location, hint);
    }
    let mut body = Body::default();
    body.collect(ctx, schema, location, hint)?;
    Ok(TypeRef {
        text: body.render_inline(),
        deps: body.deps(),
    })
}

pub(super) fn generate(
    ctx: &mut GenerationContext<'_>,
    schema: &Schema,
    decl: &Declaration<'_>,
) -> Result<GeneratedType, GenerateError> {
    let docs = ctx.jsdoc(schema, &[], "");

    if schema.properties.is_empty() && schema.all_of.is_empty() {
        let value = record(ctx, schema, decl.pointer, decl.raw)?;
        let content = format!("{}export type {} = {};", docs, decl.name, value.text);
        return Ok(GeneratedType::new(DeclarationKind::Union, content, decl.pointer)
            .with_dependencies(value.deps));
    }

    let mut deps = IndexSet::new();
    let mut extends: Vec<String> = Vec::new();
    let mut intersected: Vec<String> = Vec::new();
    let mut body = Body::default();

    let all_of = child_pointer(decl.pointer, "allOf");
    for (i, entry) in schema.all_of.iter().enumerate() {
        let location = child_pointer(&all_of, &i.to_string());
        match entry {
            SchemaNode::Reference(r) => {
                let canonical = canonicalize(&r.pointer, &location)?;
                let object_shaped = extendable(ctx, &canonical, &mut Vec::new())?;
                let base = ctx.reference_type(&r.pointer, &location)?;
                deps.extend(base.deps);
                if object_shaped {
                    extends.push(base.text);
                } else {
                    intersected.push(parenthesize(&base.text));
                }
            }
            SchemaNode::Schema(part) if mergeable(part) => {
                body.collect(ctx, part, &location, decl.raw)?;
            }
            SchemaNode::Boolean(true) => {}
            SchemaNode::Boolean(false) => intersected.push("never".to_string()),
            SchemaNode::Schema(part) => {
                let hint = compose(&[decl.raw, "Part", &(i + 1).to_string()]);
                let ty = ctx.inline_type(part, &location, &hint)?;
                deps.extend(ty.deps);
                intersected.push(parenthesize(&ty.text));
            }
        }
    }
    body.collect(ctx, schema, decl.pointer, decl.raw)?;
    deps.extend(body.deps());

    if intersected.is_empty() {
        let mut content = docs;
        content.push_str(&format!("export interface {}", decl.name));
        if !extends.is_empty() {
            content.push_str(&format!(" extends {}", extends.join(", ")));
        }
        if body.is_empty() {
            content.push_str(" {}");
        } else {
            content.push_str(&format!(" {{\n{}}}", body.render()));
        }
        return Ok(
            GeneratedType::new(DeclarationKind::Interface, content, decl.pointer)
                .with_dependencies(deps),
        );
    }

    tracing::debug!(
        name = decl.name,
        "allOf base is not object-shaped, emitting an intersection alias"
    );
    let mut parts = extends;
    parts.extend(intersected);
    if !body.is_empty() {
        parts.push(format!("{{\n{}}}", body.render()));
    }
    let content = format!("{}export type {} = {};", docs, decl.name, parts.join(" & "));
    Ok(GeneratedType::new(DeclarationKind::Union, content, decl.pointer).with_dependencies(deps))
}
