//! Type generators and the context they share.
//!
//! Generation is demand-driven. A named schema reserves its registry slot
//! before its body is generated, so a reference back to it from inside the
//! body (directly or through other schemas) resolves to the reserved name
//! instead of recursing. Each generator returns a [`GeneratedType`]; the
//! context threads through every call by `&mut`.
//!
//! Nullability is placed where TypeScript can express it:
//! - type aliases (unions, primitives, arrays) carry their own `| null`;
//! - interfaces and enums cannot, so every use of a nullable one gets `| null`;
//! - inline nodes get `| null` at the use site.

mod enums;
mod object;
mod primitive;
mod union;

pub(crate) use object::Field;

use crate::classify::{Classification, GeneratorKind, ShapeKind, classify};
use crate::config::TypegenConfig;
use crate::error::GenerateError;
use crate::filter::Filter;
use crate::naming::{Naming, compose};
use crate::registry::TypeRegistry;
use crate::resolver::{Resolver, canonicalize, child_pointer, last_segment, unescape_segment};
use crate::schema::{Schema, SchemaNode};
use indexmap::IndexSet;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

const COMPONENT_SCHEMAS: &str = "#/components/schemas/";

/// What a declaration is, as far as consumers care. Every `type X = ...`
/// alias is tagged [`DeclarationKind::Union`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Interface,
    Enum,
    Union,
}

/// One emitted declaration.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedType {
    pub name: String,
    /// Full declaration text.
    pub content: String,
    /// Names this declaration refers to, in first-use order.
    pub dependencies: IndexSet<String>,
    /// Names exported by `content`; the type's own name comes first.
    pub exports: Vec<String>,
    pub kind: DeclarationKind,
    /// Canonical pointer of the originating schema. Diagnostics only.
    pub source: String,
}

impl PartialEq for GeneratedType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.content == other.content
            && self.dependencies == other.dependencies
            && self.exports == other.exports
            && self.kind == other.kind
    }
}

impl Eq for GeneratedType {}

impl GeneratedType {
    /// A declaration with no name yet; the registry assigns one.
    pub fn new(kind: DeclarationKind, content: String, source: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            content,
            dependencies: IndexSet::new(),
            exports: Vec::new(),
            kind,
            source: source.into(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: IndexSet<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        if !self.name.is_empty() && self.name != name {
            self.exports.retain(|e| e != &self.name);
        }
        self.name = name.to_string();
        if !self.exports.iter().any(|e| e == name) {
            self.exports.insert(0, name.to_string());
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == DeclarationKind::Interface
    }

    pub fn is_enum(&self) -> bool {
        self.kind == DeclarationKind::Enum
    }

    pub fn is_union(&self) -> bool {
        self.kind == DeclarationKind::Union
    }
}

/// Type text for one use site plus the declarations it mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRef {
    pub text: String,
    pub deps: IndexSet<String>,
}

impl TypeRef {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            deps: IndexSet::new(),
        }
    }

    pub fn named(name: &str) -> Self {
        let mut deps = IndexSet::new();
        deps.insert(name.to_string());
        Self {
            text: name.to_string(),
            deps,
        }
    }

    pub fn unknown() -> Self {
        Self::plain("unknown")
    }

    /// Type of a boolean schema: `true` admits anything, `false` nothing.
    pub fn boolean_schema(allowed: bool) -> Self {
        if allowed {
            Self::unknown()
        } else {
            Self::plain("never")
        }
    }

    /// Append `| null` unless the text already admits null.
    pub fn or_null(mut self) -> Self {
        if self.text != "null" && !self.text.ends_with("| null") {
            self.text.push_str(" | null");
        }
        self
    }

    /// `T[]`, parenthesized when `T` is a union or intersection.
    pub fn array(mut self) -> Self {
        self.text = format!("{}[]", parenthesize(&self.text));
        self
    }
}

/// Wrap `text` in parentheses when it has a top-level `|` or `&`.
pub(crate) fn parenthesize(text: &str) -> String {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '(' | '[' | '<' => depth += 1,
            '}' | ')' | ']' | '>' => depth -= 1,
            '|' | '&' if depth == 0 => return format!("({})", text),
            _ => {}
        }
    }
    text.to_string()
}

/// Use of a declared type, with `| null` when the declaration cannot carry it.
pub(crate) fn named_use(name: &str, schema: &Schema) -> TypeRef {
    let classification = classify(schema);
    let ty = TypeRef::named(name);
    if classification.nullable && classification.kind.is_nominal() {
        ty.or_null()
    } else {
        ty
    }
}

/// Render a JSDoc block from prepared lines.
pub(crate) fn doc_comment(lines: &[String], indent: &str) -> String {
    let lines: Vec<String> = lines
        .iter()
        .flat_map(|line| line.lines().map(|l| l.trim_end().replace("*/", "*\\/")))
        .collect();
    match lines.as_slice() {
        [] => String::new(),
        [only] => format!("{}/** {} */\n", indent, only),
        many => {
            let mut out = format!("{}/**\n", indent);
            for line in many {
                if line.is_empty() {
                    out.push_str(&format!("{} *\n", indent));
                } else {
                    out.push_str(&format!("{} * {}\n", indent, line));
                }
            }
            out.push_str(&format!("{} */\n", indent));
            out
        }
    }
}

/// Identity of the declaration a generator is producing.
pub(crate) struct Declaration<'a> {
    /// Canonical pointer of the schema.
    pub pointer: &'a str,
    /// Final registered name.
    pub name: &'a str,
    /// Raw base name, used to derive names of nested declarations.
    pub raw: &'a str,
    pub classification: &'a Classification,
}

/// Mutable state for one generation run.
pub struct GenerationContext<'doc> {
    pub(crate) resolver: Resolver<'doc>,
    pub(crate) registry: TypeRegistry,
    pub(crate) naming: Naming,
    pub(crate) filter: Filter,
    config: TypegenConfig,
    /// Canonical pointer → assigned name, for every schema that has one.
    names: HashMap<String, String>,
    /// Pointers whose body is being generated right now.
    visiting: HashSet<String>,
}

impl<'doc> GenerationContext<'doc> {
    pub fn new(root: &'doc Value, config: &TypegenConfig, filter: Filter) -> Self {
        Self {
            resolver: Resolver::new(root),
            registry: TypeRegistry::new(),
            naming: Naming::new(config.naming.clone()),
            filter,
            config: config.clone(),
            names: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    pub fn name_for_pointer(&self, pointer: &str) -> Option<&str> {
        self.names.get(pointer).map(String::as_str)
    }

    pub fn is_visiting(&self, pointer: &str) -> bool {
        self.visiting.contains(pointer)
    }

    pub fn into_registry(self) -> TypeRegistry {
        self.registry
    }

    pub(crate) fn mapping_for(&self, schema_type: &str, format: Option<&str>) -> Option<&str> {
        self.config.mapping_for(schema_type, format)
    }

    /// Whether a canonical pointer lands in a component schema the filter
    /// excludes.
    pub(crate) fn is_excluded(&self, canonical: &str) -> bool {
        canonical
            .strip_prefix(COMPONENT_SCHEMAS)
            .and_then(|rest| rest.split('/').next())
            .is_some_and(|segment| !self.filter.admits_schema(&unescape_segment(segment)))
    }

    /// JSDoc for a schema's description and metadata, indented for its
    /// position. Empty when docs are disabled or there is nothing to say.
    pub(crate) fn jsdoc(&self, schema: &Schema, extra: &[String], indent: &str) -> String {
        if !self.config.output.emit_docs {
            return String::new();
        }
        let mut lines = Vec::new();
        if let Some(description) = schema.description.as_deref().map(str::trim)
            && !description.is_empty()
        {
            lines.push(description.to_string());
        }
        if let Some(format) = &schema.format {
            lines.push(format!("@format {}", format));
        }
        if let Some(default) = &schema.default {
            lines.push(format!("@default {}", default));
        }
        if let Some(example) = &schema.example {
            lines.push(format!("@example {}", example));
        }
        if schema.deprecated {
            lines.push("@deprecated".to_string());
        }
        lines.extend(extra.iter().cloned());
        doc_comment(&lines, indent)
    }

    /// JSDoc from free-form lines, honoring the docs switch.
    pub(crate) fn doc_lines(&self, lines: &[String], indent: &str) -> String {
        if self.config.output.emit_docs {
            doc_comment(lines, indent)
        } else {
            String::new()
        }
    }

    /// Type text for a node at `location`. Inline declarations found along
    /// the way are registered under names derived from `hint`.
    pub fn type_of(
        &mut self,
        node: &SchemaNode,
        location: &str,
        hint: &str,
    ) -> Result<TypeRef, GenerateError> {
        match node {
            SchemaNode::Reference(r) => self.reference_type(&r.pointer, location),
            SchemaNode::Schema(schema) => self.inline_type(schema, location, hint),
            SchemaNode::Boolean(allowed) => Ok(TypeRef::boolean_schema(*allowed)),
        }
    }

    /// Type text for a `$ref`, generating the target on first use.
    pub fn reference_type(
        &mut self,
        pointer: &str,
        referenced_from: &str,
    ) -> Result<TypeRef, GenerateError> {
        let canonical = canonicalize(pointer, referenced_from)?;
        if self.is_excluded(&canonical) {
            tracing::warn!(
                pointer = %canonical,
                referenced_from,
                "reference to excluded schema rendered as unknown"
            );
            return Ok(TypeRef::unknown());
        }
        let name = self.ensure_named(&canonical, referenced_from)?;
        let ty = TypeRef::named(&name);
        if self.nullable_at_use(&canonical)? {
            Ok(ty.or_null())
        } else {
            Ok(ty)
        }
    }

    /// Whether uses of the declaration at `canonical` need `| null`.
    fn nullable_at_use(&mut self, canonical: &str) -> Result<bool, GenerateError> {
        let value = self.resolver.lookup_value(canonical, canonical)?;
        if value.get("$ref").is_some() {
            // Aliases of references carry the target's nullability.
            return Ok(false);
        }
        let schema = self.resolver.resolve(canonical, canonical)?;
        let classification = classify(&schema);
        Ok(classification.nullable && classification.kind.is_nominal())
    }

    /// Type text for an inline node.
    pub fn inline_type(
        &mut self,
        schema: &Schema,
        location: &str,
        hint: &str,
    ) -> Result<TypeRef, GenerateError> {
        let classification = classify(schema);
        if classification.kind == ShapeKind::Intersection
            && let Some(pointer) = sole_reference(schema)
        {
            let from = child_pointer(&child_pointer(location, "allOf"), "0");
            let ty = self.reference_type(pointer, &from)?;
            return Ok(if classification.nullable {
                ty.or_null()
            } else {
                ty
            });
        }
        let ty = match &classification.kind {
            ShapeKind::Enum if literal_count(schema) == 1 => {
                primitive::inline(self, schema, &classification, location, hint)?
            }
            ShapeKind::Union if union::renders_inline(schema) => {
                union::inline(self, schema, &classification, location, hint)?
            }
            ShapeKind::Union | ShapeKind::Intersection | ShapeKind::Enum => {
                let name = self.generate_named(schema, location, hint)?;
                return Ok(named_use(&name, schema));
            }
            ShapeKind::Object => object::inline(self, schema, location, hint)?,
            _ => primitive::inline(self, schema, &classification, location, hint)?,
        };
        Ok(if classification.nullable {
            ty.or_null()
        } else {
            ty
        })
    }

    /// Name of the declaration for the schema at `pointer`, generating it on
    /// first request.
    pub fn ensure_named(
        &mut self,
        pointer: &str,
        referenced_from: &str,
    ) -> Result<String, GenerateError> {
        let canonical = canonicalize(pointer, referenced_from)?;
        if let Some(name) = self.names.get(&canonical) {
            if self.visiting.contains(&canonical) {
                tracing::debug!(pointer = %canonical, name = %name, "cyclic reference");
            }
            return Ok(name.clone());
        }

        let raw = compose(&[&last_segment(&canonical)]);
        let value = self.resolver.lookup_value(&canonical, referenced_from)?;
        if let Some(target) = value.get("$ref").and_then(Value::as_str) {
            return self.generate_alias(&canonical, target, &raw);
        }
        if let Some(allowed) = value.as_bool() {
            let name = self.begin(&canonical, &raw)?;
            let content = format!(
                "export type {} = {};",
                name,
                TypeRef::boolean_schema(allowed).text
            );
            let generated = GeneratedType::new(DeclarationKind::Union, content, canonical.as_str());
            self.finish(&canonical, &name, generated);
            return Ok(name);
        }
        let schema = self.resolver.resolve(&canonical, referenced_from)?;
        self.generate_named(&schema, &canonical, &raw)
    }

    /// `type X = Y` for a schema that is itself a `$ref`.
    fn generate_alias(
        &mut self,
        canonical: &str,
        target: &str,
        raw: &str,
    ) -> Result<String, GenerateError> {
        let name = self.begin(canonical, raw)?;
        let resolved = self.resolver.resolve(canonical, canonical)?;
        let ty = if *resolved == Schema::default() {
            TypeRef::unknown()
        } else {
            self.reference_type(target, canonical)?
        };
        let content = format!("export type {} = {};", name, ty.text);
        let generated =
            GeneratedType::new(DeclarationKind::Union, content, canonical).with_dependencies(ty.deps);
        self.finish(canonical, &name, generated);
        Ok(name)
    }

    /// Register a declaration for `schema` under a name derived from `raw`.
    /// A pointer that already has a name is not generated again.
    pub fn generate_named(
        &mut self,
        schema: &Schema,
        pointer: &str,
        raw: &str,
    ) -> Result<String, GenerateError> {
        if let Some(name) = self.names.get(pointer) {
            return Ok(name.clone());
        }
        let name = self.begin(pointer, raw)?;
        let classification = classify(schema);
        let declaration = Declaration {
            pointer,
            name: &name,
            raw,
            classification: &classification,
        };
        let generated = match classification.kind.generator() {
            GeneratorKind::Object => object::generate(self, schema, &declaration)?,
            GeneratorKind::Union => union::generate(self, schema, &declaration)?,
            GeneratorKind::Enum => enums::generate(self, schema, &declaration)?,
            GeneratorKind::PrimitiveArray => primitive::generate(self, schema, &declaration)?,
        };
        self.finish(pointer, &name, generated);
        Ok(name)
    }

    /// Register a synthesized declaration that has no schema of its own
    /// (operation parameters, result unions). `build` receives the final name.
    pub(crate) fn declare(
        &mut self,
        raw: &str,
        build: impl FnOnce(&str) -> GeneratedType,
    ) -> Result<String, GenerateError> {
        let base = self.naming.type_name(raw);
        let name = self.registry.reserve(&base)?;
        let mut generated = build(&name);
        generated.dependencies.shift_remove(&name);
        self.registry.fulfill(&name, generated);
        Ok(name)
    }

    fn begin(&mut self, pointer: &str, raw: &str) -> Result<String, GenerateError> {
        let base = self.naming.type_name(raw);
        let name = self.registry.reserve(&base)?;
        self.names.insert(pointer.to_string(), name.clone());
        self.visiting.insert(pointer.to_string());
        Ok(name)
    }

    fn finish(&mut self, pointer: &str, name: &str, mut generated: GeneratedType) {
        self.visiting.remove(pointer);
        generated.dependencies.shift_remove(name);
        self.registry.fulfill(name, generated);
    }
}

/// The pointer of an `allOf` that wraps a single `$ref` and adds nothing
/// else, the 3.0 way of marking a reference nullable.
fn sole_reference(schema: &Schema) -> Option<&str> {
    match schema.all_of.as_slice() {
        [SchemaNode::Reference(r)]
            if schema.properties.is_empty() && schema.additional_properties.is_none() =>
        {
            Some(r.pointer.as_str())
        }
        _ => None,
    }
}

/// Number of distinct non-null enum values.
fn literal_count(schema: &Schema) -> usize {
    let mut seen: Vec<&Value> = Vec::new();
    for value in schema.enum_values.iter().filter(|v| !v.is_null()) {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen.len()
}
