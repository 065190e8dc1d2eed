//! Generation orchestrator.
//!
//! One run: component schemas in document order, then every operation in
//! path order and method order. The registry is frozen afterwards and its
//! declarations ordered so dependencies precede dependents.

use crate::config::TypegenConfig;
use crate::document::{
    MediaType, Method, OpenApiDocument, Operation, Parameter, ParameterLocation, PathItem,
    Referenceable, RequestBody, Response,
};
use crate::error::GenerateError;
use crate::filter::Filter;
use crate::generate::{
    DeclarationKind, Field, GeneratedType, GenerationContext, TypeRef, named_use,
};
use crate::naming::compose;
use crate::resolver::{canonicalize, child_pointer};
use crate::schema::SchemaNode;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::HashMap;

const JSON_MEDIA_TYPE: &str = "application/json";
const OPERATIONS_INTERFACE: &str = "Operations";
const FORM_MEDIA_TYPES: &[&str] = &["application/x-www-form-urlencoded", "multipart/form-data"];

/// Type bindings for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationTypes {
    /// Base name the operation's types are derived from.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    pub method: Method,
    pub path: String,
    /// Request body type text.
    pub request: Option<String>,
    /// Name of the synthesized parameters interface.
    pub params: Option<String>,
    /// Response type text; the `{Op}Result` union when there are several.
    pub response: Option<String>,
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOutput {
    /// Declarations in emission order.
    pub types: Vec<GeneratedType>,
    pub type_count: usize,
    pub operation_count: usize,
    pub operations: Vec<OperationTypes>,
    /// Name reserved for the rendered `Operations` map, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations_interface: Option<String>,
}

pub struct Orchestrator<'a> {
    document: &'a OpenApiDocument,
    config: &'a TypegenConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(document: &'a OpenApiDocument, config: &'a TypegenConfig) -> Self {
        Self { document, config }
    }

    pub fn run(&self) -> Result<GenerationOutput, GenerateError> {
        let filter = Filter::new(&self.config.filter)?;
        let mut ctx = GenerationContext::new(self.document.raw(), self.config, filter);

        for name in self.document.components.schemas.keys() {
            if !ctx.filter.admits_schema(name) {
                tracing::debug!(schema = %name, "schema excluded by filter");
                continue;
            }
            let pointer = child_pointer("#/components/schemas", name);
            ctx.ensure_named(&pointer, "#/components/schemas")?;
        }

        let mut operations = Vec::new();
        for (path, item) in &self.document.paths {
            if !ctx.filter.admits_path(path) {
                tracing::debug!(path = %path, "path excluded by filter");
                continue;
            }
            for (method, operation) in item.operations() {
                operations.push(self.operation(&mut ctx, path, item, method, operation)?);
            }
        }

        // Claimed last so a schema of the same name keeps its own name.
        let operations_interface = if self.config.output.operations && !operations.is_empty() {
            let base = ctx.naming.type_name(OPERATIONS_INTERFACE);
            Some(ctx.registry.claim_export(&base)?)
        } else {
            None
        };

        let types = topological_order(ctx.into_registry().freeze().into_types());
        tracing::debug!(
            types = types.len(),
            operations = operations.len(),
            "generation finished"
        );
        Ok(GenerationOutput {
            type_count: types.len(),
            operation_count: operations.len(),
            types,
            operations,
            operations_interface,
        })
    }

    fn operation(
        &self,
        ctx: &mut GenerationContext<'_>,
        path: &str,
        item: &PathItem,
        method: Method,
        operation: &Operation,
    ) -> Result<OperationTypes, GenerateError> {
        let name = ctx
            .naming
            .operation_name(operation.operation_id.as_deref(), method.as_str(), path);
        let pointer = child_pointer(&child_pointer("#/paths", path), method.as_str());
        tracing::debug!(%method, path, name = %name, "generating operation types");

        let request = self.request_body(ctx, operation, &pointer, &name)?;
        let params = self.parameters(ctx, item, operation, path, &pointer, &name)?;
        let response = self.responses(ctx, operation, &pointer, &name)?;

        Ok(OperationTypes {
            name,
            operation_id: operation.operation_id.clone(),
            method,
            path: path.to_string(),
            request,
            params,
            response,
        })
    }

    fn request_body(
        &self,
        ctx: &mut GenerationContext<'_>,
        operation: &Operation,
        pointer: &str,
        op_name: &str,
    ) -> Result<Option<String>, GenerateError> {
        let Some(body) = &operation.request_body else {
            return Ok(None);
        };
        let local = child_pointer(pointer, "requestBody");
        let (body, body_pointer): (RequestBody, String) = match body {
            Referenceable::Reference(r) => (
                ctx.resolver.resolve_object(&r.pointer, &local)?,
                canonicalize(&r.pointer, &local)?,
            ),
            Referenceable::Item(body) => (body.clone(), local),
        };
        let Some((media_type, media)) = preferred_media(&body.content) else {
            return Ok(None);
        };
        let Some(schema) = &media.schema else {
            return Ok(None);
        };
        let suffix = if FORM_MEDIA_TYPES.contains(&media_type) {
            "FormData"
        } else {
            "Request"
        };
        let location = media_schema_pointer(&body_pointer, media_type);
        let ty = body_type(ctx, schema, &location, &compose(&[op_name, suffix]))?;
        Ok(Some(ty.text))
    }

    fn parameters(
        &self,
        ctx: &mut GenerationContext<'_>,
        item: &PathItem,
        operation: &Operation,
        path: &str,
        pointer: &str,
        op_name: &str,
    ) -> Result<Option<String>, GenerateError> {
        let path_pointer = child_pointer("#/paths", path);
        let mut merged: IndexMap<(ParameterLocation, String), (Parameter, String)> =
            IndexMap::new();
        let sources = [
            (&item.parameters, child_pointer(&path_pointer, "parameters")),
            (&operation.parameters, child_pointer(pointer, "parameters")),
        ];
        for (parameters, base) in sources {
            for (i, parameter) in parameters.iter().enumerate() {
                let local = child_pointer(&base, &i.to_string());
                let (parameter, location): (Parameter, String) = match parameter {
                    Referenceable::Reference(r) => (
                        ctx.resolver.resolve_object(&r.pointer, &local)?,
                        canonicalize(&r.pointer, &local)?,
                    ),
                    Referenceable::Item(p) => (p.clone(), local),
                };
                if parameter.location == ParameterLocation::Cookie {
                    continue;
                }
                merged.insert(
                    (parameter.location, parameter.name.clone()),
                    (parameter, location),
                );
            }
        }
        if merged.is_empty() {
            return Ok(None);
        }

        let raw = compose(&[op_name, "Params"]);
        let mut fields = Vec::with_capacity(merged.len());
        for (parameter, location) in merged.values() {
            let required = parameter.required || parameter.location == ParameterLocation::Path;
            let mut field = match &parameter.schema {
                Some(schema) => Field::build(
                    ctx,
                    &raw,
                    &parameter.name,
                    schema,
                    required,
                    &child_pointer(location, "schema"),
                )?,
                None => Field {
                    key: ctx.naming.field_name(&parameter.name),
                    optional: !required,
                    ty: TypeRef::unknown(),
                    docs: String::new(),
                },
            };
            let mut lines = Vec::new();
            if let Some(description) = parameter.description.as_deref().map(str::trim)
                && !description.is_empty()
            {
                lines.push(description.to_string());
            }
            if parameter.deprecated {
                lines.push("@deprecated".to_string());
            }
            if !lines.is_empty() {
                field.docs = ctx.doc_lines(&lines, "  ");
            }
            fields.push(field);
        }

        let mut deps = IndexSet::new();
        let mut body = String::new();
        for field in &fields {
            deps.extend(field.ty.deps.iter().cloned());
            body.push_str(&field.render());
        }
        let source = child_pointer(pointer, "parameters");
        let name = ctx.declare(&raw, |name| {
            let content = format!("export interface {} {{\n{}}}", name, body);
            GeneratedType::new(DeclarationKind::Interface, content, source).with_dependencies(deps)
        })?;
        Ok(Some(name))
    }

    fn responses(
        &self,
        ctx: &mut GenerationContext<'_>,
        operation: &Operation,
        pointer: &str,
        op_name: &str,
    ) -> Result<Option<String>, GenerateError> {
        let responses_pointer = child_pointer(pointer, "responses");
        let mut bodies: Vec<(String, SchemaNode, String)> = Vec::new();
        for (status, response) in &operation.responses {
            let local = child_pointer(&responses_pointer, status);
            let (response, response_pointer): (Response, String) = match response {
                Referenceable::Reference(r) => (
                    ctx.resolver.resolve_object(&r.pointer, &local)?,
                    canonicalize(&r.pointer, &local)?,
                ),
                Referenceable::Item(response) => (response.clone(), local),
            };
            let Some((media_type, media)) = preferred_media(&response.content) else {
                continue;
            };
            if let Some(schema) = &media.schema {
                let location = media_schema_pointer(&response_pointer, media_type);
                bodies.push((status.clone(), schema.clone(), location));
            }
        }

        let inline_count = bodies
            .iter()
            .filter(|(_, schema, _)| schema.as_schema().is_some())
            .count();
        let mut distinct: IndexSet<String> = IndexSet::new();
        let mut deps = IndexSet::new();
        for (status, schema, location) in &bodies {
            let raw = if inline_count > 1 {
                compose(&[op_name, "Response", status])
            } else {
                compose(&[op_name, "Response"])
            };
            let ty = body_type(ctx, schema, location, &raw)?;
            deps.extend(ty.deps);
            distinct.insert(ty.text);
        }

        match distinct.len() {
            0 => Ok(None),
            1 => Ok(distinct.into_iter().next()),
            _ => {
                let members: Vec<String> = distinct.into_iter().collect();
                let docs = ctx.doc_lines(
                    &[format!(
                        "Any response of `{}`.",
                        operation.operation_id.as_deref().unwrap_or(op_name)
                    )],
                    "",
                );
                let source = responses_pointer.clone();
                let name = ctx.declare(&compose(&[op_name, "Result"]), |name| {
                    let content =
                        format!("{}export type {} = {};", docs, name, members.join(" | "));
                    GeneratedType::new(DeclarationKind::Union, content, source)
                        .with_dependencies(deps)
                })?;
                Ok(Some(name))
            }
        }
    }
}

/// `application/json` when present, else the first declared media type.
fn preferred_media(content: &IndexMap<String, MediaType>) -> Option<(&str, &MediaType)> {
    content
        .get_key_value(JSON_MEDIA_TYPE)
        .or_else(|| content.first())
        .map(|(k, v)| (k.as_str(), v))
}

fn media_schema_pointer(owner: &str, media_type: &str) -> String {
    child_pointer(
        &child_pointer(&child_pointer(owner, "content"), media_type),
        "schema",
    )
}

/// Request or response body: references use the target's name, inline
/// schemas are registered under `raw`.
fn body_type(
    ctx: &mut GenerationContext<'_>,
    schema: &SchemaNode,
    location: &str,
    raw: &str,
) -> Result<TypeRef, GenerateError> {
    match schema {
        SchemaNode::Reference(r) => ctx.reference_type(&r.pointer, location),
        SchemaNode::Schema(inline) => {
            let name = ctx.generate_named(inline, location, raw)?;
            Ok(named_use(&name, inline))
        }
        SchemaNode::Boolean(allowed) => Ok(TypeRef::boolean_schema(*allowed)),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Depth-first topological order over the registry order. Dependencies come
/// first; a dependency that is already in progress is skipped, so cycles
/// keep their registry order.
pub fn topological_order(types: Vec<GeneratedType>) -> Vec<GeneratedType> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, ty) in types.iter().enumerate() {
        for export in &ty.exports {
            index.entry(export.as_str()).or_insert(i);
        }
        index.entry(ty.name.as_str()).or_insert(i);
    }

    let mut marks: Vec<Option<Mark>> = vec![None; types.len()];
    let mut order: Vec<usize> = Vec::with_capacity(types.len());
    for start in 0..types.len() {
        visit(start, &types, &index, &mut marks, &mut order);
    }

    let mut slots: Vec<Option<GeneratedType>> = types.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

fn visit(
    i: usize,
    types: &[GeneratedType],
    index: &HashMap<&str, usize>,
    marks: &mut [Option<Mark>],
    order: &mut Vec<usize>,
) {
    if marks[i].is_some() {
        return;
    }
    marks[i] = Some(Mark::InProgress);
    for dependency in &types[i].dependencies {
        if let Some(&j) = index.get(dependency.as_str()) {
            visit(j, types, index, marks, order);
        }
    }
    marks[i] = Some(Mark::Done);
    order.push(i);
}
