//! `$ref` resolution against the raw document tree.
//!
//! Pointers are local JSON pointers (`#/components/schemas/User`). Resolved
//! schemas are memoized by canonical pointer for the lifetime of a run.

use crate::error::GenerateError;
use crate::schema::{Schema, SchemaNode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;

/// Escape one JSON pointer segment (`~` → `~0`, `/` → `~1`).
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Unescape one JSON pointer segment.
pub fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Append a segment to a canonical pointer.
pub fn child_pointer(pointer: &str, segment: &str) -> String {
    format!("{}/{}", pointer, escape_segment(segment))
}

/// The unescaped last segment of a pointer (`#/components/schemas/User` → `User`).
pub fn last_segment(pointer: &str) -> String {
    unescape_segment(pointer.rsplit('/').next().unwrap_or(pointer))
}

/// Normalize a `$ref` string into the canonical `#/...` form.
///
/// Only document-local pointers are supported.
pub fn canonicalize(pointer: &str, referenced_from: &str) -> Result<String, GenerateError> {
    let Some(fragment) = pointer.strip_prefix('#') else {
        let reason = if pointer.contains('#') {
            format!("external reference `{}` is not supported", pointer)
        } else {
            format!("`{}` is not a JSON pointer", pointer)
        };
        return Err(GenerateError::unsupported(referenced_from, reason));
    };
    if !fragment.is_empty() && !fragment.starts_with('/') {
        return Err(GenerateError::unsupported(
            referenced_from,
            format!("`{}` is not a JSON pointer", pointer),
        ));
    }
    Ok(format!("#{}", fragment))
}

/// A schema reached either by borrowing an inline node or through a `$ref`.
#[derive(Debug, Clone)]
pub enum SchemaRef<'a> {
    Inline(&'a Schema),
    Resolved(Rc<Schema>),
}

impl Deref for SchemaRef<'_> {
    type Target = Schema;

    fn deref(&self) -> &Schema {
        match self {
            SchemaRef::Inline(schema) => schema,
            SchemaRef::Resolved(schema) => schema,
        }
    }
}

/// Resolves pointers into the document it was created for.
pub struct Resolver<'doc> {
    root: &'doc Value,
    memo: HashMap<String, Rc<Schema>>,
}

impl<'doc> Resolver<'doc> {
    pub fn new(root: &'doc Value) -> Self {
        Self {
            root,
            memo: HashMap::new(),
        }
    }

    /// The raw value at `pointer`.
    pub fn lookup_value(
        &self,
        pointer: &str,
        referenced_from: &str,
    ) -> Result<&'doc Value, GenerateError> {
        let canonical = canonicalize(pointer, referenced_from)?;
        self.root
            .pointer(&canonical[1..])
            .ok_or_else(|| GenerateError::unresolved(canonical, referenced_from))
    }

    /// Resolve a schema pointer, following chains of references.
    ///
    /// A chain that loops back onto itself (`A → B → A`) has no concrete
    /// schema; every pointer in it resolves to an empty schema, which
    /// classifies as unknown.
    pub fn resolve(
        &mut self,
        pointer: &str,
        referenced_from: &str,
    ) -> Result<Rc<Schema>, GenerateError> {
        let mut current = canonicalize(pointer, referenced_from)?;
        let mut from = referenced_from.to_string();
        let mut chain: Vec<String> = Vec::new();

        let resolved = loop {
            if let Some(hit) = self.memo.get(&current) {
                break Rc::clone(hit);
            }
            if chain.contains(&current) {
                tracing::warn!(pointer = %current, "reference cycle without a concrete schema");
                break Rc::new(Schema::default());
            }
            chain.push(current.clone());

            let value = self.lookup_value(&current, &from)?;
            let node = SchemaNode::deserialize(value)
                .map_err(|e| GenerateError::unsupported(current.as_str(), e.to_string()))?;
            match node {
                SchemaNode::Reference(next) => {
                    let next = canonicalize(&next.pointer, &current)?;
                    from = std::mem::replace(&mut current, next);
                }
                SchemaNode::Schema(schema) => {
                    tracing::debug!(pointer = %current, "resolved schema");
                    break Rc::new(*schema);
                }
                // No structure to classify; `false` is rendered by the
                // generators that see the raw node.
                SchemaNode::Boolean(_) => break Rc::new(Schema::default()),
            }
        };

        for pointer in chain {
            self.memo.insert(pointer, Rc::clone(&resolved));
        }
        Ok(resolved)
    }

    /// Borrow an inline node, or resolve it when it is a reference.
    pub fn schema_of<'a>(
        &mut self,
        node: &'a SchemaNode,
        location: &str,
    ) -> Result<SchemaRef<'a>, GenerateError> {
        match node {
            SchemaNode::Schema(schema) => Ok(SchemaRef::Inline(schema)),
            SchemaNode::Reference(r) => self.resolve(&r.pointer, location).map(SchemaRef::Resolved),
            SchemaNode::Boolean(_) => Ok(SchemaRef::Resolved(Rc::new(Schema::default()))),
        }
    }

    /// Deserialize a non-schema object (request body, response, parameter)
    /// at `pointer`.
    pub fn resolve_object<T: DeserializeOwned>(
        &self,
        pointer: &str,
        referenced_from: &str,
    ) -> Result<T, GenerateError> {
        let value = self.lookup_value(pointer, referenced_from)?;
        T::deserialize(value).map_err(|e| GenerateError::unsupported(pointer, e.to_string()))
    }

    /// Number of memoized pointers.
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "components": {
                "schemas": {
                    "User": { "type": "object", "properties": { "id": { "type": "string" } } },
                    "Alias": { "$ref": "#/components/schemas/User" },
                    "LoopA": { "$ref": "#/components/schemas/LoopB" },
                    "LoopB": { "$ref": "#/components/schemas/LoopA" },
                    "a/b": { "type": "string" }
                }
            }
        })
    }

    #[test]
    fn resolves_component_schema() {
        let root = doc();
        let mut resolver = Resolver::new(&root);
        let schema = resolver.resolve("#/components/schemas/User", "test").unwrap();
        assert!(schema.declares("object"));
    }

    #[test]
    fn memoizes_by_pointer() {
        let root = doc();
        let mut resolver = Resolver::new(&root);
        let first = resolver.resolve("#/components/schemas/User", "test").unwrap();
        let second = resolver.resolve("#/components/schemas/User", "elsewhere").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(resolver.memoized(), 1);
    }

    #[test]
    fn follows_reference_chains() {
        let root = doc();
        let mut resolver = Resolver::new(&root);
        let alias = resolver.resolve("#/components/schemas/Alias", "test").unwrap();
        let user = resolver.resolve("#/components/schemas/User", "test").unwrap();
        assert!(Rc::ptr_eq(&alias, &user));
    }

    #[test]
    fn breaks_pure_reference_cycles() {
        let root = doc();
        let mut resolver = Resolver::new(&root);
        let schema = resolver.resolve("#/components/schemas/LoopA", "test").unwrap();
        assert_eq!(*schema, Schema::default());
        let again = resolver.resolve("#/components/schemas/LoopB", "test").unwrap();
        assert!(Rc::ptr_eq(&schema, &again));
    }

    #[test]
    fn unresolved_pointer_reports_context() {
        let root = doc();
        let mut resolver = Resolver::new(&root);
        let err = resolver
            .resolve("#/components/schemas/Missing", "#/components/schemas/User/properties/x")
            .unwrap_err();
        assert_eq!(
            err,
            GenerateError::UnresolvedReference {
                pointer: "#/components/schemas/Missing".into(),
                referenced_from: "#/components/schemas/User/properties/x".into(),
            }
        );
    }

    #[test]
    fn rejects_external_and_malformed_pointers() {
        let root = doc();
        let mut resolver = Resolver::new(&root);
        assert!(matches!(
            resolver.resolve("other.yaml#/User", "test"),
            Err(GenerateError::UnsupportedSchema { .. })
        ));
        assert!(matches!(
            resolver.resolve("#User", "test"),
            Err(GenerateError::UnsupportedSchema { .. })
        ));
    }

    #[test]
    fn escaped_segments() {
        let root = doc();
        let mut resolver = Resolver::new(&root);
        let pointer = child_pointer("#/components/schemas", "a/b");
        assert_eq!(pointer, "#/components/schemas/a~1b");
        assert_eq!(last_segment(&pointer), "a/b");
        let schema = resolver.resolve(&pointer, "test").unwrap();
        assert!(schema.declares("string"));
    }
}
