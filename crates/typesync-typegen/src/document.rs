//! OpenAPI 3.x document model.
//!
//! Only the parts the type engine reads are modelled; everything else stays
//! reachable through the raw tree kept alongside for pointer resolution.

use crate::error::GenerateError;
use crate::schema::{Reference, SchemaNode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed OpenAPI 3.x document.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub paths: IndexMap<String, PathItem>,
    pub components: Components,
    raw: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Components {
    pub schemas: IndexMap<String, SchemaNode>,
}

/// Either an inline object or a `$ref` to one elsewhere in the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Referenceable<T> {
    Reference(Reference),
    Item(T),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathItem {
    pub parameters: Vec<Referenceable<Parameter>>,
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
}

/// HTTP methods in the order operations are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Options,
        Method::Head,
        Method::Patch,
        Method::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Post => "post",
            Method::Delete => "delete",
            Method::Options => "options",
            Method::Head => "head",
            Method::Patch => "patch",
            Method::Trace => "trace",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PathItem {
    /// Operations declared on this path, in [`Method::ALL`] order.
    pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
        Method::ALL.into_iter().filter_map(move |method| {
            let op = match method {
                Method::Get => &self.get,
                Method::Put => &self.put,
                Method::Post => &self.post,
                Method::Delete => &self.delete,
                Method::Options => &self.options,
                Method::Head => &self.head,
                Method::Patch => &self.patch,
                Method::Trace => &self.trace,
            };
            op.as_ref().map(|op| (method, op))
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<Referenceable<Parameter>>,
    pub request_body: Option<Referenceable<RequestBody>>,
    pub responses: IndexMap<String, Referenceable<Response>>,
    pub deprecated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub schema: Option<SchemaNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestBody {
    pub description: Option<String>,
    pub required: bool,
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Response {
    pub description: Option<String>,
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaType {
    pub schema: Option<SchemaNode>,
}

/// Shape of the document as deserialized, before the raw tree is attached.
#[derive(Deserialize)]
struct DocumentShape {
    openapi: String,
    #[serde(default)]
    info: Info,
    paths: IndexMap<String, PathItem>,
    #[serde(default)]
    components: Components,
}

impl OpenApiDocument {
    /// Validate and load a document from an already-decoded tree.
    ///
    /// Fails with [`GenerateError::InvalidDocument`] when `openapi` or `paths`
    /// is missing, when the version is not 3.x, or when the structure does not
    /// deserialize.
    pub fn from_value(raw: Value) -> Result<Self, GenerateError> {
        let Some(root) = raw.as_object() else {
            return Err(GenerateError::InvalidDocument(
                "document root is not an object".into(),
            ));
        };

        let version = match root.get("openapi") {
            Some(Value::String(v)) => v.clone(),
            Some(_) => {
                return Err(GenerateError::InvalidDocument(
                    "`openapi` must be a version string".into(),
                ));
            }
            None => {
                return Err(GenerateError::InvalidDocument(
                    "missing `openapi` version field".into(),
                ));
            }
        };
        if !version.starts_with("3.") {
            return Err(GenerateError::InvalidDocument(format!(
                "OpenAPI version {} not supported (expected 3.x)",
                version
            )));
        }
        if !root.get("paths").is_some_and(Value::is_object) {
            return Err(GenerateError::InvalidDocument(
                "missing `paths` object".into(),
            ));
        }

        let shape: DocumentShape = serde_json::from_value(raw.clone())
            .map_err(|e| GenerateError::InvalidDocument(e.to_string()))?;

        Ok(Self {
            openapi: shape.openapi,
            info: shape.info,
            paths: shape.paths,
            components: shape.components,
            raw,
        })
    }

    pub fn from_json_str(source: &str) -> Result<Self, GenerateError> {
        let raw: Value = serde_json::from_str(source)
            .map_err(|e| GenerateError::InvalidDocument(format!("invalid JSON: {}", e)))?;
        Self::from_value(raw)
    }

    /// Load a YAML document.
    ///
    /// Goes through `serde_yaml::Value` so non-string mapping keys (bare
    /// status codes such as `200:`) become strings.
    pub fn from_yaml_str(source: &str) -> Result<Self, GenerateError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(source)
            .map_err(|e| GenerateError::InvalidDocument(format!("invalid YAML: {}", e)))?;
        let raw = serde_json::to_value(yaml)
            .map_err(|e| GenerateError::InvalidDocument(format!("invalid YAML: {}", e)))?;
        Self::from_value(raw)
    }

    /// The undecoded document tree.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Number of operations across all paths.
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_missing_openapi() {
        let err = OpenApiDocument::from_value(json!({ "paths": {} })).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidDocument(msg) if msg.contains("openapi")));
    }

    #[test]
    fn rejects_missing_paths() {
        let err = OpenApiDocument::from_value(json!({
            "openapi": "3.0.3",
            "info": { "title": "x", "version": "1" }
        }))
        .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidDocument(msg) if msg.contains("paths")));
    }

    #[test]
    fn rejects_swagger_2() {
        let err = OpenApiDocument::from_value(json!({
            "openapi": "2.0",
            "paths": {}
        }))
        .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidDocument(_)));
    }

    #[test]
    fn loads_operations_in_method_order() {
        let doc = OpenApiDocument::from_value(json!({
            "openapi": "3.1.0",
            "info": { "title": "Pets", "version": "1.0.0" },
            "paths": {
                "/pets": {
                    "post": { "operationId": "createPet", "responses": {} },
                    "get": { "operationId": "listPets", "responses": {} }
                }
            }
        }))
        .unwrap();

        let methods: Vec<Method> = doc.paths["/pets"].operations().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![Method::Get, Method::Post]);
        assert_eq!(doc.operation_count(), 2);
        assert_eq!(doc.info.title, "Pets");
    }

    #[test]
    fn boolean_schemas_load() {
        let doc = OpenApiDocument::from_value(json!({
            "openapi": "3.1.0",
            "paths": {},
            "components": { "schemas": {
                "Anything": true,
                "Bag": { "type": "object", "properties": { "any": true, "none": false } }
            }}
        }))
        .unwrap();
        assert!(matches!(
            doc.components.schemas["Anything"],
            SchemaNode::Boolean(true)
        ));
    }

    #[test]
    fn yaml_status_codes_become_strings() {
        let doc = OpenApiDocument::from_yaml_str(
            r#"
openapi: 3.0.3
info:
  title: Health
  version: "1"
paths:
  /health:
    get:
      operationId: health
      responses:
        200:
          description: ok
          content:
            application/json:
              schema:
                type: object
                properties:
                  status:
                    type: string
"#,
        )
        .unwrap();
        let op = doc.paths["/health"].get.as_ref().unwrap();
        assert!(op.responses.contains_key("200"));
    }
}
