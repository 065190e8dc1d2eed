//! OpenAPI 3.x schema resolution and TypeScript type synthesis.
//!
//! `typesync-typegen` walks an OpenAPI document, resolves `$ref` pointers,
//! classifies every schema it reaches and emits a dependency-ordered set of
//! uniquely named TypeScript declarations.
//!
//! # Architecture
//!
//! ```text
//! Document            Resolution          Synthesis            Output
//! ──────────      ──────────────      ────────────────      ──────────────
//! JSON / YAML ──> Resolver ─────────> Classifier ──┬─> Object
//!                 ($ref, memoized)                 ├─> Union     ──> Registry ──> ordered
//!                                                  ├─> Enum          (unique      declarations
//!                                                  └─> Primitive      names)
//! ```
//!
//! # Example
//!
//! ```
//! use typesync_typegen::{OpenApiDocument, TypegenConfig, generate, output};
//!
//! let document = OpenApiDocument::from_value(serde_json::json!({
//!     "openapi": "3.0.3",
//!     "info": { "title": "Users", "version": "1.0.0" },
//!     "paths": {},
//!     "components": {
//!         "schemas": {
//!             "User": {
//!                 "type": "object",
//!                 "required": ["id"],
//!                 "properties": {
//!                     "id": { "type": "string" },
//!                     "email": { "type": "string" }
//!                 }
//!             }
//!         }
//!     }
//! }))
//! .unwrap();
//!
//! let config = TypegenConfig::default();
//! let result = generate(&document, &config).unwrap();
//! let ts = output::render_declarations(&result, &config.output);
//! assert!(ts.contains("export interface User {\n  id: string;\n  email?: string;\n}"));
//! ```

pub mod classify;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod generate;
pub mod naming;
pub mod orchestrator;
pub mod output;
pub mod registry;
pub mod resolver;
pub mod schema;

pub use classify::{Classification, ShapeKind, classify};
pub use config::TypegenConfig;
pub use document::OpenApiDocument;
pub use error::GenerateError;
pub use generate::{DeclarationKind, GeneratedType};
pub use orchestrator::{GenerationOutput, OperationTypes, Orchestrator};
pub use registry::TypeRegistry;

/// Run the engine over a document with a fresh registry.
pub fn generate(
    document: &OpenApiDocument,
    config: &TypegenConfig,
) -> Result<GenerationOutput, GenerateError> {
    Orchestrator::new(document, config).run()
}
