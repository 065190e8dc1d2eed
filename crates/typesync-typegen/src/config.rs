//! Run configuration.
//!
//! Every section defaults, so an empty TOML file is a valid config.
//!
//! ```toml
//! [naming]
//! types = "PascalCase"
//! prefix = "Api"
//!
//! [[type_mappings]]
//! type = "string"
//! format = "date-time"
//! target = "Date"
//!
//! [filter]
//! exclude_schemas = ["Internal*"]
//!
//! [output]
//! header = "// Generated by typesync. Do not edit."
//! ```

pub use crate::filter::FilterConfig;
pub use crate::naming::{NamingConfig, NamingConvention};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypegenConfig {
    pub naming: NamingConfig,
    pub type_mappings: Vec<TypeMapping>,
    pub filter: FilterConfig,
    pub output: OutputConfig,
    pub watch: WatchConfig,
}

/// A custom `(type, format)` → TypeScript type rule. Rules without a format
/// apply to every format of the type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapping {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub target: String,
}

impl TypeMapping {
    pub fn matches(&self, schema_type: &str, format: Option<&str>) -> bool {
        self.schema_type == schema_type
            && match &self.format {
                Some(expected) => format == Some(expected.as_str()),
                None => true,
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// First line(s) of the generated file.
    pub header: String,
    /// Render JSDoc comments from descriptions and metadata.
    pub emit_docs: bool,
    /// Append an `Operations` interface binding each operation to its
    /// request, parameter and response types.
    pub operations: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            header: "// This file is generated by typesync. Do not edit by hand.".to_string(),
            emit_docs: true,
            operations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

impl TypegenConfig {
    /// The first mapping matching `(schema_type, format)`, in declaration
    /// order.
    pub fn mapping_for(&self, schema_type: &str, format: Option<&str>) -> Option<&str> {
        self.type_mappings
            .iter()
            .find(|m| m.matches(schema_type, format))
            .map(|m| m.target.as_str())
    }
}
