//! Naming engine.
//!
//! Turns raw schema names, operation ids, paths and enum values into
//! TypeScript identifiers under the configured convention. Collision handling
//! is the registry's job; everything here is a pure function of its input.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

/// Case convention for generated names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingConvention {
    #[serde(rename = "camelCase", alias = "camel")]
    Camel,
    #[serde(rename = "snake_case", alias = "snake")]
    Snake,
    #[default]
    #[serde(rename = "PascalCase", alias = "pascal")]
    Pascal,
}

impl NamingConvention {
    fn case(self) -> Case<'static> {
        match self {
            NamingConvention::Camel => Case::Camel,
            NamingConvention::Snake => Case::Snake,
            NamingConvention::Pascal => Case::Pascal,
        }
    }

    /// Whether `raw` already reads as this convention. Such names are kept
    /// verbatim so acronyms (`HTTPValidationError`) survive.
    fn conforms(self, raw: &str) -> bool {
        let Some(first) = raw.chars().next() else {
            return false;
        };
        match self {
            NamingConvention::Pascal => {
                first.is_ascii_uppercase() && raw.chars().all(|c| c.is_ascii_alphanumeric())
            }
            NamingConvention::Camel => {
                first.is_ascii_lowercase() && raw.chars().all(|c| c.is_ascii_alphanumeric())
            }
            NamingConvention::Snake => {
                first.is_ascii_lowercase()
                    && raw
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            }
        }
    }

    /// Convert `raw` to this convention. Separators and punctuation become
    /// word boundaries.
    pub fn apply(self, raw: &str) -> String {
        if self.conforms(raw) {
            return raw.to_string();
        }
        let spaced: String = raw
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        spaced.trim().to_case(self.case())
    }
}

/// Names that cannot be used as a type name.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "any", "bigint", "boolean", "never", "null", "number", "object", "string", "symbol",
    "undefined", "unknown", "void",
];

/// Naming rules for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Convention for type names.
    pub types: NamingConvention,
    /// Convention for field names; `None` keeps source names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<NamingConvention>,
    /// Prepended to every type name.
    pub prefix: String,
    /// Appended to every type name.
    pub suffix: String,
}

#[derive(Debug, Clone, Default)]
pub struct Naming {
    config: NamingConfig,
}

impl Naming {
    pub fn new(config: NamingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NamingConfig {
        &self.config
    }

    fn cased(&self, raw: &str) -> String {
        self.config.types.apply(raw)
    }

    /// Final base name for a type: prefix + cased name + suffix, made into a
    /// valid identifier.
    pub fn type_name(&self, raw: &str) -> String {
        let cased = self.cased(raw);
        let body = if cased.is_empty() {
            self.cased("type")
        } else {
            cased
        };
        let mut name = format!("{}{}{}", self.config.prefix, body, self.config.suffix);
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        if RESERVED_TYPE_NAMES.contains(&name.as_str()) {
            name.push_str(match self.config.types {
                NamingConvention::Snake => "_type",
                _ => "Type",
            });
        }
        name
    }

    /// Property key as written in a declaration: converted when a field
    /// convention is configured, quoted when not a valid identifier.
    pub fn field_name(&self, raw: &str) -> String {
        let name = match self.config.fields {
            Some(convention) => convention.apply(raw),
            None => raw.to_string(),
        };
        if is_identifier(&name) {
            name
        } else {
            quote(&name)
        }
    }

    /// Raw base name for an operation: its `operationId`, or the method
    /// followed by the path segments (`get /users/{id}` → `GetUsersById`).
    pub fn operation_name(&self, operation_id: Option<&str>, method: &str, path: &str) -> String {
        if let Some(id) = operation_id.filter(|id| !id.trim().is_empty()) {
            return compose(&[id]);
        }
        let mut words = vec![method.to_string()];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            {
                Some(param) => {
                    words.push("by".to_string());
                    words.push(param.to_string());
                }
                None => words.push(segment.to_string()),
            }
        }
        compose(&[&words.join(" ")])
    }
}

/// Join name parts into one raw PascalCase name (`["user", "status"]` →
/// `UserStatus`). The type convention is applied later by
/// [`Naming::type_name`].
pub fn compose(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| NamingConvention::Pascal.apply(part))
        .collect()
}

/// Member name for an enum value.
pub fn enum_member_name(value: &serde_json::Value) -> String {
    let raw = match value {
        serde_json::Value::String(s) => NamingConvention::Pascal.apply(s),
        serde_json::Value::Number(n) => {
            format!("Value{}", n).replace('-', "Minus").replace('.', "_")
        }
        other => NamingConvention::Pascal.apply(&other.to_string()),
    };
    if raw.is_empty() {
        "Empty".to_string()
    } else if raw.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Value{}", raw)
    } else {
        raw
    }
}

/// `[A-Za-z_$][A-Za-z0-9_$]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A JSON string literal, which is also a valid TypeScript string literal.
pub fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
