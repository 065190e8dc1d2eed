//! Errors raised by a generation run.
//!
//! Every variant is fatal to the run. Anomalies with a reasonable fallback
//! (unknown shapes, unrecognized formats) never surface here.

/// A fatal error produced while loading or generating from a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// A `$ref` pointer does not resolve to any node in the document.
    #[error("unresolved reference `{pointer}` (referenced from `{referenced_from}`)")]
    UnresolvedReference {
        pointer: String,
        referenced_from: String,
    },

    /// A node is structurally invalid and has no fallback.
    #[error("unsupported schema at `{location}`: {reason}")]
    UnsupportedSchema { location: String, reason: String },

    /// No free numeric suffix was found for a base name.
    #[error("exhausted name suffixes for `{base}` after {attempts} attempts")]
    NameCollisionExhaustion { base: String, attempts: u64 },

    /// The document lacks required OpenAPI structure.
    #[error("invalid OpenAPI document: {0}")]
    InvalidDocument(String),

    /// An include/exclude glob could not be compiled.
    #[error("invalid filter pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl GenerateError {
    pub(crate) fn unresolved(pointer: impl Into<String>, referenced_from: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            pointer: pointer.into(),
            referenced_from: referenced_from.into(),
        }
    }

    pub(crate) fn unsupported(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedSchema {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
