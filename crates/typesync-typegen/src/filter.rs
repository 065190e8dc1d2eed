//! Include/exclude filtering for paths and schema names.
//!
//! Patterns are globs (`/admin/**`, `Internal*`). An empty include list
//! admits everything; excludes always win over includes.

use crate::error::GenerateError;
use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Filter patterns as written in configuration.
///
/// ```toml
/// [filter]
/// include_paths = ["/users/**"]
/// exclude_schemas = ["Internal*"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub include_schemas: Vec<String>,
    pub exclude_schemas: Vec<String>,
}

/// Compiled include/exclude matchers for one axis (paths or schema names).
#[derive(Debug, Clone, Default)]
struct Matcher {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl Matcher {
    fn new(include: &[String], exclude: &[String]) -> Result<Self, GenerateError> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    fn admits(&self, candidate: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(candidate)) {
            return false;
        }
        !self.exclude.iter().any(|p| p.matches(candidate))
    }

    fn is_active(&self) -> bool {
        !self.include.is_empty() || !self.exclude.is_empty()
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, GenerateError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| GenerateError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

/// Decides which paths and component schemas take part in a run.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    paths: Matcher,
    schemas: Matcher,
}

impl Filter {
    pub fn new(config: &FilterConfig) -> Result<Self, GenerateError> {
        Ok(Self {
            paths: Matcher::new(&config.include_paths, &config.exclude_paths)?,
            schemas: Matcher::new(&config.include_schemas, &config.exclude_schemas)?,
        })
    }

    /// Whether operations under `path` are generated.
    pub fn admits_path(&self, path: &str) -> bool {
        self.paths.admits(path)
    }

    /// Whether the component schema `name` is generated.
    pub fn admits_schema(&self, name: &str) -> bool {
        self.schemas.admits(name)
    }

    pub fn is_active(&self) -> bool {
        self.paths.is_active() || self.schemas.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_filter_admits_everything() {
        let filter = Filter::new(&FilterConfig::default()).unwrap();
        assert!(!filter.is_active());
        assert!(filter.admits_path("/anything"));
        assert!(filter.admits_schema("Anything"));
    }

    #[test]
    fn include_paths_restrict() {
        let filter = Filter::new(&FilterConfig {
            include_paths: strings(&["/users*"]),
            ..Default::default()
        })
        .unwrap();
        assert!(filter.admits_path("/users"));
        assert!(filter.admits_path("/users/{id}"));
        assert!(!filter.admits_path("/pets"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter = Filter::new(&FilterConfig {
            include_schemas: strings(&["*"]),
            exclude_schemas: strings(&["Internal*"]),
            ..Default::default()
        })
        .unwrap();
        assert!(filter.admits_schema("User"));
        assert!(!filter.admits_schema("InternalAudit"));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = Filter::new(&FilterConfig {
            exclude_paths: strings(&["/a/***"]),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, GenerateError::InvalidPattern { pattern, .. } if pattern == "/a/***"));
    }
}
