//! TypeScript declaration file writer.

use crate::config::OutputConfig;
use crate::generate::doc_comment;
use crate::naming::{is_identifier, quote};
use crate::orchestrator::{GenerationOutput, OperationTypes};
use std::collections::HashSet;

const DEFAULT_OPERATIONS_INTERFACE: &str = "Operations";

/// Render a complete `.ts` file: header, declarations in emission order, and
/// the optional `Operations` map.
pub fn render_declarations(output: &GenerationOutput, config: &OutputConfig) -> String {
    let mut out = String::new();
    let header = config.header.trim_end();
    if !header.is_empty() {
        out.push_str(header);
        out.push_str("\n\n");
    }
    for ty in &output.types {
        out.push_str(&ty.content);
        out.push_str("\n\n");
    }
    if config.operations && !output.operations.is_empty() {
        let name = output
            .operations_interface
            .as_deref()
            .unwrap_or(DEFAULT_OPERATIONS_INTERFACE);
        out.push_str(&render_operations(name, &output.operations, config.emit_docs));
        out.push('\n');
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

/// `export interface Operations { ... }` keyed by operation id.
fn render_operations(name: &str, operations: &[OperationTypes], emit_docs: bool) -> String {
    let mut out = format!("export interface {} {{\n", name);
    let mut keys: HashSet<String> = HashSet::new();
    for operation in operations {
        let base = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| operation.name.clone());
        let mut key = base.clone();
        let mut n = 2;
        while keys.contains(&key) {
            key = format!("{}{}", base, n);
            n += 1;
        }
        keys.insert(key.clone());

        if emit_docs {
            let summary = format!(
                "{} {}",
                operation.method.as_str().to_uppercase(),
                operation.path
            );
            out.push_str(&doc_comment(&[summary], "  "));
        }
        let key = if is_identifier(&key) { key } else { quote(&key) };
        out.push_str(&format!("  {}: {{\n", key));
        for (slot, ty) in [
            ("request", &operation.request),
            ("params", &operation.params),
            ("response", &operation.response),
        ] {
            out.push_str(&format!(
                "    {}: {};\n",
                slot,
                ty.as_deref().unwrap_or("never")
            ));
        }
        out.push_str("  };\n");
    }
    out.push_str("}\n");
    out
}
