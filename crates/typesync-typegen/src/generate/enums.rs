//! Enum generator.

use super::{DeclarationKind, Declaration, GeneratedType, GenerationContext};
use crate::error::GenerateError;
use crate::naming::{enum_member_name, is_identifier};
use crate::schema::Schema;
use serde_json::Value;
use std::collections::HashSet;

pub(super) fn generate(
    ctx: &mut GenerationContext<'_>,
    schema: &Schema,
    decl: &Declaration<'_>,
) -> Result<GeneratedType, GenerateError> {
    let mut values: Vec<&Value> = Vec::new();
    for value in schema.enum_values.iter().filter(|v| !v.is_null()) {
        if !values.contains(&value) {
            values.push(value);
        }
    }
    let literals: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    let docs = ctx.jsdoc(schema, &[], "");

    let all_strings = values.iter().all(|v| v.is_string());
    let all_numbers = values.iter().all(|v| v.is_number());
    if !all_strings && !all_numbers {
        tracing::debug!(name = decl.name, "mixed enum values, emitting a literal union");
        let content = format!("{}export type {} = {};", docs, decl.name, literals.join(" | "));
        return Ok(GeneratedType::new(DeclarationKind::Union, content, decl.pointer));
    }

    let mut used: HashSet<String> = HashSet::new();
    let mut members = String::new();
    for (i, (value, literal)) in values.iter().zip(&literals).enumerate() {
        let mut member = enum_member_name(value);
        if !is_identifier(&member) {
            tracing::warn!(
                name = decl.name,
                value = %literal,
                "enum value does not form an identifier"
            );
            member = format!("Value{}", i + 1);
        }
        if used.contains(&member) {
            let mut n = 2;
            while used.contains(&format!("{}{}", member, n)) {
                n += 1;
            }
            member = format!("{}{}", member, n);
        }
        members.push_str(&format!("  {} = {},\n", member, literal));
        used.insert(member);
    }

    let values_name = ctx
        .registry
        .claim_export(&format!("{}Values", decl.name))?;
    let content = format!(
        "{}export enum {} {{\n{}}}\n\nexport type {} = {};",
        docs,
        decl.name,
        members,
        values_name,
        literals.join(" | ")
    );
    let mut generated = GeneratedType::new(DeclarationKind::Enum, content, decl.pointer);
    generated.exports.push(values_name);
    Ok(generated)
}
