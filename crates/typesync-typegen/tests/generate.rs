//! Integration tests for typesync-typegen.

use pretty_assertions::assert_eq;
use std::collections::HashSet;
use typesync_typegen::{
    GenerateError, GeneratedType, GenerationOutput, OpenApiDocument, TypegenConfig,
    config::{FilterConfig, NamingConfig},
    generate, output,
};

fn load_fixture(name: &str) -> OpenApiDocument {
    let path = format!("tests/fixtures/{}", name);
    let content =
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("fixture {} not found", name));
    if name.ends_with(".yaml") {
        OpenApiDocument::from_yaml_str(&content).expect("invalid fixture")
    } else {
        OpenApiDocument::from_json_str(&content).expect("invalid fixture")
    }
}

fn run(name: &str) -> GenerationOutput {
    generate(&load_fixture(name), &TypegenConfig::default()).unwrap()
}

fn find<'a>(output: &'a GenerationOutput, name: &str) -> &'a GeneratedType {
    output
        .types
        .iter()
        .find(|t| t.name == name)
        .unwrap_or_else(|| panic!("type {} not generated", name))
}

fn position(output: &GenerationOutput, name: &str) -> usize {
    output.types.iter().position(|t| t.name == name).unwrap()
}

// === Scenarios ===

#[test]
fn simple_object() {
    let output = run("scenarios.json");
    let user = find(&output, "User");
    assert!(user.is_interface());
    assert_eq!(
        user.content,
        "export interface User {\n  id: string;\n  email: string;\n  age?: number;\n}"
    );
}

#[test]
fn inheritance() {
    let output = run("scenarios.json");
    let admin = find(&output, "AdminUser");
    assert_eq!(
        admin.content,
        "export interface AdminUser extends BaseUser {\n  permissions: string[];\n}"
    );
    assert!(admin.dependencies.contains("BaseUser"));
    assert!(position(&output, "BaseUser") < position(&output, "AdminUser"));
}

#[test]
fn discriminated_union() {
    let output = run("scenarios.json");
    let animal = find(&output, "Animal");
    assert!(animal.is_union());
    assert_eq!(
        animal.content,
        "/** @discriminator type */\nexport type Animal = Cat | Dog;"
    );
    assert!(find(&output, "Cat").content.contains("  type: \"cat\";\n"));
    assert!(find(&output, "Dog").content.contains("  type: \"dog\";\n"));
    assert!(position(&output, "Cat") < position(&output, "Animal"));
    assert!(position(&output, "Dog") < position(&output, "Animal"));
}

#[test]
fn nullable_versus_optional() {
    let output = run("scenarios.json");
    assert_eq!(
        find(&output, "Product").content,
        "export interface Product {\n  name: string;\n  description?: string;\n  price: number | null;\n  salePrice?: number | null;\n  discount?: number | null;\n}"
    );
    assert!(!output.types.iter().any(|t| t.name.starts_with("ProductDiscount")));
}

#[test]
fn operations_map_yields_to_a_schema_of_the_same_name() {
    let document = OpenApiDocument::from_value(serde_json::json!({
        "openapi": "3.0.0",
        "paths": { "/tags": { "get": {
            "operationId": "listTags",
            "responses": { "200": { "content": { "application/json": {
                "schema": { "$ref": "#/components/schemas/Operations" }
            }}}}
        }}},
        "components": { "schemas": {
            "Operations": { "type": "array", "items": { "type": "string" } }
        }}
    }))
    .unwrap();
    let config = TypegenConfig::default();
    let output = generate(&document, &config).unwrap();
    assert_eq!(output.operations_interface.as_deref(), Some("Operations2"));
    let rendered = output::render_declarations(&output, &config.output);
    assert!(rendered.contains("export type Operations = string[];\n"));
    assert!(rendered.contains("export interface Operations2 {\n"));
    assert!(rendered.contains("    response: Operations;\n"));
}

#[test]
fn cycles_generate_each_type_once() {
    let output = run("scenarios.json");
    assert_eq!(output.types.iter().filter(|t| t.name == "A").count(), 1);
    assert_eq!(output.types.iter().filter(|t| t.name == "B").count(), 1);
    assert_eq!(find(&output, "A").content, "export interface A {\n  b?: B;\n}");
    assert_eq!(find(&output, "B").content, "export interface B {\n  a?: A;\n}");
}

#[test]
fn union_takes_precedence_over_properties() {
    let output = run("scenarios.json");
    assert_eq!(find(&output, "Mixed").content, "export type Mixed = Cat | Dog;");
}

#[test]
fn colliding_names_are_suffixed() {
    let output = run("scenarios.json");
    assert!(find(&output, "UserProfile").content.contains("bio?: string;"));
    assert!(find(&output, "UserProfile2").content.contains("avatar?: string;"));
}

#[test]
fn operations_are_bound() {
    let output = run("scenarios.json");
    assert_eq!(output.operation_count, 2);

    let list = &output.operations[0];
    assert_eq!(list.name, "ListAnimals");
    assert_eq!(list.response.as_deref(), Some("ListAnimalsResponse"));
    assert_eq!(
        find(&output, "ListAnimalsResponse").content,
        "export type ListAnimalsResponse = Animal[];"
    );

    let create = &output.operations[1];
    assert_eq!(create.request.as_deref(), Some("AdminUser"));
    assert_eq!(create.response.as_deref(), Some("AdminUser"));
    assert_eq!(create.params, None);
}

// === Properties ===

#[test]
fn runs_are_idempotent() {
    let document = load_fixture("scenarios.json");
    let config = TypegenConfig::default();
    let first = generate(&document, &config).unwrap();
    let second = generate(&document, &config).unwrap();

    let key = |output: &GenerationOutput| -> Vec<(String, String, Vec<String>)> {
        output
            .types
            .iter()
            .map(|t| {
                (
                    t.name.clone(),
                    t.content.clone(),
                    t.dependencies.iter().cloned().collect(),
                )
            })
            .collect()
    };
    assert_eq!(key(&first), key(&second));
}

#[test]
fn names_are_unique() {
    let output = run("scenarios.json");
    let mut seen = HashSet::new();
    for ty in &output.types {
        for export in &ty.exports {
            assert!(seen.insert(export.clone()), "duplicate export {}", export);
        }
    }
    assert_eq!(output.type_count, output.types.len());
}

#[test]
fn dependencies_precede_dependents() {
    let output = run("scenarios.json");
    let cyclic: HashSet<&str> = ["A", "B"].into_iter().collect();
    for (i, ty) in output.types.iter().enumerate() {
        if cyclic.contains(ty.name.as_str()) {
            continue;
        }
        for dependency in &ty.dependencies {
            let at = position(&output, dependency);
            assert!(at < i, "{} emitted after dependent {}", dependency, ty.name);
        }
    }
}

// === Configuration ===

#[test]
fn prefix_and_suffix_apply_to_every_type() {
    let config = TypegenConfig {
        naming: NamingConfig {
            prefix: "Api".into(),
            suffix: "Dto".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let output = generate(&load_fixture("scenarios.json"), &config).unwrap();
    assert!(output.types.iter().all(|t| t.name.starts_with("Api")));
    assert!(find(&output, "ApiUserDto").content.starts_with("export interface ApiUserDto {"));
    assert_eq!(
        find(&output, "ApiAdminUserDto").content,
        "export interface ApiAdminUserDto extends ApiBaseUserDto {\n  permissions: string[];\n}"
    );
}

#[test]
fn excluded_schemas_render_as_unknown() {
    let config = TypegenConfig {
        filter: FilterConfig {
            exclude_schemas: vec!["Cat".into()],
            ..Default::default()
        },
        ..Default::default()
    };
    let output = generate(&load_fixture("scenarios.json"), &config).unwrap();
    assert!(output.types.iter().all(|t| t.name != "Cat"));
    assert_eq!(
        find(&output, "Animal").content,
        "/** @discriminator type */\nexport type Animal = unknown | Dog;"
    );
}

#[test]
fn excluded_paths_contribute_nothing() {
    let config = TypegenConfig {
        filter: FilterConfig {
            exclude_paths: vec!["/admin/**".into()],
            ..Default::default()
        },
        ..Default::default()
    };
    let output = generate(&load_fixture("scenarios.json"), &config).unwrap();
    assert_eq!(output.operation_count, 1);
    assert_eq!(output.operations[0].path, "/animals");
}

// === Errors ===

#[test]
fn unresolved_reference_fails_the_run() {
    let document = OpenApiDocument::from_value(serde_json::json!({
        "openapi": "3.0.0",
        "paths": {},
        "components": { "schemas": {
            "Order": {
                "type": "object",
                "properties": { "item": { "$ref": "#/components/schemas/Missing" } }
            }
        }}
    }))
    .unwrap();
    let err = generate(&document, &TypegenConfig::default()).unwrap_err();
    assert_eq!(
        err,
        GenerateError::UnresolvedReference {
            pointer: "#/components/schemas/Missing".into(),
            referenced_from: "#/components/schemas/Order/properties/item".into(),
        }
    );
}

#[test]
fn bad_filter_pattern_fails_the_run() {
    let config = TypegenConfig {
        filter: FilterConfig {
            include_schemas: vec!["[".into()],
            ..Default::default()
        },
        ..Default::default()
    };
    let err = generate(&load_fixture("scenarios.json"), &config).unwrap_err();
    assert!(matches!(err, GenerateError::InvalidPattern { .. }));
}

// === Rendering ===

#[test]
fn yaml_document_renders_to_typescript() {
    let config = TypegenConfig::default();
    let output = generate(&load_fixture("users.yaml"), &config).unwrap();
    let rendered = output::render_declarations(&output, &config.output);
    insta::assert_snapshot!(rendered, @r#"
    // This file is generated by typesync. Do not edit by hand.

    export enum Status {
      Active = "active",
      Disabled = "disabled",
    }

    export type StatusValues = "active" | "disabled";

    export interface User {
      /** @format uuid */
      id: string;
      email: string;
      status?: Status;
    }

    export interface ListUsersParams {
      limit?: number;
    }

    export type ListUsersResponse = User[];

    export interface CreateUserRequest {
      email: string;
    }

    export interface Operations {
      /** GET /users */
      listUsers: {
        request: never;
        params: ListUsersParams;
        response: ListUsersResponse;
      };
      /** POST /users */
      createUser: {
        request: CreateUserRequest;
        params: never;
        response: User;
      };
    }
    "#);
}
