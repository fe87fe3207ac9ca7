use http::Method;
use serde_json::{Value, json};

use super::support::{compile, document, orchestrator, orchestrator_with, registry};
use crate::generator::{
  error::CompileError,
  metrics::GenerationWarning,
  orchestrator::GeneratorConfig,
  routes::path_template::PathParseError,
  schema::{NumberSchema, SchemaKind},
};

fn json_content(schema: Value) -> Value {
  json!({ "application/json": { "schema": schema } })
}

fn pets_schemas() -> Value {
  json!({
    "Pet": {
      "type": "object",
      "required": ["id"],
      "properties": { "id": { "type": "integer" }, "name": { "type": "string" } },
    },
  })
}

#[test]
fn test_undeclared_placeholder_drops_only_that_route() {
  let compiled = compile(document(
    pets_schemas(),
    json!({
      "/items/{id}": { "get": { "responses": { "204": { "description": "gone" } } } },
      "/items": { "get": { "responses": { "200": { "description": "ok", "content": json_content(json!({ "type": "array", "items": { "$ref": "#/components/schemas/Pet" } })) } } } },
    }),
  ));

  assert_eq!(
    compiled.route_errors,
    vec![CompileError::PathParameterMismatch {
      method: "GET".to_string(),
      path: "/items/{id}".to_string(),
      missing: vec!["id".to_string()],
    }]
  );
  assert_eq!(compiled.routes.len(), 1);
  assert_eq!(compiled.routes[0].path, "/items");
  assert!(compiled.warnings.iter().any(GenerationWarning::is_skipped_item));
}

#[test]
fn test_malformed_template_is_route_scoped() {
  let compiled = compile(document(
    json!({}),
    json!({
      "/files/{name": { "get": { "responses": {} } },
      "/health": { "get": { "responses": {} } },
    }),
  ));

  assert_eq!(compiled.routes.len(), 1);
  assert!(matches!(
    &compiled.route_errors[..],
    [CompileError::InvalidPathTemplate {
      source: PathParseError::UnclosedBrace { .. },
      ..
    }]
  ));
}

#[test]
fn test_operation_parameters_override_path_parameters() {
  let compiled = compile(document(
    json!({}),
    json!({
      "/items": {
        "parameters": [
          { "name": "limit", "in": "query", "schema": { "type": "string" } },
          { "name": "cursor", "in": "query", "schema": { "type": "string" } },
        ],
        "get": {
          "parameters": [{ "name": "limit", "in": "query", "required": true, "schema": { "type": "integer", "minimum": 1 } }],
          "responses": {},
        },
      },
    }),
  ));

  let route = &compiled.routes[0];
  assert_eq!(route.query.as_ref().and_then(|q| q.as_reference()), Some("GetItemsQuery"));
  assert!(route.params.is_none());

  let query = compiled.table["GetItemsQuery"].as_object().unwrap();
  assert_eq!(query.properties.keys().collect::<Vec<_>>(), vec!["limit", "cursor"]);
  assert!(query.required.contains("limit"));
  assert!(!query.required.contains("cursor"));
  assert!(matches!(
    query.properties["limit"].kind,
    SchemaKind::Number(NumberSchema { integer: true, .. })
  ));
}

#[test]
fn test_headers_are_lowercased_and_cookies_ignored() {
  let compiled = compile(document(
    json!({}),
    json!({
      "/me": {
        "get": {
          "parameters": [
            { "name": "X-Request-Id", "in": "header", "required": true, "schema": { "type": "string", "format": "uuid" } },
            { "name": "session", "in": "cookie", "schema": { "type": "string" } },
          ],
          "responses": {},
        },
      },
    }),
  ));

  let headers = compiled.table["GetMeHeaders"].as_object().unwrap();
  assert_eq!(headers.properties.keys().collect::<Vec<_>>(), vec!["x-request-id"]);
  assert!(headers.required.contains("x-request-id"));
  assert!(compiled.warnings.contains(&GenerationWarning::CookieParameterIgnored {
    method: "GET".to_string(),
    path: "/me".to_string(),
    name: "session".to_string(),
  }));
}

#[test]
fn test_parameter_without_schema_accepts_anything() {
  let compiled = compile(document(
    json!({}),
    json!({ "/search": { "get": { "parameters": [{ "name": "q", "in": "query" }], "responses": {} } } }),
  ));
  let query = compiled.table["GetSearchQuery"].as_object().unwrap();
  assert_eq!(query.properties["q"].kind, SchemaKind::Any);
}

#[test]
fn test_media_type_selection() {
  let compiled = compile(document(
    json!({}),
    json!({
      "/upload": {
        "post": {
          "requestBody": { "content": { "text/plain": { "schema": { "type": "string" } } } },
          "responses": {
            "201": { "description": "created", "content": {
              "application/vnd.item+json": { "schema": { "type": "object", "properties": { "v": { "type": "integer" } } } },
              "application/json": { "schema": { "type": "object", "properties": { "id": { "type": "string" } } } },
            } },
            "400": { "description": "bad", "content": {
              "application/problem+json": { "schema": { "type": "object", "properties": { "title": { "type": "string" } } } },
            } },
            "204": { "description": "empty" },
          },
        },
      },
    }),
  ));

  let route = &compiled.routes[0];
  assert!(route.body.is_none());
  assert!(!route.body_required);
  assert_eq!(route.responses.keys().collect::<Vec<_>>(), vec!["201", "400"]);

  let created = compiled.table["PostUpload201Response"].as_object().unwrap();
  assert!(created.properties.contains_key("id"));
  let problem = compiled.table["PostUpload400ErrorResponse"].as_object().unwrap();
  assert!(problem.properties.contains_key("title"));

  assert!(compiled.warnings.contains(&GenerationWarning::NoJsonContent {
    method: "POST".to_string(),
    path: "/upload".to_string(),
    slot: "body".to_string(),
  }));
}

#[test]
fn test_component_parameters_and_bodies_are_followed() {
  let mut doc = document(
    pets_schemas(),
    json!({
      "/pets/{petId}": {
        "parameters": [{ "$ref": "#/components/parameters/PetId" }],
        "put": {
          "operationId": "updatePet",
          "requestBody": { "$ref": "#/components/requestBodies/PetBody" },
          "responses": { "200": { "$ref": "#/components/responses/PetResponse" } },
        },
      },
    }),
  );
  doc["components"]["parameters"] = json!({
    "PetId": { "$ref": "#/components/parameters/PetIdentifier" },
    "PetIdentifier": { "name": "petId", "in": "path", "required": true, "schema": { "type": "integer" } },
  });
  doc["components"]["requestBodies"] = json!({
    "PetBody": { "required": true, "content": json_content(json!({ "$ref": "#/components/schemas/Pet" })) },
  });
  doc["components"]["responses"] = json!({
    "PetResponse": { "description": "ok", "content": json_content(json!({ "$ref": "#/components/schemas/Pet" })) },
  });

  let compiled = compile(doc);
  assert!(compiled.route_errors.is_empty());

  let route = &compiled.routes[0];
  assert_eq!(route.method, Method::PUT);
  assert_eq!(route.operation_id.as_deref(), Some("updatePet"));
  assert_eq!(route.params.as_ref().and_then(|p| p.as_reference()), Some("PutPetsPetIdParams"));
  assert_eq!(route.body.as_ref().and_then(|b| b.as_reference()), Some("Pet"));
  assert!(route.body_required);
  assert_eq!(route.responses["200"].as_reference(), Some("Pet"));
  assert!(!compiled.table.contains_key("PutPetsPetIdBody"));
}

#[test]
fn test_unresolvable_component_drops_route() {
  let compiled = compile(document(
    json!({}),
    json!({
      "/a": { "get": { "parameters": [{ "$ref": "#/components/parameters/Missing" }], "responses": {} } },
      "/b": { "get": { "responses": {} } },
    }),
  ));

  assert_eq!(
    compiled.route_errors,
    vec![CompileError::UnresolvedComponent {
      method: "GET".to_string(),
      path: "/a".to_string(),
      reference: "#/components/parameters/Missing".to_string(),
    }]
  );
  assert_eq!(compiled.routes.len(), 1);
}

#[test]
fn test_dangling_body_reference_fails_document() {
  let err = orchestrator(document(
    pets_schemas(),
    json!({
      "/pets": { "post": {
        "requestBody": { "content": json_content(json!({ "$ref": "#/components/schemas/Missing" })) },
        "responses": {},
      } },
    }),
  ))
  .compile()
  .unwrap_err();

  assert_eq!(
    err,
    CompileError::DanglingReference {
      from: "POST /pets".to_string(),
      target: "Missing".to_string(),
    }
  );
}

#[test]
fn test_body_reference_follows_sanitized_component_name() {
  let compiled = compile(document(
    json!({ "pet.v1": { "type": "object", "properties": { "name": { "type": "string" } } } }),
    json!({
      "/pets": { "post": {
        "requestBody": { "content": json_content(json!({ "$ref": "#/components/schemas/pet.v1" })) },
        "responses": { "200": { "description": "ok", "content": json_content(json!({
          "type": "array",
          "items": { "$ref": "#/components/schemas/pet.v1" },
        })) } },
      } },
    }),
  ));

  let route = &compiled.routes[0];
  assert_eq!(route.body.as_ref().and_then(|b| b.as_reference()), Some("PetV1"));
  assert!(!route.body_required);
  assert_eq!(compiled.canonical_name("pet.v1"), "PetV1");
  assert_eq!(
    compiled.table["PostPets200Response"].references().into_iter().collect::<Vec<_>>(),
    vec!["PetV1".to_string()]
  );
  assert!(compiled.warnings.contains(&GenerationWarning::ComponentRenamed {
    from: "pet.v1".to_string(),
    to: "PetV1".to_string(),
  }));
}

#[test]
fn test_nullable_body_reference_is_synthesized() {
  let compiled = compile(document(
    pets_schemas(),
    json!({
      "/pets": { "put": {
        "requestBody": { "required": true, "content": json_content(json!({ "$ref": "#/components/schemas/Pet", "nullable": true })) },
        "responses": {},
      } },
    }),
  ));

  let route = &compiled.routes[0];
  assert_eq!(route.body.as_ref().and_then(|b| b.as_reference()), Some("PutPetsBody"));
  assert!(route.body_required);
  assert!(compiled.table["PutPetsBody"].nullable);
}

#[test]
fn test_routes_are_skipped_when_disabled() {
  let compiled = orchestrator_with(
    document(
      pets_schemas(),
      json!({ "/broken/{id}": { "get": { "responses": {} } } }),
    ),
    registry(&[]),
    GeneratorConfig::builder().include_routes(false).build(),
  )
  .compile()
  .unwrap();

  assert!(compiled.routes.is_empty());
  assert!(compiled.route_errors.is_empty());
  assert_eq!(compiled.table.keys().collect::<Vec<_>>(), vec!["Pet"]);
}
