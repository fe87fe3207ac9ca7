use serde_json::{Value, json};

use crate::generator::{
  orchestrator::{CompiledDocument, GeneratorConfig, Orchestrator},
  registry::{RegistryKey, SchemaRegistry},
  routes::document::OpenApiDocument,
  schema::{SchemaNode, parse_schema},
  types::{TypeContext, compile_type},
  validator::{CompileContext, RenderContext, ValidatorExpr, compile_validator},
};

pub(super) fn parse_document(value: Value) -> OpenApiDocument {
  serde_json::from_value(value).expect("failed to parse test document")
}

/// A 3.0 document with the given `components.schemas` and `paths`.
pub(super) fn document(schemas: Value, paths: Value) -> Value {
  json!({
    "openapi": "3.0.3",
    "info": { "title": "Test API", "version": "1.0.0" },
    "paths": paths,
    "components": { "schemas": schemas },
  })
}

pub(super) fn registry(entries: &[(&str, &str)]) -> SchemaRegistry {
  let mut registry = SchemaRegistry::new();
  for (key, alias) in entries {
    registry.register(RegistryKey::from(*key), *alias).unwrap();
  }
  registry
}

pub(super) fn orchestrator(document: Value) -> Orchestrator {
  orchestrator_with(document, SchemaRegistry::new(), GeneratorConfig::default())
}

pub(super) fn orchestrator_with(document: Value, registry: SchemaRegistry, config: GeneratorConfig) -> Orchestrator {
  Orchestrator::new(parse_document(document), registry, config)
}

pub(super) fn compile(document: Value) -> CompiledDocument {
  orchestrator(document).compile().expect("failed to compile test document")
}

pub(super) fn node(value: Value) -> SchemaNode {
  parse_schema(&value, "#/test").expect("failed to parse test schema")
}

pub(super) fn validator(value: Value) -> ValidatorExpr {
  compile_validator(&node(value), &mut CompileContext::new(&SchemaRegistry::new()))
}

/// Renders with every reference treated as declared.
pub(super) fn render_validator(value: Value) -> String {
  validator(value).render(&RenderContext::eager("Schema"))
}

pub(super) fn render_type(value: Value) -> String {
  compile_type(&node(value), &mut TypeContext::new(&SchemaRegistry::new())).render()
}
