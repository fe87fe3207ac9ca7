//! Round-trip verification of compiled components against their fixtures.
//!
//! A component opts in by carrying `x-<vendor>-examples: { valid: [...], invalid: [...] }`.
//! For each such component the verifier checks that the validator accepts and
//! rejects the examples, that the validator decompiles back to the fragment it
//! came from, and that the validator and the type declaration agree on shape
//! and on the registry aliases they use.
//!
//! The decompiled validator is compared with the fragment as written, not with
//! the parsed node, so a keyword the parser loses shows up as a mismatch.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::generator::{
  error::{CompileError, CompileResult},
  orchestrator::{CompiledDocument, GeneratorConfig},
  registry::SchemaRegistry,
  routes::document::OpenApiDocument,
  schema::{
    COMPONENT_REF_PREFIX, CanonicalSchema,
    emit::component_ref,
    parse::{ANNOTATIONS, infer_type, parse_reference},
  },
  shape::ShapeProjection,
  types::{TypeContext, compile_type},
  validator::{CompileContext, compile_validator},
};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixtures {
  #[serde(default)]
  valid: Vec<Value>,
  #[serde(default)]
  invalid: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundTripReport {
  /// Components that carried fixtures, in document order.
  pub checked: Vec<String>,
  pub failures: Vec<CompileError>,
}

impl RoundTripReport {
  #[must_use]
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }
}

pub struct RoundTripVerifier<'a> {
  registry: &'a SchemaRegistry,
  examples_key: String,
}

impl<'a> RoundTripVerifier<'a> {
  #[must_use]
  pub fn new(registry: &'a SchemaRegistry, config: &GeneratorConfig) -> Self {
    Self {
      registry,
      examples_key: config.examples_key(),
    }
  }

  /// Verifies every component of `document` that carries fixtures.
  #[must_use]
  pub fn verify(&self, document: &OpenApiDocument, compiled: &CompiledDocument) -> RoundTripReport {
    let mut report = RoundTripReport::default();
    for (name, fragment) in &document.components.schemas {
      let Some(fixtures) = fragment.get(&self.examples_key) else {
        continue;
      };
      report.checked.push(name.clone());
      if let Err(err) = self.verify_component(name, fragment, fixtures, compiled) {
        report.failures.push(err);
      }
    }
    report
  }

  fn verify_component(
    &self,
    name: &str,
    fragment: &Value,
    fixtures: &Value,
    compiled: &CompiledDocument,
  ) -> CompileResult<()> {
    let canonical = compiled.canonical_name(name);
    let node = compiled
      .table
      .get(canonical)
      .ok_or_else(|| CompileError::mismatch(name, format!("'{canonical}' is not in the component table")))?;
    let validator = compiled
      .validators
      .get(canonical)
      .ok_or_else(|| CompileError::mismatch(name, "no validator was compiled"))?;
    let ty = compiled
      .types
      .get(canonical)
      .ok_or_else(|| CompileError::mismatch(name, "no type was compiled"))?;

    let fixtures = Fixtures::deserialize(fixtures)
      .map_err(|e| CompileError::mismatch(name, format!("malformed {}: {e}", self.examples_key)))?;
    for (i, example) in fixtures.valid.iter().enumerate() {
      validator
        .validate(example, &compiled.validators)
        .map_err(|issue| CompileError::mismatch(name, format!("valid example #{i} was rejected: {issue}")))?;
    }
    for (i, example) in fixtures.invalid.iter().enumerate() {
      if validator.validate(example, &compiled.validators).is_ok() {
        return Err(CompileError::mismatch(name, format!("invalid example #{i} was accepted")));
      }
    }

    let expected = CanonicalSchema::from_value(normalize_fragment(fragment, &|target: &str| {
      let renamed = compiled.canonical_name(target);
      (renamed != target).then(|| renamed.to_string())
    }))?;
    let decompiled = CanonicalSchema::from_value(validator.decompile())?;
    if expected != decompiled {
      return Err(CompileError::mismatch(
        name,
        format!(
          "decompiled to {} ({}), expected {} ({})",
          decompiled.as_str(),
          decompiled.digest(),
          expected.as_str(),
          expected.digest()
        ),
      ));
    }

    let validator_shape = validator.shape();
    let type_shape = ty.shape();
    if validator_shape != type_shape {
      return Err(CompileError::mismatch(
        name,
        format!("validator shape {validator_shape} differs from type shape {type_shape}"),
      ));
    }

    let mut validator_ctx = CompileContext::new(self.registry);
    let mut type_ctx = TypeContext::new(self.registry);
    compile_validator(node, &mut validator_ctx);
    compile_type(node, &mut type_ctx);
    if validator_ctx.output_names != type_ctx.output_names {
      return Err(CompileError::mismatch(
        name,
        format!(
          "validator aliases {:?} differ from type aliases {:?}",
          validator_ctx.output_names, type_ctx.output_names
        ),
      ));
    }

    Ok(())
  }
}

/// Keywords whose `false` is the same as leaving them out.
const FALSE_BY_DEFAULT: &[&str] = &["nullable", "exclusiveMinimum", "exclusiveMaximum", "uniqueItems"];

/// The fragment in the form a decompiled validator reproduces: annotations,
/// extensions and flags left at `false` are dropped, a `type` implied by the
/// other keywords is spelled out and references follow `rename`.
fn normalize_fragment(fragment: &Value, rename: &impl Fn(&str) -> Option<String>) -> Value {
  let Value::Object(map) = fragment else {
    return fragment.clone();
  };

  let mut normalized = Map::new();
  for (key, value) in map {
    if key.starts_with("x-")
      || ANNOTATIONS.contains(&key.as_str())
      || (FALSE_BY_DEFAULT.contains(&key.as_str()) && *value == Value::Bool(false))
    {
      continue;
    }
    let value = match (key.as_str(), value) {
      ("$ref", reference) => normalize_reference(reference, rename),
      ("items", schema) => normalize_fragment(schema, rename),
      ("additionalProperties", schema @ Value::Object(_)) => normalize_fragment(schema, rename),
      ("properties", Value::Object(properties)) => Value::Object(
        properties
          .iter()
          .map(|(name, schema)| (name.clone(), normalize_fragment(schema, rename)))
          .collect(),
      ),
      ("oneOf" | "anyOf" | "allOf", Value::Array(members)) => {
        Value::Array(members.iter().map(|member| normalize_fragment(member, rename)).collect())
      }
      ("discriminator", Value::Object(discriminator)) => normalize_discriminator(discriminator, rename),
      (_, other) => other.clone(),
    };
    normalized.insert(key.clone(), value);
  }

  let composed = ["$ref", "oneOf", "anyOf", "allOf"].iter().any(|k| map.contains_key(*k));
  if !composed
    && !map.contains_key("type")
    && let Some(ty) = infer_type(map)
  {
    normalized.insert("type".into(), json!(ty));
  }
  Value::Object(normalized)
}

/// Re-escapes the reference the way the emitter does, after applying `rename`.
fn normalize_reference(reference: &Value, rename: &impl Fn(&str) -> Option<String>) -> Value {
  match parse_reference(reference, "$ref") {
    Ok(name) => json!(component_ref(&rename(&name).unwrap_or(name))),
    Err(_) => reference.clone(),
  }
}

fn normalize_discriminator(discriminator: &Map<String, Value>, rename: &impl Fn(&str) -> Option<String>) -> Value {
  let mut normalized = discriminator.clone();
  if let Some(Value::Object(mapping)) = normalized.get_mut("mapping") {
    for target in mapping.values_mut() {
      if let Some(name) = target.as_str().and_then(|t| t.strip_prefix(COMPONENT_REF_PREFIX))
        && let Some(renamed) = rename(name)
      {
        *target = json!(format!("{COMPONENT_REF_PREFIX}{renamed}"));
      }
    }
  }
  Value::Object(normalized)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn unchanged(_: &str) -> Option<String> {
    None
  }

  #[test]
  fn test_normalize_drops_annotations_and_false_flags() {
    let fragment = json!({
      "type": "object",
      "description": "a pet",
      "nullable": false,
      "x-fixture-examples": { "valid": [{}] },
      "properties": {
        "description": { "type": "string", "example": "fluffy" },
        "age": { "minimum": 0, "exclusiveMinimum": false },
      },
    });
    assert_eq!(
      normalize_fragment(&fragment, &unchanged),
      json!({
        "type": "object",
        "properties": {
          "description": { "type": "string" },
          "age": { "type": "number", "minimum": 0 },
        },
      })
    );
  }

  #[test]
  fn test_normalize_keeps_what_the_parser_could_lose() {
    let fragment = json!({
      "oneOf": [{ "$ref": "#/components/schemas/Cat" }],
      "discriminator": { "propertyName": "kind" },
    });
    assert_eq!(normalize_fragment(&fragment, &unchanged), fragment);

    let status = json!({ "type": "string", "format": "email", "enum": ["a", null], "nullable": true });
    assert_eq!(normalize_fragment(&status, &unchanged), status);
  }

  #[test]
  fn test_normalize_follows_renames() {
    let fragment = json!({
      "anyOf": [{ "$ref": "#/components/schemas/Cat" }, { "$ref": "#/components/schemas/Dog" }],
      "discriminator": { "propertyName": "kind", "mapping": { "cat": "#/components/schemas/Cat" } },
    });
    let rename = |name: &str| (name == "Cat").then(|| "Feline".to_string());
    assert_eq!(
      normalize_fragment(&fragment, &rename),
      json!({
        "anyOf": [{ "$ref": "#/components/schemas/Feline" }, { "$ref": "#/components/schemas/Dog" }],
        "discriminator": { "propertyName": "kind", "mapping": { "cat": "#/components/schemas/Feline" } },
      })
    );
  }
}
