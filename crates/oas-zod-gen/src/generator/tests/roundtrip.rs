use serde_json::{Value, json};

use super::support::{document, orchestrator_with, registry};
use crate::generator::{
  error::CompileError,
  orchestrator::{GeneratorConfig, Orchestrator},
  registry::SchemaRegistry,
  roundtrip::{RoundTripReport, RoundTripVerifier},
};

fn fixtures_config() -> GeneratorConfig {
  GeneratorConfig::builder().include_routes(false).build()
}

fn verify(orchestrator: &Orchestrator) -> RoundTripReport {
  let compiled = orchestrator.compile().unwrap();
  RoundTripVerifier::new(orchestrator.registry(), orchestrator.config()).verify(orchestrator.document(), &compiled)
}

fn verify_schemas(schemas: Value) -> RoundTripReport {
  verify(&orchestrator_with(document(schemas, json!({})), SchemaRegistry::new(), fixtures_config()))
}

fn failure_detail(report: &RoundTripReport) -> String {
  match report.failures.as_slice() {
    [CompileError::RoundTripMismatch { detail, .. }] => detail.clone(),
    other => panic!("expected one mismatch, got {other:?}"),
  }
}

#[test]
fn test_components_without_fixtures_are_not_checked() {
  let report = verify_schemas(json!({
    "Plain": { "type": "string" },
    "Checked": { "type": "integer", "x-fixture-examples": { "valid": [1] } },
  }));
  assert_eq!(report.checked, vec!["Checked".to_string()]);
  assert!(report.is_success());
}

#[test]
fn test_accepted_invalid_example_fails() {
  let report = verify_schemas(json!({
    "Count": {
      "type": "integer",
      "minimum": 0,
      "x-fixture-examples": { "valid": [0, 10], "invalid": [-1, 5] },
    },
  }));
  assert!(!report.is_success());
  assert_eq!(failure_detail(&report), "invalid example #1 was accepted");
}

#[test]
fn test_rejected_valid_example_fails() {
  let report = verify_schemas(json!({
    "Contact": {
      "type": "object",
      "required": ["email"],
      "properties": { "email": { "type": "string", "format": "email" } },
      "x-fixture-examples": { "valid": [{ "email": "a@example.com" }, { "email": "nope" }] },
    },
  }));
  let detail = failure_detail(&report);
  assert!(detail.starts_with("valid example #1 was rejected:"), "{detail}");
  assert!(detail.contains("$.email"), "{detail}");
}

#[test]
fn test_malformed_fixtures_fail() {
  let report = verify_schemas(json!({
    "Name": { "type": "string", "x-fixture-examples": { "valids": ["x"] } },
  }));
  assert!(failure_detail(&report).starts_with("malformed x-fixture-examples:"));
}

#[test]
fn test_registry_aliases_round_trip() {
  let orchestrator = orchestrator_with(
    document(
      json!({
        "Email": {
          "type": "string",
          "format": "email",
          "x-fixture-examples": { "valid": ["a@example.com"], "invalid": ["a"] },
        },
        "Count": { "type": "integer", "x-fixture-examples": { "valid": [3], "invalid": [3.5] } },
      }),
      json!({}),
    ),
    registry(&[("email", "EmailAddress"), ("integer", "Int")]),
    fixtures_config(),
  );
  let report = verify(&orchestrator);
  assert_eq!(report.checked.len(), 2);
  assert!(report.is_success(), "{:?}", report.failures);
}

#[test]
fn test_merged_and_renamed_components_round_trip() {
  let report = verify_schemas(json!({
    "Name": { "type": "string", "minLength": 1 },
    "Label": { "type": "string", "minLength": 1, "x-fixture-examples": { "valid": ["x"], "invalid": [""] } },
    "tag-list": {
      "type": "array",
      "items": { "$ref": "#/components/schemas/Label" },
      "x-fixture-examples": { "valid": [["a"]], "invalid": [[""]] },
    },
  }));
  assert_eq!(report.checked, vec!["Label".to_string(), "tag-list".to_string()]);
  assert!(report.is_success(), "{:?}", report.failures);
}

#[test]
fn test_keywords_beside_the_deciding_one_round_trip() {
  let report = verify_schemas(json!({
    "Cat": {
      "type": "object",
      "required": ["kind"],
      "properties": { "kind": { "type": "string", "enum": ["cat"] } },
    },
    "Single": {
      "oneOf": [{ "$ref": "#/components/schemas/Cat" }],
      "discriminator": { "propertyName": "kind" },
      "x-fixture-examples": { "valid": [{ "kind": "cat" }], "invalid": [{ "kind": "dog" }] },
    },
    "Wrapped": {
      "allOf": [{ "$ref": "#/components/schemas/Cat" }],
      "x-fixture-examples": { "valid": [{ "kind": "cat" }] },
    },
    "Reply": {
      "type": "string",
      "enum": ["yes", "no", null],
      "nullable": true,
      "x-fixture-examples": { "valid": ["yes", null], "invalid": ["maybe"] },
    },
    "Level": {
      "type": "integer",
      "format": "int32",
      "minimum": 1,
      "enum": [1, 2],
      "x-fixture-examples": { "valid": [2], "invalid": [3] },
    },
    "Nothing": {
      "type": "null",
      "x-fixture-examples": { "valid": [null], "invalid": [0, ""] },
    },
  }));
  assert_eq!(report.checked, ["Single", "Wrapped", "Reply", "Level", "Nothing"]);
  assert!(report.is_success(), "{:#?}", report.failures);
}

#[test]
fn test_vendor_key_is_configurable() {
  let orchestrator = orchestrator_with(
    document(
      json!({
        "Flag": {
          "type": "boolean",
          "x-acme-examples": { "valid": [true], "invalid": [0] },
          "x-fixture-examples": { "valid": ["ignored"] },
        },
      }),
      json!({}),
    ),
    SchemaRegistry::new(),
    GeneratorConfig::builder().include_routes(false).examples_vendor("acme").build(),
  );
  let report = verify(&orchestrator);
  assert_eq!(report.checked, vec!["Flag".to_string()]);
  assert!(report.is_success(), "{:?}", report.failures);
}

#[test]
fn test_fixture_suite() {
  let suite: Value = serde_json::from_str(include_str!("../../../fixtures/round_trip.json")).unwrap();
  let report = verify(&orchestrator_with(suite, SchemaRegistry::new(), fixtures_config()));

  assert!(report.is_success(), "{:#?}", report.failures);
  assert_eq!(
    report.checked,
    [
      "Email",
      "Website",
      "Slug",
      "Handle",
      "Status",
      "Priority",
      "Price",
      "Flag",
      "Anything",
      "Tags",
      "Metadata",
      "Pet",
      "Owner",
      "Animal",
      "Identifier",
      "Timestamped",
      "Nothing",
      "Contact",
      "Kitten",
      "Employee",
      "pet.summary",
    ]
  );
}
