//! End-to-end checks over the bundled fixture documents, through the library
//! API and through the `oas-zod-gen` binary.

use std::process::Command;

use oas_zod_gen::{
  GeneratorConfig, Orchestrator, RegistryKey, SchemaRegistry,
  generator::{roundtrip::RoundTripVerifier, routes::document::OpenApiDocument},
};

const PETSTORE: &str = include_str!("../fixtures/petstore.json");
const ROUND_TRIP: &str = include_str!("../fixtures/round_trip.json");

fn fixture_path(name: &str) -> String {
  format!("{}/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn petstore(config: GeneratorConfig) -> Orchestrator {
  let document: OpenApiDocument = serde_json::from_str(PETSTORE).unwrap();
  let mut registry = SchemaRegistry::new();
  registry.register(RegistryKey::from("email"), "EmailAddress").unwrap();
  Orchestrator::new(document, registry, config)
}

fn run(args: &[&str]) -> std::process::Output {
  Command::new(env!("CARGO_BIN_EXE_oas-zod-gen"))
    .args(args)
    .args(["--color", "never"])
    .output()
    .expect("failed to run oas-zod-gen")
}

#[test]
fn test_petstore_routes() {
  let compiled = petstore(GeneratorConfig::default()).compile().unwrap();

  let routes: Vec<String> = compiled
    .routes
    .iter()
    .map(|route| format!("{} {}", route.method, route.path))
    .collect();
  assert_eq!(
    routes,
    vec!["GET /pets", "POST /pets", "GET /pets/{petId}", "DELETE /pets/{petId}"]
  );
  assert_eq!(compiled.route_errors.len(), 1);
  assert!(compiled.route_errors[0].to_string().starts_with("GET /owners/{ownerId}/pets:"));
  assert_eq!(compiled.cycles, vec![vec!["Pet".to_string(), "Owner".to_string()]]);
  assert!(compiled.table.contains_key("NotFoundError"));
  assert_eq!(compiled.canonical_name("DeletePetsPetIdParams"), "GetPetsPetIdParams");
}

#[test]
fn test_petstore_output() {
  let output = petstore(GeneratorConfig::default())
    .generate_with_header("petstore.json")
    .unwrap();
  let schemas = &output.schemas_ts;
  let types = &output.types_ts;

  assert!(schemas.starts_with("// AUTO-GENERATED CODE - DO NOT EDIT!\n//\n// Pet Store\n// Source: petstore.json\n"));
  assert!(schemas.contains(
    "import { z } from \"zod\";\nimport { EmailAddress } from \"./registry\";\nimport type * as Types from \"./types\";\n"
  ));
  assert!(schemas.contains("export const PetSchema: z.ZodType<Types.Pet> = z.object({"));
  assert!(schemas.contains("  email: EmailAddress.optional(),"));
  assert!(schemas.contains("  owner: z.lazy(() => OwnerSchema).optional(),"));
  assert!(schemas.contains("export const OwnerSchema = z.object({"));
  assert!(schemas.contains("export const DeletePetsPetIdParamsSchema = GetPetsPetIdParamsSchema;"));
  assert!(schemas.contains(
    "  \"/pets\": {\n    GET: {\n      query: GetPetsQuerySchema,\n      headers: GetPetsHeadersSchema,\n    },\n    POST: {\n      \
     body: NewPetSchema,\n    },\n  },"
  ));
  assert!(schemas.contains(
    "    POST: {\n      \"201\": PetSchema,\n      \"default\": ProblemSchema,\n    },"
  ));
  assert!(schemas.contains("    GET: {\n      \"200\": PetSchema,\n      \"404\": NotFoundErrorSchema,\n    },"));
  assert!(schemas.ends_with("} as const;\n"));

  assert!(types.contains("import type { EmailAddress } from \"./registry\";\n"));
  assert!(types.contains("  tag?: string | null;"));
  assert!(types.contains("  owner?: Owner;"));
  assert!(types.contains("export type DeletePetsPetId404ErrorResponse = NotFoundError;"));

  assert_eq!(output.stats.routes_converted, 4);
  assert_eq!(output.stats.cycles_detected, 1);
  assert_eq!(output.stats.registry_aliases_used, 1);
}

#[test]
fn test_fixture_documents_round_trip() {
  let orchestrator = petstore(GeneratorConfig::builder().include_routes(false).build());
  let compiled = orchestrator.compile().unwrap();
  let report = RoundTripVerifier::new(orchestrator.registry(), orchestrator.config()).verify(orchestrator.document(), &compiled);
  assert_eq!(report.checked, ["Pet", "Owner"]);
  assert!(report.is_success(), "{:#?}", report.failures);

  let document: OpenApiDocument = serde_json::from_str(ROUND_TRIP).unwrap();
  let orchestrator = Orchestrator::new(
    document,
    SchemaRegistry::new(),
    GeneratorConfig::builder().include_routes(false).build(),
  );
  let compiled = orchestrator.compile().unwrap();
  let report = RoundTripVerifier::new(orchestrator.registry(), orchestrator.config()).verify(orchestrator.document(), &compiled);
  assert_eq!(report.checked.len(), 21);
  assert!(report.is_success(), "{:#?}", report.failures);
}

#[test]
fn test_cli_generate() {
  let dir = tempfile::tempdir().unwrap();
  let out = dir.path().join("generated");
  let output = run(&[
    "generate",
    "--input",
    &fixture_path("petstore.json"),
    "--output",
    out.to_str().unwrap(),
    "--register",
    "email=EmailAddress",
    "--quiet",
  ]);
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

  let schemas = std::fs::read_to_string(out.join("schemas.ts")).unwrap();
  let types = std::fs::read_to_string(out.join("types.ts")).unwrap();
  assert!(schemas.contains("import { EmailAddress } from \"./registry\";"));
  assert!(schemas.contains("// Source: "));
  assert!(types.contains("export type NotFoundError = {"));
}

#[test]
fn test_cli_rejects_bad_registration() {
  let dir = tempfile::tempdir().unwrap();
  let output = run(&[
    "generate",
    "-i",
    &fixture_path("petstore.json"),
    "-o",
    dir.path().to_str().unwrap(),
    "--register",
    "email",
  ]);
  assert!(!output.status.success());
  assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid register format"));
  assert!(!dir.path().join("schemas.ts").exists());
}

#[test]
fn test_cli_verify() {
  let output = run(&["verify", "--input", &fixture_path("round_trip.json")]);
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
  assert!(String::from_utf8_lossy(&output.stdout).contains("Verified 21 components, 0 failed"));

  let mut document: serde_json::Value = serde_json::from_str(ROUND_TRIP).unwrap();
  document["components"]["schemas"]["Flag"]["x-fixture-examples"]["invalid"] = serde_json::json!([true]);
  let dir = tempfile::tempdir().unwrap();
  let tampered = dir.path().join("tampered.json");
  std::fs::write(&tampered, serde_json::to_string_pretty(&document).unwrap()).unwrap();

  let output = run(&["verify", "--input", tampered.to_str().unwrap()]);
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("round trip mismatch for 'Flag': invalid example #0 was accepted"), "{stderr}");
}
