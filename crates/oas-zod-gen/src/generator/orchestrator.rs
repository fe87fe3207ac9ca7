//! Orchestration for the OpenAPI to zod/TypeScript pipeline.
//!
//! [`Orchestrator`] owns a parsed document, the registry and the generator
//! configuration. [`Orchestrator::compile`] runs the core passes (schema
//! parsing, route collection, resolution, validator and type compilation) and
//! returns a [`CompiledDocument`]; [`Orchestrator::generate`] additionally
//! renders `schemas.ts` and `types.ts`.
//!
//! ## Usage
//!
//! ```no_run
//! use oas_zod_gen::{GeneratorConfig, Orchestrator, SchemaRegistry};
//!
//! # fn example() -> anyhow::Result<()> {
//! let json = std::fs::read_to_string("openapi.json")?;
//! let document = serde_json::from_str(&json)?;
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register("email".into(), "Email")?;
//!
//! let orchestrator = Orchestrator::new(document, registry, GeneratorConfig::default());
//! let output = orchestrator.generate_with_header("openapi.json")?;
//!
//! std::fs::write("schemas.ts", &output.schemas_ts)?;
//! std::fs::write("types.ts", &output.types_ts)?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};

use crate::generator::{
  codegen::{self, FileHeader},
  error::{CompileError, CompileResult},
  metrics::{GenerationStats, GenerationWarning},
  naming::{ensure_unique, is_identifier, to_type_name},
  registry::SchemaRegistry,
  resolver::{Resolution, resolve},
  routes::{RouteEntry, RouteTable, build_routes, document::OpenApiDocument},
  schema::{SchemaNode, parse::escape_pointer_segment, parse_schema},
  types::{TsType, TypeContext, compile_type},
  validator::{CompileContext, ValidatorSet, compile_validator},
};

/// Output configuration. Every field has a default, so `GeneratorConfig::default()`
/// gives `XSchema` names importing from `zod`, `./registry` and `./types`.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct GeneratorConfig {
  /// Appended to every table name to form the validator constant name.
  #[builder(default = "Schema".to_string(), into)]
  pub schema_suffix: String,
  #[builder(default = "zod".to_string(), into)]
  pub zod_import: String,
  /// Module that exports the registry aliases.
  #[builder(default = "./registry".to_string(), into)]
  pub registry_module: String,
  /// Module `schemas.ts` imports the declared types from, for annotations on recursive schemas.
  #[builder(default = "./types".to_string(), into)]
  pub types_module: String,
  #[builder(default = true)]
  pub include_routes: bool,
  /// Fixture examples are read from `x-<vendor>-examples`.
  #[builder(default = "fixture".to_string(), into)]
  pub examples_vendor: String,
}

impl Default for GeneratorConfig {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl GeneratorConfig {
  #[must_use]
  pub fn examples_key(&self) -> String {
    format!("x-{}-examples", self.examples_vendor)
  }
}

/// Everything the core produces for one document.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
  /// Component table in emission order.
  pub table: IndexMap<String, SchemaNode>,
  pub routes: Vec<RouteEntry>,
  pub validators: ValidatorSet,
  pub types: IndexMap<String, TsType>,
  /// Deduplicated names, each mapped to the table entry that replaced it.
  pub renames: IndexMap<String, String>,
  /// Component names that were not identifiers, mapped to their sanitized name.
  pub sanitized: IndexMap<String, String>,
  pub cycles: Vec<Vec<String>>,
  pub route_errors: Vec<CompileError>,
  pub warnings: Vec<GenerationWarning>,
  /// Registry aliases referenced by the generated code.
  pub output_names: BTreeSet<String>,
  /// Table entries that came from the document's `components.schemas`.
  pub component_names: IndexSet<String>,
}

impl CompiledDocument {
  /// Table name for a document component or route schema name.
  #[must_use]
  pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
    let name = self.sanitized.get(name).map_or(name, String::as_str);
    self.renames.get(name).map_or(name, String::as_str)
  }

  /// Deduplicated names that are still exported, as `(alias, canonical)` pairs.
  pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .renames
      .iter()
      .filter(|(alias, _)| is_identifier(alias) && !self.table.contains_key(alias.as_str()))
      .map(|(alias, canonical)| (alias.as_str(), canonical.as_str()))
  }
}

#[derive(Debug, Clone)]
pub struct GeneratedOutput {
  pub schemas_ts: String,
  pub types_ts: String,
  pub stats: GenerationStats,
}

/// High-level entry point for compiling one OpenAPI document.
pub struct Orchestrator {
  document: OpenApiDocument,
  registry: SchemaRegistry,
  config: GeneratorConfig,
}

impl Orchestrator {
  /// The registry is frozen from here on: compilation only ever borrows it.
  #[must_use]
  pub fn new(document: OpenApiDocument, registry: SchemaRegistry, config: GeneratorConfig) -> Self {
    Self {
      document,
      registry,
      config,
    }
  }

  #[must_use]
  pub fn document(&self) -> &OpenApiDocument {
    &self.document
  }

  #[must_use]
  pub fn registry(&self) -> &SchemaRegistry {
    &self.registry
  }

  #[must_use]
  pub fn config(&self) -> &GeneratorConfig {
    &self.config
  }

  /// Runs every core pass.
  ///
  /// # Errors
  ///
  /// Fails on the first document-level error: an unsupported OpenAPI version or
  /// schema, or a dangling reference. Route-level errors are collected in
  /// [`CompiledDocument::route_errors`] instead.
  pub fn compile(&self) -> CompileResult<CompiledDocument> {
    if !self.document.openapi.starts_with("3.0") {
      return Err(CompileError::unsupported(
        "#/openapi",
        format!("OpenAPI version '{}' is not 3.0.x", self.document.openapi),
      ));
    }

    let (components, sanitized) = self.parse_components()?;
    let component_names: IndexSet<String> = components.keys().cloned().collect();

    let RouteTable {
      resolution,
      routes,
      errors,
      mut warnings,
    } = if self.config.include_routes {
      build_routes(&self.document, components, &sanitized)?
    } else {
      RouteTable {
        resolution: resolve(components, IndexMap::new())?,
        ..RouteTable::default()
      }
    };
    let Resolution { table, renames, cycles } = resolution;

    warnings.extend(sanitized.iter().map(|(from, to)| GenerationWarning::ComponentRenamed {
      from: from.clone(),
      to: to.clone(),
    }));
    warnings.extend(errors.iter().map(GenerationWarning::from));

    let mut validator_ctx = CompileContext::new(&self.registry);
    let mut type_ctx = TypeContext::new(&self.registry);
    let mut validators = ValidatorSet::new();
    let mut types = IndexMap::with_capacity(table.len());
    for (name, node) in &table {
      validators.insert(name.clone(), compile_validator(node, &mut validator_ctx));
      types.insert(name.clone(), compile_type(node, &mut type_ctx));
    }
    for (alias, canonical) in &renames {
      validators.insert_alias(alias.clone(), canonical.clone());
    }

    let mut output_names = validator_ctx.output_names;
    output_names.extend(type_ctx.output_names);

    Ok(CompiledDocument {
      component_names: component_names
        .into_iter()
        .map(|name| renames.get(&name).cloned().unwrap_or(name))
        .filter(|name| table.contains_key(name))
        .collect(),
      table,
      routes,
      validators,
      types,
      renames,
      sanitized,
      cycles,
      route_errors: errors,
      warnings,
      output_names,
    })
  }

  /// Compiles the document and renders both output files.
  pub fn generate(&self) -> CompileResult<GeneratedOutput> {
    self.render(&FileHeader::default())
  }

  /// Like [`generate`](Self::generate), with an auto-generated header naming the source document.
  pub fn generate_with_header(&self, source_path: &str) -> CompileResult<GeneratedOutput> {
    let info = &self.document.info;
    self.render(&FileHeader {
      title: Some(info.title.clone()).filter(|title| !title.is_empty()),
      version: Some(info.version.clone()).filter(|version| !version.is_empty()),
      description: info.description.clone(),
      source: Some(source_path.to_string()),
    })
  }

  fn render(&self, header: &FileHeader) -> CompileResult<GeneratedOutput> {
    let compiled = self.compile()?;
    let schemas_ts = codegen::render_schemas(&compiled, &self.config, header);
    let types_ts = codegen::render_types(&compiled, &self.config, header);
    let stats = Self::collect_stats(&compiled);
    Ok(GeneratedOutput {
      schemas_ts,
      types_ts,
      stats,
    })
  }

  fn collect_stats(compiled: &CompiledDocument) -> GenerationStats {
    let mut stats = GenerationStats::default();
    for name in compiled.table.keys() {
      stats.record_schema(!compiled.component_names.contains(name));
    }
    stats.record_aliases(compiled.aliases().count());
    stats.record_routes(&compiled.routes);
    stats.record_registry_aliases(compiled.output_names.len());
    stats.record_cycles(compiled.cycles.clone());
    stats.record_warnings(compiled.warnings.iter().cloned());
    stats
  }

  /// Parses `components.schemas`, renaming components whose names are not identifiers.
  fn parse_components(&self) -> CompileResult<(IndexMap<String, SchemaNode>, IndexMap<String, String>)> {
    let schemas = &self.document.components.schemas;

    let mut sanitized: IndexMap<String, String> = IndexMap::new();
    let mut taken: IndexSet<String> = schemas.keys().filter(|name| to_type_name(name) == **name).cloned().collect();
    for name in schemas.keys() {
      if taken.contains(name) {
        continue;
      }
      let renamed = ensure_unique(&to_type_name(name), |candidate| taken.contains(candidate));
      taken.insert(renamed.clone());
      sanitized.insert(name.clone(), renamed);
    }

    let mut components = IndexMap::with_capacity(schemas.len());
    for (name, value) in schemas {
      let pointer = format!("#/components/schemas/{}", escape_pointer_segment(name));
      let mut node = parse_schema(value, &pointer)?;
      if !sanitized.is_empty() {
        node.rewrite_references(&|target: &str| sanitized.get(target).cloned());
      }
      let name = sanitized.get(name).cloned().unwrap_or_else(|| name.clone());
      components.insert(name, node);
    }

    Ok((components, sanitized))
  }
}
