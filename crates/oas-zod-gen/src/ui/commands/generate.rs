use std::path::PathBuf;

use anyhow::Context;
use crossterm::style::Stylize;

use super::{format_timestamp, load_registry, parse_registrations};
use crate::{
  generator::{
    metrics::GenerationStats,
    orchestrator::{GeneratedOutput, GeneratorConfig, Orchestrator},
    registry::SchemaRegistry,
  },
  ui::{Colors, GenerateCommand},
  utils::SpecLoader,
};

#[derive(Debug, Clone)]
pub struct GenerateConfig {
  pub input: PathBuf,
  pub output: PathBuf,
  pub registry_file: Option<PathBuf>,
  /// `KEY=ALIAS` pairs in command line order.
  pub registrations: Vec<(String, String)>,
  pub registry_module: String,
  pub schema_suffix: String,
  pub include_routes: bool,
  pub verbose: bool,
  pub quiet: bool,
}

impl GenerateConfig {
  pub fn from_command(command: GenerateCommand) -> anyhow::Result<Self> {
    let GenerateCommand {
      input,
      output,
      register,
      registry,
      registry_module,
      schema_suffix,
      no_routes,
      verbose,
      quiet,
    } = command;

    Ok(Self {
      input,
      output,
      registry_file: registry,
      registrations: parse_registrations(register)?,
      registry_module,
      schema_suffix,
      include_routes: !no_routes,
      verbose,
      quiet,
    })
  }

  fn generator_config(&self) -> GeneratorConfig {
    GeneratorConfig::builder()
      .schema_suffix(self.schema_suffix.clone())
      .registry_module(self.registry_module.clone())
      .include_routes(self.include_routes)
      .build()
  }

  async fn build_registry(&self) -> anyhow::Result<SchemaRegistry> {
    load_registry(self.registry_file.as_deref(), &self.registrations).await
  }

  async fn write_output(&self, output: &GeneratedOutput) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&self.output)
      .await
      .with_context(|| format!("failed to create {}", self.output.display()))?;
    tokio::fs::write(self.output.join("schemas.ts"), &output.schemas_ts).await?;
    tokio::fs::write(self.output.join("types.ts"), &output.types_ts).await?;
    Ok(())
  }
}

struct GenerateLogger<'a> {
  config: &'a GenerateConfig,
  colors: &'a Colors,
}

impl<'a> GenerateLogger<'a> {
  fn new(config: &'a GenerateConfig, colors: &'a Colors) -> Self {
    Self { config, colors }
  }

  fn info(&self, message: &str) {
    if !self.config.quiet {
      println!("{} {message}", format_timestamp().with(self.colors.timestamp()));
    }
  }

  fn stat(&self, label: &str, value: String) {
    if !self.config.quiet {
      println!(
        "            {:<25} {}",
        label.with(self.colors.label()),
        value.with(self.colors.value())
      );
    }
  }

  fn log_loading(&self) {
    self.info(
      &format!("Loading OpenAPI document from: {}", self.config.input.display())
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn log_registry(&self, registry: &SchemaRegistry) {
    if !self.config.verbose || registry.is_empty() {
      return;
    }
    self.info(
      &format!("Registry has {} aliases", registry.len())
        .with(self.colors.primary())
        .to_string(),
    );
    for (key, alias) in registry.iter() {
      self.stat("", format!("{key} -> {alias}"));
    }
  }

  fn log_generating(&self) {
    self.info(&"Compiling zod validators and TypeScript types...".with(self.colors.primary()).to_string());
  }

  fn print_statistics(&self, stats: &GenerationStats) {
    if self.config.quiet {
      return;
    }

    self.stat("Schemas generated:", stats.schemas_generated.to_string());
    if stats.route_schemas_generated > 0 {
      self.stat("", format!("{} from routes", stats.route_schemas_generated));
    }
    if stats.aliases_generated > 0 {
      self.stat("", format!("{} aliases", stats.aliases_generated));
    }
    if self.config.include_routes {
      self.stat("Routes converted:", stats.routes_converted.to_string());
      self.stat("", format!("{} responses", stats.responses_converted));
    }
    if stats.registry_aliases_used > 0 {
      self.stat("Registry aliases used:", stats.registry_aliases_used.to_string());
    }
    if !stats.warnings.is_empty() {
      self.stat("Warnings:", stats.warnings.len().to_string());
    }

    self.print_cycles(stats);
    self.print_warnings(stats);
  }

  fn print_cycles(&self, stats: &GenerationStats) {
    if stats.cycles_detected == 0 {
      return;
    }

    self.stat("Cycles:", stats.cycles_detected.to_string());

    if self.config.verbose {
      for (i, cycle) in stats.cycle_details.iter().enumerate() {
        println!(
          "              {}: {}",
          format!("Cycle {}", i + 1).with(self.colors.accent()),
          cycle.join(" -> ").with(self.colors.info())
        );
      }
    }
  }

  fn print_warnings(&self, stats: &GenerationStats) {
    let mut printed_header = false;
    for warning in &stats.warnings {
      if !warning.is_skipped_item() && !self.config.verbose {
        continue;
      }

      if !printed_header {
        println!();
        printed_header = true;
      }

      let prefix = if warning.is_skipped_item() { "Skipped:" } else { "Warning:" };
      eprintln!(
        "{} {}",
        prefix.with(self.colors.accent()),
        warning.to_string().with(self.colors.primary())
      );
    }
  }

  fn log_writing(&self) {
    self.info(
      &format!("Writing to: {}", self.config.output.display())
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn log_success(&self) {
    if !self.config.quiet {
      println!();
      println!(
        "{} {}",
        format_timestamp().with(self.colors.timestamp()),
        "Successfully generated schemas.ts and types.ts".with(self.colors.success())
      );
    }
  }
}

pub async fn generate_code(config: GenerateConfig, colors: &Colors) -> anyhow::Result<()> {
  let logger = GenerateLogger::new(&config, colors);

  logger.log_loading();
  let document = SpecLoader::open(&config.input).await?.parse()?;
  let registry = config.build_registry().await?;
  logger.log_registry(&registry);

  logger.log_generating();
  let orchestrator = Orchestrator::new(document, registry, config.generator_config());
  let source_path = config.input.display().to_string();
  let output = orchestrator
    .generate_with_header(&source_path)
    .with_context(|| format!("failed to compile {source_path}"))?;
  logger.print_statistics(&output.stats);

  logger.log_writing();
  config.write_output(&output).await?;

  logger.log_success();
  Ok(())
}
