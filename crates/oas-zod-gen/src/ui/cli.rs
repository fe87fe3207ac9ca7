use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::colors::{ColorMode, Colors, ThemeMode};

#[derive(Parser, Debug)]
#[command(name = "oas-zod-gen")]
#[command(author, version, about = "OpenAPI 3.0 to zod and TypeScript compiler")]
#[command(styles = Colors::clap_styles())]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,

  /// Control color output
  #[arg(long, value_enum, default_value = "auto", global = true)]
  pub color: ColorMode,

  /// Terminal theme (dark or light background)
  #[arg(long, value_enum, default_value = "auto", global = true)]
  pub theme: ThemeMode,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// List information from an OpenAPI document
  List {
    #[command(subcommand)]
    list_command: ListCommands,
  },
  /// Generate zod validators and TypeScript types from an OpenAPI document
  Generate(GenerateCommand),
  /// Check every component carrying example fixtures against its compiled validator and type
  Verify(VerifyCommand),
}

#[derive(Args, Debug)]
pub struct GenerateCommand {
  /// Path to the OpenAPI JSON document
  #[arg(short, long, value_name = "FILE")]
  pub input: PathBuf,

  /// Directory where `schemas.ts` and `types.ts` are written
  #[arg(short, long, value_name = "DIR")]
  pub output: PathBuf,

  /// Map a format or primitive to an alias exported by the registry module (e.g. email=Email)
  #[arg(long = "register", value_name = "KEY=ALIAS")]
  pub register: Vec<String>,

  /// JSON object of registry entries, applied before --register
  #[arg(long, value_name = "FILE")]
  pub registry: Option<PathBuf>,

  /// Module the registry aliases are imported from
  #[arg(long, value_name = "MODULE", default_value = "./registry")]
  pub registry_module: String,

  /// Suffix appended to every validator constant
  #[arg(long, value_name = "SUFFIX", default_value = "Schema")]
  pub schema_suffix: String,

  /// Skip the Request and Response lookups
  #[arg(long, default_value_t = false)]
  pub no_routes: bool,

  /// Enable verbose output with detailed progress information
  #[arg(short, long, default_value_t = false)]
  pub verbose: bool,

  /// Suppress non-essential output (errors only)
  #[arg(short, long, default_value_t = false)]
  pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct VerifyCommand {
  /// Path to the OpenAPI JSON document
  #[arg(short, long, value_name = "FILE")]
  pub input: PathBuf,

  /// Vendor name of the fixture extension, read from `x-<VENDOR>-examples`
  #[arg(long, value_name = "VENDOR", default_value = "fixture")]
  pub examples_vendor: String,

  /// Map a format or primitive to a registry alias (e.g. email=Email)
  #[arg(long = "register", value_name = "KEY=ALIAS")]
  pub register: Vec<String>,

  /// JSON object of registry entries, applied before --register
  #[arg(long, value_name = "FILE")]
  pub registry: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ListCommands {
  /// List every route with the schemas bound to it
  Routes {
    /// Path to the OpenAPI JSON document
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,
  },
}
