#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
//! Compiles OpenAPI 3.0 component and route schemas into zod validators and
//! TypeScript type declarations, and verifies that the pair round-trips back to
//! the schema it came from.

pub mod generator;
pub mod utils;

pub use generator::{
  CompiledDocument, GeneratorConfig, Orchestrator,
  error::{CompileError, CompileResult},
  registry::{RegistryKey, SchemaRegistry},
};
