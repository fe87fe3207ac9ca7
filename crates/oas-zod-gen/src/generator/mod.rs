//! The compiler core: schema parsing, route collection, resolution, validator
//! and type compilation, rendering and round-trip verification.

pub mod codegen;
pub mod error;
pub mod metrics;
pub(crate) mod naming;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod roundtrip;
pub mod routes;
pub mod schema;
pub mod shape;
pub mod types;
pub mod validator;

#[cfg(test)]
mod tests;

pub use orchestrator::{CompiledDocument, GeneratedOutput, GeneratorConfig, Orchestrator};
