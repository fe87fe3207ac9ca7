use thiserror::Error;

use crate::generator::routes::path_template::PathParseError;

pub type CompileResult<T> = Result<T, CompileError>;

/// Everything that can stop a document from compiling.
///
/// Schema, registry and reference errors are fatal for the whole document.
/// Route errors are collected per route by the route table builder and never
/// abort sibling routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
  #[error("unsupported schema at '{pointer}': {reason}")]
  UnsupportedSchema { pointer: String, reason: String },

  #[error("{key} is already registered as '{existing}', cannot register '{requested}'")]
  ConflictingRegistration {
    key: String,
    existing: String,
    requested: String,
  },

  #[error("registry alias '{alias}' is not a valid identifier")]
  InvalidAlias { alias: String },

  #[error("schema '{from}' references undefined schema '{target}'")]
  DanglingReference { from: String, target: String },

  #[error("{method} {path}: placeholders [{}] are not declared as path parameters", .missing.join(", "))]
  PathParameterMismatch {
    method: String,
    path: String,
    missing: Vec<String>,
  },

  #[error("{method} {path}: invalid path template: {source}")]
  InvalidPathTemplate {
    method: String,
    path: String,
    source: PathParseError,
  },

  #[error("{method} {path}: cannot resolve '{reference}'")]
  UnresolvedComponent {
    method: String,
    path: String,
    reference: String,
  },

  #[error("failed to canonicalize schema: {0}")]
  Canonicalization(String),

  #[error("round trip mismatch for '{schema}': {detail}")]
  RoundTripMismatch { schema: String, detail: String },
}

impl CompileError {
  pub(crate) fn unsupported(pointer: &str, reason: impl Into<String>) -> Self {
    Self::UnsupportedSchema {
      pointer: pointer.to_string(),
      reason: reason.into(),
    }
  }

  pub(crate) fn mismatch(schema: &str, detail: impl Into<String>) -> Self {
    Self::RoundTripMismatch {
      schema: schema.to_string(),
      detail: detail.into(),
    }
  }

  /// Route-scoped errors drop a single route; everything else fails the document.
  #[must_use]
  pub fn is_route_scoped(&self) -> bool {
    matches!(
      self,
      Self::PathParameterMismatch { .. } | Self::InvalidPathTemplate { .. } | Self::UnresolvedComponent { .. }
    )
  }
}
