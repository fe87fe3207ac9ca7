use std::{convert::Infallible, fmt, str::FromStr};

use indexmap::IndexMap;

use crate::generator::{
  error::{CompileError, CompileResult},
  naming::is_identifier,
};

/// What a registry entry replaces: a string `format`, or one of the scalar primitives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegistryKey {
  Format(String),
  Boolean,
  Number,
  Integer,
}

impl From<&str> for RegistryKey {
  /// `boolean`, `number` and `integer` name primitives; anything else is a format.
  /// A `format:` prefix forces the format reading, e.g. `format:number`.
  fn from(s: &str) -> Self {
    match s {
      "boolean" => Self::Boolean,
      "number" => Self::Number,
      "integer" => Self::Integer,
      format => Self::Format(format.strip_prefix("format:").unwrap_or(format).to_string()),
    }
  }
}

impl FromStr for RegistryKey {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self::from(s))
  }
}

impl fmt::Display for RegistryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Format(format) => write!(f, "format '{format}'"),
      Self::Boolean => f.write_str("primitive 'boolean'"),
      Self::Number => f.write_str("primitive 'number'"),
      Self::Integer => f.write_str("primitive 'integer'"),
    }
  }
}

/// Maps custom string formats and scalar primitives to externally defined alias names.
///
/// Both the validator and the type generator consult the same registry, which is
/// what keeps the two outputs naming the same alias. Entries are added before
/// compilation starts; compilation only ever borrows the registry immutably.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRegistry {
  entries: IndexMap<RegistryKey, String>,
}

impl SchemaRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `alias` for `key`.
  ///
  /// Registering the same pair twice is a no-op. Registering a different alias for
  /// an existing key fails with [`CompileError::ConflictingRegistration`].
  pub fn register(&mut self, key: RegistryKey, alias: impl Into<String>) -> CompileResult<()> {
    let alias = alias.into();
    if !is_identifier(&alias) {
      return Err(CompileError::InvalidAlias { alias });
    }

    match self.entries.get(&key) {
      Some(existing) if *existing == alias => Ok(()),
      Some(existing) => Err(CompileError::ConflictingRegistration {
        key: key.to_string(),
        existing: existing.clone(),
        requested: alias,
      }),
      None => {
        self.entries.insert(key, alias);
        Ok(())
      }
    }
  }

  #[must_use]
  pub fn lookup(&self, key: &RegistryKey) -> Option<&str> {
    self.entries.get(key).map(String::as_str)
  }

  #[must_use]
  pub fn lookup_format(&self, format: &str) -> Option<&str> {
    self.lookup(&RegistryKey::Format(format.to_string()))
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&RegistryKey, &str)> {
    self.entries.iter().map(|(key, alias)| (key, alias.as_str()))
  }

  /// Registers every `key -> alias` pair of a flat JSON object, in document order.
  pub fn extend_from_json(&mut self, value: &serde_json::Value) -> CompileResult<()> {
    let Some(map) = value.as_object() else {
      return Err(CompileError::unsupported("#", "registry file must be a JSON object"));
    };

    for (key, alias) in map {
      let Some(alias) = alias.as_str() else {
        return Err(CompileError::unsupported(
          &format!("#/{key}"),
          "registry aliases must be strings",
        ));
      };
      self.register(RegistryKey::from(key.as_str()), alias)?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_register_and_lookup() {
    let mut registry = SchemaRegistry::new();
    registry.register(RegistryKey::Format("email".into()), "Email").unwrap();
    registry.register(RegistryKey::Integer, "Int").unwrap();

    assert_eq!(registry.lookup_format("email"), Some("Email"));
    assert_eq!(registry.lookup(&RegistryKey::Integer), Some("Int"));
    assert_eq!(registry.lookup(&RegistryKey::Number), None);
    assert_eq!(registry.lookup_format("uuid"), None);
  }

  #[test]
  fn test_register_same_pair_is_idempotent() {
    let mut registry = SchemaRegistry::new();
    registry.register(RegistryKey::Boolean, "Flag").unwrap();
    registry.register(RegistryKey::Boolean, "Flag").unwrap();
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn test_conflicting_registration_is_rejected() {
    let mut registry = SchemaRegistry::new();
    registry.register(RegistryKey::Format("date".into()), "IsoDate").unwrap();

    let err = registry
      .register(RegistryKey::Format("date".into()), "CalendarDate")
      .unwrap_err();
    assert_eq!(
      err,
      CompileError::ConflictingRegistration {
        key: "format 'date'".to_string(),
        existing: "IsoDate".to_string(),
        requested: "CalendarDate".to_string(),
      }
    );
    assert_eq!(registry.lookup_format("date"), Some("IsoDate"));
  }

  #[test]
  fn test_invalid_alias_is_rejected() {
    let mut registry = SchemaRegistry::new();
    let err = registry.register(RegistryKey::Number, "not an ident").unwrap_err();
    assert!(matches!(err, CompileError::InvalidAlias { .. }));
    assert!(registry.is_empty());
  }

  #[test]
  fn test_clear_resets_registry() {
    let mut registry = SchemaRegistry::new();
    registry.register(RegistryKey::Number, "Decimal").unwrap();
    registry.clear();
    assert!(registry.is_empty());
    registry.register(RegistryKey::Number, "Float").unwrap();
    assert_eq!(registry.lookup(&RegistryKey::Number), Some("Float"));
  }

  #[test]
  fn test_key_parsing() {
    assert_eq!("boolean".parse::<RegistryKey>(), Ok(RegistryKey::Boolean));
    assert_eq!("integer".parse::<RegistryKey>(), Ok(RegistryKey::Integer));
    assert_eq!("email".parse::<RegistryKey>(), Ok(RegistryKey::Format("email".into())));
    assert_eq!("format:number".parse::<RegistryKey>(), Ok(RegistryKey::Format("number".into())));
  }

  #[test]
  fn test_extend_from_json() {
    let mut registry = SchemaRegistry::new();
    registry
      .extend_from_json(&json!({ "email": "Email", "integer": "Int" }))
      .unwrap();
    assert_eq!(registry.lookup_format("email"), Some("Email"));
    assert_eq!(registry.lookup(&RegistryKey::Integer), Some("Int"));

    assert!(registry.extend_from_json(&json!({ "email": "Other" })).is_err());
    assert!(registry.extend_from_json(&json!(["email"])).is_err());
  }
}
