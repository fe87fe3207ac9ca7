use std::path::Path;

use anyhow::Context;

use crate::generator::registry::{RegistryKey, SchemaRegistry};

/// Builds the registry before compilation starts: first from an optional JSON
/// file, then from `KEY=ALIAS` pairs given on the command line.
#[derive(Debug, Default)]
pub struct RegistryLoader {
  registry: SchemaRegistry,
}

impl RegistryLoader {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Reads a `{ "KEY": "Alias" }` object.
  pub async fn load_file(mut self, path: &Path) -> anyhow::Result<Self> {
    let content = tokio::fs::read(path)
      .await
      .with_context(|| format!("failed to read registry file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_slice(&content)
      .with_context(|| format!("registry file {} is not valid JSON", path.display()))?;
    self
      .registry
      .extend_from_json(&value)
      .with_context(|| format!("invalid registry file {}", path.display()))?;
    Ok(self)
  }

  pub fn register_all(mut self, entries: &[(String, String)]) -> anyhow::Result<Self> {
    for (key, alias) in entries {
      let key: RegistryKey = key.as_str().into();
      self.registry.register(key, alias.as_str())?;
    }
    Ok(self)
  }

  #[must_use]
  pub fn finish(self) -> SchemaRegistry {
    self.registry
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_file_then_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.json");
    tokio::fs::write(&path, r#"{ "email": "Email", "integer": "Int" }"#).await.unwrap();

    let registry = RegistryLoader::new()
      .load_file(&path)
      .await
      .unwrap()
      .register_all(&[("uuid".to_string(), "Uuid".to_string())])
      .unwrap()
      .finish();

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.lookup_format("email"), Some("Email"));
    assert_eq!(registry.lookup(&RegistryKey::Integer), Some("Int"));
  }

  #[test]
  fn test_conflicting_pair() {
    let result = RegistryLoader::new().register_all(&[
      ("email".to_string(), "Email".to_string()),
      ("email".to_string(), "MailAddress".to_string()),
    ]);
    assert!(result.is_err());
  }
}
