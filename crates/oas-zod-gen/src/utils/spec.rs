use std::path::{Path, PathBuf};

use anyhow::Context;
use fmmap::tokio::{AsyncMmapFile, AsyncMmapFileExt};

use crate::generator::routes::document::OpenApiDocument;

/// Memory-maps an OpenAPI JSON document for parsing.
pub struct SpecLoader {
  path: PathBuf,
  file: AsyncMmapFile,
}

impl SpecLoader {
  pub async fn open(path: &Path) -> anyhow::Result<Self> {
    let file = AsyncMmapFile::open(path)
      .await
      .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Self {
      path: path.to_path_buf(),
      file,
    })
  }

  /// Deserializes the document. Errors name the JSON path of the offending value.
  pub fn parse(&self) -> anyhow::Result<OpenApiDocument> {
    let mut deserializer = serde_json::Deserializer::from_slice(self.file.as_slice());
    let document = serde_path_to_error::deserialize(&mut deserializer)
      .with_context(|| format!("failed to parse OpenAPI document {}", self.path.display()))?;
    Ok(document)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[tokio::test]
  async fn test_parse_document() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"{{"openapi":"3.0.3","info":{{"title":"Pets","version":"1.0.0"}},"paths":{{}}}}"#
    )
    .unwrap();

    let document = SpecLoader::open(file.path()).await.unwrap().parse().unwrap();
    assert_eq!(document.openapi, "3.0.3");
    assert_eq!(document.info.title, "Pets");
  }

  #[tokio::test]
  async fn test_parse_error_names_the_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"openapi":"3.0.3","paths":{{"/pets":{{"get":{{"parameters":[{{"name":1}}]}}}}}}}}"#).unwrap();

    let err = SpecLoader::open(file.path()).await.unwrap().parse().unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("failed to parse OpenAPI document"), "{chain}");
    assert!(chain.contains("paths./pets.get.parameters[0]"), "{chain}");
  }

  #[tokio::test]
  async fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(SpecLoader::open(&dir.path().join("missing.json")).await.is_err());
  }
}
