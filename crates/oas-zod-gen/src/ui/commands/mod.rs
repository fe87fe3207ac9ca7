#![allow(clippy::struct_excessive_bools)]

pub mod generate;
pub mod list;
pub mod verify;

use std::path::Path;

use chrono::{Local, Timelike};

pub use generate::{GenerateConfig, generate_code};
pub use list::list_routes;
pub use verify::verify_fixtures;

use crate::{generator::registry::SchemaRegistry, utils::RegistryLoader};

fn format_timestamp() -> String {
  let now = Local::now();
  format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second())
}

fn parse_registrations(entries: Vec<String>) -> anyhow::Result<Vec<(String, String)>> {
  entries
    .into_iter()
    .map(|entry| {
      let (key, alias) = entry.split_once('=').ok_or_else(|| {
        anyhow::anyhow!("Invalid register format '{entry}': expected KEY=ALIAS (e.g., email=Email)")
      })?;
      Ok((key.to_string(), alias.to_string()))
    })
    .collect()
}

/// Registry file entries first, then `--register` pairs in command line order.
async fn load_registry(file: Option<&Path>, registrations: &[(String, String)]) -> anyhow::Result<SchemaRegistry> {
  let mut loader = RegistryLoader::new();
  if let Some(path) = file {
    loader = loader.load_file(path).await?;
  }
  Ok(loader.register_all(registrations)?.finish())
}
