use std::fmt::Write as _;

use super::{FileHeader, named_import};
use crate::generator::orchestrator::{CompiledDocument, GeneratorConfig};

/// Renders `types.ts`: one `type` per table entry followed by the deduplication aliases.
#[must_use]
pub fn render_types(compiled: &CompiledDocument, config: &GeneratorConfig, header: &FileHeader) -> String {
  let mut out = header.render();
  if let Some(import) = named_import(
    "import type",
    compiled.output_names.iter().map(String::as_str),
    &config.registry_module,
  ) {
    out.push_str(&import);
    out.push('\n');
  }

  let mut body = String::new();
  for (name, ty) in &compiled.types {
    let _ = writeln!(body, "export type {name} = {};\n", ty.render());
  }
  for (alias, canonical) in compiled.aliases() {
    let _ = writeln!(body, "export type {alias} = {canonical};\n");
  }

  out.push_str(body.trim_end());
  out.push('\n');
  out
}
