//! Rendering of the compiled document into TypeScript source files.

mod types;
mod validators;

pub use types::render_types;
pub use validators::render_schemas;

/// Text for the comment block at the top of every generated file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHeader {
  pub title: Option<String>,
  pub version: Option<String>,
  pub description: Option<String>,
  pub source: Option<String>,
}

impl FileHeader {
  fn render(&self) -> String {
    let mut lines = vec!["AUTO-GENERATED CODE - DO NOT EDIT!".to_string(), String::new()];
    if let Some(title) = &self.title {
      lines.push(title.clone());
    }
    if let Some(source) = &self.source {
      lines.push(format!("Source: {source}"));
    }
    if let Some(version) = &self.version {
      lines.push(format!("Version: {version}"));
    }
    lines.push("Generated by `oas-zod-gen`".to_string());
    if let Some(description) = &self.description {
      lines.push(String::new());
      lines.extend(description.lines().map(str::to_string));
    }

    let mut out: String = lines
      .iter()
      .map(|line| if line.is_empty() { "//\n".to_string() } else { format!("// {line}\n") })
      .collect();
    out.push('\n');
    out
  }
}

/// `import { a, b } from "module";`, or nothing when there is nothing to import.
fn named_import<'a>(keyword: &str, names: impl IntoIterator<Item = &'a str>, module: &str) -> Option<String> {
  let names: Vec<&str> = names.into_iter().collect();
  if names.is_empty() {
    return None;
  }
  Some(format!(
    "{keyword} {{ {} }} from {};\n",
    names.join(", "),
    crate::generator::naming::quote(module)
  ))
}
