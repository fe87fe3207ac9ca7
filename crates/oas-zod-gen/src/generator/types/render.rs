use itertools::Itertools;

use super::TsType;
use crate::generator::naming::{property_key, quote};

impl TsType {
  #[must_use]
  pub fn render(&self) -> String {
    self.render_at(0)
  }

  fn render_at(&self, indent: usize) -> String {
    match self {
      Self::String => "string".to_string(),
      Self::Number => "number".to_string(),
      Self::Boolean => "boolean".to_string(),
      Self::Null => "null".to_string(),
      Self::Unknown => "unknown".to_string(),
      Self::StringLiterals(values) => values.iter().map(|v| quote(v)).join(" | "),
      Self::NumberLiterals(values) => values.iter().join(" | "),
      Self::Array(item) => format!("Array<{}>", item.render_at(indent)),
      Self::Object { properties, index } => {
        let index = index.as_ref().map(|ty| format!("Record<string, {}>", ty.render_at(indent)));
        if properties.is_empty() {
          return index.unwrap_or_else(|| "{}".to_string());
        }

        let pad = "  ".repeat(indent + 1);
        let body = properties
          .iter()
          .map(|property| {
            let optional = if property.optional { "?" } else { "" };
            format!(
              "{pad}{}{optional}: {};\n",
              property_key(&property.name),
              property.ty.render_at(indent + 1)
            )
          })
          .join("");
        let object = format!("{{\n{body}{}}}", "  ".repeat(indent));
        match index {
          Some(index) => format!("{object} & {index}"),
          None => object,
        }
      }
      Self::Union(members) => members.iter().map(|m| m.render_member(indent)).join(" | "),
      Self::Intersection(members) => members.iter().map(|m| m.render_member(indent)).join(" & "),
      Self::Ref(name) | Self::Alias(name) => name.clone(),
      Self::Nullable(inner) => format!("{} | null", inner.render_member(indent)),
    }
  }

  /// Renders an operand of `|` or `&`, parenthesizing compound types.
  fn render_member(&self, indent: usize) -> String {
    let rendered = self.render_at(indent);
    if self.is_compound() {
      format!("({rendered})")
    } else {
      rendered
    }
  }

  fn is_compound(&self) -> bool {
    match self {
      Self::Union(_) | Self::Intersection(_) | Self::Nullable(_) => true,
      Self::StringLiterals(values) => values.len() > 1,
      Self::NumberLiterals(values) => values.len() > 1,
      Self::Object { properties, index } => !properties.is_empty() && index.is_some(),
      _ => false,
    }
  }
}
