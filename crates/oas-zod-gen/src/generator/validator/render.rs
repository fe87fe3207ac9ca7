use std::collections::HashSet;

use itertools::Itertools;
use serde_json::Number;

use super::{NumberValidator, ObjectExtras, StringValidator, ValidatorExpr, formats::FormatCheck};
use crate::generator::naming::{property_key, quote};

/// Naming and ordering information needed to print references.
///
/// A reference to a schema that has not been declared yet (a forward or cyclic
/// reference) is wrapped in `z.lazy`.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
  suffix: &'a str,
  declared: HashSet<String>,
  assume_declared: bool,
}

impl<'a> RenderContext<'a> {
  #[must_use]
  pub fn new(suffix: &'a str) -> Self {
    Self {
      suffix,
      declared: HashSet::new(),
      assume_declared: false,
    }
  }

  /// Every reference is treated as already declared, so none are wrapped in `z.lazy`.
  #[must_use]
  pub fn eager(suffix: &'a str) -> Self {
    Self {
      assume_declared: true,
      ..Self::new(suffix)
    }
  }

  pub fn declare(&mut self, name: &str) {
    self.declared.insert(name.to_string());
  }

  #[must_use]
  pub fn schema_name(&self, name: &str) -> String {
    format!("{name}{}", self.suffix)
  }

  fn is_declared(&self, name: &str) -> bool {
    self.assume_declared || self.declared.contains(name)
  }
}

impl ValidatorExpr {
  #[must_use]
  pub fn render(&self, ctx: &RenderContext<'_>) -> String {
    self.render_at(ctx, 0)
  }

  /// True when the rendered expression reads a schema that is not declared yet.
  #[must_use]
  pub fn needs_lazy(&self, ctx: &RenderContext<'_>) -> bool {
    match self {
      Self::Ref(name) => !ctx.is_declared(name),
      Self::Array { item, .. } => item.needs_lazy(ctx),
      Self::Object { fields, extras } => {
        fields.iter().any(|f| f.validator.needs_lazy(ctx))
          || matches!(extras, ObjectExtras::Catchall(extra) if extra.needs_lazy(ctx))
      }
      Self::Union { members, .. } | Self::Intersection { members, .. } => members.iter().any(|m| m.needs_lazy(ctx)),
      Self::Nullable(inner) => inner.needs_lazy(ctx),
      _ => false,
    }
  }

  fn render_at(&self, ctx: &RenderContext<'_>, indent: usize) -> String {
    match self {
      Self::String(string) => render_string(string),
      Self::Number(number) => render_number(number),
      Self::Boolean => "z.boolean()".to_string(),
      Self::Null => "z.null()".to_string(),
      Self::Unknown => "z.unknown()".to_string(),
      Self::Enum { values, .. } => format!("z.enum([{}])", values.iter().map(|v| quote(v)).join(", ")),
      Self::Literals { values, .. } => match values.as_slice() {
        [single] => format!("z.literal({single})"),
        _ => format!(
          "z.union([{}])",
          values.iter().map(|v| format!("z.literal({v})")).join(", ")
        ),
      },
      Self::Array {
        item,
        min_items,
        max_items,
      } => {
        let mut out = format!("z.array({})", item.render_at(ctx, indent));
        push_bound(&mut out, "min", *min_items);
        push_bound(&mut out, "max", *max_items);
        out
      }
      Self::Object { fields, extras } => {
        let mut out = if fields.is_empty() {
          "z.object({})".to_string()
        } else {
          let pad = "  ".repeat(indent + 1);
          let body = fields
            .iter()
            .map(|field| {
              let optional = if field.optional { ".optional()" } else { "" };
              format!(
                "{pad}{}: {}{optional},\n",
                property_key(&field.name),
                field.validator.render_at(ctx, indent + 1)
              )
            })
            .join("");
          format!("z.object({{\n{body}{}}})", "  ".repeat(indent))
        };
        match extras {
          ObjectExtras::Strip => {}
          ObjectExtras::Passthrough => out.push_str(".passthrough()"),
          ObjectExtras::Strict => out.push_str(".strict()"),
          ObjectExtras::Catchall(extra) => out.push_str(&format!(".catchall({})", extra.render_at(ctx, indent))),
        }
        out
      }
      Self::Union {
        members, discriminator, ..
      } => {
        if let [single] = members.as_slice() {
          return single.render_at(ctx, indent);
        }
        // zod reads the options of a discriminated union eagerly, so a lazy member needs a plain union
        let lazy = members.iter().any(|m| m.needs_lazy(ctx));
        let rendered = members.iter().map(|m| m.render_at(ctx, indent)).join(", ");
        match discriminator {
          Some(discriminator) if !lazy => format!(
            "z.discriminatedUnion({}, [{rendered}])",
            quote(&discriminator.property_name)
          ),
          _ => format!("z.union([{rendered}])"),
        }
      }
      Self::Intersection { members, .. } => members
        .iter()
        .map(|m| m.render_at(ctx, indent))
        .reduce(|acc, next| format!("z.intersection({acc}, {next})"))
        .unwrap_or_else(|| "z.unknown()".to_string()),
      Self::Ref(name) => {
        let schema = ctx.schema_name(name);
        if ctx.is_declared(name) {
          schema
        } else {
          format!("z.lazy(() => {schema})")
        }
      }
      Self::Alias { name, .. } => name.clone(),
      Self::Nullable(inner) => format!("{}.nullable()", inner.render_at(ctx, indent)),
    }
  }
}

fn render_string(string: &StringValidator) -> String {
  let mut out = "z.string()".to_string();
  let check = string.format.as_deref().and_then(FormatCheck::from_format);
  if let Some(check) = check {
    out.push_str(check.refinement());
  }
  push_bound(&mut out, "min", string.min_length);
  push_bound(&mut out, "max", string.max_length);
  if let Some(pattern) = &string.pattern {
    out.push_str(&format!(".regex(new RegExp({}))", quote(pattern)));
  }
  if let Some(format) = &string.format
    && check.is_none_or(|check| check.implied_format() != format)
  {
    push_format_metadata(&mut out, format);
  }
  out
}

fn render_number(number: &NumberValidator) -> String {
  let mut out = "z.number()".to_string();
  if number.integer {
    out.push_str(".int()");
  }
  push_number(&mut out, if number.exclusive_minimum { "gt" } else { "gte" }, number.minimum.as_ref());
  push_number(&mut out, if number.exclusive_maximum { "lt" } else { "lte" }, number.maximum.as_ref());
  push_number(&mut out, "multipleOf", number.multiple_of.as_ref());
  if let Some(format) = &number.format {
    push_format_metadata(&mut out, format);
  }
  out
}

fn push_bound(out: &mut String, method: &str, bound: Option<u64>) {
  if let Some(bound) = bound {
    out.push_str(&format!(".{method}({bound})"));
  }
}

fn push_number(out: &mut String, method: &str, bound: Option<&Number>) {
  if let Some(bound) = bound {
    out.push_str(&format!(".{method}({bound})"));
  }
}

/// Formats zod cannot express are carried as OpenAPI metadata so they survive a round trip.
fn push_format_metadata(out: &mut String, format: &str) {
  out.push_str(&format!(".openapi({{ format: {} }})", quote(format)));
}
