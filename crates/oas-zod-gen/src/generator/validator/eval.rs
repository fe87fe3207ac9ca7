//! Reference semantics of the emitted zod expressions, used by the round-trip verifier.

use std::{collections::HashMap, ptr};

use regex::Regex;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::{NumberValidator, ObjectExtras, ObjectField, StringValidator, ValidatorExpr, ValidatorSet, formats::FormatCheck};
use crate::generator::schema::{COMPONENT_REF_PREFIX, Discriminator};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {kind}")]
pub struct ValidationIssue {
  pub path: String,
  pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueKind {
  #[error("expected {expected}, found {found}")]
  InvalidType { expected: &'static str, found: &'static str },
  #[error("must contain at least {0} characters")]
  TooShort(u64),
  #[error("must contain at most {0} characters")]
  TooLong(u64),
  #[error("does not match pattern {0}")]
  PatternMismatch(String),
  #[error("pattern {pattern} cannot be evaluated: {reason}")]
  InvalidPattern { pattern: String, reason: String },
  #[error("is not a valid {0}")]
  InvalidFormat(String),
  #[error("is not one of the allowed values")]
  NotAllowed,
  #[error("must be an integer")]
  NotInteger,
  #[error("must be {comparison} {bound}")]
  OutOfRange { comparison: &'static str, bound: String },
  #[error("must be a multiple of {0}")]
  NotMultipleOf(String),
  #[error("must contain at least {0} items")]
  TooFewItems(u64),
  #[error("must contain at most {0} items")]
  TooManyItems(u64),
  #[error("missing required property '{0}'")]
  MissingProperty(String),
  #[error("unexpected property '{0}'")]
  UnexpectedProperty(String),
  #[error("does not match any union member")]
  NoMatchingMember,
  #[error("discriminator '{0}' does not select a union member")]
  UnknownDiscriminator(String),
  #[error("references unknown schema '{0}'")]
  UnknownSchema(String),
  #[error("reference cycle through '{0}' never reaches a concrete validator")]
  CyclicReference(String),
}

impl ValidatorExpr {
  /// Checks `value` the way the rendered zod schema would, resolving references through `schemas`.
  pub fn validate(&self, value: &Value, schemas: &ValidatorSet) -> Result<(), ValidationIssue> {
    Evaluator::new(schemas).check(self, value, "$")
  }
}

struct Evaluator<'a> {
  schemas: &'a ValidatorSet,
  active_refs: Vec<(String, *const Value)>,
  patterns: HashMap<String, Result<Regex, String>>,
}

impl<'a> Evaluator<'a> {
  fn new(schemas: &'a ValidatorSet) -> Self {
    Self {
      schemas,
      active_refs: vec![],
      patterns: HashMap::new(),
    }
  }

  fn check(&mut self, expr: &ValidatorExpr, value: &Value, path: &str) -> Result<(), ValidationIssue> {
    let fail = |kind: IssueKind| -> Result<(), ValidationIssue> {
      Err(ValidationIssue {
        path: path.to_string(),
        kind,
      })
    };

    match expr {
      ValidatorExpr::String(string) => match value {
        Value::String(s) => self.check_string(string, s).map_or(Ok(()), fail),
        other => fail(type_mismatch("string", other)),
      },
      ValidatorExpr::Number(number) => match value {
        Value::Number(n) => check_number(number, n).map_or(Ok(()), fail),
        other => fail(type_mismatch(if number.integer { "integer" } else { "number" }, other)),
      },
      ValidatorExpr::Boolean => match value {
        Value::Bool(_) => Ok(()),
        other => fail(type_mismatch("boolean", other)),
      },
      ValidatorExpr::Null => match value {
        Value::Null => Ok(()),
        other => fail(type_mismatch("null", other)),
      },
      ValidatorExpr::Unknown => Ok(()),
      ValidatorExpr::Enum { values, .. } => match value {
        Value::String(s) if values.contains(s) => Ok(()),
        Value::String(_) => fail(IssueKind::NotAllowed),
        other => fail(type_mismatch("string", other)),
      },
      ValidatorExpr::Literals { values, .. } => match value {
        Value::Number(n) if values.iter().any(|v| numbers_equal(v, n)) => Ok(()),
        Value::Number(_) => fail(IssueKind::NotAllowed),
        other => fail(type_mismatch("number", other)),
      },
      ValidatorExpr::Array {
        item,
        min_items,
        max_items,
      } => {
        let Value::Array(items) = value else {
          return fail(type_mismatch("array", value));
        };
        let len = items.len() as u64;
        if let Some(min) = min_items
          && len < *min
        {
          return fail(IssueKind::TooFewItems(*min));
        }
        if let Some(max) = max_items
          && len > *max
        {
          return fail(IssueKind::TooManyItems(*max));
        }
        items
          .iter()
          .enumerate()
          .try_for_each(|(i, element)| self.check(item, element, &format!("{path}[{i}]")))
      }
      ValidatorExpr::Object { fields, extras } => {
        let Value::Object(map) = value else {
          return fail(type_mismatch("object", value));
        };
        self.check_object(fields, extras, map, path)
      }
      ValidatorExpr::Union {
        members, discriminator, ..
      } => {
        if let (Some(discriminator), [_, _, ..]) = (discriminator, members.as_slice()) {
          return self.check_discriminated(members, discriminator, value, path);
        }
        for member in members {
          if self.check(member, value, path).is_ok() {
            return Ok(());
          }
        }
        fail(IssueKind::NoMatchingMember)
      }
      ValidatorExpr::Intersection { members, .. } => members.iter().try_for_each(|m| self.check(m, value, path)),
      ValidatorExpr::Ref(name) => {
        let schemas = self.schemas;
        let Some(target) = schemas.get(name) else {
          return fail(IssueKind::UnknownSchema(name.clone()));
        };
        let frame = (name.clone(), ptr::from_ref(value));
        if self.active_refs.contains(&frame) {
          return fail(IssueKind::CyclicReference(name.clone()));
        }
        self.active_refs.push(frame);
        let result = self.check(target, value, path);
        self.active_refs.pop();
        result
      }
      ValidatorExpr::Alias { base, .. } => self.check(base, value, path),
      ValidatorExpr::Nullable(inner) => match value {
        Value::Null => Ok(()),
        _ => self.check(inner, value, path),
      },
    }
  }

  /// Selects the member by its tag before checking it, the way `z.discriminatedUnion` does.
  fn check_discriminated(
    &mut self,
    members: &[ValidatorExpr],
    discriminator: &Discriminator,
    value: &Value,
    path: &str,
  ) -> Result<(), ValidationIssue> {
    let fail = |kind: IssueKind| -> Result<(), ValidationIssue> {
      Err(ValidationIssue {
        path: path.to_string(),
        kind,
      })
    };

    let Value::Object(map) = value else {
      return fail(type_mismatch("object", value));
    };
    let tag = map.get(&discriminator.property_name).and_then(Value::as_str);
    let selected = tag.and_then(|tag| {
      members
        .iter()
        .find(|member| member_tags(self.schemas, member, discriminator).iter().any(|t| t == tag))
    });
    match selected {
      Some(member) => self.check(member, value, path),
      None => fail(IssueKind::UnknownDiscriminator(discriminator.property_name.clone())),
    }
  }

  fn check_string(&mut self, string: &StringValidator, s: &str) -> Option<IssueKind> {
    // zod measures `.length` in UTF-16 code units
    let len = s.encode_utf16().count() as u64;
    if let Some(min) = string.min_length
      && len < min
    {
      return Some(IssueKind::TooShort(min));
    }
    if let Some(max) = string.max_length
      && len > max
    {
      return Some(IssueKind::TooLong(max));
    }
    if let Some(format) = &string.format
      && let Some(check) = FormatCheck::from_format(format)
      && !check.accepts(s)
    {
      return Some(IssueKind::InvalidFormat(format.clone()));
    }
    if let Some(pattern) = &string.pattern {
      let compiled = self
        .patterns
        .entry(pattern.clone())
        .or_insert_with(|| Regex::new(pattern).map_err(|e| e.to_string()));
      match compiled {
        Ok(regex) if !regex.is_match(s) => return Some(IssueKind::PatternMismatch(pattern.clone())),
        Ok(_) => {}
        Err(reason) => {
          return Some(IssueKind::InvalidPattern {
            pattern: pattern.clone(),
            reason: reason.clone(),
          });
        }
      }
    }
    None
  }

  fn check_object(
    &mut self,
    fields: &[ObjectField],
    extras: &ObjectExtras,
    map: &Map<String, Value>,
    path: &str,
  ) -> Result<(), ValidationIssue> {
    for field in fields {
      let field_path = format!("{path}.{}", field.name);
      match map.get(&field.name) {
        Some(property) => self.check(&field.validator, property, &field_path)?,
        None if field.optional => {}
        None => {
          return Err(ValidationIssue {
            path: path.to_string(),
            kind: IssueKind::MissingProperty(field.name.clone()),
          });
        }
      }
    }

    for (key, property) in map {
      if fields.iter().any(|f| f.name == *key) {
        continue;
      }
      match extras {
        ObjectExtras::Strip | ObjectExtras::Passthrough => {}
        ObjectExtras::Strict => {
          return Err(ValidationIssue {
            path: path.to_string(),
            kind: IssueKind::UnexpectedProperty(key.clone()),
          });
        }
        ObjectExtras::Catchall(extra) => self.check(extra, property, &format!("{path}.{key}"))?,
      }
    }

    Ok(())
  }
}

/// Tags that select `member`: the literal values of its discriminator
/// property, or else the mapping entries naming it, or else its component name.
fn member_tags(schemas: &ValidatorSet, member: &ValidatorExpr, discriminator: &Discriminator) -> Vec<String> {
  let tags = literal_tags(schemas, member, &discriminator.property_name, &mut vec![]);
  if !tags.is_empty() {
    return tags;
  }
  let ValidatorExpr::Ref(name) = member else {
    return tags;
  };

  let mapped: Vec<String> = discriminator
    .mapping
    .iter()
    .filter(|(_, target)| target.strip_prefix(COMPONENT_REF_PREFIX).unwrap_or(target.as_str()) == name.as_str())
    .map(|(tag, _)| tag.clone())
    .collect();
  if mapped.is_empty() { vec![name.clone()] } else { mapped }
}

fn literal_tags(schemas: &ValidatorSet, expr: &ValidatorExpr, property: &str, visiting: &mut Vec<String>) -> Vec<String> {
  match expr {
    ValidatorExpr::Object { fields, .. } => fields
      .iter()
      .find(|field| field.name == property)
      .map(|field| enum_values(&field.validator))
      .unwrap_or_default(),
    ValidatorExpr::Intersection { members, .. } => members
      .iter()
      .flat_map(|m| literal_tags(schemas, m, property, visiting))
      .collect(),
    ValidatorExpr::Ref(name) if !visiting.contains(name) => {
      visiting.push(name.clone());
      schemas
        .get(name)
        .map(|target| literal_tags(schemas, target, property, visiting))
        .unwrap_or_default()
    }
    ValidatorExpr::Alias { base, .. } | ValidatorExpr::Nullable(base) => literal_tags(schemas, base, property, visiting),
    _ => vec![],
  }
}

fn enum_values(expr: &ValidatorExpr) -> Vec<String> {
  match expr {
    ValidatorExpr::Enum { values, .. } => values.clone(),
    ValidatorExpr::Alias { base, .. } | ValidatorExpr::Nullable(base) => enum_values(base),
    _ => vec![],
  }
}

fn check_number(number: &NumberValidator, n: &Number) -> Option<IssueKind> {
  let value = n.as_f64()?;
  if number.integer && !is_integral(n) {
    return Some(IssueKind::NotInteger);
  }
  if let Some(minimum) = &number.minimum
    && let Some(bound) = minimum.as_f64()
  {
    let (below, comparison) = if number.exclusive_minimum {
      (value <= bound, "greater than")
    } else {
      (value < bound, "greater than or equal to")
    };
    if below {
      return Some(IssueKind::OutOfRange {
        comparison,
        bound: minimum.to_string(),
      });
    }
  }
  if let Some(maximum) = &number.maximum
    && let Some(bound) = maximum.as_f64()
  {
    let (above, comparison) = if number.exclusive_maximum {
      (value >= bound, "less than")
    } else {
      (value > bound, "less than or equal to")
    };
    if above {
      return Some(IssueKind::OutOfRange {
        comparison,
        bound: maximum.to_string(),
      });
    }
  }
  if let Some(multiple_of) = &number.multiple_of
    && !is_multiple_of(n, multiple_of)
  {
    return Some(IssueKind::NotMultipleOf(multiple_of.to_string()));
  }
  None
}

fn is_integral(n: &Number) -> bool {
  n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
}

fn is_multiple_of(n: &Number, divisor: &Number) -> bool {
  if let (Some(n), Some(d)) = (n.as_i64(), divisor.as_i64())
    && d != 0
  {
    return n % d == 0;
  }
  match (n.as_f64(), divisor.as_f64()) {
    (Some(n), Some(d)) if d != 0.0 => {
      let quotient = n / d;
      (quotient - quotient.round()).abs() < 1e-9
    }
    _ => false,
  }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
  a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
}

fn type_mismatch(expected: &'static str, found: &Value) -> IssueKind {
  IssueKind::InvalidType {
    expected,
    found: json_type(found),
  }
}

const fn json_type(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}
