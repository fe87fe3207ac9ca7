//! Validator expressions.
//!
//! [`compile_validator`] lowers a [`SchemaNode`] into a [`ValidatorExpr`], a
//! small AST over the zod API. The same AST is rendered to TypeScript
//! ([`render`]), evaluated against JSON values ([`eval`]) and decompiled back
//! into a schema node ([`decompile`]).

pub mod decompile;
pub mod eval;
mod formats;
pub mod render;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Number;

pub use eval::{IssueKind, ValidationIssue};
pub use render::RenderContext;

use crate::generator::{
  registry::{RegistryKey, SchemaRegistry},
  schema::{
    AdditionalProperties, Discriminator, NumberSchema, ObjectSchema, SchemaKind, SchemaNode, StringSchema, UnionKeyword,
  },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorExpr {
  String(StringValidator),
  Number(NumberValidator),
  Boolean,
  Null,
  Unknown,
  /// `constraints` are dominated by the enum. They take no part in validation
  /// and are only kept for decompilation.
  Enum {
    values: Vec<String>,
    constraints: StringValidator,
    lists_null: bool,
  },
  Literals {
    values: Vec<Number>,
    constraints: NumberValidator,
    lists_null: bool,
  },
  Array {
    item: Box<ValidatorExpr>,
    min_items: Option<u64>,
    max_items: Option<u64>,
  },
  Object {
    fields: Vec<ObjectField>,
    extras: ObjectExtras,
  },
  /// A single member renders as that member alone.
  Union {
    keyword: UnionKeyword,
    members: Vec<ValidatorExpr>,
    discriminator: Option<Discriminator>,
    object_typed: bool,
  },
  Intersection {
    members: Vec<ValidatorExpr>,
    /// The last member holds the object keywords written beside `allOf`.
    inline: bool,
    object_typed: bool,
  },
  Ref(String),
  /// A registry alias. `base` is the validator the alias stands in for and is
  /// what evaluation and decompilation use.
  Alias {
    name: String,
    base: Box<ValidatorExpr>,
  },
  Nullable(Box<ValidatorExpr>),
}

/// `format` is kept even when no refinement exists for it so that it survives decompilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringValidator {
  pub format: Option<String>,
  pub min_length: Option<u64>,
  pub max_length: Option<u64>,
  pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberValidator {
  pub integer: bool,
  pub format: Option<String>,
  pub minimum: Option<Number>,
  pub maximum: Option<Number>,
  pub exclusive_minimum: bool,
  pub exclusive_maximum: bool,
  pub multiple_of: Option<Number>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectField {
  pub name: String,
  pub validator: ValidatorExpr,
  pub optional: bool,
}

/// How an object validator treats keys it has no field for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectExtras {
  /// zod's default: extra keys are accepted and dropped from the parsed value.
  Strip,
  Passthrough,
  Strict,
  Catchall(Box<ValidatorExpr>),
}

/// Per-compilation state. The registry is borrowed immutably for the whole
/// compilation; `output_names` collects every registry alias the generator emitted.
#[derive(Debug)]
pub struct CompileContext<'a> {
  registry: &'a SchemaRegistry,
  pub output_names: BTreeSet<String>,
}

impl<'a> CompileContext<'a> {
  #[must_use]
  pub fn new(registry: &'a SchemaRegistry) -> Self {
    Self {
      registry,
      output_names: BTreeSet::new(),
    }
  }

  #[must_use]
  pub fn registry(&self) -> &'a SchemaRegistry {
    self.registry
  }

  /// Registry alias for a primitive node, if any. Enums never take an alias.
  pub(crate) fn alias_for(&mut self, kind: &SchemaKind) -> Option<String> {
    let alias = match kind {
      SchemaKind::String(StringSchema {
        format: Some(format),
        enum_values: None,
        ..
      }) => self.registry.lookup_format(format),
      SchemaKind::Number(NumberSchema {
        integer: true,
        enum_values: None,
        ..
      }) => self.registry.lookup(&RegistryKey::Integer),
      SchemaKind::Number(NumberSchema {
        integer: false,
        enum_values: None,
        ..
      }) => self.registry.lookup(&RegistryKey::Number),
      SchemaKind::Boolean => self.registry.lookup(&RegistryKey::Boolean),
      _ => None,
    }?;

    self.output_names.insert(alias.to_string());
    Some(alias.to_string())
  }
}

/// Compiles one schema node.
///
/// Nullability is applied last, around the fully specialized base, and
/// references are never inlined.
pub fn compile_validator(node: &SchemaNode, ctx: &mut CompileContext<'_>) -> ValidatorExpr {
  let base = compile_kind(&node.kind, ctx);
  if node.nullable {
    ValidatorExpr::Nullable(Box::new(base))
  } else {
    base
  }
}

fn compile_kind(kind: &SchemaKind, ctx: &mut CompileContext<'_>) -> ValidatorExpr {
  let expr = match kind {
    SchemaKind::String(string) => {
      let constraints = StringValidator {
        format: string.format.clone(),
        min_length: string.min_length,
        max_length: string.max_length,
        pattern: string.pattern.clone(),
      };
      match &string.enum_values {
        Some(values) => ValidatorExpr::Enum {
          values: values.clone(),
          constraints,
          lists_null: string.enum_lists_null,
        },
        None => ValidatorExpr::String(constraints),
      }
    }
    SchemaKind::Number(number) => {
      let constraints = NumberValidator {
        integer: number.integer,
        format: number.format.clone(),
        minimum: number.minimum.clone(),
        maximum: number.maximum.clone(),
        exclusive_minimum: number.exclusive_minimum,
        exclusive_maximum: number.exclusive_maximum,
        multiple_of: number.multiple_of.clone(),
      };
      match &number.enum_values {
        Some(values) => ValidatorExpr::Literals {
          values: values.clone(),
          constraints,
          lists_null: number.enum_lists_null,
        },
        None => ValidatorExpr::Number(constraints),
      }
    }
    SchemaKind::Boolean => ValidatorExpr::Boolean,
    SchemaKind::Null => ValidatorExpr::Null,
    SchemaKind::Any => ValidatorExpr::Unknown,
    SchemaKind::Array(array) => ValidatorExpr::Array {
      item: Box::new(compile_validator(&array.items, ctx)),
      min_items: array.min_items,
      max_items: array.max_items,
    },
    SchemaKind::Object(object) => compile_object(object, ctx),
    SchemaKind::Union(union) => ValidatorExpr::Union {
      keyword: union.keyword,
      members: union.members.iter().map(|m| compile_validator(m, ctx)).collect(),
      discriminator: union.discriminator.clone(),
      object_typed: union.object_typed,
    },
    SchemaKind::Intersection(intersection) => {
      let mut members: Vec<_> = intersection.members.iter().map(|m| compile_validator(m, ctx)).collect();
      if let Some(inline) = &intersection.inline {
        members.push(compile_object(inline, ctx));
      }
      ValidatorExpr::Intersection {
        members,
        inline: intersection.inline.is_some(),
        object_typed: intersection.object_typed,
      }
    }
    SchemaKind::Reference(name) => ValidatorExpr::Ref(name.clone()),
  };

  match ctx.alias_for(kind) {
    Some(name) => ValidatorExpr::Alias {
      name,
      base: Box::new(expr),
    },
    None => expr,
  }
}

fn compile_object(object: &ObjectSchema, ctx: &mut CompileContext<'_>) -> ValidatorExpr {
  let fields = object
    .properties
    .iter()
    .map(|(name, property)| ObjectField {
      name: name.clone(),
      validator: compile_validator(property, ctx),
      optional: !object.required.contains(name),
    })
    .collect();
  let extras = match &object.additional_properties {
    AdditionalProperties::Unspecified => ObjectExtras::Strip,
    AdditionalProperties::Allow => ObjectExtras::Passthrough,
    AdditionalProperties::Forbid => ObjectExtras::Strict,
    AdditionalProperties::Schema(extra) => ObjectExtras::Catchall(Box::new(compile_validator(extra, ctx))),
  };
  ValidatorExpr::Object { fields, extras }
}

/// Every compiled validator of a document, plus the aliases left behind by deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorSet {
  entries: IndexMap<String, ValidatorExpr>,
  aliases: IndexMap<String, String>,
}

impl ValidatorSet {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: impl Into<String>, validator: ValidatorExpr) {
    self.entries.insert(name.into(), validator);
  }

  pub fn insert_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
    self.aliases.insert(alias.into(), canonical.into());
  }

  /// Looks a validator up by name, following deduplication aliases.
  #[must_use]
  pub fn get(&self, name: &str) -> Option<&ValidatorExpr> {
    self
      .entries
      .get(name)
      .or_else(|| self.aliases.get(name).and_then(|canonical| self.entries.get(canonical)))
  }

  #[must_use]
  pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
    self.aliases.get(name).map_or(name, String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidatorExpr)> {
    self.entries.iter().map(|(name, validator)| (name.as_str(), validator))
  }

  pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
    self.aliases.iter().map(|(alias, canonical)| (alias.as_str(), canonical.as_str()))
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
