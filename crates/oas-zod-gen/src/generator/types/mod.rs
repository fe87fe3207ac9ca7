//! TypeScript type declarations.
//!
//! Mirrors the validator dispatch node for node: optionality, nullability and
//! registry aliases come out the same way on both sides.

mod render;

use std::collections::BTreeSet;

use serde_json::Number;

use crate::generator::{
  registry::{RegistryKey, SchemaRegistry},
  schema::{AdditionalProperties, NumberSchema, ObjectSchema, SchemaKind, SchemaNode, StringSchema},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsType {
  String,
  Number,
  Boolean,
  Null,
  Unknown,
  StringLiterals(Vec<String>),
  NumberLiterals(Vec<Number>),
  Array(Box<TsType>),
  Object {
    properties: Vec<TsProperty>,
    index: Option<Box<TsType>>,
  },
  Union(Vec<TsType>),
  Intersection(Vec<TsType>),
  Ref(String),
  Alias(String),
  Nullable(Box<TsType>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsProperty {
  pub name: String,
  pub ty: TsType,
  pub optional: bool,
}

#[derive(Debug)]
pub struct TypeContext<'a> {
  registry: &'a SchemaRegistry,
  pub output_names: BTreeSet<String>,
}

impl<'a> TypeContext<'a> {
  #[must_use]
  pub fn new(registry: &'a SchemaRegistry) -> Self {
    Self {
      registry,
      output_names: BTreeSet::new(),
    }
  }

  fn alias_for(&mut self, kind: &SchemaKind) -> Option<String> {
    let key = match kind {
      SchemaKind::String(StringSchema {
        format: Some(format),
        enum_values: None,
        ..
      }) => RegistryKey::Format(format.clone()),
      SchemaKind::Number(NumberSchema {
        integer,
        enum_values: None,
        ..
      }) => {
        if *integer {
          RegistryKey::Integer
        } else {
          RegistryKey::Number
        }
      }
      SchemaKind::Boolean => RegistryKey::Boolean,
      _ => return None,
    };

    let alias = self.registry.lookup(&key)?.to_string();
    self.output_names.insert(alias.clone());
    Some(alias)
  }
}

pub fn compile_type(node: &SchemaNode, ctx: &mut TypeContext<'_>) -> TsType {
  let base = compile_kind(&node.kind, ctx);
  if node.nullable {
    TsType::Nullable(Box::new(base))
  } else {
    base
  }
}

fn compile_kind(kind: &SchemaKind, ctx: &mut TypeContext<'_>) -> TsType {
  if let Some(alias) = ctx.alias_for(kind) {
    return TsType::Alias(alias);
  }

  match kind {
    SchemaKind::String(string) => match &string.enum_values {
      Some(values) => TsType::StringLiterals(values.clone()),
      None => TsType::String,
    },
    SchemaKind::Number(number) => match &number.enum_values {
      Some(values) => TsType::NumberLiterals(values.clone()),
      None => TsType::Number,
    },
    SchemaKind::Boolean => TsType::Boolean,
    SchemaKind::Null => TsType::Null,
    SchemaKind::Any => TsType::Unknown,
    SchemaKind::Array(array) => TsType::Array(Box::new(compile_type(&array.items, ctx))),
    SchemaKind::Object(object) => compile_object(object, ctx),
    SchemaKind::Union(union) => {
      let mut members: Vec<_> = union.members.iter().map(|m| compile_type(m, ctx)).collect();
      if members.len() == 1 {
        members.remove(0)
      } else {
        TsType::Union(members)
      }
    }
    SchemaKind::Intersection(intersection) => {
      let mut members: Vec<_> = intersection.members.iter().map(|m| compile_type(m, ctx)).collect();
      if let Some(inline) = &intersection.inline {
        members.push(compile_object(inline, ctx));
      }
      if members.len() == 1 {
        members.remove(0)
      } else {
        TsType::Intersection(members)
      }
    }
    SchemaKind::Reference(name) => TsType::Ref(name.clone()),
  }
}

fn compile_object(object: &ObjectSchema, ctx: &mut TypeContext<'_>) -> TsType {
  TsType::Object {
    properties: object
      .properties
      .iter()
      .map(|(name, property)| TsProperty {
        name: name.clone(),
        ty: compile_type(property, ctx),
        optional: !object.required.contains(name),
      })
      .collect(),
    index: match &object.additional_properties {
      AdditionalProperties::Schema(extra) => Some(Box::new(compile_type(extra, ctx))),
      AdditionalProperties::Unspecified | AdditionalProperties::Allow | AdditionalProperties::Forbid => None,
    },
  }
}
