use indexmap::IndexSet;
use serde_json::{Number, Value};

use super::{NumberValidator, ObjectExtras, ObjectField, StringValidator, ValidatorExpr};
use crate::generator::schema::{
  AdditionalProperties, ArraySchema, IntersectionSchema, NumberSchema, ObjectSchema, SchemaKind, SchemaNode,
  StringSchema, UnionSchema,
};

impl ValidatorExpr {
  /// Rebuilds the schema node this validator was compiled from.
  ///
  /// Registry aliases decompile through their base validator, so the result
  /// does not depend on what the registry contained.
  #[must_use]
  pub fn to_schema(&self) -> SchemaNode {
    let kind = match self {
      Self::String(string) => SchemaKind::String(string_schema(string, None, false)),
      Self::Number(number) => SchemaKind::Number(number_schema(number, None, false)),
      Self::Boolean => SchemaKind::Boolean,
      Self::Null => SchemaKind::Null,
      Self::Unknown => SchemaKind::Any,
      Self::Enum {
        values,
        constraints,
        lists_null,
      } => SchemaKind::String(string_schema(constraints, Some(values.clone()), *lists_null)),
      Self::Literals {
        values,
        constraints,
        lists_null,
      } => SchemaKind::Number(number_schema(constraints, Some(values.clone()), *lists_null)),
      Self::Array {
        item,
        min_items,
        max_items,
      } => SchemaKind::Array(ArraySchema {
        items: Box::new(item.to_schema()),
        min_items: *min_items,
        max_items: *max_items,
      }),
      Self::Object { fields, extras } => SchemaKind::Object(object_schema(fields, extras)),
      Self::Union {
        keyword,
        members,
        discriminator,
        object_typed,
      } => SchemaKind::Union(UnionSchema {
        keyword: *keyword,
        members: members.iter().map(Self::to_schema).collect(),
        discriminator: discriminator.clone(),
        object_typed: *object_typed,
      }),
      Self::Intersection {
        members,
        inline,
        object_typed,
      } => {
        let (members, inline) = match (members.split_last(), inline) {
          (Some((Self::Object { fields, extras }, rest)), true) => (rest, Some(object_schema(fields, extras))),
          _ => (members.as_slice(), None),
        };
        SchemaKind::Intersection(IntersectionSchema {
          members: members.iter().map(Self::to_schema).collect(),
          inline,
          object_typed: *object_typed,
        })
      }
      Self::Ref(name) => SchemaKind::Reference(name.clone()),
      Self::Alias { base, .. } => return base.to_schema(),
      Self::Nullable(inner) => return inner.to_schema().with_nullable(true),
    };

    SchemaNode::new(kind)
  }

  /// The OpenAPI fragment recovered from this validator.
  #[must_use]
  pub fn decompile(&self) -> Value {
    self.to_schema().to_value()
  }
}

fn string_schema(string: &StringValidator, enum_values: Option<Vec<String>>, enum_lists_null: bool) -> StringSchema {
  StringSchema {
    format: string.format.clone(),
    min_length: string.min_length,
    max_length: string.max_length,
    pattern: string.pattern.clone(),
    enum_values,
    enum_lists_null,
  }
}

fn number_schema(number: &NumberValidator, enum_values: Option<Vec<Number>>, enum_lists_null: bool) -> NumberSchema {
  NumberSchema {
    integer: number.integer,
    format: number.format.clone(),
    minimum: number.minimum.clone(),
    maximum: number.maximum.clone(),
    exclusive_minimum: number.exclusive_minimum,
    exclusive_maximum: number.exclusive_maximum,
    multiple_of: number.multiple_of.clone(),
    enum_values,
    enum_lists_null,
  }
}

fn object_schema(fields: &[ObjectField], extras: &ObjectExtras) -> ObjectSchema {
  ObjectSchema {
    properties: fields
      .iter()
      .map(|field| (field.name.clone(), field.validator.to_schema()))
      .collect(),
    required: fields
      .iter()
      .filter(|field| !field.optional)
      .map(|field| field.name.clone())
      .collect::<IndexSet<_>>(),
    additional_properties: match extras {
      ObjectExtras::Strip => AdditionalProperties::Unspecified,
      ObjectExtras::Passthrough => AdditionalProperties::Allow,
      ObjectExtras::Strict => AdditionalProperties::Forbid,
      ObjectExtras::Catchall(extra) => AdditionalProperties::Schema(Box::new(extra.to_schema())),
    },
  }
}
