//! Shape projection: the structure of a schema with its value constraints removed.
//!
//! A validator and a type declaration compiled from the same node must project
//! to the same shape. Lengths, bounds, patterns, formats, the `oneOf`/`anyOf`
//! distinction and the strictness of objects do not exist on the type side, so
//! they are not part of the shape.

use serde_json::{Map, Value, json};

use crate::generator::{
  schema::emit::component_ref,
  types::TsType,
  validator::{ObjectExtras, ValidatorExpr},
};

pub trait ShapeProjection {
  fn shape(&self) -> Value;
}

impl ShapeProjection for ValidatorExpr {
  fn shape(&self) -> Value {
    match self {
      Self::String(_) => json!({ "type": "string" }),
      Self::Number(_) => json!({ "type": "number" }),
      Self::Boolean => json!({ "type": "boolean" }),
      Self::Null => json!({ "type": "null" }),
      Self::Unknown => json!({}),
      Self::Enum { values, .. } => json!({ "type": "string", "enum": values }),
      Self::Literals { values, .. } => json!({ "type": "number", "enum": values }),
      Self::Array { item, .. } => json!({ "type": "array", "items": item.shape() }),
      Self::Object { fields, extras } => object_shape(
        fields.iter().map(|f| (f.name.as_str(), f.validator.shape(), f.optional)),
        match extras {
          ObjectExtras::Catchall(extra) => Some(extra.shape()),
          ObjectExtras::Strip | ObjectExtras::Passthrough | ObjectExtras::Strict => None,
        },
      ),
      Self::Union { members, .. } => composite_shape("anyOf", members.iter().map(Self::shape)),
      Self::Intersection { members, .. } => composite_shape("allOf", members.iter().map(Self::shape)),
      Self::Ref(name) => json!({ "$ref": component_ref(name) }),
      Self::Alias { name, .. } => json!({ "alias": name }),
      Self::Nullable(inner) => nullable_shape(inner.shape()),
    }
  }
}

impl ShapeProjection for TsType {
  fn shape(&self) -> Value {
    match self {
      Self::String => json!({ "type": "string" }),
      Self::Number => json!({ "type": "number" }),
      Self::Boolean => json!({ "type": "boolean" }),
      Self::Null => json!({ "type": "null" }),
      Self::Unknown => json!({}),
      Self::StringLiterals(values) => json!({ "type": "string", "enum": values }),
      Self::NumberLiterals(values) => json!({ "type": "number", "enum": values }),
      Self::Array(item) => json!({ "type": "array", "items": item.shape() }),
      Self::Object { properties, index } => object_shape(
        properties.iter().map(|p| (p.name.as_str(), p.ty.shape(), p.optional)),
        index.as_ref().map(|ty| ty.shape()),
      ),
      Self::Union(members) => composite_shape("anyOf", members.iter().map(Self::shape)),
      Self::Intersection(members) => composite_shape("allOf", members.iter().map(Self::shape)),
      Self::Ref(name) => json!({ "$ref": component_ref(name) }),
      Self::Alias(name) => json!({ "alias": name }),
      Self::Nullable(inner) => nullable_shape(inner.shape()),
    }
  }
}

fn object_shape<'a>(properties: impl Iterator<Item = (&'a str, Value, bool)>, extra: Option<Value>) -> Value {
  let mut shaped = Map::new();
  let mut required = vec![];
  for (name, shape, optional) in properties {
    if !optional {
      required.push(name.to_string());
    }
    shaped.insert(name.to_string(), shape);
  }

  let mut map = Map::new();
  map.insert("type".into(), json!("object"));
  map.insert("properties".into(), Value::Object(shaped));
  map.insert("required".into(), json!(required));
  if let Some(extra) = extra {
    map.insert("additionalProperties".into(), extra);
  }
  Value::Object(map)
}

/// A single member projects to that member, matching how it is rendered.
fn composite_shape(keyword: &str, members: impl Iterator<Item = Value>) -> Value {
  let mut members: Vec<Value> = members.collect();
  if members.len() == 1 {
    return members.remove(0);
  }
  let mut map = Map::new();
  map.insert(keyword.to_string(), Value::Array(members));
  Value::Object(map)
}

fn nullable_shape(mut inner: Value) -> Value {
  if let Value::Object(map) = &mut inner {
    map.insert("nullable".into(), Value::Bool(true));
  }
  inner
}
