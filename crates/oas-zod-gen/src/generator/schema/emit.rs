use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::{Map, Value, json};

use super::{
  AdditionalProperties, ArraySchema, COMPONENT_REF_PREFIX, IntersectionSchema, NumberSchema, ObjectSchema, SchemaKind,
  SchemaNode, StringSchema, UnionSchema,
};

const REF_NAME: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'%').add(b'<').add(b'>').add(b'`');

/// Formats a component name as a `$ref` pointer, escaping it the way the parser unescapes it.
pub(crate) fn component_ref(name: &str) -> String {
  let escaped = name.replace('~', "~0").replace('/', "~1");
  format!("{COMPONENT_REF_PREFIX}{}", utf8_percent_encode(&escaped, REF_NAME))
}

impl SchemaNode {
  /// Writes the node back out as an OpenAPI 3.0 schema fragment.
  ///
  /// The output is the normal form every comparison in the crate works on:
  /// annotations are gone, `nullable` only appears when true and keywords that
  /// were inferred (such as `type` next to a bare `enum`) are spelled out.
  /// Everything else the parser read is written back.
  #[must_use]
  pub fn to_value(&self) -> Value {
    let mut value = match &self.kind {
      SchemaKind::String(string) => string_value(string),
      SchemaKind::Number(number) => number_value(number),
      SchemaKind::Boolean => json!({ "type": "boolean" }),
      SchemaKind::Null => json!({ "type": "null" }),
      SchemaKind::Any => json!({}),
      SchemaKind::Array(array) => array_value(array),
      SchemaKind::Object(object) => object_value(object),
      SchemaKind::Union(union) => union_value(union),
      SchemaKind::Intersection(intersection) => intersection_value(intersection),
      SchemaKind::Reference(name) => json!({ "$ref": component_ref(name) }),
    };

    if self.nullable
      && let Value::Object(map) = &mut value
    {
      map.insert("nullable".to_string(), Value::Bool(true));
    }

    value
  }
}

fn string_value(string: &StringSchema) -> Value {
  let mut map = Map::new();
  map.insert("type".into(), json!("string"));
  insert_opt(&mut map, "format", string.format.as_ref().map(|f| json!(f)));
  insert_opt(&mut map, "minLength", string.min_length.map(Value::from));
  insert_opt(&mut map, "maxLength", string.max_length.map(Value::from));
  insert_opt(&mut map, "pattern", string.pattern.as_ref().map(|p| json!(p)));
  if let Some(values) = &string.enum_values {
    let values = values.iter().map(|v| json!(v));
    map.insert("enum".into(), enum_value(values, string.enum_lists_null));
  }
  Value::Object(map)
}

fn number_value(number: &NumberSchema) -> Value {
  let mut map = Map::new();
  let ty = if number.integer { "integer" } else { "number" };
  map.insert("type".into(), json!(ty));
  if let Some(values) = &number.enum_values {
    let values = values.iter().cloned().map(Value::Number);
    map.insert("enum".into(), enum_value(values, number.enum_lists_null));
  }
  insert_opt(&mut map, "format", number.format.as_ref().map(|f| json!(f)));
  insert_opt(&mut map, "minimum", number.minimum.clone().map(Value::Number));
  if number.exclusive_minimum {
    map.insert("exclusiveMinimum".into(), Value::Bool(true));
  }
  insert_opt(&mut map, "maximum", number.maximum.clone().map(Value::Number));
  if number.exclusive_maximum {
    map.insert("exclusiveMaximum".into(), Value::Bool(true));
  }
  insert_opt(&mut map, "multipleOf", number.multiple_of.clone().map(Value::Number));
  Value::Object(map)
}

fn array_value(array: &ArraySchema) -> Value {
  let mut map = Map::new();
  map.insert("type".into(), json!("array"));
  map.insert("items".into(), array.items.to_value());
  insert_opt(&mut map, "minItems", array.min_items.map(Value::from));
  insert_opt(&mut map, "maxItems", array.max_items.map(Value::from));
  Value::Object(map)
}

fn enum_value(values: impl Iterator<Item = Value>, lists_null: bool) -> Value {
  let mut values: Vec<Value> = values.collect();
  if lists_null {
    values.push(Value::Null);
  }
  Value::Array(values)
}

fn object_value(object: &ObjectSchema) -> Value {
  let mut map = Map::new();
  map.insert("type".into(), json!("object"));
  insert_object_keywords(&mut map, object);
  Value::Object(map)
}

fn insert_object_keywords(map: &mut Map<String, Value>, object: &ObjectSchema) {
  if !object.properties.is_empty() {
    let properties: Map<String, Value> = object
      .properties
      .iter()
      .map(|(name, node)| (name.clone(), node.to_value()))
      .collect();
    map.insert("properties".into(), Value::Object(properties));
  }
  if !object.required.is_empty() {
    map.insert("required".into(), json!(object.required));
  }
  match &object.additional_properties {
    AdditionalProperties::Unspecified => {}
    AdditionalProperties::Allow => {
      map.insert("additionalProperties".into(), Value::Bool(true));
    }
    AdditionalProperties::Forbid => {
      map.insert("additionalProperties".into(), Value::Bool(false));
    }
    AdditionalProperties::Schema(node) => {
      map.insert("additionalProperties".into(), node.to_value());
    }
  }
}

fn union_value(union: &UnionSchema) -> Value {
  let mut map = Map::new();
  if union.object_typed {
    map.insert("type".into(), json!("object"));
  }
  map.insert(
    union.keyword.to_string(),
    Value::Array(union.members.iter().map(SchemaNode::to_value).collect()),
  );
  if let Some(discriminator) = &union.discriminator {
    let mut inner = Map::new();
    inner.insert("propertyName".into(), json!(discriminator.property_name));
    if !discriminator.mapping.is_empty() {
      inner.insert("mapping".into(), json!(discriminator.mapping));
    }
    map.insert("discriminator".into(), Value::Object(inner));
  }
  Value::Object(map)
}

fn intersection_value(intersection: &IntersectionSchema) -> Value {
  let mut map = Map::new();
  if intersection.object_typed {
    map.insert("type".into(), json!("object"));
  }
  map.insert(
    "allOf".into(),
    Value::Array(intersection.members.iter().map(SchemaNode::to_value).collect()),
  );
  if let Some(inline) = &intersection.inline {
    insert_object_keywords(&mut map, inline);
  }
  Value::Object(map)
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
  if let Some(value) = value {
    map.insert(key.to_string(), value);
  }
}
