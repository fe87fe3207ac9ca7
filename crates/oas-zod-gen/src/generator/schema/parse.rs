use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use percent_encoding::percent_decode_str;
use serde_json::{Map, Number, Value};

use super::{
  AdditionalProperties, ArraySchema, COMPONENT_REF_PREFIX, Discriminator, IntersectionSchema, NumberSchema,
  ObjectSchema, SchemaKind, SchemaNode, StringSchema, UnionKeyword, UnionSchema,
};
use crate::generator::error::{CompileError, CompileResult};

/// Keywords that describe a schema without constraining it.
pub(crate) const ANNOTATIONS: &[&str] = &[
  "title",
  "description",
  "example",
  "examples",
  "default",
  "readOnly",
  "writeOnly",
  "deprecated",
  "externalDocs",
  "xml",
];

/// Object keywords that may sit beside `allOf`.
const OBJECT_KEYWORDS: [&str; 3] = ["properties", "required", "additionalProperties"];

const COMPOSITIONS: [(&str, Option<UnionKeyword>); 3] = [
  ("oneOf", Some(UnionKeyword::OneOf)),
  ("anyOf", Some(UnionKeyword::AnyOf)),
  ("allOf", None),
];

/// Parses one OpenAPI 3.0 schema fragment.
///
/// `pointer` is the JSON pointer of `value` inside its document and only
/// shows up in error messages. Any keyword the node model cannot represent
/// fails with [`CompileError::UnsupportedSchema`]; annotations and `x-`
/// extensions are dropped.
pub fn parse_schema(value: &Value, pointer: &str) -> CompileResult<SchemaNode> {
  let Value::Object(map) = value else {
    return Err(CompileError::unsupported(pointer, "schema must be a JSON object"));
  };

  let mut keywords = Keywords::new(map, pointer);
  let nullable = keywords.take_bool("nullable")?.unwrap_or(false);

  let mut node = if let Some(reference) = keywords.take("$ref") {
    SchemaNode::reference(parse_reference(reference, pointer)?)
  } else if let Some(node) = parse_composition(&mut keywords)? {
    node
  } else {
    SchemaNode::new(parse_typed(&mut keywords, nullable)?)
  };

  keywords.finish()?;
  node.nullable |= nullable;
  Ok(node)
}

/// Resolves `#/components/schemas/<name>` to `<name>`, undoing percent and pointer escaping.
pub fn parse_reference(value: &Value, pointer: &str) -> CompileResult<String> {
  let Some(reference) = value.as_str() else {
    return Err(CompileError::unsupported(pointer, "'$ref' must be a string"));
  };
  let Some(encoded) = reference.strip_prefix(COMPONENT_REF_PREFIX) else {
    return Err(CompileError::unsupported(
      pointer,
      format!("only '{COMPONENT_REF_PREFIX}' references are supported, found '{reference}'"),
    ));
  };

  if encoded.is_empty() || encoded.contains('/') {
    return Err(CompileError::unsupported(
      pointer,
      format!("'{reference}' does not name a component schema"),
    ));
  }

  let decoded = percent_decode_str(encoded)
    .decode_utf8()
    .map_err(|_| CompileError::unsupported(pointer, format!("'{reference}' is not valid UTF-8")))?;
  Ok(decoded.replace("~1", "/").replace("~0", "~"))
}

pub(crate) fn escape_pointer_segment(segment: &str) -> String {
  segment.replace('~', "~0").replace('/', "~1")
}

fn parse_composition(keywords: &mut Keywords<'_>) -> CompileResult<Option<SchemaNode>> {
  let present: Vec<_> = COMPOSITIONS.iter().filter(|(key, _)| keywords.has(key)).collect();
  let [(key, union_keyword)] = present.as_slice() else {
    if present.is_empty() {
      return Ok(None);
    }
    let names: Vec<&str> = present.iter().map(|(key, _)| *key).collect();
    return Err(keywords.error(format!("cannot combine {}", names.join(" and "))));
  };

  let object_typed = match keywords.take("type") {
    None => false,
    Some(Value::String(ty)) if ty == "object" => true,
    Some(_) => return Err(keywords.error(format!("'{key}' can only be combined with 'type: object'"))),
  };

  let Some(Value::Array(items)) = keywords.take(key) else {
    return Err(keywords.error(format!("'{key}' must be an array")));
  };
  if items.is_empty() {
    return Err(keywords.error(format!("'{key}' must have at least one member")));
  }

  let members = items
    .iter()
    .enumerate()
    .map(|(i, item)| {
      let index = i.to_string();
      parse_schema(item, &keywords.child(&[*key, index.as_str()]))
    })
    .collect::<CompileResult<Vec<_>>>()?;

  let sibling = OBJECT_KEYWORDS.into_iter().find(|k| keywords.has(k));
  let kind = match union_keyword {
    Some(keyword) => {
      if let Some(sibling) = sibling {
        return Err(keywords.error(format!(
          "'{sibling}' beside '{key}' is not supported; move it into every member or wrap the union in 'allOf'"
        )));
      }
      let discriminator = match keywords.take("discriminator") {
        Some(raw) => Some(parse_discriminator(raw, keywords)?),
        None => None,
      };
      SchemaKind::Union(UnionSchema {
        keyword: *keyword,
        members,
        discriminator,
        object_typed,
      })
    }
    None => {
      let inline = match sibling {
        Some(_) => Some(parse_object(keywords)?),
        None => None,
      };
      SchemaKind::Intersection(IntersectionSchema {
        members,
        inline,
        object_typed,
      })
    }
  };
  Ok(Some(SchemaNode::new(kind)))
}

fn parse_discriminator(value: &Value, keywords: &Keywords<'_>) -> CompileResult<Discriminator> {
  let pointer = keywords.child(&["discriminator"]);
  let Some(map) = value.as_object() else {
    return Err(CompileError::unsupported(&pointer, "discriminator must be an object"));
  };
  let mut inner = Keywords::new(map, &pointer);
  let Some(property_name) = inner.take_str("propertyName")? else {
    return Err(CompileError::unsupported(&pointer, "discriminator requires 'propertyName'"));
  };

  let mut mapping = IndexMap::new();
  if let Some(raw) = inner.take("mapping") {
    let Some(entries) = raw.as_object() else {
      return Err(CompileError::unsupported(&pointer, "discriminator mapping must be an object"));
    };
    for (tag, target) in entries {
      let Some(target) = target.as_str() else {
        return Err(CompileError::unsupported(&pointer, "discriminator mapping values must be strings"));
      };
      mapping.insert(tag.clone(), target.to_string());
    }
  }

  inner.finish()?;
  Ok(Discriminator {
    property_name: property_name.to_string(),
    mapping,
  })
}

fn parse_typed(keywords: &mut Keywords<'_>, nullable: bool) -> CompileResult<SchemaKind> {
  let declared = match keywords.take("type") {
    None => None,
    Some(Value::String(ty)) => Some(ty.as_str()),
    Some(Value::Array(_)) => {
      return Err(keywords.error("type arrays are OpenAPI 3.1; use 'nullable: true'"));
    }
    Some(other) => return Err(keywords.error(format!("'type' must be a string, found {other}"))),
  };

  let ty = match declared {
    Some(ty) => Some(ty),
    None => infer_type(keywords.map),
  };

  match ty {
    Some("string") => parse_string(keywords, nullable).map(SchemaKind::String),
    Some("integer") => parse_number(keywords, true, nullable).map(SchemaKind::Number),
    Some("number") => parse_number(keywords, false, nullable).map(SchemaKind::Number),
    Some("boolean") => Ok(SchemaKind::Boolean),
    Some("null") => Ok(SchemaKind::Null),
    Some("array") => parse_array(keywords).map(SchemaKind::Array),
    Some("object") => parse_object(keywords).map(SchemaKind::Object),
    Some(other) => Err(keywords.error(format!("unknown type '{other}'"))),
    None if keywords.has("enum") => Err(keywords.error("cannot infer a type for an enum mixing value kinds")),
    None => Ok(SchemaKind::Any),
  }
}

/// The `type` implied by the other keywords of a schema that does not declare one.
pub(crate) fn infer_type(map: &Map<String, Value>) -> Option<&'static str> {
  if ["properties", "additionalProperties", "required"].iter().any(|k| map.contains_key(*k)) {
    return Some("object");
  }
  if map.contains_key("items") {
    return Some("array");
  }
  if ["minLength", "maxLength", "pattern"].iter().any(|k| map.contains_key(*k)) {
    return Some("string");
  }
  if ["minimum", "maximum", "multipleOf"].iter().any(|k| map.contains_key(*k)) {
    return Some("number");
  }

  let Some(Value::Array(values)) = map.get("enum") else {
    return None;
  };
  let members: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
  if members.is_empty() {
    None
  } else if members.iter().all(|v| v.is_string()) {
    Some("string")
  } else if members.iter().all(|v| v.is_i64() || v.is_u64()) {
    Some("integer")
  } else if members.iter().all(|v| v.is_number()) {
    Some("number")
  } else {
    None
  }
}

fn parse_string(keywords: &mut Keywords<'_>, nullable: bool) -> CompileResult<StringSchema> {
  let format = keywords.take_str("format")?.map(String::from);
  let min_length = keywords.take_u64("minLength")?;
  let max_length = keywords.take_u64("maxLength")?;
  let pattern = keywords.take_str("pattern")?.map(String::from);

  let (enum_values, enum_lists_null) = match keywords.take_enum(nullable)? {
    Some((values, lists_null)) => {
      let values = values
        .into_iter()
        .map(|value| match value {
          Value::String(s) => Ok(s.clone()),
          other => Err(keywords.error(format!("string enum contains non-string value {other}"))),
        })
        .collect::<CompileResult<Vec<_>>>()?;
      (Some(values), lists_null)
    }
    None => (None, false),
  };

  Ok(StringSchema {
    format,
    min_length,
    max_length,
    pattern,
    enum_values,
    enum_lists_null,
  })
}

fn parse_number(keywords: &mut Keywords<'_>, integer: bool, nullable: bool) -> CompileResult<NumberSchema> {
  let format = keywords.take_str("format")?.map(String::from);
  let minimum = keywords.take_number("minimum")?;
  let maximum = keywords.take_number("maximum")?;
  let exclusive_minimum = keywords.take_bool("exclusiveMinimum")?.unwrap_or(false);
  let exclusive_maximum = keywords.take_bool("exclusiveMaximum")?.unwrap_or(false);
  let multiple_of = keywords.take_number("multipleOf")?;

  if exclusive_minimum && minimum.is_none() {
    return Err(keywords.error("'exclusiveMinimum' requires 'minimum'"));
  }
  if exclusive_maximum && maximum.is_none() {
    return Err(keywords.error("'exclusiveMaximum' requires 'maximum'"));
  }
  if multiple_of.as_ref().and_then(Number::as_f64).is_some_and(|m| m <= 0.0) {
    return Err(keywords.error("'multipleOf' must be greater than zero"));
  }

  let (enum_values, enum_lists_null) = match keywords.take_enum(nullable)? {
    Some((values, lists_null)) => {
      let values = values
        .into_iter()
        .map(|value| match value {
          Value::Number(n)
            if !integer || n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0) =>
          {
            Ok(n.clone())
          }
          other => Err(keywords.error(format!("numeric enum contains invalid value {other}"))),
        })
        .collect::<CompileResult<Vec<_>>>()?;
      (Some(values), lists_null)
    }
    None => (None, false),
  };

  Ok(NumberSchema {
    integer,
    format,
    minimum,
    maximum,
    exclusive_minimum,
    exclusive_maximum,
    multiple_of,
    enum_values,
    enum_lists_null,
  })
}

fn parse_array(keywords: &mut Keywords<'_>) -> CompileResult<ArraySchema> {
  let Some(items) = keywords.take("items") else {
    return Err(keywords.error("array schema requires 'items'"));
  };
  let items = parse_schema(items, &keywords.child(&["items"]))?;
  let min_items = keywords.take_u64("minItems")?;
  let max_items = keywords.take_u64("maxItems")?;
  if keywords.take_bool("uniqueItems")? == Some(true) {
    return Err(keywords.error("'uniqueItems' is not supported"));
  }

  Ok(ArraySchema {
    items: Box::new(items),
    min_items,
    max_items,
  })
}

fn parse_object(keywords: &mut Keywords<'_>) -> CompileResult<ObjectSchema> {
  let mut properties = IndexMap::new();
  if let Some(raw) = keywords.take("properties") {
    let Some(entries) = raw.as_object() else {
      return Err(keywords.error("'properties' must be an object"));
    };
    for (name, schema) in entries {
      let node = parse_schema(schema, &keywords.child(&["properties", name]))?;
      properties.insert(name.clone(), node);
    }
  }

  let mut required = IndexSet::new();
  if let Some(raw) = keywords.take("required") {
    let Some(names) = raw.as_array() else {
      return Err(keywords.error("'required' must be an array"));
    };
    for name in names {
      let Some(name) = name.as_str() else {
        return Err(keywords.error("'required' entries must be strings"));
      };
      if !properties.contains_key(name) {
        return Err(keywords.error(format!("required property '{name}' has no schema")));
      }
      required.insert(name.to_string());
    }
  }

  let additional_properties = match keywords.take("additionalProperties") {
    None => AdditionalProperties::Unspecified,
    Some(Value::Bool(true)) => AdditionalProperties::Allow,
    Some(Value::Bool(false)) => AdditionalProperties::Forbid,
    Some(schema) => AdditionalProperties::Schema(Box::new(parse_schema(
      schema,
      &keywords.child(&["additionalProperties"]),
    )?)),
  };

  Ok(ObjectSchema {
    properties,
    required,
    additional_properties,
  })
}

/// Tracks which keywords of a schema object have been understood.
struct Keywords<'a> {
  map: &'a Map<String, Value>,
  pointer: &'a str,
  consumed: HashSet<&'a str>,
}

impl<'a> Keywords<'a> {
  fn new(map: &'a Map<String, Value>, pointer: &'a str) -> Self {
    Self {
      map,
      pointer,
      consumed: HashSet::new(),
    }
  }

  fn has(&self, key: &str) -> bool {
    self.map.contains_key(key)
  }

  fn take(&mut self, key: &str) -> Option<&'a Value> {
    let (key, value) = self.map.get_key_value(key)?;
    self.consumed.insert(key.as_str());
    Some(value)
  }

  fn take_bool(&mut self, key: &str) -> CompileResult<Option<bool>> {
    match self.take(key) {
      None => Ok(None),
      Some(Value::Bool(b)) => Ok(Some(*b)),
      Some(_) => Err(self.error(format!("'{key}' must be a boolean"))),
    }
  }

  fn take_u64(&mut self, key: &str) -> CompileResult<Option<u64>> {
    match self.take(key) {
      None => Ok(None),
      Some(value) => value
        .as_u64()
        .map(Some)
        .ok_or_else(|| self.error(format!("'{key}' must be a non-negative integer"))),
    }
  }

  fn take_number(&mut self, key: &str) -> CompileResult<Option<Number>> {
    match self.take(key) {
      None => Ok(None),
      Some(Value::Number(n)) => Ok(Some(n.clone())),
      Some(_) => Err(self.error(format!("'{key}' must be a number"))),
    }
  }

  fn take_str(&mut self, key: &str) -> CompileResult<Option<&'a str>> {
    match self.take(key) {
      None => Ok(None),
      Some(Value::String(s)) => Ok(Some(s.as_str())),
      Some(_) => Err(self.error(format!("'{key}' must be a string"))),
    }
  }

  /// Non-null members of `enum`, and whether it listed `null`. A `null`
  /// member is only allowed on nullable schemas.
  fn take_enum(&mut self, nullable: bool) -> CompileResult<Option<(Vec<&'a Value>, bool)>> {
    let Some(raw) = self.take("enum") else {
      return Ok(None);
    };
    let Some(values) = raw.as_array() else {
      return Err(self.error("'enum' must be an array"));
    };

    let mut members = Vec::with_capacity(values.len());
    let mut lists_null = false;
    for value in values {
      if value.is_null() {
        if !nullable {
          return Err(self.error("enum contains null but the schema is not nullable"));
        }
        lists_null = true;
        continue;
      }
      members.push(value);
    }

    if members.is_empty() {
      return Err(self.error("'enum' must have at least one non-null value"));
    }
    Ok(Some((members, lists_null)))
  }

  fn child(&self, segments: &[&str]) -> String {
    let mut pointer = self.pointer.to_string();
    for segment in segments {
      pointer.push('/');
      pointer.push_str(&escape_pointer_segment(segment));
    }
    pointer
  }

  fn error(&self, reason: impl Into<String>) -> CompileError {
    CompileError::unsupported(self.pointer, reason)
  }

  fn finish(self) -> CompileResult<()> {
    let unknown = self
      .map
      .keys()
      .find(|key| !self.consumed.contains(key.as_str()) && !key.starts_with("x-") && !ANNOTATIONS.contains(&key.as_str()));

    match unknown {
      Some(key) => Err(self.error(format!("unsupported keyword '{key}'"))),
      None => Ok(()),
    }
  }
}
