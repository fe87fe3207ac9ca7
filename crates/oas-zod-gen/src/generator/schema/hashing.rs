use std::{cmp::Ordering, hash::Hash};

use json_canon::to_string as to_canonical_json;
use serde_json::Value;

use super::SchemaNode;
use crate::generator::error::{CompileError, CompileResult};

/// Structural fingerprint of a schema node.
///
/// Two nodes with the same `CanonicalSchema` are interchangeable: the resolver
/// merges them into a single named table entry, and the round-trip verifier
/// uses it to compare a decompiled validator against the source fragment.
#[derive(Debug, Clone, Eq)]
pub struct CanonicalSchema(String);

impl CanonicalSchema {
  pub fn from_node(node: &SchemaNode) -> CompileResult<Self> {
    Self::from_value(node.to_value())
  }

  /// Sorts order-independent arrays (`required`, `enum`) and serializes the
  /// result as RFC 8785 canonical JSON, so key order and member order do not
  /// affect equality.
  pub fn from_value(mut value: Value) -> CompileResult<Self> {
    normalize_schema_semantics(&mut value);
    let canonical_json = to_canonical_json(&value).map_err(|e| CompileError::Canonicalization(e.to_string()))?;
    Ok(CanonicalSchema(canonical_json))
  }

  #[must_use]
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Short BLAKE3 digest for diagnostics.
  #[must_use]
  pub fn digest(&self) -> String {
    blake3::hash(self.0.as_bytes()).to_hex().as_str()[..16].to_string()
  }
}

impl PartialEq for CanonicalSchema {
  fn eq(&self, other: &Self) -> bool {
    self.0 == other.0
  }
}

impl PartialOrd for CanonicalSchema {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for CanonicalSchema {
  fn cmp(&self, other: &Self) -> Ordering {
    self.0.cmp(&other.0)
  }
}

impl Hash for CanonicalSchema {
  /// Feeds the BLAKE3 hash of the canonical JSON to the hasher instead of the full text.
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    let hash = blake3::hash(self.0.as_bytes());
    hash.as_bytes().hash(state);
  }
}

fn normalize_schema_semantics(value: &mut Value) {
  match value {
    Value::Object(map) => {
      for key in ["required", "enum"] {
        if let Some(Value::Array(arr)) = map.get_mut(key) {
          sort_scalar_array(arr);
        }
      }

      for value in map.values_mut() {
        normalize_schema_semantics(value);
      }
    }
    Value::Array(arr) => {
      for item in arr {
        normalize_schema_semantics(item);
      }
    }
    _ => {}
  }
}

/// Sorts arrays made only of strings or only of numbers, with any `null` moved
/// to the end. Anything else keeps its order.
fn sort_scalar_array(arr: &mut Vec<Value>) {
  let nulls = arr.iter().filter(|v| v.is_null()).count();
  let mut values: Vec<Value> = arr.drain(..).filter(|v| !v.is_null()).collect();
  if values.iter().all(Value::is_string) {
    values.sort_unstable_by(|a, b| a.as_str().cmp(&b.as_str()));
  } else if values.iter().all(Value::is_number) {
    values.sort_unstable_by(|a, b| {
      let (a, b) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
      a.total_cmp(&b)
    });
  }
  values.extend(std::iter::repeat_n(Value::Null, nulls));
  *arr = values;
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::generator::schema::parse_schema;

  fn canonical(value: &Value) -> CanonicalSchema {
    CanonicalSchema::from_node(&parse_schema(value, "#").unwrap()).unwrap()
  }

  #[test]
  fn test_key_and_required_order_do_not_matter() {
    let a = canonical(&json!({
      "type": "object",
      "properties": { "id": { "type": "integer" }, "name": { "type": "string" } },
      "required": ["id", "name"]
    }));
    let b = canonical(&json!({
      "required": ["name", "id"],
      "properties": { "name": { "type": "string" }, "id": { "type": "integer" } },
      "type": "object"
    }));
    assert_eq!(a, b);
    assert_eq!(a.digest(), b.digest());
  }

  #[test]
  fn test_annotations_do_not_matter() {
    let a = canonical(&json!({ "type": "string", "description": "a name", "example": "bob" }));
    let b = canonical(&json!({ "type": "string", "nullable": false }));
    assert_eq!(a, b);
  }

  #[test]
  fn test_enum_order_does_not_matter() {
    let a = canonical(&json!({ "type": "integer", "enum": [3, 1, 2] }));
    let b = canonical(&json!({ "enum": [1, 2, 3] }));
    assert_eq!(a, b);
  }

  #[test]
  fn test_null_enum_member_sorts_last() {
    let a = CanonicalSchema::from_value(json!({ "type": "string", "enum": [null, "b", "a"], "nullable": true })).unwrap();
    let b = CanonicalSchema::from_value(json!({ "type": "string", "enum": ["a", "b", null], "nullable": true })).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.as_str(), r#"{"enum":["a","b",null],"nullable":true,"type":"string"}"#);
  }

  #[test]
  fn test_union_member_order_matters() {
    let a = canonical(&json!({ "oneOf": [{ "type": "string" }, { "type": "integer" }] }));
    let b = canonical(&json!({ "oneOf": [{ "type": "integer" }, { "type": "string" }] }));
    assert_ne!(a, b);
  }

  #[test]
  fn test_nullable_changes_fingerprint() {
    let a = canonical(&json!({ "type": "string" }));
    let b = canonical(&json!({ "type": "string", "nullable": true }));
    assert_ne!(a, b);
  }
}
