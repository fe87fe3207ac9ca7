//! The subset of an OpenAPI 3.0 document the route table builder reads.
//!
//! Schemas stay as raw JSON and go through [`parse_schema`](crate::generator::schema::parse_schema),
//! which owns every schema keyword rule. Everything else is typed here.

use http::Method;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use strum::Display;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiDocument {
  pub openapi: String,
  #[serde(default)]
  pub info: Info,
  #[serde(default)]
  pub paths: IndexMap<String, PathItem>,
  #[serde(default)]
  pub components: Components,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub version: String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
  #[serde(default)]
  pub schemas: IndexMap<String, Value>,
  #[serde(default)]
  pub parameters: IndexMap<String, RefOr<Parameter>>,
  #[serde(default, rename = "requestBodies")]
  pub request_bodies: IndexMap<String, RefOr<RequestBody>>,
  #[serde(default)]
  pub responses: IndexMap<String, RefOr<Response>>,
}

/// A `$ref` object or an inline value. `$ref` wins when both could apply.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
  Ref {
    #[serde(rename = "$ref")]
    reference: String,
  },
  Item(T),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
  #[serde(default)]
  pub parameters: Vec<RefOr<Parameter>>,
  pub get: Option<Operation>,
  pub put: Option<Operation>,
  pub post: Option<Operation>,
  pub delete: Option<Operation>,
  pub options: Option<Operation>,
  pub head: Option<Operation>,
  pub patch: Option<Operation>,
  pub trace: Option<Operation>,
}

impl PathItem {
  /// Operations in document order of the HTTP method list.
  pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
    [
      (Method::GET, &self.get),
      (Method::PUT, &self.put),
      (Method::POST, &self.post),
      (Method::DELETE, &self.delete),
      (Method::OPTIONS, &self.options),
      (Method::HEAD, &self.head),
      (Method::PATCH, &self.patch),
      (Method::TRACE, &self.trace),
    ]
    .into_iter()
    .filter_map(|(method, operation)| operation.as_ref().map(|op| (method, op)))
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
  #[serde(rename = "operationId")]
  pub operation_id: Option<String>,
  #[serde(default)]
  pub parameters: Vec<RefOr<Parameter>>,
  #[serde(rename = "requestBody")]
  pub request_body: Option<RefOr<RequestBody>>,
  #[serde(default)]
  pub responses: IndexMap<String, RefOr<Response>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParameterLocation {
  Path,
  Query,
  Header,
  Cookie,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
  pub name: String,
  #[serde(rename = "in")]
  pub location: ParameterLocation,
  #[serde(default)]
  pub required: bool,
  pub schema: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
  #[serde(default)]
  pub content: IndexMap<String, MediaTypeObject>,
  #[serde(default)]
  pub required: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
  #[serde(default)]
  pub content: IndexMap<String, MediaTypeObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaTypeObject {
  pub schema: Option<Value>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_ref_or_prefers_reference() {
    let parameter: RefOr<Parameter> =
      serde_json::from_value(json!({ "$ref": "#/components/parameters/Limit" })).unwrap();
    assert!(matches!(parameter, RefOr::Ref { reference } if reference == "#/components/parameters/Limit"));

    let parameter: RefOr<Parameter> =
      serde_json::from_value(json!({ "name": "limit", "in": "query", "schema": { "type": "integer" } })).unwrap();
    let RefOr::Item(parameter) = parameter else {
      panic!("expected inline parameter");
    };
    assert_eq!(parameter.location, ParameterLocation::Query);
    assert!(!parameter.required);
  }

  #[test]
  fn test_operations_in_method_order() {
    let item: PathItem = serde_json::from_value(json!({
      "post": { "responses": {} },
      "get": { "operationId": "list", "responses": {} },
    }))
    .unwrap();
    let methods: Vec<_> = item.operations().map(|(method, _)| method).collect();
    assert_eq!(methods, vec![Method::GET, Method::POST]);
  }
}
