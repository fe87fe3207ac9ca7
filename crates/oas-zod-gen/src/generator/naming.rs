use std::{collections::HashSet, sync::LazyLock};

use any_ascii::any_ascii;
use http::Method;
use inflections::Inflect;
use regex::Regex;

/// Global names the generated modules rely on; a schema with one of these names would shadow them.
static RESERVED_TYPE_NAMES: LazyLock<HashSet<&str>> = LazyLock::new(|| {
  [
    "Array", "Record", "Partial", "Required", "Readonly", "Pick", "Omit", "Request", "Response", "Types",
  ]
  .into_iter()
  .collect()
});

static TS_KEYWORDS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
  [
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do", "else", "enum",
    "export", "extends", "false", "finally", "for", "function", "if", "import", "in", "instanceof", "new", "null",
    "return", "super", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "let",
    "static", "yield", "await", "implements", "interface", "package", "private", "protected", "public", "type",
  ]
  .into_iter()
  .collect()
});

static INVALID_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());
static MULTI_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

/// Transliterates to ASCII, replaces anything outside `[A-Za-z0-9_]` with underscores,
/// collapses runs of underscores and trims them from both ends.
pub(crate) fn sanitize(input: &str) -> String {
  if input.is_empty() {
    return String::new();
  }

  let ascii = any_ascii(input);
  let replaced = INVALID_CHARS_RE.replace_all(&ascii, "_");
  let collapsed = MULTI_UNDERSCORE_RE.replace_all(&replaced, "_");

  collapsed.trim_matches('_').to_string()
}

/// True when `name` can be used as a bare TypeScript identifier.
pub(crate) fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  let Some(first) = chars.next() else {
    return false;
  };

  (first.is_ascii_alphabetic() || first == '_' || first == '$')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    && !TS_KEYWORDS.contains(name)
}

/// Converts an arbitrary component name into an exported type name.
///
/// Names that are already identifiers are kept verbatim so that hand-written code
/// referring to `components.schemas` keys keeps working.
pub(crate) fn to_type_name(name: &str) -> String {
  let mut ident = if is_identifier(name) {
    name.to_string()
  } else {
    sanitize(name).to_pascal_case()
  };

  if ident.is_empty() {
    return "Unnamed".to_string();
  }

  if ident.starts_with(|c: char| c.is_ascii_digit()) {
    ident.insert(0, 'T');
  }

  if RESERVED_TYPE_NAMES.contains(ident.as_str()) {
    ident.push_str("Model");
  }

  ident
}

/// Appends the smallest numeric suffix, starting at 2, that makes `base_name` unused.
pub(crate) fn ensure_unique(base_name: &str, is_used: impl Fn(&str) -> bool) -> String {
  if !is_used(base_name) {
    return base_name.to_string();
  }
  let mut i = 2;
  loop {
    let new_name = format!("{base_name}{i}");
    if !is_used(&new_name) {
      return new_name;
    }
    i += 1;
  }
}

/// Object keys are written bare when possible and as JSON string literals otherwise.
pub(crate) fn property_key(name: &str) -> String {
  let bare = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
  if bare {
    name.to_string()
  } else {
    quote(name)
  }
}

pub(crate) fn quote(value: &str) -> String {
  serde_json::Value::String(value.to_string()).to_string()
}

/// Which part of an operation a synthesized route schema describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RouteSlot<'a> {
  Params,
  Query,
  Headers,
  Body,
  Response(&'a str),
}

impl RouteSlot<'_> {
  fn suffix(&self) -> String {
    match self {
      Self::Params => "Params".to_string(),
      Self::Query => "Query".to_string(),
      Self::Headers => "Headers".to_string(),
      Self::Body => "Body".to_string(),
      Self::Response(status) if status.starts_with('2') => format!("{}Response", status.to_uppercase()),
      Self::Response(status) => format!("{}ErrorResponse", sanitize(status).to_pascal_case()),
    }
  }
}

/// Builds `{Method}{PathSegments}{Slot}`, e.g. `GET /users/{id}` + 200 gives `GetUsersId200Response`.
pub(crate) fn route_schema_name(method: &Method, path: &str, slot: &RouteSlot<'_>) -> String {
  let segments: String = path
    .split('/')
    .map(|segment| sanitize(segment.trim_matches(|c| c == '{' || c == '}')))
    .filter(|segment| !segment.is_empty())
    .map(|segment| segment.to_pascal_case())
    .collect();

  format!("{}{segments}{}", method.as_str().to_pascal_case(), slot.suffix())
}

/// `not_found` becomes `NotFoundError`.
pub(crate) fn error_schema_name(code: &str) -> Option<String> {
  let base = sanitize(code).to_pascal_case();
  if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
    return None;
  }
  Some(format!("{base}Error"))
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;

  #[test]
  fn test_route_schema_names() {
    let cases = [
      (Method::GET, "/users/{id}", RouteSlot::Params, "GetUsersIdParams"),
      (Method::GET, "/users/{id}", RouteSlot::Response("200"), "GetUsersId200Response"),
      (Method::POST, "/users", RouteSlot::Body, "PostUsersBody"),
      (Method::DELETE, "/users/{id}", RouteSlot::Response("404"), "DeleteUsersId404ErrorResponse"),
      (Method::GET, "/", RouteSlot::Response("default"), "GetDefaultErrorResponse"),
      (Method::GET, "/pet-store/items", RouteSlot::Query, "GetPetStoreItemsQuery"),
      (Method::PATCH, "/a/{b}", RouteSlot::Headers, "PatchABHeaders"),
    ];

    for (method, path, slot, expected) in cases {
      assert_eq!(route_schema_name(&method, path, &slot), expected, "{method} {path} {slot:?}");
    }
  }

  #[test]
  fn test_to_type_name() {
    assert_eq!(to_type_name("User"), "User");
    assert_eq!(to_type_name("petStatus"), "petStatus");
    assert_eq!(to_type_name("pet-status"), "PetStatus");
    assert_eq!(to_type_name("Café Menu"), "CafeMenu");
    assert_eq!(to_type_name("2fa"), "T2fa");
    assert_eq!(to_type_name("Array"), "ArrayModel");
    assert_eq!(to_type_name("!!!"), "Unnamed");
  }

  #[test]
  fn test_is_identifier() {
    assert!(is_identifier("Email"));
    assert!(is_identifier("$ref_1"));
    assert!(!is_identifier("1abc"));
    assert!(!is_identifier("a-b"));
    assert!(!is_identifier("default"));
    assert!(!is_identifier(""));
  }

  #[test]
  fn test_property_key() {
    assert_eq!(property_key("email"), "email");
    assert_eq!(property_key("content-type"), "\"content-type\"");
    assert_eq!(property_key("1st"), "\"1st\"");
    assert_eq!(property_key("say \"hi\""), r#""say \"hi\"""#);
  }

  #[test]
  fn test_ensure_unique() {
    let used: BTreeSet<String> = ["User", "User2"].into_iter().map(String::from).collect();
    assert_eq!(ensure_unique("User", |name| used.contains(name)), "User3");
    assert_eq!(ensure_unique("Pet", |name| used.contains(name)), "Pet");
  }

  #[test]
  fn test_error_schema_name() {
    assert_eq!(error_schema_name("not_found").as_deref(), Some("NotFoundError"));
    assert_eq!(error_schema_name("UNAUTHORIZED").as_deref(), Some("UnauthorizedError"));
    assert_eq!(error_schema_name("404"), None);
  }
}
