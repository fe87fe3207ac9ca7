//! Route table construction.
//!
//! Every `path x method` of the document becomes a [`RouteEntry`]. Parameters
//! are grouped into synthesized `params`, `query` and `headers` objects; the
//! request body and the per-status responses keep their JSON schema. Inline
//! schemas become resolver candidates, so every slot of a finished route is a
//! reference into the component table.

pub mod document;
pub mod path_template;

use http::Method;
use indexmap::{IndexMap, IndexSet};
use mediatype::MediaType;
use percent_encoding::percent_decode_str;

use self::{
  document::{MediaTypeObject, OpenApiDocument, Operation, Parameter, ParameterLocation, PathItem, RefOr},
  path_template::parse_placeholders,
};
use crate::generator::{
  error::{CompileError, CompileResult},
  metrics::GenerationWarning,
  naming::{RouteSlot, ensure_unique, route_schema_name},
  resolver::{Resolution, resolve},
  schema::{ObjectSchema, SchemaKind, SchemaNode, parse::escape_pointer_segment, parse_schema},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
  pub path: String,
  pub method: Method,
  pub operation_id: Option<String>,
  pub params: Option<SchemaNode>,
  pub query: Option<SchemaNode>,
  pub headers: Option<SchemaNode>,
  pub body: Option<SchemaNode>,
  pub body_required: bool,
  /// Status code (or `default`) to response schema, in document order.
  pub responses: IndexMap<String, SchemaNode>,
}

impl RouteEntry {
  /// Request slots that are present, labelled the way the `Request` lookup names them.
  pub fn request_slots(&self) -> impl Iterator<Item = (&'static str, &SchemaNode)> {
    [
      ("params", &self.params),
      ("query", &self.query),
      ("headers", &self.headers),
      ("body", &self.body),
    ]
    .into_iter()
    .filter_map(|(label, slot)| slot.as_ref().map(|node| (label, node)))
  }

  fn slots_mut(&mut self) -> impl Iterator<Item = &mut SchemaNode> {
    [&mut self.params, &mut self.query, &mut self.headers, &mut self.body]
      .into_iter()
      .filter_map(Option::as_mut)
      .chain(self.responses.values_mut())
  }
}

/// Routes of one document, resolved against its component table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
  pub resolution: Resolution,
  pub routes: Vec<RouteEntry>,
  /// Routes that were dropped, one error each.
  pub errors: Vec<CompileError>,
  pub warnings: Vec<GenerationWarning>,
}

/// Builds the route table of `document`.
///
/// `components` are the parsed component schemas and `sanitized` maps the
/// document's component names to the table names they were emitted under.
/// Route-scoped failures drop the route and are collected in
/// [`RouteTable::errors`]; anything else fails the whole document.
pub fn build_routes(
  document: &OpenApiDocument,
  components: IndexMap<String, SchemaNode>,
  sanitized: &IndexMap<String, String>,
) -> CompileResult<RouteTable> {
  let mut collector = RouteCollector::new(document, &components, sanitized);
  for (path, item) in &document.paths {
    for (method, operation) in item.operations() {
      collector.collect(path, item, &method, operation)?;
    }
  }

  let RouteCollector {
    routes,
    candidates,
    errors,
    warnings,
    ..
  } = collector;

  let resolution = resolve(components, candidates)?;
  let routes = routes
    .into_iter()
    .map(|mut route| {
      for slot in route.slots_mut() {
        slot.rewrite_references(&|name: &str| resolution.renames.get(name).cloned());
      }
      route
    })
    .collect();

  Ok(RouteTable {
    resolution,
    routes,
    errors,
    warnings,
  })
}

struct RouteCollector<'a> {
  document: &'a OpenApiDocument,
  components: &'a IndexMap<String, SchemaNode>,
  sanitized: &'a IndexMap<String, String>,
  routes: Vec<RouteEntry>,
  candidates: IndexMap<String, SchemaNode>,
  errors: Vec<CompileError>,
  warnings: Vec<GenerationWarning>,
}

/// Everything one operation contributes, committed only when the whole route builds.
struct RouteDraft<'a> {
  method: &'a Method,
  path: &'a str,
  candidates: IndexMap<String, SchemaNode>,
  warnings: Vec<GenerationWarning>,
}

#[derive(Default)]
struct ParameterGroups {
  path: ObjectSchema,
  query: ObjectSchema,
  headers: ObjectSchema,
}

impl<'a> RouteCollector<'a> {
  fn new(
    document: &'a OpenApiDocument,
    components: &'a IndexMap<String, SchemaNode>,
    sanitized: &'a IndexMap<String, String>,
  ) -> Self {
    Self {
      document,
      components,
      sanitized,
      routes: vec![],
      candidates: IndexMap::new(),
      errors: vec![],
      warnings: vec![],
    }
  }

  fn collect(&mut self, path: &str, item: &PathItem, method: &Method, operation: &Operation) -> CompileResult<()> {
    let mut draft = RouteDraft {
      method,
      path,
      candidates: IndexMap::new(),
      warnings: vec![],
    };

    match self.build_route(&mut draft, item, operation) {
      Ok(route) => {
        self.candidates.extend(draft.candidates);
        self.warnings.extend(draft.warnings);
        self.routes.push(route);
        Ok(())
      }
      Err(err) if err.is_route_scoped() => {
        self.errors.push(err);
        Ok(())
      }
      Err(err) => Err(err),
    }
  }

  fn build_route(&self, draft: &mut RouteDraft<'_>, item: &PathItem, operation: &Operation) -> CompileResult<RouteEntry> {
    let placeholders = parse_placeholders(draft.path).map_err(|source| CompileError::InvalidPathTemplate {
      method: draft.method.to_string(),
      path: draft.path.to_string(),
      source,
    })?;

    let groups = self.parameter_groups(draft, item, operation)?;
    let missing: Vec<String> = placeholders
      .iter()
      .filter(|name| !groups.path.required.contains(*name))
      .cloned()
      .collect();
    if !missing.is_empty() {
      return Err(CompileError::PathParameterMismatch {
        method: draft.method.to_string(),
        path: draft.path.to_string(),
        missing,
      });
    }

    let params = self.object_slot(draft, groups.path, &RouteSlot::Params)?;
    let query = self.object_slot(draft, groups.query, &RouteSlot::Query)?;
    let headers = self.object_slot(draft, groups.headers, &RouteSlot::Headers)?;

    let (body, body_required) = match &operation.request_body {
      Some(request_body) => {
        let (request_body, pointer) = self.resolve_component(draft, request_body, "requestBodies", || {
          operation_pointer(draft, &["requestBody"])
        })?;
        let body = self.media_slot(draft, &request_body.content, &pointer, &RouteSlot::Body)?;
        let required = body.is_some() && request_body.required;
        (body, required)
      }
      None => (None, false),
    };

    let mut responses = IndexMap::new();
    for (status, response) in &operation.responses {
      let (response, pointer) = self.resolve_component(draft, response, "responses", || {
        operation_pointer(draft, &["responses", status.as_str()])
      })?;
      if let Some(node) = self.media_slot(draft, &response.content, &pointer, &RouteSlot::Response(status))? {
        responses.insert(status.clone(), node);
      }
    }

    Ok(RouteEntry {
      path: draft.path.to_string(),
      method: draft.method.clone(),
      operation_id: operation.operation_id.clone(),
      params,
      query,
      headers,
      body,
      body_required,
      responses,
    })
  }

  /// Merges path-level and operation-level parameters, the latter overriding by `(name, in)`.
  fn parameter_groups(
    &self,
    draft: &mut RouteDraft<'_>,
    item: &PathItem,
    operation: &Operation,
  ) -> CompileResult<ParameterGroups> {
    let path_pointer = format!("#/paths/{}", escape_pointer_segment(draft.path));
    let mut merged: IndexMap<(String, ParameterLocation), (&Parameter, String)> = IndexMap::new();

    let path_level = item
      .parameters
      .iter()
      .enumerate()
      .map(|(i, p)| (p, format!("{path_pointer}/parameters/{i}")));
    let operation_level = operation
      .parameters
      .iter()
      .enumerate()
      .map(|(i, p)| (p, operation_pointer(draft, &["parameters", i.to_string().as_str()])));

    for (parameter, pointer) in path_level.chain(operation_level).collect::<Vec<_>>() {
      let (parameter, pointer) = self.resolve_component(draft, parameter, "parameters", || pointer)?;
      merged.insert((parameter.name.clone(), parameter.location), (parameter, pointer));
    }

    let mut groups = ParameterGroups::default();
    for ((name, location), (parameter, pointer)) in merged {
      let (group, key, required) = match location {
        ParameterLocation::Path => (&mut groups.path, name, true),
        ParameterLocation::Query => (&mut groups.query, name, parameter.required),
        ParameterLocation::Header => (&mut groups.headers, name.to_ascii_lowercase(), parameter.required),
        ParameterLocation::Cookie => {
          draft.warnings.push(GenerationWarning::CookieParameterIgnored {
            method: draft.method.to_string(),
            path: draft.path.to_string(),
            name,
          });
          continue;
        }
      };
      let node = match &parameter.schema {
        Some(schema) => self.parse(schema, &format!("{pointer}/schema"))?,
        None => SchemaNode::new(SchemaKind::Any),
      };
      if required {
        group.required.insert(key.clone());
      }
      group.properties.insert(key, node);
    }
    Ok(groups)
  }

  /// Registers a synthesized parameter object, or returns `None` when it has no properties.
  fn object_slot(
    &self,
    draft: &mut RouteDraft<'_>,
    object: ObjectSchema,
    slot: &RouteSlot<'_>,
  ) -> CompileResult<Option<SchemaNode>> {
    if object.properties.is_empty() {
      return Ok(None);
    }
    Ok(Some(self.register(draft, SchemaNode::new(SchemaKind::Object(object)), slot)))
  }

  /// Picks the JSON media type of a body or response and turns its schema into a slot.
  fn media_slot(
    &self,
    draft: &mut RouteDraft<'_>,
    content: &IndexMap<String, MediaTypeObject>,
    pointer: &str,
    slot: &RouteSlot<'_>,
  ) -> CompileResult<Option<SchemaNode>> {
    let Some((media_type, media)) = select_json_media(content) else {
      if !content.is_empty() {
        draft.warnings.push(GenerationWarning::NoJsonContent {
          method: draft.method.to_string(),
          path: draft.path.to_string(),
          slot: slot_label(slot),
        });
      }
      return Ok(None);
    };
    let Some(schema) = &media.schema else {
      return Ok(None);
    };

    let pointer = format!("{pointer}/content/{}/schema", escape_pointer_segment(media_type));
    let node = self.parse(schema, &pointer)?;
    if let Some(name) = node.as_reference()
      && !node.nullable
    {
      if !self.components.contains_key(name) {
        return Err(CompileError::DanglingReference {
          from: format!("{} {}", draft.method, draft.path),
          target: name.to_string(),
        });
      }
      return Ok(Some(node));
    }
    Ok(Some(self.register(draft, node, slot)))
  }

  /// Parses an inline schema, pointing its references at the sanitized component names.
  fn parse(&self, schema: &serde_json::Value, pointer: &str) -> CompileResult<SchemaNode> {
    let mut node = parse_schema(schema, pointer)?;
    if !self.sanitized.is_empty() {
      node.rewrite_references(&|target: &str| self.sanitized.get(target).cloned());
    }
    Ok(node)
  }

  /// Adds `node` as a resolver candidate and returns a reference to it.
  fn register(&self, draft: &mut RouteDraft<'_>, node: SchemaNode, slot: &RouteSlot<'_>) -> SchemaNode {
    let base = route_schema_name(draft.method, draft.path, slot);
    let name = ensure_unique(&base, |candidate| {
      self.components.contains_key(candidate)
        || self.candidates.contains_key(candidate)
        || draft.candidates.contains_key(candidate)
    });
    draft.candidates.insert(name.clone(), node);
    SchemaNode::reference(name)
  }

  /// Follows a `$ref` into `#/components/<section>/`, returning the value and its pointer.
  fn resolve_component<'d, T>(
    &'d self,
    draft: &RouteDraft<'_>,
    value: &'d RefOr<T>,
    section: &str,
    inline_pointer: impl FnOnce() -> String,
  ) -> CompileResult<(&'d T, String)>
  where
    OpenApiDocument: ComponentSection<T>,
  {
    let reference = match value {
      RefOr::Item(item) => return Ok((item, inline_pointer())),
      RefOr::Ref { reference } => reference,
    };

    let unresolved = || CompileError::UnresolvedComponent {
      method: draft.method.to_string(),
      path: draft.path.to_string(),
      reference: reference.clone(),
    };

    let mut seen = IndexSet::new();
    let mut current = reference;
    loop {
      let name = component_name(current, section).ok_or_else(unresolved)?;
      if !seen.insert(name.clone()) {
        return Err(unresolved());
      }
      match <OpenApiDocument as ComponentSection<T>>::section(self.document).get(&name).ok_or_else(unresolved)? {
        RefOr::Item(item) => {
          let pointer = format!("#/components/{section}/{}", escape_pointer_segment(&name));
          return Ok((item, pointer));
        }
        RefOr::Ref { reference } => current = reference,
      }
    }
  }
}

/// Access to one `components` map by value type.
trait ComponentSection<T> {
  fn section(&self) -> &IndexMap<String, RefOr<T>>;
}

impl ComponentSection<Parameter> for OpenApiDocument {
  fn section(&self) -> &IndexMap<String, RefOr<Parameter>> {
    &self.components.parameters
  }
}

impl ComponentSection<document::RequestBody> for OpenApiDocument {
  fn section(&self) -> &IndexMap<String, RefOr<document::RequestBody>> {
    &self.components.request_bodies
  }
}

impl ComponentSection<document::Response> for OpenApiDocument {
  fn section(&self) -> &IndexMap<String, RefOr<document::Response>> {
    &self.components.responses
  }
}

fn component_name(reference: &str, section: &str) -> Option<String> {
  let encoded = reference.strip_prefix("#/components/")?.strip_prefix(section)?.strip_prefix('/')?;
  if encoded.is_empty() || encoded.contains('/') {
    return None;
  }
  let decoded = percent_decode_str(encoded).decode_utf8().ok()?;
  Some(decoded.replace("~1", "/").replace("~0", "~"))
}

fn operation_pointer(draft: &RouteDraft<'_>, segments: &[&str]) -> String {
  let mut pointer = format!(
    "#/paths/{}/{}",
    escape_pointer_segment(draft.path),
    draft.method.as_str().to_ascii_lowercase()
  );
  for segment in segments {
    pointer.push('/');
    pointer.push_str(&escape_pointer_segment(segment));
  }
  pointer
}

/// `application/json` first, then the first `*/*+json` media type.
fn select_json_media(content: &IndexMap<String, MediaTypeObject>) -> Option<(&str, &MediaTypeObject)> {
  let mut structured = None;
  for (key, media) in content {
    let Ok(parsed) = MediaType::parse(key) else {
      continue;
    };
    let suffix = parsed.suffix.as_ref().map(mediatype::Name::as_str);
    match (parsed.ty.as_str(), parsed.subty.as_str(), suffix) {
      ("application", "json", None) => return Some((key.as_str(), media)),
      (_, _, Some("json")) if structured.is_none() => structured = Some((key.as_str(), media)),
      _ => {}
    }
  }
  structured
}

fn slot_label(slot: &RouteSlot<'_>) -> String {
  match slot {
    RouteSlot::Params => "params".to_string(),
    RouteSlot::Query => "query".to_string(),
    RouteSlot::Headers => "headers".to_string(),
    RouteSlot::Body => "body".to_string(),
    RouteSlot::Response(status) => format!("response {status}"),
  }
}
