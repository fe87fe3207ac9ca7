use std::fmt::Write as _;

use indexmap::IndexMap;

use super::{FileHeader, named_import};
use crate::generator::{
  naming::quote,
  orchestrator::{CompiledDocument, GeneratorConfig},
  registry::SchemaRegistry,
  routes::RouteEntry,
  schema::SchemaNode,
  validator::{CompileContext, RenderContext, compile_validator},
};

/// Renders `schemas.ts`: one zod declaration per table entry, the deduplication
/// aliases and, when routes are enabled, the `Request` and `Response` lookups.
#[must_use]
pub fn render_schemas(compiled: &CompiledDocument, config: &GeneratorConfig, header: &FileHeader) -> String {
  let mut ctx = RenderContext::new(&config.schema_suffix);
  let mut body = String::new();
  let mut annotated = false;

  for (name, validator) in compiled.validators.iter() {
    let schema = ctx.schema_name(name);
    // a recursive const needs an explicit type or TypeScript infers `any`
    let annotation = if validator.needs_lazy(&ctx) {
      annotated = true;
      format!(": z.ZodType<Types.{name}>")
    } else {
      String::new()
    };
    let _ = writeln!(body, "export const {schema}{annotation} = {};\n", validator.render(&ctx));
    ctx.declare(name);
  }

  for (alias, canonical) in compiled.aliases() {
    let _ = writeln!(
      body,
      "export const {} = {};\n",
      ctx.schema_name(alias),
      ctx.schema_name(canonical)
    );
  }

  if config.include_routes {
    let ctx = RenderContext::eager(&config.schema_suffix);
    body.push_str(&render_request_lookup(&compiled.routes, &ctx));
    body.push('\n');
    body.push_str(&render_response_lookup(&compiled.routes, &ctx));
  }

  let mut out = header.render();
  let _ = writeln!(out, "import {{ z }} from {};", quote(&config.zod_import));
  if let Some(import) = named_import(
    "import",
    compiled.output_names.iter().map(String::as_str),
    &config.registry_module,
  ) {
    out.push_str(&import);
  }
  if annotated {
    let _ = writeln!(out, "import type * as Types from {};", quote(&config.types_module));
  }
  out.push('\n');
  out.push_str(body.trim_end());
  out.push('\n');
  out
}

fn routes_by_path(routes: &[RouteEntry]) -> IndexMap<&str, Vec<&RouteEntry>> {
  let mut grouped: IndexMap<&str, Vec<&RouteEntry>> = IndexMap::new();
  for route in routes {
    grouped.entry(route.path.as_str()).or_default().push(route);
  }
  grouped
}

fn render_request_lookup(routes: &[RouteEntry], ctx: &RenderContext<'_>) -> String {
  let mut out = "export const Request = {\n".to_string();
  for (path, routes) in routes_by_path(routes) {
    let _ = writeln!(out, "  {}: {{", quote(path));
    for route in routes {
      let slots: Vec<_> = route.request_slots().collect();
      if slots.is_empty() {
        let _ = writeln!(out, "    {}: {{}},", route.method);
        continue;
      }
      let _ = writeln!(out, "    {}: {{", route.method);
      for (label, node) in slots {
        let optional = if label == "body" && !route.body_required {
          ".optional()"
        } else {
          ""
        };
        let _ = writeln!(out, "      {label}: {}{optional},", slot_expression(node, ctx));
      }
      out.push_str("    },\n");
    }
    out.push_str("  },\n");
  }
  out.push_str("} as const;\n");
  out
}

fn render_response_lookup(routes: &[RouteEntry], ctx: &RenderContext<'_>) -> String {
  let mut out = "export const Response = {\n".to_string();
  for (path, routes) in routes_by_path(routes) {
    let _ = writeln!(out, "  {}: {{", quote(path));
    for route in routes {
      if route.responses.is_empty() {
        let _ = writeln!(out, "    {}: {{}},", route.method);
        continue;
      }
      let _ = writeln!(out, "    {}: {{", route.method);
      for (status, node) in &route.responses {
        let _ = writeln!(out, "      {}: {},", quote(status), slot_expression(node, ctx));
      }
      out.push_str("    },\n");
    }
    out.push_str("  },\n");
  }
  out.push_str("} as const;\n");
  out
}

/// Route slots are references into the table, so they render as the schema constant.
fn slot_expression(node: &SchemaNode, ctx: &RenderContext<'_>) -> String {
  let registry = SchemaRegistry::new();
  compile_validator(node, &mut CompileContext::new(&registry)).render(ctx)
}

#[cfg(test)]
mod tests {
  use http::Method;

  use super::*;

  fn route(method: Method, path: &str) -> RouteEntry {
    RouteEntry {
      path: path.to_string(),
      method,
      operation_id: None,
      params: None,
      query: None,
      headers: None,
      body: None,
      body_required: false,
      responses: IndexMap::new(),
    }
  }

  #[test]
  fn test_request_lookup_groups_methods_by_path() {
    let mut get = route(Method::GET, "/users/{id}");
    get.params = Some(SchemaNode::reference("GetUsersIdParams"));
    let mut post = route(Method::POST, "/users");
    post.body = Some(SchemaNode::reference("User"));
    let mut put = route(Method::PUT, "/users/{id}");
    put.params = Some(SchemaNode::reference("GetUsersIdParams"));
    put.body = Some(SchemaNode::reference("User"));
    put.body_required = true;

    let rendered = render_request_lookup(&[get, post, put], &RenderContext::eager("Schema"));
    assert_eq!(
      rendered,
      r#"export const Request = {
  "/users/{id}": {
    GET: {
      params: GetUsersIdParamsSchema,
    },
    PUT: {
      params: GetUsersIdParamsSchema,
      body: UserSchema,
    },
  },
  "/users": {
    POST: {
      body: UserSchema.optional(),
    },
  },
} as const;
"#
    );
  }

  #[test]
  fn test_response_lookup_quotes_status() {
    let mut get = route(Method::GET, "/health");
    get.responses.insert("200".to_string(), SchemaNode::reference("Health"));
    get.responses.insert("default".to_string(), SchemaNode::reference("Problem"));
    let delete = route(Method::DELETE, "/health");

    let rendered = render_response_lookup(&[get, delete], &RenderContext::eager("Schema"));
    assert_eq!(
      rendered,
      r#"export const Response = {
  "/health": {
    GET: {
      "200": HealthSchema,
      "default": ProblemSchema,
    },
    DELETE: {},
  },
} as const;
"#
    );
  }
}
