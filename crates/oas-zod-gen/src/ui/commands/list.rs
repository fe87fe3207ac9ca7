use std::path::Path;

use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Row, Table};
use crossterm::style::Stylize;
use itertools::Itertools;

use crate::{
  generator::{
    orchestrator::{GeneratorConfig, Orchestrator},
    registry::SchemaRegistry,
    routes::RouteEntry,
  },
  ui::{Colors, colors::to_comfy, term_width},
  utils::SpecLoader,
};

fn request_summary(route: &RouteEntry) -> String {
  route
    .request_slots()
    .map(|(slot, node)| format!("{slot}: {}", node.as_reference().unwrap_or("inline")))
    .join("\n")
}

fn response_summary(route: &RouteEntry) -> String {
  route
    .responses
    .iter()
    .map(|(status, node)| format!("{status}: {}", node.as_reference().unwrap_or("inline")))
    .join("\n")
}

pub async fn list_routes(input: &Path, colors: &Colors) -> anyhow::Result<()> {
  let document = SpecLoader::open(input).await?.parse()?;
  let orchestrator = Orchestrator::new(document, SchemaRegistry::new(), GeneratorConfig::default());
  let compiled = orchestrator.compile()?;

  let mut table = Table::new();
  table
    .load_preset("  ── ──            ")
    .set_content_arrangement(ContentArrangement::Dynamic)
    .set_width(term_width());

  let mut row = Row::new();
  for header in ["METHOD", "PATH", "OPERATION ID", "REQUEST", "RESPONSES"] {
    row.add_cell(Cell::new(header).fg(to_comfy(colors.label())));
  }
  table.set_header(row);

  for route in &compiled.routes {
    let mut row = Row::new();
    row.add_cell(
      Cell::new(route.method.as_str())
        .fg(to_comfy(colors.accent()))
        .set_alignment(CellAlignment::Right),
    );
    row.add_cell(Cell::new(&route.path).fg(to_comfy(colors.primary())));
    row.add_cell(
      Cell::new(route.operation_id.as_deref().unwrap_or("-"))
        .fg(to_comfy(colors.value()))
        .add_attribute(Attribute::Bold),
    );
    row.add_cell(Cell::new(request_summary(route)).fg(to_comfy(colors.info())));
    row.add_cell(Cell::new(response_summary(route)).fg(to_comfy(colors.info())));
    table.add_row(row);
  }

  println!("{table}");

  for error in &compiled.route_errors {
    eprintln!(
      "{} {}",
      "Skipped:".with(colors.accent()),
      error.to_string().with(colors.primary())
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use http::Method;
  use indexmap::IndexMap;

  use super::*;
  use crate::generator::schema::SchemaNode;

  #[test]
  fn test_route_summaries() {
    let mut responses = IndexMap::new();
    responses.insert("200".to_string(), SchemaNode::reference("Pet"));
    responses.insert("404".to_string(), SchemaNode::reference("NotFoundError"));
    let route = RouteEntry {
      path: "/pets/{id}".to_string(),
      method: Method::GET,
      operation_id: Some("getPet".to_string()),
      params: Some(SchemaNode::reference("GetPetsIdParams")),
      query: None,
      headers: None,
      body: None,
      body_required: false,
      responses,
    };

    assert_eq!(request_summary(&route), "params: GetPetsIdParams");
    assert_eq!(response_summary(&route), "200: Pet\n404: NotFoundError");
  }
}
