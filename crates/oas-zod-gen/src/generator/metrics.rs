use strum::Display;

use crate::generator::{error::CompileError, routes::RouteEntry};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationStats {
  pub schemas_generated: usize,
  pub route_schemas_generated: usize,
  pub aliases_generated: usize,
  pub routes_converted: usize,
  pub responses_converted: usize,
  pub registry_aliases_used: usize,
  pub cycles_detected: usize,
  pub cycle_details: Vec<Vec<String>>,
  pub warnings: Vec<GenerationWarning>,
}

impl GenerationStats {
  pub fn record_schema(&mut self, synthesized: bool) {
    self.schemas_generated += 1;
    if synthesized {
      self.route_schemas_generated += 1;
    }
  }

  pub fn record_aliases(&mut self, count: usize) {
    self.aliases_generated += count;
  }

  pub fn record_route(&mut self, route: &RouteEntry) {
    self.routes_converted += 1;
    self.responses_converted += route.responses.len();
  }

  pub fn record_routes(&mut self, routes: &[RouteEntry]) {
    for route in routes {
      self.record_route(route);
    }
  }

  pub fn record_registry_aliases(&mut self, count: usize) {
    self.registry_aliases_used = count;
  }

  pub fn record_cycle(&mut self, cycle: Vec<String>) {
    self.cycles_detected += 1;
    self.cycle_details.push(cycle);
  }

  pub fn record_cycles(&mut self, cycles: Vec<Vec<String>>) {
    for cycle in cycles {
      self.record_cycle(cycle);
    }
  }

  pub fn record_warning(&mut self, warning: GenerationWarning) {
    self.warnings.push(warning);
  }

  pub fn record_warnings(&mut self, warnings: impl IntoIterator<Item = GenerationWarning>) {
    self.warnings.extend(warnings);
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GenerationWarning {
  #[strum(to_string = "Dropped route: {error}")]
  RouteSkipped { error: String },
  #[strum(to_string = "{method} {path}: cookie parameter '{name}' is not part of the route schemas")]
  CookieParameterIgnored { method: String, path: String, name: String },
  #[strum(to_string = "{method} {path}: {slot} has no JSON media type")]
  NoJsonContent { method: String, path: String, slot: String },
  #[strum(to_string = "Schema '{from}' is emitted as '{to}'")]
  ComponentRenamed { from: String, to: String },
}

impl GenerationWarning {
  pub fn is_skipped_item(&self) -> bool {
    matches!(self, Self::RouteSkipped { .. })
  }
}

impl From<&CompileError> for GenerationWarning {
  fn from(error: &CompileError) -> Self {
    Self::RouteSkipped {
      error: error.to_string(),
    }
  }
}
