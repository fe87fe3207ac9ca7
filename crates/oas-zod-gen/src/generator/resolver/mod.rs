//! Dependency resolution and deduplication of the component table.
//!
//! [`resolve`] merges structurally identical schemas, folds the inline route
//! schemas into the table, checks that every reference resolves and orders
//! the table so that every entry follows the entries it references.

mod graph;

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::generator::{
  error::{CompileError, CompileResult},
  naming::{ensure_unique, error_schema_name},
  schema::{CanonicalSchema, SchemaKind, SchemaNode},
};

use self::graph::ReferenceGraph;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
  /// Final table in emission order.
  pub table: IndexMap<String, SchemaNode>,
  /// Every name that did not survive, mapped to the table entry that replaced it.
  pub renames: IndexMap<String, String>,
  /// Reference cycles, each in table order.
  pub cycles: Vec<Vec<String>>,
}

impl Resolution {
  /// Table name for `name`, following renames.
  #[must_use]
  pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
    self.renames.get(name).map_or(name, String::as_str)
  }
}

/// Resolves the document components together with the inline route schemas.
///
/// Candidate names must not collide with component names. Resolving the
/// returned table again, without candidates, returns it unchanged.
pub fn resolve(
  components: IndexMap<String, SchemaNode>,
  candidates: IndexMap<String, SchemaNode>,
) -> CompileResult<Resolution> {
  let (mut table, mut renames) = merge_components(components)?;

  let mut fingerprints = HashMap::new();
  for (name, node) in &table {
    fingerprints.insert(CanonicalSchema::from_node(node)?, name.clone());
  }

  // synthesized entry -> every candidate name that ended up in it
  let mut synthesized: IndexMap<String, Vec<String>> = IndexMap::new();
  for (name, mut node) in candidates {
    node.rewrite_references(&|target: &str| renames.get(target).cloned());
    let fingerprint = CanonicalSchema::from_node(&node)?;

    if let Some(existing) = fingerprints.get(&fingerprint) {
      if let Some(members) = synthesized.get_mut(existing) {
        members.push(name.clone());
      }
      renames.insert(name, existing.clone());
      continue;
    }

    let unique = ensure_unique(&name, |candidate| {
      table.contains_key(candidate) || renames.contains_key(candidate)
    });
    if unique != name {
      renames.insert(name.clone(), unique.clone());
    }
    fingerprints.insert(fingerprint, unique.clone());
    synthesized.insert(unique.clone(), vec![name]);
    table.insert(unique, node);
  }

  for (entry, members) in &synthesized {
    if members.len() < 2 {
      continue;
    }
    let Some(preferred) = table.get(entry).and_then(error_code).and_then(|code| error_schema_name(&code)) else {
      continue;
    };
    let renamed = ensure_unique(&preferred, |candidate| {
      candidate != entry.as_str() && (table.contains_key(candidate) || renames.contains_key(candidate))
    });
    if renamed != *entry {
      rename_entry(&mut table, &mut renames, entry, &renamed);
    }
  }

  check_references(&table)?;

  let graph = ReferenceGraph::build(&table);
  let cycles = graph.cycles();
  let mut ordered = IndexMap::with_capacity(table.len());
  for name in graph.emission_order() {
    if let Some(node) = table.get(name) {
      ordered.insert(name.to_string(), node.clone());
    }
  }

  Ok(Resolution {
    table: ordered,
    renames,
    cycles,
  })
}

/// Folds structurally identical components into the first of them until no duplicates remain.
fn merge_components(
  mut table: IndexMap<String, SchemaNode>,
) -> CompileResult<(IndexMap<String, SchemaNode>, IndexMap<String, String>)> {
  let mut renames: IndexMap<String, String> = IndexMap::new();

  loop {
    let mut seen: HashMap<CanonicalSchema, String> = HashMap::new();
    let mut merged: IndexMap<String, String> = IndexMap::new();
    for (name, node) in &table {
      let fingerprint = CanonicalSchema::from_node(node)?;
      match seen.get(&fingerprint) {
        Some(first) => {
          merged.insert(name.clone(), first.clone());
        }
        None => {
          seen.insert(fingerprint, name.clone());
        }
      }
    }

    if merged.is_empty() {
      return Ok((table, renames));
    }

    table.retain(|name, _| !merged.contains_key(name));
    for node in table.values_mut() {
      node.rewrite_references(&|target: &str| merged.get(target).cloned());
    }
    for target in renames.values_mut() {
      if let Some(replacement) = merged.get(target.as_str()) {
        target.clone_from(replacement);
      }
    }
    renames.extend(merged);
  }
}

fn rename_entry(
  table: &mut IndexMap<String, SchemaNode>,
  renames: &mut IndexMap<String, String>,
  from: &str,
  to: &str,
) {
  let entries = std::mem::take(table);
  *table = entries
    .into_iter()
    .map(|(name, node)| if name == from { (to.to_string(), node) } else { (name, node) })
    .collect();

  for node in table.values_mut() {
    node.rewrite_references(&|target: &str| (target == from).then(|| to.to_string()));
  }
  for target in renames.values_mut() {
    if *target == from {
      *target = to.to_string();
    }
  }
  renames.insert(from.to_string(), to.to_string());
}

/// `code` of an error envelope `{ error: { code: <single enum value> } }`.
fn error_code(node: &SchemaNode) -> Option<String> {
  let error = node.as_object()?.properties.get("error")?;
  let code = error.as_object()?.properties.get("code")?;
  match &code.kind {
    SchemaKind::String(string) => match string.enum_values.as_deref() {
      Some([code]) => Some(code.clone()),
      _ => None,
    },
    _ => None,
  }
}

fn check_references(table: &IndexMap<String, SchemaNode>) -> CompileResult<()> {
  for (name, node) in table {
    if let Some(target) = node.references().into_iter().find(|target| !table.contains_key(target)) {
      return Err(CompileError::DanglingReference {
        from: name.clone(),
        target,
      });
    }
  }
  Ok(())
}
