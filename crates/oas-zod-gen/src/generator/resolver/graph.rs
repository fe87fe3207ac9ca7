use std::{
  cmp::Reverse,
  collections::{BTreeSet, BinaryHeap, HashMap},
};

use indexmap::IndexMap;
use petgraph::{algo::kosaraju_scc, graphmap::DiGraphMap};

use crate::generator::schema::SchemaNode;

/// Reference graph over a component table. An edge `a -> b` means `a` references `b`.
pub(crate) struct ReferenceGraph<'a> {
  graph: DiGraphMap<&'a str, ()>,
  position: HashMap<&'a str, usize>,
  components: Vec<Vec<&'a str>>,
}

impl<'a> ReferenceGraph<'a> {
  /// Every reference must already resolve inside `table`.
  pub(crate) fn build(table: &'a IndexMap<String, SchemaNode>) -> Self {
    let mut graph = DiGraphMap::<&str, ()>::new();
    for name in table.keys() {
      graph.add_node(name.as_str());
    }
    for (name, node) in table {
      for target in node.references() {
        if let Some((target, _)) = table.get_key_value(&target) {
          graph.add_edge(name.as_str(), target.as_str(), ());
        }
      }
    }

    let position = table.keys().enumerate().map(|(i, name)| (name.as_str(), i)).collect::<HashMap<_, _>>();
    let components = kosaraju_scc(&graph)
      .into_iter()
      .map(|mut scc| {
        scc.sort_by_key(|name| position[name]);
        scc
      })
      .collect();

    Self {
      graph,
      position,
      components,
    }
  }

  /// Strongly connected groups that form a cycle, including self references.
  pub(crate) fn cycles(&self) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = self
      .components
      .iter()
      .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
      .map(|scc| scc.iter().map(|name| (*name).to_string()).collect())
      .collect();
    cycles.sort_by_key(|cycle| cycle.first().map(|name| self.position[name.as_str()]));
    cycles
  }

  /// Emission order: every entry after the entries it references, except
  /// inside a cycle. Ties go to the entry that came first in the input, and
  /// each cyclic group is emitted as one contiguous run.
  pub(crate) fn emission_order(&self) -> Vec<&'a str> {
    let scc_of: HashMap<&str, usize> = self
      .components
      .iter()
      .enumerate()
      .flat_map(|(id, scc)| scc.iter().map(move |name| (*name, id)))
      .collect();

    let mut pending: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.components.len()];
    let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.components.len()];
    for (from, to, _) in self.graph.all_edges() {
      let (from, to) = (scc_of[from], scc_of[to]);
      if from != to {
        pending[from].insert(to);
        dependents[to].insert(from);
      }
    }

    let first_position = |id: usize| self.position[self.components[id][0]];
    let mut ready: BinaryHeap<Reverse<(usize, usize)>> = pending
      .iter()
      .enumerate()
      .filter(|(_, deps)| deps.is_empty())
      .map(|(id, _)| Reverse((first_position(id), id)))
      .collect();

    let mut order = Vec::with_capacity(self.position.len());
    while let Some(Reverse((_, id))) = ready.pop() {
      order.extend(self.components[id].iter().copied());
      for &dependent in &dependents[id] {
        pending[dependent].remove(&id);
        if pending[dependent].is_empty() {
          ready.push(Reverse((first_position(dependent), dependent)));
        }
      }
    }
    order
  }
}
