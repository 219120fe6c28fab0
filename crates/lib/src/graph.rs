//! Target dependency graph.
//!
//! Targets are nodes and `depends` entries are edges from a target to each
//! of its dependencies. Edge weights record the position of the dependency in
//! the `depends` list so traversal follows declared order.

use std::collections::{BTreeMap, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use thiserror::Error;
use tracing::trace;

use crate::model::Target;

/// Errors from dependency resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  /// A target was reached again while its own dependencies were being
  /// resolved. `cycle` starts and ends with the same target.
  #[error("circular dependency: {}", cycle.join(" -> "))]
  CyclicDependency { cycle: Vec<String> },

  #[error("target \"{dependency}\" does not exist in the project; it is used from target \"{target}\"")]
  UnresolvedDependency { target: String, dependency: String },

  #[error("target \"{0}\" does not exist in the project")]
  UnknownTarget(String),
}

/// A node in the target graph.
#[derive(Debug, Clone, Copy)]
pub enum GraphNode<'a> {
  Defined(&'a Target),
  /// Named in a `depends` list but never defined.
  Missing(&'a str),
}

impl<'a> GraphNode<'a> {
  fn name(&self) -> &'a str {
    match self {
      GraphNode::Defined(target) => &target.name,
      GraphNode::Missing(name) => name,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
  Visiting,
  Done,
}

/// Dependency graph over a project's targets.
pub struct TargetGraph<'a> {
  graph: DiGraph<GraphNode<'a>, usize>,
  nodes: HashMap<&'a str, NodeIndex>,
}

impl<'a> TargetGraph<'a> {
  pub fn new(targets: &'a BTreeMap<String, Target>) -> Self {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for (name, target) in targets {
      let idx = graph.add_node(GraphNode::Defined(target));
      nodes.insert(name.as_str(), idx);
    }

    for (name, target) in targets {
      let from = nodes[name.as_str()];
      for (position, dependency) in target.depends.iter().enumerate() {
        let to = *nodes
          .entry(dependency.as_str())
          .or_insert_with(|| graph.add_node(GraphNode::Missing(dependency)));
        graph.add_edge(from, to, position);
      }
    }

    Self { graph, nodes }
  }

  /// Dependencies of `idx` in declared order.
  fn dependencies(&self, idx: NodeIndex) -> Vec<NodeIndex> {
    let mut edges: Vec<_> = self.graph.edges_directed(idx, Direction::Outgoing).collect();
    edges.sort_by_key(|edge| *edge.weight());
    edges.into_iter().map(|edge| edge.target()).collect()
  }

  /// Depth-first order covering every requested target and its
  /// dependencies.
  ///
  /// Dependencies come before their dependents, each target appears once, and
  /// ties follow request order and then declared `depends` order.
  pub fn execution_order<S: AsRef<str>>(&self, requested: &[S]) -> Result<Vec<&'a Target>, GraphError> {
    let mut marks: HashMap<NodeIndex, Mark> = HashMap::new();
    let mut order = Vec::new();

    for name in requested {
      let name = name.as_ref();
      let root = match self.nodes.get(name) {
        Some(&idx) if matches!(self.graph[idx], GraphNode::Defined(_)) => idx,
        _ => return Err(GraphError::UnknownTarget(name.to_string())),
      };
      self.visit(root, &mut marks, &mut order)?;
    }

    trace!(
      order = ?order.iter().map(|t: &&Target| t.name.as_str()).collect::<Vec<_>>(),
      "resolved execution order"
    );
    Ok(order)
  }

  fn visit(
    &self,
    root: NodeIndex,
    marks: &mut HashMap<NodeIndex, Mark>,
    order: &mut Vec<&'a Target>,
  ) -> Result<(), GraphError> {
    if marks.contains_key(&root) {
      return Ok(());
    }

    // Each frame is a node and the index of the next dependency to visit.
    let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();
    marks.insert(root, Mark::Visiting);
    stack.push((root, self.dependencies(root), 0));

    while let Some((node, deps, next)) = stack.last_mut() {
      let node = *node;
      let Some(&dep) = deps.get(*next) else {
        marks.insert(node, Mark::Done);
        if let GraphNode::Defined(target) = self.graph[node] {
          order.push(target);
        }
        stack.pop();
        continue;
      };
      *next += 1;

      match marks.get(&dep) {
        Some(Mark::Done) => {}
        Some(Mark::Visiting) => {
          let start = stack.iter().position(|(idx, _, _)| *idx == dep).unwrap_or(0);
          let mut cycle: Vec<String> = stack[start..]
            .iter()
            .map(|(idx, _, _)| self.graph[*idx].name().to_string())
            .collect();
          cycle.push(self.graph[dep].name().to_string());
          return Err(GraphError::CyclicDependency { cycle });
        }
        None => {
          if let GraphNode::Missing(dependency) = self.graph[dep] {
            return Err(GraphError::UnresolvedDependency {
              target: self.graph[node].name().to_string(),
              dependency: dependency.to_string(),
            });
          }
          marks.insert(dep, Mark::Visiting);
          stack.push((dep, self.dependencies(dep), 0));
        }
      }
    }

    Ok(())
  }
}
