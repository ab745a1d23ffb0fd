//! Reverse-dependency reachability
//!
//! Breadth-first over the reverse map with an explicit visited set. A package is
//! enqueued at most once, so cycles terminate in at most `|packages|` dequeues.

use super::workspace_graph::Adjacency;
use crate::core::error::GraphError;
use std::collections::{BTreeSet, VecDeque};

/// Every package reachable from `seeds` by following `reverse`, seeds included.
///
/// Fails only when a seed is not a key of `reverse`.
pub fn closure(seeds: &BTreeSet<String>, reverse: &Adjacency) -> Result<BTreeSet<String>, GraphError> {
  if let Some(unknown) = seeds.iter().find(|seed| !reverse.contains_key(*seed)) {
    return Err(GraphError::UnknownPackage { name: unknown.clone() });
  }

  let mut visited: BTreeSet<String> = seeds.clone();
  let mut queue: VecDeque<&str> = seeds.iter().map(String::as_str).collect();

  while let Some(current) = queue.pop_front() {
    let Some(dependents) = reverse.get(current) else {
      continue;
    };
    for dependent in dependents {
      if visited.insert(dependent.clone()) {
        queue.push_back(dependent.as_str());
      }
    }
  }

  Ok(visited)
}
