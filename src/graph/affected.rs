//! Affected package analysis
//!
//! Given a set of changed files, determine:
//! - Which packages directly contain those files
//! - Whether any file is a root trigger (everything is affected)
//! - Which packages transitively depend on the changed packages
//!
//! Exclusions are applied last, as a filter on the final sets. They never edit the
//! graph, so an excluded package does not hide the dependents it would have pulled in.

use super::paths::{PathMapper, normalize_path};
use super::traverse::closure;
use super::triggers::RootTriggers;
use super::workspace_graph::DependencyGraph;
use crate::core::config::AnalysisConfig;
use crate::core::error::GraphError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Where one changed file landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMapping {
  pub path: String,
  /// Owning package, `None` when unmatched
  pub owner: Option<String>,
  /// File matched a root trigger
  pub trigger: bool,
}

/// Result of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedResult {
  /// Packages owning at least one changed file
  pub directly_changed: BTreeSet<String>,
  /// Directly changed packages plus everything depending on them
  pub affected: BTreeSet<String>,
  /// A root trigger fired
  pub test_all: bool,
  /// Per-file mapping, sorted by path
  pub files: Vec<FileMapping>,
}

impl AffectedResult {
  pub fn is_empty(&self) -> bool {
    self.affected.is_empty() && !self.test_all
  }

  /// Whether a package is affected only through its dependencies
  pub fn is_transitive(&self, name: &str) -> bool {
    self.affected.contains(name) && !self.directly_changed.contains(name)
  }

  /// Changed files no package owns
  pub fn unmatched(&self) -> impl Iterator<Item = &FileMapping> {
    self.files.iter().filter(|f| f.owner.is_none())
  }
}

/// Compute the affected set for a batch of workspace-relative changed files.
///
/// Algorithm:
/// 1. Map files → owning packages (longest source-path prefix, virtual roots excluded)
/// 2. Match files against root triggers
/// 3. Expand: nothing (direct-only), every package (trigger fired), or the
///    reverse-dependency closure of the direct set
/// 4. Drop virtual roots, then configured exclusions
pub fn assemble<S: AsRef<str>>(
  changed_files: &[S],
  graph: &DependencyGraph,
  triggers: &RootTriggers,
  config: &AnalysisConfig,
) -> Result<AffectedResult, GraphError> {
  let mapper = PathMapper::new(graph);

  let mut files: BTreeMap<String, FileMapping> = BTreeMap::new();
  for raw in changed_files {
    let path = normalize_path(raw.as_ref());
    if path.is_empty() || files.contains_key(&path) {
      continue;
    }
    let owner = mapper.owner(&path).map(str::to_string);
    let trigger = triggers.matches(&path);
    debug!("{} -> {:?}{}", path, owner, if trigger { " (root trigger)" } else { "" });
    files.insert(path.clone(), FileMapping { path, owner, trigger });
  }

  let mut directly_changed: BTreeSet<String> = files.values().filter_map(|f| f.owner.clone()).collect();
  let test_all = files.values().any(|f| f.trigger);

  let mut affected = if config.direct_only {
    directly_changed.clone()
  } else if test_all {
    graph.package_names()
  } else {
    closure(&directly_changed, graph.reverse())?
  };

  for root in graph.virtual_roots() {
    affected.remove(&root);
  }

  for name in &config.exclude_packages {
    if !graph.contains(name) {
      warn!("Excluded package '{}' is not a workspace member", name);
    }
    directly_changed.remove(name);
    affected.remove(name);
  }

  debug!(
    "{} files, {} directly changed, {} affected, test_all={}",
    files.len(),
    directly_changed.len(),
    affected.len(),
    test_all
  );

  Ok(AffectedResult {
    directly_changed,
    affected,
    test_all,
    files: files.into_values().collect(),
  })
}
