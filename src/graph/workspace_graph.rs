//! Workspace dependency graph built from manifest records
//!
//! ## Graph Structure
//!
//! - **Forward**: `A → B` means "A depends on B"
//! - **Reverse**: `B → A`, the exact transpose of forward
//! - **Nodes**: workspace packages only; external dependencies never enter the graph
//! - **Edges**: filtered by dependency kind at build time, per `AnalysisConfig`
//!
//! Both directions are plain `name → set of names` maps keyed by package name.
//! Cycles are legal and leave both maps intact; traversal guards against them
//! (see `traverse`). petgraph is only used for reporting: SCC cycle listing and
//! Graphviz export.

use super::paths::normalize_path;
use crate::core::config::AnalysisConfig;
use crate::core::error::ManifestError;
use crate::manifest::{DependencyKind, WorkspaceManifest};
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Package name → set of package names
pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Internal dependency edge as declared
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Dependency {
  pub name: String,
  pub kind: DependencyKind,
}

/// A workspace member
#[derive(Debug, Clone, Serialize)]
pub struct Package {
  pub name: String,
  /// Normalized workspace-relative directory ("" for the workspace root)
  pub source_path: String,
  /// Declared internal dependencies, before kind filtering
  pub dependencies: BTreeSet<Dependency>,
  /// Aggregates other members and owns no files of its own
  pub is_virtual_root: bool,
}

/// Workspace dependency graph.
///
/// Immutable once built. Every package has an entry (possibly empty) in both
/// `forward` and `reverse`.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
  packages: BTreeMap<String, Package>,
  forward: Adjacency,
  reverse: Adjacency,
}

impl DependencyGraph {
  /// Build the graph from manifest records.
  ///
  /// 1. Register packages (unique names, unique non-virtual source paths). Whether a
  ///    package is virtual is the adapter's call: a Cargo root crate also lives at ""
  ///    but owns the files under it.
  /// 2. Classify each dependency: internal, external (dropped), or contradictory
  /// 3. Apply the kind filter from `config`
  /// 4. Transpose forward into reverse
  pub fn build(manifest: &WorkspaceManifest, config: &AnalysisConfig) -> Result<Self, ManifestError> {
    let mut packages: BTreeMap<String, Package> = BTreeMap::new();
    let mut paths: HashMap<String, String> = HashMap::new();

    for record in &manifest.packages {
      let source_path = normalize_path(&record.source_path);
      if record.name.trim().is_empty() {
        return Err(ManifestError::InvalidPackageName { source_path });
      }
      if packages.contains_key(&record.name) {
        return Err(ManifestError::DuplicatePackage {
          name: record.name.clone(),
        });
      }

      let is_virtual_root = record.is_virtual;
      if !is_virtual_root && let Some(first) = paths.insert(source_path.clone(), record.name.clone()) {
        return Err(ManifestError::DuplicateSourcePath {
          path: source_path,
          first,
          second: record.name.clone(),
        });
      }

      packages.insert(
        record.name.clone(),
        Package {
          name: record.name.clone(),
          source_path,
          dependencies: BTreeSet::new(),
          is_virtual_root,
        },
      );
    }

    let mut forward: Adjacency = packages.keys().map(|name| (name.clone(), BTreeSet::new())).collect();
    let mut external = 0usize;

    for record in &manifest.packages {
      for dep in &record.dependencies {
        if dep.name.trim().is_empty() {
          return Err(ManifestError::MalformedDependency {
            package: record.name.clone(),
            reason: "dependency has an empty name".to_string(),
          });
        }

        if dep.name == record.name {
          debug!("Ignoring self-dependency of '{}'", record.name);
          continue;
        }

        if !packages.contains_key(&dep.name) {
          if manifest.members.contains(&dep.name) {
            return Err(ManifestError::UnresolvedMember {
              package: record.name.clone(),
              dependency: dep.name.clone(),
            });
          }
          external += 1;
          continue;
        }

        if let Some(pkg) = packages.get_mut(&record.name) {
          pkg.dependencies.insert(Dependency {
            name: dep.name.clone(),
            kind: dep.kind,
          });
        }

        if !config.includes(dep.kind) {
          debug!(
            "Filtering {} edge {} -> {} (group: {})",
            dep.kind,
            record.name,
            dep.name,
            dep.group.as_deref().unwrap_or("-")
          );
        } else if let Some(deps) = forward.get_mut(&record.name) {
          deps.insert(dep.name.clone());
        }
      }
    }

    let reverse = transpose(&forward);

    debug!(
      "Built graph: {} packages, {} edges, {} external references dropped",
      packages.len(),
      forward.values().map(BTreeSet::len).sum::<usize>(),
      external
    );

    Ok(Self {
      packages,
      forward,
      reverse,
    })
  }

  /// All packages by name
  pub fn packages(&self) -> &BTreeMap<String, Package> {
    &self.packages
  }

  pub fn package(&self, name: &str) -> Option<&Package> {
    self.packages.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.packages.contains_key(name)
  }

  /// Sorted package names
  pub fn package_names(&self) -> BTreeSet<String> {
    self.packages.keys().cloned().collect()
  }

  /// Names of packages rooted at the workspace root
  pub fn virtual_roots(&self) -> BTreeSet<String> {
    self
      .packages
      .values()
      .filter(|p| p.is_virtual_root)
      .map(|p| p.name.clone())
      .collect()
  }

  /// Package → what it depends on (post-filter)
  pub fn forward(&self) -> &Adjacency {
    &self.forward
  }

  /// Package → what depends on it (post-filter)
  pub fn reverse(&self) -> &Adjacency {
    &self.reverse
  }

  /// Direct dependencies of a package (what it uses)
  pub fn dependencies(&self, name: &str) -> Option<&BTreeSet<String>> {
    self.forward.get(name)
  }

  /// Direct dependents of a package (what uses it)
  pub fn dependents(&self, name: &str) -> Option<&BTreeSet<String>> {
    self.reverse.get(name)
  }

  /// Detect dependency cycles using Tarjan's SCC algorithm.
  ///
  /// Returns strongly connected components with more than one package, each
  /// sorted, the list itself sorted.
  pub fn cycles(&self) -> Vec<Vec<String>> {
    let graph = self.to_petgraph();

    let mut cycles: Vec<Vec<String>> = algo::tarjan_scc(&graph)
      .into_iter()
      .filter(|component| component.len() > 1)
      .map(|component| {
        let mut names: Vec<String> = component.into_iter().map(|idx| graph[idx].to_string()).collect();
        names.sort();
        names
      })
      .collect();

    cycles.sort();
    cycles
  }

  /// Export graph to DOT format (Graphviz).
  ///
  /// ```bash
  /// rail-affected graph --format dot > graph.dot
  /// dot -Tpng graph.dot -o graph.png
  /// ```
  pub fn to_dot(&self) -> String {
    use petgraph::dot::{Config, Dot};
    use petgraph::visit::EdgeRef;

    let graph = self.to_petgraph();

    // Rendered in one expression: the attribute closures are temporaries
    format!(
      "{}",
      Dot::with_attr_getters(
        &graph,
        &[Config::EdgeNoLabel, Config::NodeNoLabel],
        &|_, edge_ref| match edge_ref.weight() {
          DependencyKind::Runtime => String::new(),
          DependencyKind::Dev => "style=dashed color=blue".to_string(),
          DependencyKind::Optional => "style=dotted color=orange".to_string(),
        },
        &|_, (_idx, name)| {
          let is_virtual = self.packages.get(*name).is_some_and(|p| p.is_virtual_root);
          if is_virtual {
            format!("label=\"{}\" shape=ellipse", name)
          } else {
            format!("label=\"{}\" shape=box", name)
          }
        },
      )
    )
  }

  /// petgraph view of the filtered forward edges, weighted by the strongest kind
  fn to_petgraph(&self) -> DiGraph<&str, DependencyKind> {
    let mut graph = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for name in self.packages.keys() {
      index.insert(name.as_str(), graph.add_node(name.as_str()));
    }

    for (from, targets) in self.forward() {
      let Some(pkg) = self.packages.get(from) else {
        continue;
      };
      for to in targets {
        let kind = pkg
          .dependencies
          .iter()
          .filter(|d| &d.name == to)
          .map(|d| d.kind)
          .min()
          .unwrap_or(DependencyKind::Runtime);
        graph.add_edge(index[from.as_str()], index[to.as_str()], kind);
      }
    }

    graph
  }
}

/// Reverse every edge of an adjacency map, keeping every key present
pub fn transpose(forward: &Adjacency) -> Adjacency {
  let mut reverse: Adjacency = forward.keys().map(|name| (name.clone(), BTreeSet::new())).collect();
  for (from, targets) in forward {
    for to in targets {
      reverse.entry(to.clone()).or_default().insert(from.clone());
    }
  }
  reverse
}
