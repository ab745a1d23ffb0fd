//! Changed-file paths → owning packages
//!
//! All comparisons are on normalized, `/`-separated, workspace-relative strings.
//! Ownership is decided per path segment, never by bare string prefix, so
//! `packages/api-extra/x.py` cannot land in a package rooted at `packages/api`.

use super::workspace_graph::DependencyGraph;
use std::path::Path;
use tracing::debug;

/// Normalize a relative path: `/` separators, no `./` prefix, no empty segments,
/// no trailing separator. The workspace root itself normalizes to `""`.
pub fn normalize_path(raw: &str) -> String {
  let unified = raw.replace('\\', "/");
  unified
    .split('/')
    .filter(|segment| !segment.is_empty() && *segment != ".")
    .collect::<Vec<_>>()
    .join("/")
}

/// Whether `root` is `path` itself or one of its ancestor directories.
///
/// The empty root is an ancestor of everything.
pub fn is_path_prefix(root: &str, path: &str) -> bool {
  if root.is_empty() {
    return true;
  }
  match path.strip_prefix(root) {
    Some(rest) => rest.is_empty() || rest.starts_with('/'),
    None => false,
  }
}

/// Where the workspace root sits inside the version-control checkout.
///
/// Git reports changed files relative to the repository root, while package source
/// paths are relative to the directory holding the workspace manifest. The prefix
/// is the path from the former to the latter (empty when they coincide).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspacePrefix {
  prefix: String,
}

impl WorkspacePrefix {
  /// Identity rebasing: paths are already workspace-relative
  pub fn root() -> Self {
    Self::default()
  }

  pub fn new(prefix: &str) -> Self {
    Self {
      prefix: normalize_path(prefix),
    }
  }

  /// Compute the prefix between two directories.
  ///
  /// Both are canonicalized first so symlinked temp dirs compare equal. Returns
  /// `None` when the workspace is not inside the repository.
  pub fn between(repo_root: &Path, workspace_root: &Path) -> Option<Self> {
    let repo = repo_root.canonicalize().unwrap_or_else(|_| repo_root.to_path_buf());
    let workspace = workspace_root
      .canonicalize()
      .unwrap_or_else(|_| workspace_root.to_path_buf());

    let relative = workspace.strip_prefix(&repo).ok()?;
    Some(Self::new(&relative.to_string_lossy()))
  }

  pub fn as_str(&self) -> &str {
    &self.prefix
  }

  /// Re-express a repository-relative path relative to the workspace.
  ///
  /// Returns `None` for paths outside the workspace.
  pub fn rebase(&self, repo_relative: &str) -> Option<String> {
    let path = normalize_path(repo_relative);
    if self.prefix.is_empty() {
      return Some(path);
    }
    match path.strip_prefix(&self.prefix) {
      Some(rest) if rest.starts_with('/') => Some(rest[1..].to_string()),
      _ => None,
    }
  }

  /// Rebase a batch of paths, dropping the ones outside the workspace
  pub fn rebase_all<S: AsRef<str>>(&self, repo_relative: &[S]) -> Vec<String> {
    repo_relative
      .iter()
      .filter_map(|p| {
        let rebased = self.rebase(p.as_ref());
        if rebased.is_none() {
          debug!("Dropping {} (outside workspace '{}')", p.as_ref(), self.prefix);
        }
        rebased
      })
      .collect()
  }
}

/// Longest-prefix lookup from file path to owning package.
///
/// Virtual roots are never candidates: their empty source path would claim every file.
/// A non-virtual package at the root (a Cargo root crate) sorts last and only owns
/// files no deeper package claims.
pub struct PathMapper<'g> {
  /// (source_path, package name), longest source path first
  roots: Vec<(&'g str, &'g str)>,
}

impl<'g> PathMapper<'g> {
  pub fn new(graph: &'g DependencyGraph) -> Self {
    let mut roots: Vec<(&str, &str)> = graph
      .packages()
      .values()
      .filter(|pkg| !pkg.is_virtual_root)
      .map(|pkg| (pkg.source_path.as_str(), pkg.name.as_str()))
      .collect();

    roots.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
    Self { roots }
  }

  /// Owning package for a normalized, workspace-relative path
  pub fn owner(&self, path: &str) -> Option<&'g str> {
    self
      .roots
      .iter()
      .find(|(root, _)| is_path_prefix(root, path))
      .map(|(_, name)| *name)
  }
}
