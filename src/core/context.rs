//! Unified workspace context - load once, pass everywhere
//!
//! ```text
//! main.rs:
//!   WorkspaceContext::build() -> &WorkspaceContext
//!   |
//!   v
//! commands/affected.rs, graph.rs:
//!   fn run_*(ctx: &WorkspaceContext, ...)
//! ```
//!
//! The graph itself is built per command, because its edges depend on the
//! command's analysis options (`--no-dev`, `--no-optional`).

use crate::core::config::{AnalysisConfig, RailConfig};
use crate::core::error::RailResult;
use crate::graph::{DependencyGraph, RootTriggers};
use crate::manifest::{self, ManifestAdapter, WorkspaceManifest};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Workspace-level data shared by every command
pub struct WorkspaceContext {
  /// Workspace root directory (absolute path)
  pub root: PathBuf,

  /// Manifest the packages were read from
  pub manifest_path: PathBuf,

  /// Ecosystem adapter that read it
  pub adapter: Box<dyn ManifestAdapter>,

  /// Package records
  pub manifest: WorkspaceManifest,

  /// rail.toml (defaults when absent)
  pub config: RailConfig,
}

impl WorkspaceContext {
  /// Resolve the manifest, read it, and load rail.toml from the workspace root.
  ///
  /// `manifest` may name a manifest file or a workspace directory. Without it the
  /// workspace is detected in `cwd`.
  pub fn build(cwd: &Path, manifest: Option<&Path>) -> RailResult<Self> {
    let requested = match manifest {
      Some(path) if path.is_absolute() => path.to_path_buf(),
      Some(path) => cwd.join(path),
      None => cwd.to_path_buf(),
    };

    let (adapter, manifest_path) = if requested.is_dir() {
      let adapter = manifest::detect_adapter(&requested)?;
      let path = requested.join(adapter.manifest_filename());
      (adapter, path)
    } else {
      (manifest::adapter_for_manifest(&requested), requested)
    };

    debug!("Loading {} workspace from {}", adapter.name(), manifest_path.display());
    let manifest = adapter.load(&manifest_path)?;
    let root = manifest.root.clone();
    let config = RailConfig::load(&root)?;

    Ok(Self {
      root,
      manifest_path,
      adapter,
      manifest,
      config,
    })
  }

  /// File config merged with command-line options
  pub fn analysis_config(&self, cli: &AnalysisConfig) -> AnalysisConfig {
    AnalysisConfig::from_section(&self.config.affected).merge(cli)
  }

  /// Build the dependency graph under the given analysis options
  pub fn graph(&self, analysis: &AnalysisConfig) -> RailResult<DependencyGraph> {
    Ok(DependencyGraph::build(&self.manifest, analysis)?)
  }

  /// Ecosystem default triggers plus configured extras
  pub fn root_triggers(&self, analysis: &AnalysisConfig) -> RailResult<RootTriggers> {
    let triggers = RootTriggers::new(self.adapter.default_root_triggers(), &analysis.root_triggers)?;
    debug!("Root triggers: {}", triggers.patterns().collect::<Vec<_>>().join(", "));
    Ok(triggers)
  }

  /// Get workspace root as Path reference (convenience)
  pub fn workspace_root(&self) -> &Path {
    &self.root
  }
}
