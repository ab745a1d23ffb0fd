//! Cargo workspace adapter
//!
//! Uses `cargo metadata --no-deps`: workspace members come back with their declared
//! dependencies, which is all the graph needs. Resolution of registry crates is skipped.

use super::{DependencyKind, DependencyRef, ManifestAdapter, PackageRecord, WorkspaceManifest};
use crate::core::error::{ManifestError, RailResult};
use cargo_metadata::{Dependency, MetadataCommand};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

pub struct CargoAdapter;

impl CargoAdapter {
  pub fn new() -> Self {
    Self
  }
}

impl Default for CargoAdapter {
  fn default() -> Self {
    Self::new()
  }
}

impl ManifestAdapter for CargoAdapter {
  fn name(&self) -> &'static str {
    "cargo"
  }

  fn manifest_filename(&self) -> &'static str {
    "Cargo.toml"
  }

  fn can_handle(&self, root: &Path) -> bool {
    let cargo_toml = root.join(self.manifest_filename());
    if !cargo_toml.exists() {
      return false;
    }

    // Check if it's a workspace
    if let Ok(content) = std::fs::read_to_string(&cargo_toml) {
      content.contains("[workspace]")
    } else {
      false
    }
  }

  fn default_root_triggers(&self) -> &'static [&'static str] {
    &["Cargo.toml", "Cargo.lock", "rust-toolchain.toml", ".cargo/", ".github/"]
  }

  fn load(&self, manifest_path: &Path) -> RailResult<WorkspaceManifest> {
    if !manifest_path.exists() {
      return Err(
        ManifestError::NotFound {
          path: manifest_path.to_path_buf(),
        }
        .into(),
      );
    }

    let metadata = MetadataCommand::new().manifest_path(manifest_path).no_deps().exec()?;
    let workspace_root = metadata.workspace_root.clone().into_std_path_buf();

    let mut members = BTreeSet::new();
    let mut packages = Vec::new();

    for pkg in metadata.workspace_packages() {
      let name = pkg.name.to_string();
      members.insert(name.clone());

      let source_path = pkg
        .manifest_path
        .parent()
        .and_then(|dir| dir.strip_prefix(&metadata.workspace_root).ok())
        .map(|rel| rel.as_str().to_string())
        .unwrap_or_default();

      packages.push(PackageRecord {
        name,
        source_path,
        dependencies: pkg.dependencies.iter().map(dependency_ref).collect(),
        // A root crate holds its own src/
        is_virtual: false,
      });
    }

    debug!("Loaded {} workspace crates from {}", packages.len(), manifest_path.display());

    Ok(WorkspaceManifest {
      root: workspace_root,
      members,
      packages,
    })
  }
}

fn dependency_ref(dep: &Dependency) -> DependencyRef {
  let kind = match dep.kind {
    cargo_metadata::DependencyKind::Development => DependencyKind::Dev,
    _ if dep.optional => DependencyKind::Optional,
    _ => DependencyKind::Runtime,
  };

  DependencyRef {
    name: dep.name.clone(),
    kind,
    group: None,
  }
}
