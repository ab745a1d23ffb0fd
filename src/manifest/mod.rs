//! Workspace manifest model and ecosystem adapters
//!
//! An adapter turns an ecosystem's manifest (uv.lock, Cargo metadata) into a flat
//! list of package declarations. Nothing here decides what is internal or external;
//! that classification belongs to the graph builder.
//!
//! Currently supports:
//! - Python (uv workspaces, via uv.lock)
//! - Rust (Cargo workspaces, via cargo metadata)

use crate::core::error::{ManifestError, RailResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod cargo;
pub mod uv;

/// How a dependency is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
  /// Always installed alongside the package
  Runtime,
  /// Development-only (dev groups, dev-dependencies)
  Dev,
  /// Behind an extra / feature flag
  Optional,
}

impl fmt::Display for DependencyKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DependencyKind::Runtime => write!(f, "runtime"),
      DependencyKind::Dev => write!(f, "dev"),
      DependencyKind::Optional => write!(f, "optional"),
    }
  }
}

/// A dependency reference exactly as the manifest declares it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
  pub name: String,
  pub kind: DependencyKind,
  /// Extra or dev-group name, when the format has one
  pub group: Option<String>,
}

impl DependencyRef {
  pub fn runtime(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: DependencyKind::Runtime,
      group: None,
    }
  }

  pub fn grouped(name: impl Into<String>, kind: DependencyKind, group: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind,
      group: Some(group.into()),
    }
  }
}

/// Raw package declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
  pub name: String,
  /// Workspace-relative directory, not yet normalized
  pub source_path: String,
  pub dependencies: Vec<DependencyRef>,
  /// Aggregates other members and owns no files (uv's `virtual = "."` root)
  pub is_virtual: bool,
}

/// Everything an adapter extracts from a workspace manifest
#[derive(Debug, Clone)]
pub struct WorkspaceManifest {
  /// Directory the source paths are relative to
  pub root: PathBuf,
  /// Declared member names (may include members without a usable record)
  pub members: BTreeSet<String>,
  /// Package records in manifest order
  pub packages: Vec<PackageRecord>,
}

/// Ecosystem adapter trait
///
/// Each ecosystem (uv, Cargo) implements this trait to locate and read its
/// workspace manifest and to name the root files whose change affects everything.
pub trait ManifestAdapter: Send + Sync {
  /// Short ecosystem name for logs and reports
  fn name(&self) -> &'static str;

  /// Manifest filename looked up in the workspace root
  fn manifest_filename(&self) -> &'static str;

  /// Detect if this adapter can handle the given workspace
  fn can_handle(&self, root: &Path) -> bool;

  /// Root files and directories whose change affects every package
  fn default_root_triggers(&self) -> &'static [&'static str];

  /// Read the manifest into package records
  fn load(&self, manifest_path: &Path) -> RailResult<WorkspaceManifest>;
}

/// Detect the appropriate adapter for a workspace root
///
/// Tries adapters in order: uv → Cargo
pub fn detect_adapter(root: &Path) -> RailResult<Box<dyn ManifestAdapter>> {
  let uv_adapter = uv::UvAdapter::new();
  if uv_adapter.can_handle(root) {
    return Ok(Box::new(uv_adapter));
  }

  let cargo_adapter = cargo::CargoAdapter::new();
  if cargo_adapter.can_handle(root) {
    return Ok(Box::new(cargo_adapter));
  }

  Err(
    ManifestError::UnsupportedWorkspace {
      root: root.to_path_buf(),
    }
    .into(),
  )
}

/// Pick the adapter for an explicitly named manifest file
pub fn adapter_for_manifest(manifest_path: &Path) -> Box<dyn ManifestAdapter> {
  let is_cargo = manifest_path
    .file_name()
    .and_then(|n| n.to_str())
    .is_some_and(|n| n == "Cargo.toml");

  if is_cargo {
    Box::new(cargo::CargoAdapter::new())
  } else {
    Box::new(uv::UvAdapter::new())
  }
}
