//! uv workspace adapter
//!
//! Reads `uv.lock` directly. The lock file already lists every workspace member in
//! `[manifest] members` and records each package's source, so there is no need to
//! evaluate pyproject.toml files or invoke uv.

use super::{DependencyKind, DependencyRef, ManifestAdapter, PackageRecord, WorkspaceManifest};
use crate::core::error::{ManifestError, RailResult, ResultExt};
use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use toml_edit::{DocumentMut, Item, Table, Value};
use tracing::{debug, warn};

/// Lock file versions whose layout we understand
const SUPPORTED_LOCK_VERSIONS: &[i64] = &[1];

/// Source keys that point at a local directory, in priority order
const LOCAL_SOURCE_KEYS: &[&str] = &["editable", "directory", "virtual"];

pub struct UvAdapter;

impl UvAdapter {
  pub fn new() -> Self {
    Self
  }
}

impl Default for UvAdapter {
  fn default() -> Self {
    Self::new()
  }
}

impl ManifestAdapter for UvAdapter {
  fn name(&self) -> &'static str {
    "uv"
  }

  fn manifest_filename(&self) -> &'static str {
    "uv.lock"
  }

  fn can_handle(&self, root: &Path) -> bool {
    root.join(self.manifest_filename()).is_file()
  }

  fn default_root_triggers(&self) -> &'static [&'static str] {
    &["pyproject.toml", "uv.lock", ".github/"]
  }

  fn load(&self, manifest_path: &Path) -> RailResult<WorkspaceManifest> {
    let contents = match std::fs::read_to_string(manifest_path) {
      Ok(contents) => contents,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(
          ManifestError::NotFound {
            path: manifest_path.to_path_buf(),
          }
          .into(),
        );
      }
      Err(e) => return Err(e).with_context(|| format!("Cannot read {}", manifest_path.display())),
    };

    let mut manifest = parse_lock(&contents, manifest_path)?;
    if let Some(parent) = manifest_path.parent().filter(|p| !p.as_os_str().is_empty()) {
      manifest.root = parent.to_path_buf();
    }
    Ok(manifest)
  }
}

/// Parse uv.lock contents into package records.
///
/// Only packages listed in `[manifest] members` become records; every other
/// `[[package]]` entry is an external distribution. `path` is used for messages only.
pub fn parse_lock(contents: &str, path: &Path) -> Result<WorkspaceManifest, ManifestError> {
  let doc: DocumentMut = contents.parse().map_err(|e: toml_edit::TomlError| ManifestError::InvalidToml {
    path: path.to_path_buf(),
    message: e.to_string().trim().to_string(),
  })?;

  let version = doc.get("version").and_then(Item::as_integer);
  if !version.is_some_and(|v| SUPPORTED_LOCK_VERSIONS.contains(&v)) {
    let shown = version.map_or_else(|| "<missing>".to_string(), |v| v.to_string());
    warn!(
      "uv.lock version {} is not recognized (supported: {:?}). Results may be unreliable.",
      shown, SUPPORTED_LOCK_VERSIONS
    );
  }

  let members = parse_members(&doc, path)?;

  let mut packages = Vec::new();
  if let Some(tables) = doc.get("package").and_then(Item::as_array_of_tables) {
    for table in tables.iter() {
      let Some(name) = table.get("name").and_then(Item::as_str) else {
        continue;
      };
      if !members.contains(name) {
        continue;
      }

      let Some(source_path) = local_source_path(table) else {
        warn!("Package '{}' has no recognized source path, skipping", name);
        continue;
      };

      let source_path = source_path.trim_end_matches('/').to_string();
      packages.push(PackageRecord {
        name: name.to_string(),
        is_virtual: matches!(source_path.as_str(), "" | "."),
        source_path,
        dependencies: package_dependencies(name, table)?,
      });
    }
  }

  debug!("Parsed {} workspace members from {}", packages.len(), path.display());

  Ok(WorkspaceManifest {
    root: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
    members,
    packages,
  })
}

fn parse_members(doc: &DocumentMut, path: &Path) -> Result<BTreeSet<String>, ManifestError> {
  let manifest = doc
    .get("manifest")
    .and_then(Item::as_table_like)
    .ok_or_else(|| ManifestError::NotAWorkspace { path: path.to_path_buf() })?;

  let Some(item) = manifest.get("members") else {
    return Err(ManifestError::NoMembers { path: path.to_path_buf() });
  };

  let array = item.as_array().ok_or_else(|| ManifestError::MembersNotArray {
    path: path.to_path_buf(),
    found: item.type_name().to_string(),
  })?;

  let mut raw = Vec::with_capacity(array.len());
  for value in array.iter() {
    let name = value.as_str().ok_or_else(|| ManifestError::MembersNotArray {
      path: path.to_path_buf(),
      found: format!("array containing {}", value.type_name()),
    })?;
    raw.push(name.to_string());
  }

  let members: BTreeSet<String> = raw.iter().cloned().collect();
  if members.len() != raw.len() {
    let mut seen = BTreeSet::new();
    let duplicates: BTreeSet<&str> = raw.iter().filter(|m| !seen.insert(m.as_str())).map(String::as_str).collect();
    warn!("Duplicate members in {}: {:?}", path.display(), duplicates);
  }

  if members.is_empty() {
    return Err(ManifestError::NoMembers { path: path.to_path_buf() });
  }

  Ok(members)
}

fn local_source_path(table: &Table) -> Option<String> {
  let source = table.get("source").and_then(Item::as_table_like)?;
  LOCAL_SOURCE_KEYS
    .iter()
    .find_map(|key| source.get(key).and_then(Item::as_str))
    .map(str::to_string)
}

fn package_dependencies(package: &str, table: &Table) -> Result<Vec<DependencyRef>, ManifestError> {
  let mut deps = Vec::new();

  if let Some(item) = table.get("dependencies") {
    for name in dependency_names(package, item)? {
      deps.push(DependencyRef::runtime(name));
    }
  }

  let grouped = [
    ("optional-dependencies", DependencyKind::Optional),
    ("dev-dependencies", DependencyKind::Dev),
  ];
  for (key, kind) in grouped {
    let Some(groups) = table.get(key).and_then(Item::as_table_like) else {
      continue;
    };
    for (group, item) in groups.iter() {
      for name in dependency_names(package, item)? {
        deps.push(DependencyRef::grouped(name, kind, group));
      }
    }
  }

  Ok(deps)
}

/// Names from a dependency list: an array of inline tables, or an array of tables.
fn dependency_names(package: &str, item: &Item) -> Result<Vec<String>, ManifestError> {
  let malformed = |reason: String| ManifestError::MalformedDependency {
    package: package.to_string(),
    reason,
  };

  if let Some(array) = item.as_array() {
    return array
      .iter()
      .map(|value| match value {
        Value::InlineTable(entry) => entry
          .get("name")
          .and_then(Value::as_str)
          .map(str::to_string)
          .ok_or_else(|| malformed("dependency entry has no name".to_string())),
        other => Err(malformed(format!("expected an inline table, got {}", other.type_name()))),
      })
      .collect();
  }

  if let Some(tables) = item.as_array_of_tables() {
    return tables
      .iter()
      .map(|entry| {
        entry
          .get("name")
          .and_then(Item::as_str)
          .map(str::to_string)
          .ok_or_else(|| malformed("dependency entry has no name".to_string()))
      })
      .collect();
  }

  Err(malformed(format!("dependency list must be an array, got {}", item.type_name())))
}
