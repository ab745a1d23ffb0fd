//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// One workspace member for a generated uv.lock
pub struct Member<'a> {
  pub name: &'a str,
  /// Source path; "." makes a virtual root
  pub path: &'a str,
  pub deps: &'a [&'a str],
  pub dev: &'a [&'a str],
  pub optional: &'a [&'a str],
}

impl<'a> Member<'a> {
  pub fn new(name: &'a str, path: &'a str, deps: &'a [&'a str]) -> Self {
    Self {
      name,
      path,
      deps,
      dev: &[],
      optional: &[],
    }
  }

  pub fn dev(mut self, dev: &'a [&'a str]) -> Self {
    self.dev = dev;
    self
  }

  pub fn optional(mut self, optional: &'a [&'a str]) -> Self {
    self.optional = optional;
    self
  }
}

/// Render a uv.lock for the given members. Dependency names that are not members
/// become registry packages.
pub fn uv_lock(members: &[Member]) -> String {
  let names: Vec<&str> = members.iter().map(|m| m.name).collect();
  let quoted: Vec<String> = names.iter().map(|n| format!("\"{}\"", n)).collect();

  let mut lock = format!(
    "version = 1\nrequires-python = \">=3.12\"\n\n[manifest]\nmembers = [{}]\n",
    quoted.join(", ")
  );

  let mut externals = std::collections::BTreeSet::new();
  for member in members {
    let source = if member.path == "." {
      "{ virtual = \".\" }".to_string()
    } else {
      format!("{{ editable = \"{}\" }}", member.path)
    };
    lock.push_str(&format!(
      "\n[[package]]\nname = \"{}\"\nversion = \"0.1.0\"\nsource = {}\ndependencies = [\n{}]\n",
      member.name,
      source,
      entries(member.deps)
    ));
    if !member.optional.is_empty() {
      lock.push_str(&format!("\n[package.optional-dependencies]\nextra = [\n{}]\n", entries(member.optional)));
    }
    if !member.dev.is_empty() {
      lock.push_str(&format!("\n[package.dev-dependencies]\ndev = [\n{}]\n", entries(member.dev)));
    }

    for dep in member.deps.iter().chain(member.dev).chain(member.optional) {
      if !names.contains(dep) {
        externals.insert(*dep);
      }
    }
  }

  for external in externals {
    lock.push_str(&format!(
      "\n[[package]]\nname = \"{}\"\nversion = \"1.0.0\"\nsource = {{ registry = \"https://pypi.org/simple\" }}\n",
      external
    ));
  }

  lock
}

fn entries(deps: &[&str]) -> String {
  deps
    .iter()
    .map(|d| format!("    {{ name = \"{}\" }},\n", d))
    .collect()
}

/// The workspace most tests use:
///
/// ```text
/// myproject (virtual root) -> api, worker
/// api -> shared, requests (external); dev: testkit
/// worker -> shared; optional: notify
/// api-extra, notify, shared, testkit -> nothing internal
/// ```
pub fn standard_members() -> Vec<Member<'static>> {
  vec![
    Member::new("myproject", ".", &["api", "worker"]),
    Member::new("api", "packages/api", &["shared", "requests"]).dev(&["testkit"]),
    Member::new("api-extra", "packages/api-extra", &[]),
    Member::new("shared", "packages/shared", &[]),
    Member::new("worker", "packages/worker", &["shared"]).optional(&["notify"]),
    Member::new("notify", "packages/notify", &[]),
    Member::new("testkit", "packages/testkit", &[]),
  ]
}

/// A git repository holding a uv workspace, possibly in a subdirectory
pub struct TestWorkspace {
  _root: TempDir,
  /// Repository root
  pub repo: PathBuf,
  /// Workspace root (directory holding uv.lock)
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Workspace at the repository root, with the standard members committed
  pub fn new() -> Result<Self> {
    Self::with_members("", &standard_members())
  }

  /// Workspace in `subdir` of the repository (empty for the root)
  pub fn with_members(subdir: &str, members: &[Member]) -> Result<Self> {
    let root = TempDir::new()?;
    let repo = root.path().to_path_buf();
    let path = if subdir.is_empty() { repo.clone() } else { repo.join(subdir) };
    std::fs::create_dir_all(&path)?;

    // Initialize git repo with main as default branch
    git(&repo, &["init", "--initial-branch=main"])?;
    git(&repo, &["config", "user.name", "Test User"])?;
    git(&repo, &["config", "user.email", "test@example.com"])?;
    git(&repo, &["config", "commit.gpgsign", "false"])?;

    let ws = Self { _root: root, repo, path };
    ws.write("uv.lock", &uv_lock(members))?;
    ws.write("pyproject.toml", "[tool.uv.workspace]\nmembers = [\"packages/*\"]\n")?;
    for member in members.iter().filter(|m| m.path != ".") {
      ws.write(
        &format!("{}/src/{}/__init__.py", member.path, member.name.replace('-', "_")),
        &format!("NAME = \"{}\"\n", member.name),
      )?;
    }
    ws.commit("Initial workspace setup")?;

    Ok(ws)
  }

  /// Write a file relative to the workspace root
  pub fn write(&self, rel: &str, content: &str) -> Result<()> {
    write_file(&self.path.join(rel), content)
  }

  /// Write a file relative to the repository root
  pub fn write_in_repo(&self, rel: &str, content: &str) -> Result<()> {
    write_file(&self.repo.join(rel), content)
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.repo, &["add", "-A"])?;
    git(&self.repo, &["commit", "-m", message])?;

    let output = git(&self.repo, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Point a local `origin/main` branch at HEAD, the default base ref
  pub fn mark_base(&self) -> Result<()> {
    git(&self.repo, &["branch", "-f", "origin/main"])?;
    Ok(())
  }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run rail-affected and return its output, successful or not
pub fn run_rail_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_rail-affected"))
    .current_dir(cwd)
    .env_remove("RUST_LOG")
    .args(args)
    .output()
    .context("Failed to run rail-affected")
}

/// Run rail-affected, failing the test if it exits non-zero; returns stdout
pub fn run_rail(cwd: &Path, args: &[&str]) -> Result<String> {
  let output = run_rail_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "rail-affected command failed: rail-affected {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(String::from_utf8(output.stdout)?)
}

/// Run `affected --format json` and parse the report
pub fn affected_json(cwd: &Path, args: &[&str]) -> Result<serde_json::Value> {
  let mut full = vec!["affected", "--format", "json"];
  full.extend_from_slice(args);
  let stdout = run_rail(cwd, &full)?;
  serde_json::from_str(&stdout).with_context(|| format!("Invalid JSON output:\n{}", stdout))
}

/// Sorted string array from a JSON report field
pub fn names(report: &serde_json::Value, field: &str) -> Vec<String> {
  report[field]
    .as_array()
    .map(|items| items.iter().filter_map(|v| v.as_str().map(String::from)).collect())
    .unwrap_or_default()
}
