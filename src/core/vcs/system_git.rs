//! System git backend
//!
//! Two jobs: find the repository root, and list the files changed in a range.
//! Every call runs the `git` binary in an isolated environment so user config
//! (pagers, quoting, diff drivers) cannot change the output we parse.

use crate::core::error::{GitError, RailError, RailResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Git backend using system git
pub struct SystemGit {
  /// Directory git was opened from
  repo_path: PathBuf,

  /// Working tree root (`git rev-parse --show-toplevel`)
  work_tree: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`
  pub fn open(path: &Path) -> RailResult<Self> {
    let output = isolated_git()
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(RailError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(RailError::message(format!(
        "Failed to open git repository: {}",
        stderr.trim()
      )));
    }

    let work_tree = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    debug!("Opened git repository at {}", work_tree.display());

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree,
    })
  }

  /// Repository root; changed-file paths are relative to it
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Files changed on HEAD since it diverged from `base` (`base...HEAD`)
  pub fn changed_files_since(&self, base: &str) -> RailResult<Vec<String>> {
    validate_ref(base)?;
    let range = format!("{}...HEAD", base);
    self.diff_names(&[range.as_str()], base)
  }

  /// Files that differ between two refs
  pub fn changed_files_between(&self, from: &str, to: &str) -> RailResult<Vec<String>> {
    validate_ref(from)?;
    validate_ref(to)?;
    self.diff_names(&[from, to], &format!("{}..{}", from, to))
  }

  fn diff_names(&self, range: &[&str], display_ref: &str) -> RailResult<Vec<String>> {
    let output = self
      .git_cmd()
      .args(["diff", "--name-only", "--no-renames"])
      .args(range)
      .arg("--")
      .output()
      .context("Failed to execute git diff")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      if is_unknown_ref(&stderr) {
        return Err(RailError::Git(GitError::UnknownRef {
          reference: display_ref.to_string(),
        }));
      }
      return Err(RailError::Git(GitError::CommandFailed {
        command: format!("git diff --name-only --no-renames {}", range.join(" ")),
        stderr,
      }));
    }

    let stdout = String::from_utf8(output.stdout)?;
    let files: Vec<String> = stdout
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect();

    debug!("git diff {}: {} changed files", range.join(" "), files.len());
    Ok(files)
  }

  /// Create a git command with an isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  fn git_cmd(&self) -> Command {
    let mut cmd = isolated_git();
    cmd.arg("-C").arg(&self.repo_path);
    cmd
  }
}

fn isolated_git() -> Command {
  let mut cmd = Command::new("git");

  // Don't trust global config
  cmd.env_clear();
  if let Ok(path) = std::env::var("PATH") {
    cmd.env("PATH", path);
  }
  if let Ok(home) = std::env::var("HOME") {
    cmd.env("HOME", home);
  }

  cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
  cmd.arg("--no-pager");

  cmd
}

fn is_unknown_ref(stderr: &str) -> bool {
  stderr.contains("unknown revision")
    || stderr.contains("bad revision")
    || stderr.contains("ambiguous argument")
    || stderr.contains("no merge base")
}

/// Reject refs that git would misread before spawning it
pub fn validate_ref(reference: &str) -> Result<(), GitError> {
  let invalid = |reason: &str| GitError::InvalidRef {
    reference: reference.to_string(),
    reason: reason.to_string(),
  };

  if reference.trim().is_empty() {
    return Err(invalid("ref is empty"));
  }
  if reference.contains('\0') {
    return Err(invalid("ref contains a NUL byte"));
  }
  if reference.starts_with('-') {
    return Err(invalid("ref must not start with '-'"));
  }
  if reference.chars().any(char::is_whitespace) {
    return Err(invalid("ref contains whitespace"));
  }
  Ok(())
}
